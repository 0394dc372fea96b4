//! Model locations for the predictor backend.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::engine::OcrError;

pub const MODEL_DIR_ENV: &str = "OCR_BRIDGE_MODEL_DIR";
pub const DET_MODEL_ENV: &str = "OCR_BRIDGE_DET_MODEL";
pub const REC_MODEL_ENV: &str = "OCR_BRIDGE_REC_MODEL";
pub const DICT_ENV: &str = "OCR_BRIDGE_DICT";

pub const DET_MODEL_FILE: &str = "det.onnx";
pub const REC_MODEL_FILE: &str = "rec.onnx";
pub const DICT_FILE: &str = "dict.txt";

/// Where to find the detection model, recognition model and character
/// dictionary. Explicit paths win over files inside `model_dir`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub model_dir: Option<PathBuf>,
    pub det_model: Option<PathBuf>,
    pub rec_model: Option<PathBuf>,
    pub dict_path: Option<PathBuf>,
}

/// Fully resolved, existing model files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub det_model: PathBuf,
    pub rec_model: PathBuf,
    pub dict_path: PathBuf,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let path = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        Self {
            model_dir: path(MODEL_DIR_ENV),
            det_model: path(DET_MODEL_ENV),
            rec_model: path(REC_MODEL_ENV),
            dict_path: path(DICT_ENV),
        }
    }

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(dir.into());
        self
    }

    fn pick(&self, explicit: &Option<PathBuf>, file: &str, what: &str) -> Result<PathBuf, OcrError> {
        let path = explicit
            .clone()
            .or_else(|| self.model_dir.as_ref().map(|dir| dir.join(file)))
            .ok_or_else(|| OcrError::EngineInit(format!("no {what} configured")))?;
        ensure_exists(&path, what)?;
        Ok(path)
    }

    pub fn resolve(&self) -> Result<ModelPaths, OcrError> {
        Ok(ModelPaths {
            det_model: self.pick(&self.det_model, DET_MODEL_FILE, "detection model")?,
            rec_model: self.pick(&self.rec_model, REC_MODEL_FILE, "recognition model")?,
            dict_path: self.pick(&self.dict_path, DICT_FILE, "character dictionary")?,
        })
    }
}

fn ensure_exists(path: &Path, what: &str) -> Result<(), OcrError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(OcrError::EngineInit(format!(
            "{what} not found: {}",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let config = EngineConfig::from_lookup(lookup(&[
            (MODEL_DIR_ENV, "/data/models"),
            (DICT_ENV, "/data/keys.txt"),
            (REC_MODEL_ENV, ""),
        ]));
        assert_eq!(config.model_dir, Some(PathBuf::from("/data/models")));
        assert_eq!(config.dict_path, Some(PathBuf::from("/data/keys.txt")));
        assert_eq!(config.rec_model, None);
        assert_eq!(config.det_model, None);
    }

    #[test]
    fn test_resolve_from_model_dir() {
        let dir = tempfile::tempdir().unwrap();
        for file in [DET_MODEL_FILE, REC_MODEL_FILE, DICT_FILE] {
            std::fs::write(dir.path().join(file), b"x").unwrap();
        }
        let paths = EngineConfig::default()
            .with_model_dir(dir.path())
            .resolve()
            .unwrap();
        assert_eq!(paths.det_model, dir.path().join(DET_MODEL_FILE));
        assert_eq!(paths.dict_path, dir.path().join(DICT_FILE));
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        for file in [DET_MODEL_FILE, REC_MODEL_FILE, DICT_FILE] {
            std::fs::write(dir.path().join(file), b"x").unwrap();
        }
        let keys = dir.path().join("ppocr_keys_v1.txt");
        std::fs::write(&keys, b"a\nb\n").unwrap();

        let config = EngineConfig {
            dict_path: Some(keys.clone()),
            ..EngineConfig::default().with_model_dir(dir.path())
        };
        assert_eq!(config.resolve().unwrap().dict_path, keys);
    }

    #[test]
    fn test_missing_model_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::default()
            .with_model_dir(dir.path())
            .resolve()
            .unwrap_err();
        match err {
            OcrError::EngineInit(msg) => assert!(msg.starts_with("detection model not found")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_nothing_configured() {
        let err = EngineConfig::default().resolve().unwrap_err();
        assert_eq!(
            err.to_string(),
            "engine initialization failed: no detection model configured"
        );
    }
}
