use std::path::Path;
use std::sync::Arc;

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::document::load_document;
use crate::record::{OcrRequest, OcrResult};
use crate::region::TextRegion;

/// Confidence reported when the predictor exposes no scores at all.
pub const DEFAULT_CONFIDENCE: f32 = 1.0;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("engine initialization failed: {0}")]
    EngineInit(String),
    #[error("failed to load image: {0}")]
    ImageLoad(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Regions the predictor found on a single page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagePrediction {
    pub regions: Vec<TextRegion>,
}

/// Combined detection + recognition pipeline of the underlying OCR library.
pub trait Predictor: Send + Sync {
    /// Runs the pipeline over decoded pages, returning one prediction per page
    /// in input order.
    fn predict(&self, pages: Vec<RgbImage>) -> Result<Vec<PagePrediction>, OcrError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    pub text: String,
    pub regions: Vec<TextRegion>,
}

impl OcrOutput {
    /// Mean of the finite region scores, or [`DEFAULT_CONFIDENCE`] when the
    /// predictor reported none.
    pub fn confidence(&self) -> f32 {
        let scores: Vec<f32> = self
            .regions
            .iter()
            .filter_map(|r| r.confidence)
            .filter(|c| c.is_finite())
            .collect();
        if scores.is_empty() {
            return DEFAULT_CONFIDENCE;
        }
        scores.iter().sum::<f32>() / scores.len() as f32
    }
}

impl From<OcrOutput> for OcrResult {
    fn from(output: OcrOutput) -> Self {
        let confidence = output.confidence();
        OcrResult::Success {
            text: output.text,
            boxes: Some(output.regions),
            confidence,
        }
    }
}

fn build_output(pages: Vec<PagePrediction>) -> OcrOutput {
    let regions: Vec<TextRegion> = pages
        .into_iter()
        .flat_map(|page| page.regions)
        .filter(|r| !r.text.is_empty())
        .collect();
    let text = regions
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    OcrOutput { text, regions }
}

/// Thin call-through to a [`Predictor`]: load, predict, translate.
pub struct OcrEngine {
    predictor: Arc<dyn Predictor>,
}

impl OcrEngine {
    pub fn new(predictor: impl Predictor + 'static) -> Self {
        Self {
            predictor: Arc::new(predictor),
        }
    }

    /// Builds the engine on the backend selected at compile time.
    #[cfg(feature = "oar")]
    pub fn from_config(config: &EngineConfig) -> Result<Self, OcrError> {
        let paths = config.resolve()?;
        let predictor = crate::oar::OarPredictor::new(&paths)?;
        Ok(Self::new(predictor))
    }

    #[cfg(not(feature = "oar"))]
    pub fn from_config(config: &EngineConfig) -> Result<Self, OcrError> {
        debug!(?config, "no predictor backend compiled in");
        Err(OcrError::Unsupported(
            "no OCR backend compiled in, rebuild with the `oar` feature".into(),
        ))
    }

    pub fn recognize(&self, path: &Path) -> Result<OcrOutput, OcrError> {
        let pages = load_document(path)?;
        let predictions = self.predictor.predict(pages)?;
        if predictions.is_empty() {
            return Err(OcrError::Inference("no results returned".into()));
        }
        Ok(build_output(predictions))
    }

    /// Runs a request to completion. Every failure is folded into
    /// [`OcrResult::Error`].
    ///
    /// The threshold travels with the request but does not filter regions.
    pub fn process(&self, request: &OcrRequest) -> OcrResult {
        debug!(
            path = %request.image_path.display(),
            min_confidence = request.min_confidence,
            "processing image"
        );
        match self.recognize(&request.image_path) {
            Ok(output) => output.into(),
            Err(e) => {
                warn!(path = %request.image_path.display(), error = %e, "OCR failed");
                OcrResult::error(e.to_string())
            }
        }
    }

    pub fn process_image(&self, image_path: &Path, min_confidence: f32) -> OcrResult {
        self.process(&OcrRequest::new(image_path, min_confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::BoundingBox;

    struct FixedPredictor(Vec<PagePrediction>);

    impl Predictor for FixedPredictor {
        fn predict(&self, _pages: Vec<RgbImage>) -> Result<Vec<PagePrediction>, OcrError> {
            Ok(self.0.clone())
        }
    }

    struct FailingPredictor;

    impl Predictor for FailingPredictor {
        fn predict(&self, _pages: Vec<RgbImage>) -> Result<Vec<PagePrediction>, OcrError> {
            Err(OcrError::Inference("session crashed".into()))
        }
    }

    fn region(text: &str, confidence: Option<f32>) -> TextRegion {
        TextRegion {
            text: text.into(),
            bounding_box: Some(BoundingBox {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 4.0,
            }),
            confidence,
        }
    }

    fn sample_image() -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        RgbImage::new(8, 8).save(file.path()).unwrap();
        file
    }

    #[test]
    fn test_confidence_is_mean_of_scores() {
        let output = OcrOutput {
            text: String::new(),
            regions: vec![region("a", Some(0.5)), region("b", Some(1.0)), region("c", None)],
        };
        assert_eq!(output.confidence(), 0.75);
    }

    #[test]
    fn test_confidence_defaults_without_scores() {
        let output = OcrOutput {
            text: String::new(),
            regions: vec![region("a", None), region("b", Some(f32::NAN))],
        };
        assert_eq!(output.confidence(), DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_text_joins_regions_in_order() {
        let output = build_output(vec![
            PagePrediction {
                regions: vec![region("first", Some(0.9)), region("", Some(0.1))],
            },
            PagePrediction {
                regions: vec![region("second", Some(0.8))],
            },
        ]);
        assert_eq!(output.text, "first\nsecond");
        assert_eq!(output.regions.len(), 2);
    }

    #[test]
    fn test_process_success() {
        let image = sample_image();
        let engine = OcrEngine::new(FixedPredictor(vec![PagePrediction {
            regions: vec![region("Hello", Some(0.5))],
        }]));

        match engine.process_image(image.path(), 0.5) {
            OcrResult::Success {
                text,
                boxes,
                confidence,
            } => {
                assert_eq!(text, "Hello");
                assert_eq!(boxes.unwrap().len(), 1);
                assert_eq!(confidence, 0.5);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn test_threshold_does_not_filter() {
        let image = sample_image();
        let engine = OcrEngine::new(FixedPredictor(vec![PagePrediction {
            regions: vec![region("faint", Some(0.1))],
        }]));

        let result = engine.process_image(image.path(), 0.99);
        assert!(matches!(result, OcrResult::Success { ref text, .. } if text == "faint"));
    }

    #[test]
    fn test_missing_file_is_error_record() {
        let engine = OcrEngine::new(FixedPredictor(Vec::new()));
        let result = engine.process_image(Path::new("/definitely/not/here.png"), 0.5);
        match result {
            OcrResult::Error { message } => assert!(message.starts_with("failed to load image")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_inference_failure_is_error_record() {
        let image = sample_image();
        let engine = OcrEngine::new(FailingPredictor);
        let result = engine.process_image(image.path(), 0.5);
        assert_eq!(
            result,
            OcrResult::error("inference failed: session crashed")
        );
    }

    #[test]
    fn test_empty_prediction_is_error() {
        let image = sample_image();
        let engine = OcrEngine::new(FixedPredictor(Vec::new()));
        assert!(matches!(
            engine.recognize(image.path()),
            Err(OcrError::Inference(_))
        ));
    }
}
