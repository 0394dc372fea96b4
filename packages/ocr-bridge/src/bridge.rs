use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tracing::{info, warn};

use crate::codec::serialize_or_fallback;
use crate::config::EngineConfig;
use crate::engine::{OcrEngine, OcrError};
use crate::record::OcrResult;

pub type EngineFactory = Box<dyn Fn(&EngineConfig) -> Result<OcrEngine, OcrError> + Send + Sync>;

static GLOBAL: OnceLock<OcrBridge> = OnceLock::new();

struct State {
    config: EngineConfig,
    engine: Option<Arc<OcrEngine>>,
}

/// Owns the lazily constructed engine behind the native entry points.
///
/// The engine is built on first use and shared by every later call. A
/// failed construction leaves the slot empty so the next call retries.
pub struct OcrBridge {
    state: Mutex<State>,
    factory: EngineFactory,
}

impl OcrBridge {
    pub fn new<F>(config: EngineConfig, factory: F) -> Self
    where
        F: Fn(&EngineConfig) -> Result<OcrEngine, OcrError> + Send + Sync + 'static,
    {
        Self {
            state: Mutex::new(State {
                config,
                engine: None,
            }),
            factory: Box::new(factory),
        }
    }

    /// Process-wide bridge configured from the environment.
    pub fn global() -> &'static OcrBridge {
        GLOBAL.get_or_init(|| OcrBridge::new(EngineConfig::from_env(), OcrEngine::from_config))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().engine.is_some()
    }

    /// Replaces the model configuration used for the next construction.
    ///
    /// Fails once an engine built from a different configuration exists.
    pub fn configure(&self, config: EngineConfig) -> Result<(), OcrError> {
        let mut state = self.lock();
        if state.engine.is_some() && state.config != config {
            return Err(OcrError::InvalidInput(
                "engine already initialized with a different model configuration".into(),
            ));
        }
        state.config = config;
        Ok(())
    }

    pub fn config(&self) -> EngineConfig {
        self.lock().config.clone()
    }

    /// Returns the shared engine, constructing it on first use.
    pub fn engine(&self) -> Result<Arc<OcrEngine>, OcrError> {
        let mut state = self.lock();
        if let Some(engine) = &state.engine {
            return Ok(Arc::clone(engine));
        }

        info!(config = ?state.config, "initializing OCR engine");
        let engine = (self.factory)(&state.config).map_err(|e| {
            warn!(error = %e, "failed to initialize OCR engine");
            e
        })?;
        let engine = Arc::new(engine);
        state.engine = Some(Arc::clone(&engine));
        info!("OCR engine ready");
        Ok(engine)
    }

    pub fn process_image(&self, image_path: &str, min_confidence: f32) -> OcrResult {
        match self.engine() {
            Ok(engine) => engine.process_image(Path::new(image_path), min_confidence),
            Err(e) => OcrResult::error(e.to_string()),
        }
    }

    /// [`process_image`](Self::process_image) encoded for the wire.
    pub fn process_image_serialized(&self, image_path: &str, min_confidence: f32) -> String {
        serialize_or_fallback(&self.process_image(image_path, min_confidence))
    }
}
