//! # ocr-bridge
//!
//! Exposes a document OCR predictor (text detection + recognition) to a
//! mobile host application through a small C ABI.
//!
//! The host loads `libocr_bridge`, optionally calls `ocr_bridge_init`, then
//! calls `process_image(path, min_confidence)` and receives a JSON result
//! record which it releases with `ocr_bridge_free_string`.
//!
//! ```ignore
//! use ocr_bridge::prelude::*;
//!
//! let bridge = OcrBridge::global();
//! match bridge.process_image("receipt.jpg", 0.5) {
//!     OcrResult::Success { text, .. } => println!("{text}"),
//!     OcrResult::Error { message } => eprintln!("{message}"),
//! }
//! ```

pub mod bridge;
pub mod codec;
pub mod config;
pub mod document;
pub mod engine;
pub mod ffi;
pub mod logging;
pub mod record;
pub mod region;

#[cfg(feature = "oar")]
pub mod oar;

pub use bridge::OcrBridge;
pub use codec::{deserialize_result, serialize_or_fallback, serialize_result};
pub use config::{EngineConfig, ModelPaths};
pub use engine::{OcrEngine, OcrError, OcrOutput, PagePrediction, Predictor};
pub use logging::init_logging;
pub use record::{OcrRequest, OcrResult};
pub use region::{BoundingBox, TextRegion};

#[cfg(feature = "oar")]
pub use oar::OarPredictor;

pub mod prelude {
    pub use crate::{
        deserialize_result, serialize_result, EngineConfig, OcrBridge, OcrEngine, OcrError,
        OcrRequest, OcrResult, Predictor, TextRegion,
    };
}
