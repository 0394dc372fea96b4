//! Per-call request and result records carried across the FFI boundary.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::region::TextRegion;

#[derive(Debug, Clone, PartialEq)]
pub struct OcrRequest {
    pub image_path: PathBuf,
    /// Caller supplied threshold. Recorded, not enforced.
    pub min_confidence: f32,
}

impl OcrRequest {
    pub fn new(image_path: impl AsRef<Path>, min_confidence: f32) -> Self {
        Self {
            image_path: image_path.as_ref().to_path_buf(),
            min_confidence,
        }
    }
}

/// Outcome of a single OCR call, tagged by `status` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OcrResult {
    Success {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        boxes: Option<Vec<TextRegion>>,
        confidence: f32,
    },
    Error {
        message: String,
    },
}

impl OcrResult {
    pub fn error(message: impl Into<String>) -> Self {
        OcrResult::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OcrResult::Success { .. })
    }

    /// `true` when every score and coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        match self {
            OcrResult::Error { .. } => true,
            OcrResult::Success {
                boxes, confidence, ..
            } => {
                confidence.is_finite()
                    && boxes.iter().flatten().all(|region| {
                        region.confidence.map_or(true, f32::is_finite)
                            && region.bounding_box.as_ref().map_or(true, |b| {
                                [b.x, b.y, b.width, b.height].iter().all(|v| v.is_finite())
                            })
                    })
            }
        }
    }
}
