//! Transport encoding for [`OcrResult`].
//!
//! Results travel as a JSON object whose `status` field is `"success"` or
//! `"error"`:
//!
//! ```text
//! {"status":"success","text":"Hello","boxes":[{"text":"Hello","bounding_box":{...},"confidence":0.98}],"confidence":0.98}
//! {"status":"error","message":"failed to load image: ..."}
//! ```
use crate::engine::OcrError;
use crate::record::OcrResult;

/// Sent when a result cannot be encoded at all.
pub const FALLBACK_ERROR: &str =
    r#"{"status":"error","message":"Bridge error: failed to serialize result"}"#;

/// Encodes `result`. JSON has no NaN or infinity, so a record carrying a
/// non-finite score or coordinate is rejected rather than written lossily.
pub fn serialize_result(result: &OcrResult) -> Result<String, OcrError> {
    if !result.is_finite() {
        return Err(OcrError::Serialization(serde::ser::Error::custom(
            "result contains a non-finite number",
        )));
    }
    Ok(serde_json::to_string(result)?)
}

pub fn deserialize_result(encoded: &str) -> Result<OcrResult, OcrError> {
    Ok(serde_json::from_str(encoded)?)
}

/// Encodes `result`, substituting [`FALLBACK_ERROR`] on failure so callers
/// always receive a well-formed record.
pub fn serialize_or_fallback(result: &OcrResult) -> String {
    serialize_result(result).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to serialize OCR result");
        FALLBACK_ERROR.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{BoundingBox, TextRegion};

    fn success() -> OcrResult {
        OcrResult::Success {
            text: "Invoice 42\nTotal: 17.50".into(),
            boxes: Some(vec![
                TextRegion {
                    text: "Invoice 42".into(),
                    bounding_box: Some(BoundingBox {
                        x: 12.0,
                        y: 8.5,
                        width: 120.25,
                        height: 18.0,
                    }),
                    confidence: Some(0.875),
                },
                TextRegion {
                    text: "Total: 17.50".into(),
                    bounding_box: None,
                    confidence: None,
                },
            ]),
            confidence: 0.875,
        }
    }

    #[test]
    fn test_success_round_trip() {
        let original = success();
        let encoded = serialize_result(&original).unwrap();
        assert_eq!(deserialize_result(&encoded).unwrap(), original);
    }

    #[test]
    fn test_error_round_trip() {
        let original = OcrResult::error("failed to load image: missing.png");
        let encoded = serialize_result(&original).unwrap();
        assert_eq!(
            encoded,
            r#"{"status":"error","message":"failed to load image: missing.png"}"#
        );
        assert_eq!(deserialize_result(&encoded).unwrap(), original);
    }

    #[test]
    fn test_encoding_is_stable() {
        let first = serialize_result(&success()).unwrap();
        let decoded = deserialize_result(&first).unwrap();
        assert_eq!(serialize_result(&decoded).unwrap(), first);
    }

    #[test]
    fn test_status_discriminator() {
        let encoded = serialize_result(&success()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["boxes"][0]["text"], "Invoice 42");
        assert!(value["boxes"][1].get("bounding_box").is_none());
    }

    #[test]
    fn test_absent_boxes_round_trip() {
        let original = OcrResult::Success {
            text: String::new(),
            boxes: None,
            confidence: 1.0,
        };
        let encoded = serialize_result(&original).unwrap();
        assert!(!encoded.contains("boxes"));
        assert_eq!(deserialize_result(&encoded).unwrap(), original);
    }

    #[test]
    fn test_unknown_status_rejected() {
        let err = deserialize_result(r#"{"status":"pending"}"#).unwrap_err();
        assert!(matches!(err, OcrError::Serialization(_)));
    }

    #[test]
    fn test_non_finite_confidence_rejected() {
        let result = OcrResult::Success {
            text: "a".into(),
            boxes: Some(vec![TextRegion {
                text: "a".into(),
                bounding_box: None,
                confidence: Some(f32::NAN),
            }]),
            confidence: 1.0,
        };
        assert!(matches!(
            serialize_result(&result),
            Err(OcrError::Serialization(_))
        ));
        assert_eq!(serialize_or_fallback(&result), FALLBACK_ERROR);
    }

    #[test]
    fn test_non_finite_box_falls_back() {
        let result = OcrResult::Success {
            text: "a".into(),
            boxes: Some(vec![TextRegion {
                text: "a".into(),
                bounding_box: Some(BoundingBox {
                    x: 0.0,
                    y: 0.0,
                    width: f32::INFINITY,
                    height: 4.0,
                }),
                confidence: Some(0.5),
            }]),
            confidence: 0.5,
        };
        let encoded = serialize_or_fallback(&result);
        assert_eq!(encoded, FALLBACK_ERROR);
        assert!(deserialize_result(&encoded).is_ok());
    }

    #[test]
    fn test_non_finite_overall_confidence_rejected() {
        let result = OcrResult::Success {
            text: String::new(),
            boxes: None,
            confidence: f32::NEG_INFINITY,
        };
        assert!(serialize_result(&result).is_err());
    }

    #[test]
    fn test_fallback_is_decodable() {
        assert_eq!(
            deserialize_result(FALLBACK_ERROR).unwrap(),
            OcrResult::error("Bridge error: failed to serialize result")
        );
    }
}
