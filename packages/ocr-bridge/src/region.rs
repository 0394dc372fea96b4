use serde::{Deserialize, Serialize};

/// Axis-aligned box in source image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Smallest box enclosing every point. `None` for an empty polygon or
    /// one with a non-finite coordinate.
    pub fn enclosing(points: impl IntoIterator<Item = (f32, f32)>) -> Option<Self> {
        let points: Vec<(f32, f32)> = points.into_iter().collect();
        if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return None;
        }
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let (mut x_min, mut y_min, mut x_max, mut y_max) = (x0, y0, x0, y0);
        for (x, y) in iter {
            x_min = x_min.min(x);
            y_min = y_min.min(y);
            x_max = x_max.max(x);
            y_max = y_max.max(y);
        }
        Some(Self {
            x: x_min,
            y: y_min,
            width: x_max - x_min,
            height: y_max - y_min,
        })
    }
}

/// One recognized line of text as reported by the predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}
