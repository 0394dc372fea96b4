//! Detection + recognition through `oar-ocr`.
use image::RgbImage;
use oar_ocr::oarocr::{OAROCRBuilder, OAROCRResult, OAROCR};
use tracing::info;

use crate::config::ModelPaths;
use crate::engine::{OcrError, PagePrediction, Predictor};
use crate::region::{BoundingBox, TextRegion};

pub struct OarPredictor {
    ocr: OAROCR,
}

impl OarPredictor {
    pub fn new(paths: &ModelPaths) -> Result<Self, OcrError> {
        info!(
            det = %paths.det_model.display(),
            rec = %paths.rec_model.display(),
            dict = %paths.dict_path.display(),
            "loading oar-ocr pipeline"
        );
        let ocr = OAROCRBuilder::new(&paths.det_model, &paths.rec_model, &paths.dict_path)
            .build()
            .map_err(|e| OcrError::EngineInit(e.to_string()))?;
        Ok(Self { ocr })
    }
}

fn to_prediction(result: &OAROCRResult) -> PagePrediction {
    let regions = result
        .text_regions
        .iter()
        .filter_map(|region| {
            let text = region.text.as_ref()?.to_string();
            Some(TextRegion {
                text,
                bounding_box: BoundingBox::enclosing(
                    region.bounding_box.points.iter().map(|p| (p.x, p.y)),
                ),
                confidence: region.confidence.filter(|c| c.is_finite()),
            })
        })
        .collect();
    PagePrediction { regions }
}

impl Predictor for OarPredictor {
    fn predict(&self, pages: Vec<RgbImage>) -> Result<Vec<PagePrediction>, OcrError> {
        let results = self
            .ocr
            .predict(pages)
            .map_err(|e| OcrError::Inference(e.to_string()))?;
        Ok(results.iter().map(to_prediction).collect())
    }
}
