use std::path::Path;

use image::{ImageReader, RgbImage};

use crate::engine::OcrError;

/// Decodes an image file into the RGB pages handed to the predictor.
///
/// The format is sniffed from the file contents, so extension-less paths
/// (host cache files, content-provider copies) load as well.
pub fn load_document(path: &Path) -> Result<Vec<RgbImage>, OcrError> {
    let image_err =
        |e: &dyn std::fmt::Display| OcrError::ImageLoad(format!("{}: {e}", path.display()));

    let reader = ImageReader::open(path)
        .map_err(|e| image_err(&e))?
        .with_guessed_format()
        .map_err(|e| image_err(&e))?;
    let image = reader.decode().map_err(|e| image_err(&e))?;
    Ok(vec![image.to_rgb8()])
}
