//! Source image preparation.
//!
//! The generation service works on square frames, so the image is
//! center-cropped, resized, flattened onto white and re-encoded as JPEG.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use tracing::debug;

use super::config::PreprocessConfig;
use super::error::GenerationError;

/// Lowest JPEG quality tried when shrinking an oversized image.
const MIN_JPEG_QUALITY: u8 = 30;

/// Quality step used when shrinking an oversized image.
const QUALITY_STEP: u8 = 10;

/// Prepares `image` for submission and returns JPEG bytes.
pub fn prepare_image(image: &[u8], config: &PreprocessConfig) -> Result<Vec<u8>, GenerationError> {
    let decoded = image::load_from_memory(image)
        .map_err(|e| GenerationError::Preprocess(format!("Invalid image: {}", e)))?;

    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(GenerationError::Preprocess("Image has no pixels".to_string()));
    }

    let side = width.min(height);
    let square = decoded.crop_imm((width - side) / 2, (height - side) / 2, side, side);
    let resized = square.resize_exact(config.target_size, config.target_size, FilterType::Lanczos3);
    let flattened = flatten_onto_white(&resized);

    let mut quality = config.jpeg_quality.clamp(1, 100);
    loop {
        let encoded = encode_jpeg(&flattened, quality)?;
        debug!(
            "Prepared {}x{} image at quality {}: {} bytes",
            config.target_size,
            config.target_size,
            quality,
            encoded.len()
        );

        if encoded.len() <= config.max_image_bytes {
            return Ok(encoded);
        }
        if quality <= MIN_JPEG_QUALITY {
            return Err(GenerationError::Preprocess(format!(
                "Image is still {} bytes at quality {}; limit is {} bytes",
                encoded.len(),
                quality,
                config.max_image_bytes
            )));
        }
        quality = quality.saturating_sub(QUALITY_STEP).max(MIN_JPEG_QUALITY);
    }
}

fn flatten_onto_white(image: &DynamicImage) -> DynamicImage {
    let rgba = image.to_rgba8();
    let mut canvas = RgbaImage::from_pixel(rgba.width(), rgba.height(), Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut canvas, &rgba, 0, 0);
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, GenerationError> {
    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    image
        .write_with_encoder(encoder)
        .map_err(|e| GenerationError::Preprocess(format!("JPEG encoding failed: {}", e)))?;
    Ok(buf.into_inner())
}
