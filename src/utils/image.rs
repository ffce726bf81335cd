//! Image loading and conversion helpers.
//!
//! Every decode failure is reported as [`OCRError::InvalidImageKind`] so a
//! batch can record it against the image that caused it.

use crate::core::{OCRError, OcrResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, Rgb, RgbImage};
use std::path::Path;

/// Loads and decodes an image file.
pub fn load_image(path: &Path) -> OcrResult<DynamicImage> {
    image::open(path).map_err(|e| {
        OCRError::undecodable_image(format!("cannot decode '{}'", path.display()), e)
    })
}

/// Decodes an image from encoded bytes (PNG, JPEG, ...).
pub fn load_image_from_bytes(bytes: &[u8]) -> OcrResult<DynamicImage> {
    image::load_from_memory(bytes)
        .map_err(|e| OCRError::undecodable_image("cannot decode image bytes", e))
}

/// Decodes a base64-encoded image.
///
/// Accepts the standard alphabet with padding. A `data:<mime>;base64,`
/// prefix, as produced by browsers, is stripped first.
pub fn load_image_from_base64(encoded: &str) -> OcrResult<DynamicImage> {
    let payload = strip_data_url(encoded.trim());
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| OCRError::undecodable_image("invalid base64 payload", e))?;
    load_image_from_bytes(&bytes)
}

/// Reads a file and returns its contents base64-encoded.
pub fn encode_file_base64(path: &Path) -> OcrResult<String> {
    let bytes = std::fs::read(path)?;
    Ok(STANDARD.encode(bytes))
}

fn strip_data_url(s: &str) -> &str {
    match s.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => s,
    }
}

/// Composites an image onto an opaque white background.
///
/// Fully transparent pixels become white and partially transparent ones are
/// blended with source-over. Images without alpha are converted unchanged.
pub fn flatten_alpha_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u32::from(a);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
