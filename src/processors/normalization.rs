//! Grayscale intensity normalization for line images.
//!
//! Turns a decoded image of any size into the `[1, 1, H, W]` tensor the
//! recognition model consumes: resize to the fixed height, then map every
//! pixel to the unweighted mean of its R, G and B channels scaled to
//! `[0.0, 1.0]`. Alpha is ignored unless transparency flattening is enabled.

use crate::core::{OCRError, OcrResult, RecognizerConfig};
use crate::domain::NormalizedTensor;
use crate::processors::resize::LineResize;
use crate::processors::types::ResampleFilter;
use crate::utils::flatten_alpha_onto_white;
use image::DynamicImage;

/// Intensity of one 8-bit RGB pixel.
///
/// The channel sum is divided by three in integer arithmetic before scaling,
/// so the result is always one of the 256 values `k / 255.0`.
#[inline]
pub fn pixel_intensity(r: u8, g: u8, b: u8) -> f32 {
    let mean = (u32::from(r) + u32::from(g) + u32::from(b)) / 3;
    mean as f32 / 255.0
}

/// Produces [`NormalizedTensor`]s from raw line images.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineNormalizer {
    resize: LineResize,
    flatten_transparency: bool,
}

impl LineNormalizer {
    /// Creates a normalizer for the given height and filter.
    pub fn new(target_height: u32, filter: ResampleFilter) -> Self {
        Self {
            resize: LineResize::new(target_height, filter),
            flatten_transparency: false,
        }
    }

    /// Creates a normalizer from recognizer settings.
    pub fn from_config(config: &RecognizerConfig) -> Self {
        Self::new(config.target_height, config.filter)
            .with_flatten_transparency(config.flatten_transparency)
            .with_max_pixels(config.max_tensor_pixels)
    }

    /// Rejects images whose tensor would exceed `max_pixels` values.
    pub fn with_max_pixels(mut self, max_pixels: Option<usize>) -> Self {
        self.resize = self.resize.with_max_pixels(max_pixels);
        self
    }

    /// Composite transparent pixels onto white before normalizing.
    pub fn with_flatten_transparency(mut self, flatten: bool) -> Self {
        self.flatten_transparency = flatten;
        self
    }

    /// Height of the produced tensors.
    pub fn target_height(&self) -> u32 {
        self.resize.target_height()
    }

    /// Width the tensor for a `width` x `height` image will have.
    pub fn target_width(&self, width: u32, height: u32) -> OcrResult<u32> {
        self.resize.target_width(width, height)
    }

    /// Normalizes one image.
    ///
    /// # Errors
    ///
    /// * [`OCRError::InvalidImageKind`] if the image has a zero dimension.
    /// * [`OCRError::TensorConstruction`] if the tensor exceeds the pixel limit
    ///   or a buffer for it cannot be allocated.
    pub fn normalize(&self, image: &DynamicImage) -> OcrResult<NormalizedTensor> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(OCRError::invalid_dimensions(width, height));
        }

        let rgb = if self.flatten_transparency {
            flatten_alpha_onto_white(image)
        } else {
            image.to_rgb8()
        };
        let resized = self.resize.apply(&rgb)?;

        let (out_width, out_height) = (resized.width() as usize, resized.height() as usize);
        let shape = [1, 1, out_height, out_width];
        let len = out_width * out_height;

        let mut values = Vec::new();
        values.try_reserve_exact(len).map_err(|e| {
            OCRError::tensor_construction(
                shape,
                format!("cannot allocate {len} intensity values"),
                Some(Box::new(e)),
            )
        })?;
        values.extend(
            resized
                .pixels()
                .map(|p| pixel_intensity(p[0], p[1], p[2])),
        );

        tracing::trace!(
            source_width = width,
            source_height = height,
            tensor_width = out_width,
            "normalized line image"
        );
        NormalizedTensor::from_intensities(out_height, out_width, values)
    }
}
