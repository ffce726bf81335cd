//! Fixed-height, aspect-preserving resize for single text lines.
//!
//! Every filter except `Nearest` runs as a separable convolution: a
//! horizontal pass into an 8-bit buffer, then a vertical pass. Each output
//! sample is centred at `(out + 0.5) * scale` in source space; when
//! downsampling the kernel is widened by the scale factor so every source
//! pixel contributes. Intermediate values are rounded half-up and clamped to
//! `0..=255`, which makes the output deterministic across platforms.
//!
//! All buffers sized by the output are reserved fallibly, so an image whose
//! scaled width cannot be held in memory fails with
//! [`OCRError::TensorConstruction`] instead of aborting the process.

use crate::core::{OCRError, OcrResult};
use crate::processors::types::ResampleFilter;
use image::{ImageBuffer, RgbImage};
use std::borrow::Cow;
use std::collections::TryReserveError;
use std::f32::consts::PI;
use thiserror::Error;

#[inline]
fn sinc(x: f32) -> f32 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// Lanczos kernel with two lobes.
#[inline]
fn lanczos2(x: f32) -> f32 {
    if x.abs() < 2.0 {
        sinc(x) * sinc(x / 2.0)
    } else {
        0.0
    }
}

/// Lanczos kernel with three lobes.
#[inline]
fn lanczos3(x: f32) -> f32 {
    if x.abs() < 3.0 {
        sinc(x) * sinc(x / 3.0)
    } else {
        0.0
    }
}

/// Keys cubic with `a = -0.5` (Catmull-Rom).
#[inline]
fn catmull_rom(x: f32) -> f32 {
    const A: f32 = -0.5;
    let x = x.abs();
    if x < 1.0 {
        ((A + 2.0) * x - (A + 3.0)) * x * x + 1.0
    } else if x < 2.0 {
        (((x - 5.0) * x + 8.0) * x - 4.0) * A
    } else {
        0.0
    }
}

#[inline]
fn triangle(x: f32) -> f32 {
    (1.0 - x.abs()).max(0.0)
}

/// A resampling kernel and its support radius at scale 1.
#[derive(Clone, Copy)]
struct Kernel {
    support: f32,
    eval: fn(f32) -> f32,
}

/// Convolution kernel for `filter`; `None` for nearest-neighbour sampling.
fn kernel_for(filter: ResampleFilter) -> Option<Kernel> {
    let (support, eval): (f32, fn(f32) -> f32) = match filter {
        ResampleFilter::Lanczos2 => (2.0, lanczos2),
        ResampleFilter::Lanczos3 => (3.0, lanczos3),
        ResampleFilter::CatmullRom => (2.0, catmull_rom),
        ResampleFilter::Triangle => (1.0, triangle),
        ResampleFilter::Nearest => return None,
    };
    Some(Kernel { support, eval })
}

/// Why a resample buffer could not be created.
#[derive(Debug, Error)]
enum BufferError {
    #[error("buffer of {0:?} elements overflows usize")]
    Overflow(Vec<usize>),
    #[error(transparent)]
    Reserve(#[from] TryReserveError),
    #[error("buffer does not fit a {0}x{1} image")]
    Layout(u32, u32),
}

/// Allocates a buffer of `dims.product()` copies of `value` without aborting
/// on allocation failure.
fn try_filled<T: Clone>(dims: &[usize], value: T) -> Result<Vec<T>, BufferError> {
    let len = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| BufferError::Overflow(dims.to_vec()))?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.resize(len, value);
    Ok(buf)
}

/// Source ranges and normalized weights for every output coordinate along
/// one axis, stored flat with `taps` weights per coordinate.
#[derive(Debug)]
struct Contributions {
    taps: usize,
    ranges: Vec<(usize, usize)>,
    weights: Vec<f32>,
}

impl Contributions {
    fn compute(in_size: usize, out_size: usize, kernel: Kernel) -> Result<Self, BufferError> {
        let scale = in_size as f32 / out_size as f32;
        let filterscale = scale.max(1.0);
        let support = kernel.support * filterscale;
        let taps = support.ceil() as usize * 2 + 1;

        let mut ranges = try_filled(&[out_size], (0usize, 0usize))?;
        let mut weights = try_filled(&[out_size, taps], 0.0f32)?;

        for (out, (range, row)) in ranges
            .iter_mut()
            .zip(weights.chunks_exact_mut(taps))
            .enumerate()
        {
            let center = (out as f32 + 0.5) * scale;
            let start = ((center - support + 0.5).floor().max(0.0)) as usize;
            let end = ((center + support + 0.5).floor() as usize)
                .min(in_size)
                .min(start + taps);
            let len = end.saturating_sub(start);

            let mut total = 0.0;
            for (k, w) in row[..len].iter_mut().enumerate() {
                *w = (kernel.eval)(((start + k) as f32 + 0.5 - center) / filterscale);
                total += *w;
            }
            if total != 0.0 {
                row[..len].iter_mut().for_each(|w| *w /= total);
            }
            *range = (start, len);
        }

        Ok(Self {
            taps,
            ranges,
            weights,
        })
    }

    /// First source index and weights for output coordinate `out`.
    #[inline]
    fn get(&self, out: usize) -> (usize, &[f32]) {
        let (start, len) = self.ranges[out];
        let offset = out * self.taps;
        (start, &self.weights[offset..offset + len])
    }
}

#[inline]
fn to_u8(value: f32) -> u8 {
    (value + 0.5).floor().clamp(0.0, 255.0) as u8
}

fn separable_resize(
    src: &RgbImage,
    out_width: u32,
    out_height: u32,
    kernel: Kernel,
) -> Result<RgbImage, BufferError> {
    let (in_width, in_height) = src.dimensions();

    // Horizontal pass
    let temp: Cow<'_, RgbImage> = if in_width == out_width {
        Cow::Borrowed(src)
    } else {
        let (in_w, out_w) = (in_width as usize, out_width as usize);
        let xs = Contributions::compute(in_w, out_w, kernel)?;
        let mut buf = try_filled(&[out_w, in_height as usize, 3], 0u8)?;
        for (src_row, out_row) in src
            .as_raw()
            .chunks_exact(in_w * 3)
            .zip(buf.chunks_exact_mut(out_w * 3))
        {
            for (out_x, out_px) in out_row.chunks_exact_mut(3).enumerate() {
                let (start, weights) = xs.get(out_x);
                let mut acc = [0.0f32; 3];
                for (k, &w) in weights.iter().enumerate() {
                    let p = (start + k) * 3;
                    for c in 0..3 {
                        acc[c] += f32::from(src_row[p + c]) * w;
                    }
                }
                out_px.copy_from_slice(&acc.map(to_u8));
            }
        }
        Cow::Owned(
            ImageBuffer::from_raw(out_width, in_height, buf)
                .ok_or(BufferError::Layout(out_width, in_height))?,
        )
    };

    if in_height == out_height {
        return Ok(temp.into_owned());
    }

    // Vertical pass
    let row_len = out_width as usize * 3;
    let ys = Contributions::compute(in_height as usize, out_height as usize, kernel)?;
    let mut buf = try_filled(&[row_len, out_height as usize], 0u8)?;
    let temp_raw = temp.as_raw();
    for (out_y, out_row) in buf.chunks_exact_mut(row_len).enumerate() {
        let (start, weights) = ys.get(out_y);
        for (i, out_value) in out_row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &w) in weights.iter().enumerate() {
                acc += f32::from(temp_raw[(start + k) * row_len + i]) * w;
            }
            *out_value = to_u8(acc);
        }
    }
    ImageBuffer::from_raw(out_width, out_height, buf).ok_or(BufferError::Layout(out_width, out_height))
}

/// Samples the source pixel under each output pixel centre.
fn nearest_resize(src: &RgbImage, out_width: u32, out_height: u32) -> Result<RgbImage, BufferError> {
    let (in_width, in_height) = src.dimensions();
    let scale_x = f64::from(in_width) / f64::from(out_width);
    let scale_y = f64::from(in_height) / f64::from(out_height);

    let row_len = out_width as usize * 3;
    let mut buf = try_filled(&[row_len, out_height as usize], 0u8)?;
    for (out_y, out_row) in buf.chunks_exact_mut(row_len).enumerate() {
        let y = (((out_y as f64 + 0.5) * scale_y) as u32).min(in_height - 1);
        for (out_x, out_px) in out_row.chunks_exact_mut(3).enumerate() {
            let x = (((out_x as f64 + 0.5) * scale_x) as u32).min(in_width - 1);
            out_px.copy_from_slice(&src.get_pixel(x, y).0);
        }
    }
    ImageBuffer::from_raw(out_width, out_height, buf).ok_or(BufferError::Layout(out_width, out_height))
}

/// Resizes a line image to a fixed height, scaling the width proportionally.
#[derive(Debug, Clone, Copy)]
pub struct LineResize {
    target_height: u32,
    filter: ResampleFilter,
    max_pixels: Option<usize>,
}

impl LineResize {
    /// Creates a resizer for `target_height` using `filter`.
    pub fn new(target_height: u32, filter: ResampleFilter) -> Self {
        Self {
            target_height,
            filter,
            max_pixels: None,
        }
    }

    /// Rejects outputs with more than `max_pixels` pixels. `None` means no limit.
    pub fn with_max_pixels(mut self, max_pixels: Option<usize>) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    /// Output height.
    pub fn target_height(&self) -> u32 {
        self.target_height
    }

    /// Resampling filter in use.
    pub fn filter(&self) -> ResampleFilter {
        self.filter
    }

    /// Output pixel limit, if any.
    pub fn max_pixels(&self) -> Option<usize> {
        self.max_pixels
    }

    /// Output width for a `width` x `height` source: `max(1, width * H / height)`.
    ///
    /// # Errors
    ///
    /// [`OCRError::InvalidImageKind`] when either dimension is zero or the
    /// scaled width does not fit in a `u32`.
    pub fn target_width(&self, width: u32, height: u32) -> OcrResult<u32> {
        if width == 0 || height == 0 {
            return Err(OCRError::invalid_dimensions(width, height));
        }
        let scaled = (u64::from(width) * u64::from(self.target_height) / u64::from(height)).max(1);
        u32::try_from(scaled).map_err(|e| OCRError::InvalidImageKind {
            width,
            height,
            message: format!("scaled width {scaled} is too large"),
            source: Some(Box::new(e)),
        })
    }

    /// Resizes `src` to `target_width x target_height`.
    ///
    /// # Errors
    ///
    /// * [`OCRError::InvalidImageKind`] as for [`LineResize::target_width`].
    /// * [`OCRError::TensorConstruction`] when the output exceeds the pixel
    ///   limit or its buffers cannot be allocated.
    pub fn apply(&self, src: &RgbImage) -> OcrResult<RgbImage> {
        let (width, height) = src.dimensions();
        let out_width = self.target_width(width, height)?;
        let out_height = self.target_height;
        let shape = [1, 1, out_height as usize, out_width as usize];

        let pixels = u64::from(out_width) * u64::from(out_height);
        if let Some(limit) = self.max_pixels.filter(|&limit| pixels > limit as u64) {
            return Err(OCRError::tensor_construction(
                shape,
                format!("{pixels} pixels exceeds the limit of {limit}"),
                None,
            ));
        }

        if (width, height) == (out_width, out_height) {
            return Ok(src.clone());
        }

        let resized = match kernel_for(self.filter) {
            Some(kernel) => separable_resize(src, out_width, out_height, kernel),
            None => nearest_resize(src, out_width, out_height),
        };
        resized.map_err(|e| {
            OCRError::tensor_construction(shape, "cannot allocate resample buffer", Some(Box::new(e)))
        })
    }
}

impl Default for LineResize {
    fn default() -> Self {
        Self::new(crate::core::TARGET_HEIGHT, ResampleFilter::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            let v = ((x * 7 + y * 3) % 256) as u8;
            Rgb([v, v / 2, 255 - v])
        })
    }

    #[test]
    fn test_kernel_shape() {
        assert_eq!(lanczos2(0.0), 1.0);
        assert!(lanczos2(1.0).abs() < 1e-6);
        assert!(lanczos2(1.5) < 0.0);
        assert_eq!(lanczos2(2.0), 0.0);
        assert_eq!(lanczos2(-3.0), 0.0);
        assert_eq!(catmull_rom(0.0), 1.0);
        assert_eq!(catmull_rom(2.5), 0.0);
        assert_eq!(triangle(0.5), 0.5);
    }

    #[test]
    fn test_contribution_weights_sum_to_one() {
        for filter in [
            ResampleFilter::Lanczos2,
            ResampleFilter::Lanczos3,
            ResampleFilter::CatmullRom,
            ResampleFilter::Triangle,
        ] {
            let kernel = kernel_for(filter).unwrap();
            for (input, output) in [(100, 64), (32, 64), (1, 64), (640, 7)] {
                let xs = Contributions::compute(input, output, kernel).unwrap();
                for out in 0..output {
                    let (start, weights) = xs.get(out);
                    let total: f32 = weights.iter().sum();
                    assert!((total - 1.0).abs() < 1e-4, "{filter:?} {input}->{output}: {total}");
                    assert!(start + weights.len() <= input);
                }
            }
        }
    }

    #[test]
    fn test_target_width_rule() {
        let resize = LineResize::default();
        assert_eq!(resize.target_width(128, 64).unwrap(), 128);
        assert_eq!(resize.target_width(100, 32).unwrap(), 200);
        assert_eq!(resize.target_width(50, 30).unwrap(), 106);
        assert_eq!(resize.target_width(1, 1000).unwrap(), 1);
        assert_eq!(resize.target_width(3, 200).unwrap(), 1);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let resize = LineResize::default();
        assert!(matches!(
            resize.target_width(0, 10),
            Err(OCRError::InvalidImageKind { .. })
        ));
        assert!(matches!(
            resize.target_width(10, 0),
            Err(OCRError::InvalidImageKind { .. })
        ));
    }

    #[test]
    fn test_output_dimensions_for_every_filter() {
        let src = gradient(90, 40);
        for filter in [
            ResampleFilter::Lanczos2,
            ResampleFilter::Lanczos3,
            ResampleFilter::CatmullRom,
            ResampleFilter::Triangle,
            ResampleFilter::Nearest,
        ] {
            let out = LineResize::new(64, filter).apply(&src).unwrap();
            assert_eq!(out.dimensions(), (144, 64), "{filter:?}");
        }
    }

    #[test]
    fn test_uniform_image_stays_uniform() {
        let src: RgbImage = ImageBuffer::from_pixel(37, 19, Rgb([200, 13, 90]));
        for filter in [ResampleFilter::Lanczos2, ResampleFilter::Nearest] {
            let out = LineResize::new(64, filter).apply(&src).unwrap();
            assert_eq!(out.dimensions(), (124, 64));
            assert!(out.pixels().all(|p| *p == Rgb([200, 13, 90])), "{filter:?}");
        }
    }

    #[test]
    fn test_same_size_is_identity() {
        let src = gradient(128, 64);
        let out = LineResize::default().apply(&src).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_lanczos2_is_deterministic() {
        let src = gradient(300, 97);
        let a = LineResize::default().apply(&src).unwrap();
        let b = LineResize::default().apply(&src).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_buffer_size_overflow_is_an_error() {
        assert!(matches!(
            try_filled(&[usize::MAX, 2], 0u8),
            Err(BufferError::Overflow(_))
        ));
        // Larger than isize::MAX bytes: rejected without touching the allocator.
        assert!(matches!(
            try_filled(&[isize::MAX as usize, 2], 0u8),
            Err(BufferError::Reserve(_))
        ));
    }

    #[test]
    fn test_pixel_limit_rejects_wide_output() {
        let src = gradient(1000, 1);
        let resize = LineResize::default().with_max_pixels(Some(64 * 1000));
        match resize.apply(&src) {
            Err(OCRError::TensorConstruction { shape, .. }) => {
                assert_eq!(shape, [1, 1, 64, 64_000]);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let fits = LineResize::default().with_max_pixels(Some(64 * 64));
        assert_eq!(fits.apply(&gradient(4, 4)).unwrap().dimensions(), (64, 64));
    }
}
