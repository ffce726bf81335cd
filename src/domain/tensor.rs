//! The normalized model input.

use crate::core::{OCRError, OcrResult};
use ndarray::Array4;

/// Fixed-height, width-proportional single-channel input for the model.
///
/// Logical shape is `[1, 1, H, W]`. The backing array is contiguous and
/// row-major, so `as_slice()[y * W + x]` is the intensity at `(x, y)`.
/// Every value lies in `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor {
    data: Array4<f32>,
}

impl NormalizedTensor {
    /// Wraps a row-major intensity buffer of `height * width` values.
    pub fn from_intensities(height: usize, width: usize, values: Vec<f32>) -> OcrResult<Self> {
        let shape = [1, 1, height, width];
        let data = Array4::from_shape_vec((1, 1, height, width), values).map_err(|e| {
            OCRError::tensor_construction(
                shape,
                "intensity buffer does not match tensor shape",
                Some(Box::new(e)),
            )
        })?;
        Ok(Self { data })
    }

    /// Tensor height `H`.
    pub fn height(&self) -> usize {
        self.data.shape()[2]
    }

    /// Tensor width `W`.
    pub fn width(&self) -> usize {
        self.data.shape()[3]
    }

    /// The `[1, 1, H, W]` shape.
    pub fn shape(&self) -> [usize; 4] {
        [1, 1, self.height(), self.width()]
    }

    /// Intensity at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        self.data.get((0, 0, y, x)).copied()
    }

    /// The flat row-major buffer.
    pub fn as_slice(&self) -> &[f32] {
        // from_shape_vec always yields a standard-layout array
        self.data.as_slice().unwrap_or(&[])
    }

    /// The underlying 4-D array.
    pub fn as_array(&self) -> &Array4<f32> {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_layout() {
        let tensor = NormalizedTensor::from_intensities(2, 3, vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5])
            .unwrap();
        assert_eq!(tensor.shape(), [1, 1, 2, 3]);
        assert_eq!(tensor.get(2, 0), Some(0.2));
        assert_eq!(tensor.get(0, 1), Some(0.3));
        assert_eq!(tensor.as_slice()[1 * 3 + 2], 0.5);
        assert_eq!(tensor.get(3, 0), None);
    }

    #[test]
    fn test_mismatched_buffer_is_tensor_construction_error() {
        let err = NormalizedTensor::from_intensities(2, 2, vec![0.0; 3]).unwrap_err();
        assert!(matches!(
            err,
            OCRError::TensorConstruction {
                shape: [1, 1, 2, 2],
                ..
            }
        ));
    }
}
