//! Output sequence length of the recognition network.

/// Number of frames the model emits for a tensor of width `width`.
///
/// Each frame covers `stride` input columns; a partial trailing window still
/// yields a frame, so this is `ceil(width / stride)` and is at least 1 for any
/// non-empty tensor.
#[inline]
pub fn output_sequence_length(width: usize, stride: usize) -> usize {
    width.div_ceil(stride.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FRAME_STRIDE;

    #[test]
    fn test_sequence_length_rounds_up() {
        assert_eq!(output_sequence_length(1, FRAME_STRIDE), 1);
        assert_eq!(output_sequence_length(4, FRAME_STRIDE), 1);
        assert_eq!(output_sequence_length(5, FRAME_STRIDE), 2);
        assert_eq!(output_sequence_length(256, FRAME_STRIDE), 64);
    }

    #[test]
    fn test_sequence_length_is_positive_for_any_width() {
        for width in 1..=64 {
            assert!(output_sequence_length(width, FRAME_STRIDE) >= 1);
        }
    }

    #[test]
    fn test_custom_stride() {
        assert_eq!(output_sequence_length(128, 8), 16);
        assert_eq!(output_sequence_length(129, 8), 17);
    }
}
