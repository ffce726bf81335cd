//! Single-line CTC recognition model.
//!
//! This module ties the pipeline stages for one image together: the image is
//! normalized into a fixed-height tensor, the backend produces one class index
//! per frame, and the indices are collapsed into text with greedy CTC
//! decoding.

use crate::core::config::{ConfigValidator, OrtSessionConfig, RecognizerConfig};
use crate::core::inference::{OrtInfer, SequenceInference};
use crate::core::{OCRError, OcrResult};
use crate::domain::{Charset, LineRecognition, NormalizedTensor};
use crate::processors::{
    CTCGreedyDecode, LineNormalizer, ResampleFilter, output_sequence_length,
};
use image::DynamicImage;
use std::path::Path;
use tracing::debug;

/// Single-line recognition model: normalize, infer, decode.
///
/// The model is immutable after construction and can be shared between
/// threads behind an `Arc`.
#[derive(Debug)]
pub struct LineCtcModel {
    /// Inference backend
    inference: Box<dyn SequenceInference>,
    /// Image normalizer for preprocessing
    normalizer: LineNormalizer,
    /// CTC decoder for postprocessing
    decoder: CTCGreedyDecode,
    /// Input columns per output frame
    frame_stride: usize,
}

impl LineCtcModel {
    /// Creates a new model from its parts.
    pub fn new(
        inference: Box<dyn SequenceInference>,
        normalizer: LineNormalizer,
        decoder: CTCGreedyDecode,
        frame_stride: usize,
    ) -> Self {
        Self {
            inference,
            normalizer,
            decoder,
            frame_stride,
        }
    }

    /// Name of the backing model.
    pub fn model_name(&self) -> &str {
        self.inference.model_name()
    }

    /// The charset used for decoding.
    pub fn charset(&self) -> &Charset {
        self.decoder.charset()
    }

    /// Converts an image into the model input tensor.
    pub fn preprocess(&self, image: &DynamicImage) -> OcrResult<NormalizedTensor> {
        self.normalizer.normalize(image)
    }

    /// Runs the backend and checks the output length.
    ///
    /// # Errors
    ///
    /// [`OCRError::Inference`] if the backend fails or returns a sequence whose
    /// length differs from `ceil(W / frame_stride)`.
    pub fn infer(&self, tensor: &NormalizedTensor) -> OcrResult<Vec<i64>> {
        let seq_len = output_sequence_length(tensor.width(), self.frame_stride);
        let indices = self.inference.infer_sequence(tensor, seq_len)?;
        if indices.len() != seq_len {
            return Err(OCRError::sequence_length_mismatch(
                self.inference.model_name(),
                seq_len,
                indices.len(),
            ));
        }
        Ok(indices)
    }

    /// Decodes class indices into text.
    pub fn postprocess(&self, indices: &[i64]) -> String {
        let decoded = self.decoder.decode_detailed(indices);
        if decoded.out_of_vocabulary > 0 {
            debug!(
                model = %self.model_name(),
                skipped = decoded.out_of_vocabulary,
                charset_len = self.charset().len(),
                "class indices outside the charset were skipped"
            );
        }
        decoded.text
    }

    /// Recognizes the text in one line image.
    pub fn recognize(&self, image: &DynamicImage) -> OcrResult<LineRecognition> {
        let tensor = self.preprocess(image)?;
        let indices = self.infer(&tensor)?;
        let text = self.postprocess(&indices);
        Ok(LineRecognition {
            text,
            tensor_width: tensor.width(),
            sequence_length: indices.len(),
        })
    }
}

/// Builder for [`LineCtcModel`].
#[derive(Debug, Default)]
pub struct LineCtcModelBuilder {
    config: RecognizerConfig,
    charset: Option<Charset>,
}

impl LineCtcModelBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: RecognizerConfig) -> Self {
        Self {
            config,
            charset: None,
        }
    }

    /// Sets the charset. Required.
    pub fn charset(mut self, charset: Charset) -> Self {
        self.charset = Some(charset);
        self
    }

    /// Sets the tensor height.
    pub fn target_height(mut self, height: u32) -> Self {
        self.config.target_height = height;
        self
    }

    /// Sets the number of input columns per output frame.
    pub fn frame_stride(mut self, stride: usize) -> Self {
        self.config.frame_stride = stride;
        self
    }

    /// Sets the resampling filter.
    pub fn filter(mut self, filter: ResampleFilter) -> Self {
        self.config.filter = filter;
        self
    }

    /// Composite transparent images onto white before normalizing.
    pub fn flatten_transparency(mut self, flatten: bool) -> Self {
        self.config.flatten_transparency = flatten;
        self
    }

    /// Limits the tensor size an image may normalize to.
    pub fn max_tensor_pixels(mut self, pixels: usize) -> Self {
        self.config.max_tensor_pixels = Some(pixels);
        self
    }

    /// Sets the session pool size.
    pub fn session_pool_size(mut self, size: usize) -> Self {
        self.config.session_pool_size = size;
        self
    }

    /// Sets the ONNX Runtime session configuration.
    pub fn with_ort_config(mut self, config: OrtSessionConfig) -> Self {
        self.config.ort_session = Some(config);
        self
    }

    /// Builds the model on an ONNX Runtime backend loaded from `model_path`.
    ///
    /// # Errors
    ///
    /// [`OCRError::ConfigError`] for an invalid configuration or a missing
    /// charset, [`OCRError::ModelLoad`] if the runtime cannot load the model.
    pub fn build(self, model_path: &Path) -> OcrResult<LineCtcModel> {
        self.config.validate()?;
        if self.charset.is_none() {
            return Err(missing_charset());
        }
        let inference = OrtInfer::with_pool(
            model_path,
            self.config.session_pool_size,
            self.config.ort_session.as_ref(),
        )?;
        self.build_with_inference(Box::new(inference))
    }

    /// Builds the model on a caller-supplied backend.
    pub fn build_with_inference(
        self,
        inference: Box<dyn SequenceInference>,
    ) -> OcrResult<LineCtcModel> {
        self.config.validate()?;
        let charset = self.charset.ok_or_else(missing_charset)?;

        debug!(
            model = %inference.model_name(),
            target_height = self.config.target_height,
            frame_stride = self.config.frame_stride,
            filter = ?self.config.filter,
            charset_len = charset.len(),
            "building line recognition model"
        );

        Ok(LineCtcModel::new(
            inference,
            LineNormalizer::from_config(&self.config),
            CTCGreedyDecode::new(charset),
            self.config.frame_stride,
        ))
    }
}

fn missing_charset() -> OCRError {
    OCRError::ConfigError {
        message: "a charset is required to build the recognition model".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{FixedSequence, RepeatingPattern};
    use image::{GrayImage, Luma};
    use std::sync::Arc;

    fn abc() -> Charset {
        Charset::from_entries(vec!["".into(), "A".into(), "B".into(), "C".into()]).unwrap()
    }

    fn gray_line(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, _| {
            Luma([if x % 16 < 8 { 0 } else { 255 }])
        }))
    }

    #[test]
    fn test_end_to_end_with_fixed_sequence() {
        let mut sequence = vec![0i64; 32];
        sequence[..9].copy_from_slice(&[0, 1, 1, 0, 2, 2, 2, 0, 3]);
        let mock = FixedSequence::new(sequence);

        let model = LineCtcModelBuilder::new()
            .charset(abc())
            .build_with_inference(Box::new(mock))
            .unwrap();

        let result = model.recognize(&gray_line(128, 64)).unwrap();
        assert_eq!(result.text, "ABC");
        assert_eq!(result.tensor_width, 128);
        assert_eq!(result.sequence_length, 32);
    }

    #[test]
    fn test_backend_receives_tensor_and_length() {
        let mock = Arc::new(FixedSequence::new(vec![0; 50]));
        let model = LineCtcModelBuilder::new()
            .charset(abc())
            .build_with_inference(Box::new(Arc::clone(&mock)))
            .unwrap();

        // 100x32 scales to 200x64, so 50 frames are expected
        let result = model.recognize(&gray_line(100, 32)).unwrap();
        assert_eq!(result.text, "");
        assert_eq!(result.tensor_width, 200);
        assert_eq!(result.sequence_length, 50);
        assert_eq!(*mock.calls.lock().unwrap(), vec![(200, 50)]);
    }

    #[test]
    fn test_wrong_length_is_inference_error() {
        let model = LineCtcModelBuilder::new()
            .charset(abc())
            .build_with_inference(Box::new(FixedSequence::new(vec![1, 2, 3])))
            .unwrap();

        let err = model.recognize(&gray_line(128, 64)).unwrap_err();
        match err {
            OCRError::Inference { context, .. } => {
                assert!(context.contains("32"));
                assert!(context.contains('3'));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_out_of_vocabulary_output_is_not_an_error() {
        let model = LineCtcModelBuilder::new()
            .charset(abc())
            .build_with_inference(Box::new(RepeatingPattern(vec![0, 99, 1])))
            .unwrap();

        let result = model.recognize(&gray_line(24, 64)).unwrap();
        // 24 columns -> 6 frames: 0 99 1 0 99 1
        assert_eq!(result.text, "AA");
    }

    #[test]
    fn test_zero_area_image_never_reaches_backend() {
        let model = LineCtcModelBuilder::new()
            .charset(abc())
            .build_with_inference(Box::new(RepeatingPattern(vec![1])))
            .unwrap();

        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 64));
        assert!(matches!(
            model.recognize(&empty),
            Err(OCRError::InvalidImageKind { .. })
        ));
    }

    #[test]
    fn test_custom_stride_changes_expected_length() {
        let model = LineCtcModelBuilder::new()
            .charset(abc())
            .frame_stride(8)
            .build_with_inference(Box::new(RepeatingPattern(vec![2])))
            .unwrap();

        let result = model.recognize(&gray_line(128, 64)).unwrap();
        assert_eq!(result.sequence_length, 16);
        assert_eq!(result.text, "B");
    }

    #[test]
    fn test_missing_charset_rejected() {
        let err = LineCtcModelBuilder::new()
            .build_with_inference(Box::new(RepeatingPattern(vec![0])))
            .unwrap_err();
        assert!(matches!(err, OCRError::ConfigError { .. }));
        assert!(!err.is_per_image());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = LineCtcModelBuilder::new()
            .charset(abc())
            .frame_stride(0)
            .build_with_inference(Box::new(RepeatingPattern(vec![0])))
            .unwrap_err();
        assert!(matches!(err, OCRError::ConfigError { .. }));
    }

    #[test]
    fn test_missing_model_file_is_model_load_error() {
        let err = LineCtcModelBuilder::new()
            .charset(abc())
            .build(Path::new("no/such/model.onnx"))
            .unwrap_err();
        assert!(matches!(err, OCRError::ModelLoad { .. }));
    }
}
