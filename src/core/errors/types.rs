//! Core error types for the line recognition pipeline.
//!
//! [`OCRError`] is the single error type returned by every fallible operation in
//! the crate. Most variants are scoped to one image: a batch records them as that
//! image's outcome and moves on. Only [`OCRError::ModelLoad`] prevents the
//! pipeline from being built at all.

use thiserror::Error;

/// Errors produced by the line recognition pipeline.
#[derive(Error, Debug)]
pub enum OCRError {
    /// The image could not be decoded, or it has a zero width or height.
    #[error("invalid image ({width}x{height}): {message}")]
    InvalidImageKind {
        /// Width of the offending image (0 when it could not be decoded).
        width: u32,
        /// Height of the offending image (0 when it could not be decoded).
        height: u32,
        /// What was wrong with it.
        message: String,
        /// Decoder error, when there was one.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The normalized buffer could not be allocated or wrapped into a tensor.
    #[error("tensor construction failed for shape {shape:?}: {message}")]
    TensorConstruction {
        /// The requested `[N, C, H, W]` shape.
        shape: [usize; 4],
        /// Additional context.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The model failed, or returned a sequence of the wrong length.
    #[error("inference failed in model '{model_name}': {context}")]
    Inference {
        /// The name of the model where inference failed.
        model_name: String,
        /// Additional context about the inference error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),

    /// The model or the runtime could not be initialized.
    #[error("model load failed for '{model_path}': {reason}{suggestion}")]
    ModelLoad {
        /// Path to the model that failed to load
        model_path: String,
        /// Short reason string
        reason: String,
        /// Optional suggestion (prefixed with '; ' when present)
        suggestion: String,
        /// Underlying source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl From<crate::core::config::ConfigError> for OCRError {
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

impl OCRError {
    /// Creates an [`OCRError::InvalidImageKind`] for an image with unusable dimensions.
    pub fn invalid_dimensions(width: u32, height: u32) -> Self {
        Self::InvalidImageKind {
            width,
            height,
            message: "image width and height must both be greater than zero".to_string(),
            source: None,
        }
    }

    /// Creates an [`OCRError::InvalidImageKind`] for bytes that do not decode to an image.
    pub fn undecodable_image(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::InvalidImageKind {
            width: 0,
            height: 0,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an [`OCRError::TensorConstruction`] error.
    pub fn tensor_construction(
        shape: [usize; 4],
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::TensorConstruction {
            shape,
            message: message.into(),
            source,
        }
    }

    /// Creates an [`OCRError::Inference`] error wrapping an engine failure.
    pub fn inference_error(
        model_name: impl Into<String>,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.into(),
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an [`OCRError::Inference`] error for an output whose length does not
    /// match the length requested from the model.
    pub fn sequence_length_mismatch(
        model_name: impl Into<String>,
        expected: usize,
        actual: usize,
    ) -> Self {
        Self::Inference {
            model_name: model_name.into(),
            context: format!("expected an output sequence of length {expected}, got {actual}"),
            source: None,
        }
    }

    /// Creates an [`OCRError::ModelLoad`] error.
    pub fn model_load_error(
        path: &std::path::Path,
        reason: impl Into<String>,
        suggestion: Option<&str>,
        source: Option<ort::Error>,
    ) -> Self {
        Self::ModelLoad {
            model_path: path.display().to_string(),
            reason: reason.into(),
            suggestion: suggestion.map(|s| format!("; {s}")).unwrap_or_default(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Creates a configuration error for invalid field values.
    pub fn invalid_field(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::ConfigError {
            message: format!(
                "invalid value for field '{}': expected {}, got {}",
                field.into(),
                expected.into(),
                actual.into()
            ),
        }
    }

    /// Returns `true` when the error only affects the image that produced it.
    ///
    /// A batch keeps going after a per-image error. Initialization failures
    /// are not per-image: nothing can be recognized without a model.
    pub fn is_per_image(&self) -> bool {
        !matches!(self, Self::ModelLoad { .. } | Self::ConfigError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_dimensions_message() {
        let err = OCRError::invalid_dimensions(0, 32);
        assert!(matches!(
            err,
            OCRError::InvalidImageKind {
                width: 0,
                height: 32,
                ..
            }
        ));
        assert!(err.to_string().contains("0x32"));
    }

    #[test]
    fn test_sequence_length_mismatch_is_inference_error() {
        let err = OCRError::sequence_length_mismatch("common", 32, 31);
        match &err {
            OCRError::Inference { context, .. } => {
                assert!(context.contains("32"));
                assert!(context.contains("31"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_per_image());
    }

    #[test]
    fn test_model_load_is_not_per_image() {
        let err = OCRError::model_load_error(
            std::path::Path::new("missing.onnx"),
            "failed to create ONNX session",
            Some("verify model file exists and is readable"),
            None,
        );
        assert!(!err.is_per_image());
        assert!(err.to_string().contains("; verify model file"));
    }
}
