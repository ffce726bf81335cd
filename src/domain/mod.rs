//! Domain types shared across the recognition pipeline.

pub mod charset;
pub mod tensor;

pub use charset::Charset;
pub use tensor::NormalizedTensor;

/// Text recognized from one line image.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LineRecognition {
    /// Decoded text; may be empty.
    pub text: String,
    /// Width `W` of the normalized tensor.
    pub tensor_width: usize,
    /// Number of frames the model was expected to emit.
    pub sequence_length: usize,
}
