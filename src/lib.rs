//! # line-ocr
//!
//! Recognition of short, single-line text images with CTC models.
//!
//! An image of any size is resized to a fixed height (64 pixels by default)
//! with its aspect ratio preserved, mapped to grayscale intensities in
//! `[0, 1]`, and fed to a recognition network that emits one class index per
//! four input columns. Greedy CTC decoding turns those indices into text.
//!
//! ## Modules
//!
//! * [`core`] - Configuration, errors, constants and the inference seam
//! * [`domain`] - Charset, tensor and result types
//! * [`processors`] - Resize, normalization, sequence length and CTC decoding
//! * [`models`] - The single-line model tying the stages together
//! * [`pipeline`] - Image sources, batch processing and result sinks
//! * [`utils`] - Image decoding and logging setup
//!
//! ## Example
//!
//! ```no_run
//! use line_ocr::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! line_ocr::utils::init_tracing();
//!
//! let ocr = LineOcrBuilder::new("models/common.onnx", "models/charset.json").build()?;
//! let sources = collect_image_sources(std::path::Path::new("lines/"))?;
//!
//! let mut outcomes = Vec::new();
//! ocr.run_into(&sources, &mut outcomes);
//! for outcome in &outcomes {
//!     match &outcome.result {
//!         Ok(line) => println!("{}: {}", outcome.identifier, line.text),
//!         Err(err) => eprintln!("{}: {}", outcome.identifier, err),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod models;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::core::config::{OrtSessionConfig, ParallelPolicy, RecognizerConfig};
    pub use crate::core::{OCRError, OcrResult, OrtInfer, SequenceInference};
    pub use crate::domain::{Charset, LineRecognition, NormalizedTensor};
    pub use crate::models::{LineCtcModel, LineCtcModelBuilder};
    pub use crate::pipeline::{
        BatchSummary, ImageSource, LineOcr, LineOcrBuilder, LineOutcome, ResultSink,
        collect_image_sources,
    };
    pub use crate::processors::{CTCGreedyDecode, LineNormalizer, ResampleFilter};
    pub use crate::utils::{load_image, load_image_from_base64, load_image_from_bytes};
}
