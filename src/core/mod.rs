//! The core module of the recognition pipeline.
//!
//! This module contains the pieces every other module builds on:
//! - Configuration management
//! - Constants used throughout the pipeline
//! - Error handling
//! - The inference seam and its ONNX Runtime implementation

pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;

pub use config::{ConfigError, ConfigValidator, ParallelPolicy, RecognizerConfig};
pub use constants::*;
pub use errors::{OCRError, OcrResult};
pub use inference::{OrtInfer, SequenceInference, load_session};
