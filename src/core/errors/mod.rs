//! Error types for the line recognition pipeline.
//!
//! # Usage
//!
//! ```rust
//! use line_ocr::core::errors::OCRError;
//!
//! let err = OCRError::invalid_dimensions(0, 64);
//! assert!(err.is_per_image());
//! ```

mod types;

pub use types::OCRError;

/// Result alias used across the crate.
pub type OcrResult<T> = Result<T, OCRError>;
