//! Configuration management for the recognition pipeline.
//!
//! This module provides configuration types, validation traits, and utilities
//! for loading a recognizer configuration from disk.

pub mod errors;
pub mod onnx;
pub mod parallel;
pub mod recognizer;

pub use errors::{ConfigError, ConfigValidator};
pub use onnx::*;
pub use parallel::ParallelPolicy;
pub use recognizer::RecognizerConfig;
