//! Configuration types for the CLI and the HTTP server.

use std::path::PathBuf;

/// What is needed to build the recognition pipeline.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub model: PathBuf,
    pub charset: PathBuf,
    pub prepend_blank: bool,
    pub device: String,
    /// Optional JSON file with recognizer settings.
    pub recognizer_config: Option<PathBuf>,
}

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub ocr: OcrConfig,
    pub host: String,
    pub port: u16,
}
