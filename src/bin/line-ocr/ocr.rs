//! Recognition logic shared between CLI and server modes.

use crate::config::OcrConfig;
use line_ocr::core::config::{OrtSessionConfig, RecognizerConfig};
use line_ocr::core::OCRError;
use line_ocr::pipeline::{BatchSummary, ImageSource, LineOcr, LineOcrBuilder, LineOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to initialize recognizer: {0}")]
    Init(#[source] OCRError),

    #[error("Invalid input: {0}")]
    Input(#[source] OCRError),

    #[error("Failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Request to recognize one line image
#[derive(Debug, Deserialize)]
pub struct OcrRequest {
    /// Base64-encoded image, optionally as a `data:` URL
    pub image: String,
}

/// Request to recognize several line images
#[derive(Debug, Deserialize)]
pub struct BatchOcrRequest {
    pub images: Vec<String>,
}

/// Result for one image
#[derive(Debug, Serialize)]
pub struct OcrResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tensor_width: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
}

impl OcrResponse {
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            id: None,
            text: String::new(),
            tensor_width: None,
            sequence_length: None,
            error: Some(message),
            processing_time_ms: None,
        }
    }

    pub fn from_outcome(outcome: &LineOutcome) -> Self {
        match &outcome.result {
            Ok(line) => Self {
                success: true,
                id: Some(outcome.identifier.clone()),
                text: line.text.clone(),
                tensor_width: Some(line.tensor_width),
                sequence_length: Some(line.sequence_length),
                error: None,
                processing_time_ms: None,
            },
            Err(err) => Self {
                id: Some(outcome.identifier.clone()),
                ..Self::error(err.to_string())
            },
        }
    }

    pub fn with_time(mut self, processing_time_ms: f64) -> Self {
        self.processing_time_ms = Some(processing_time_ms);
        self
    }
}

/// Response for a batch of images
#[derive(Debug, Serialize)]
pub struct BatchOcrResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: BatchSummary,
    pub results: Vec<OcrResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
}

impl BatchOcrResponse {
    pub fn from_outcomes(
        outcomes: &[LineOutcome],
        summary: BatchSummary,
        processing_time_ms: f64,
    ) -> Self {
        Self {
            success: summary.failed == 0,
            summary,
            results: outcomes.iter().map(OcrResponse::from_outcome).collect(),
            error: None,
            processing_time_ms: Some(processing_time_ms),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            summary: BatchSummary::default(),
            results: Vec::new(),
            error: Some(message),
            processing_time_ms: None,
        }
    }
}

/// Recognizer wrapper shared by the CLI and the server
pub struct OcrEngine {
    ocr: LineOcr,
}

impl OcrEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: &OcrConfig) -> Result<Self, AppError> {
        if !config.model.exists() {
            return Err(AppError::NotFound(format!(
                "Recognition model not found: {}",
                config.model.display()
            )));
        }
        if !config.charset.exists() {
            return Err(AppError::NotFound(format!(
                "Charset file not found: {}",
                config.charset.display()
            )));
        }

        let mut recognizer = match &config.recognizer_config {
            Some(path) => RecognizerConfig::from_file(path)
                .map_err(|e| AppError::Config(e.to_string()))?,
            None => RecognizerConfig::default(),
        };
        if let Some(ort) = parse_device_config(&config.device)? {
            recognizer.ort_session = Some(ort);
        }

        if let Err(e) = recognizer.parallel.install_global_thread_pool() {
            tracing::warn!(error = %e, "Global thread pool already initialized");
        }

        let ocr = LineOcrBuilder::new(&config.model, &config.charset)
            .prepend_blank(config.prepend_blank)
            .config(recognizer)
            .build()
            .map_err(AppError::Init)?;

        info!(
            model = %ocr.model().model_name(),
            charset_entries = ocr.model().charset().len(),
            device = %config.device,
            "Recognizer ready"
        );
        Ok(Self { ocr })
    }

    /// Recognize a batch of sources, keeping input order
    pub fn process(&self, sources: &[ImageSource]) -> (Vec<LineOutcome>, BatchSummary) {
        let mut outcomes = Vec::with_capacity(sources.len());
        let summary = self.ocr.run_into(sources, &mut outcomes);
        (outcomes, summary)
    }

    /// Recognize a single source
    pub fn process_one(&self, source: &ImageSource) -> LineOutcome {
        self.ocr.recognize_source(source)
    }
}

/// Parse device string into session options; `None` means the default CPU setup
fn parse_device_config(device: &str) -> Result<Option<OrtSessionConfig>, AppError> {
    OrtSessionConfig::from_device(device).map_err(|e| AppError::Config(e.to_string()))
}

/// Thread-safe engine wrapped in Arc
pub type SharedOcrEngine = Arc<OcrEngine>;

#[cfg(test)]
mod tests {
    use super::*;
    use line_ocr::domain::LineRecognition;

    #[test]
    fn test_response_from_failed_outcome() {
        let outcome = LineOutcome {
            identifier: "bad.png".to_string(),
            result: Err(OCRError::invalid_dimensions(0, 4)),
        };
        let response = OcrResponse::from_outcome(&outcome);
        assert!(!response.success);
        assert_eq!(response.id.as_deref(), Some("bad.png"));
        assert!(response.error.unwrap().contains("0x4"));
    }

    #[test]
    fn test_batch_response_serializes_summary_inline() {
        let outcomes = vec![LineOutcome {
            identifier: "0".to_string(),
            result: Ok(LineRecognition {
                text: "hi".to_string(),
                tensor_width: 8,
                sequence_length: 2,
            }),
        }];
        let summary = BatchSummary {
            total: 1,
            succeeded: 1,
            failed: 0,
        };
        let json =
            serde_json::to_value(BatchOcrResponse::from_outcomes(&outcomes, summary, 1.5)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["total"], 1);
        assert_eq!(json["results"][0]["text"], "hi");
    }

    #[test]
    fn test_unknown_device_rejected() {
        assert!(matches!(
            parse_device_config("tpu"),
            Err(AppError::Config(_))
        ));
        assert!(parse_device_config("cpu").unwrap().is_none());
    }

    #[test]
    fn test_missing_model_reported_before_loading() {
        let config = OcrConfig {
            model: "no/such/model.onnx".into(),
            charset: "no/such/charset.txt".into(),
            prepend_blank: false,
            device: "cpu".to_string(),
            recognizer_config: None,
        };
        assert!(matches!(
            OcrEngine::new(&config),
            Err(AppError::NotFound(_))
        ));
    }
}
