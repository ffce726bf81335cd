//! Batch recognition over many line images.
//!
//! Every source produces exactly one [`LineOutcome`], in input order. A
//! failure on one image is recorded against that image and logged; the rest
//! of the batch still runs.

use crate::core::config::{OrtSessionConfig, ParallelPolicy, RecognizerConfig};
use crate::core::{OCRError, OcrResult};
use crate::domain::{Charset, LineRecognition};
use crate::models::{LineCtcModel, LineCtcModelBuilder};
use crate::pipeline::source::ImageSource;
use image::DynamicImage;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The result for one image of a batch.
#[derive(Debug)]
pub struct LineOutcome {
    /// Identifier of the source the outcome belongs to.
    pub identifier: String,
    /// Recognized text, or why recognition failed.
    pub result: OcrResult<LineRecognition>,
}

impl LineOutcome {
    /// Returns `true` when recognition succeeded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Recognized text, if any.
    pub fn text(&self) -> Option<&str> {
        self.result.as_ref().ok().map(|r| r.text.as_str())
    }
}

/// Receives outcomes as a batch completes, in input order.
pub trait ResultSink {
    /// Handles one outcome.
    fn accept(&mut self, outcome: LineOutcome);
}

impl ResultSink for Vec<LineOutcome> {
    fn accept(&mut self, outcome: LineOutcome) {
        self.push(outcome);
    }
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Images processed.
    pub total: usize,
    /// Images recognized successfully.
    pub succeeded: usize,
    /// Images whose outcome is an error.
    pub failed: usize,
}

/// Line recognition pipeline: a shared model plus a batching policy.
///
/// Cheap to clone; clones share the model.
#[derive(Debug, Clone)]
pub struct LineOcr {
    model: Arc<LineCtcModel>,
    parallel: ParallelPolicy,
}

impl LineOcr {
    /// Wraps an existing model.
    pub fn from_model(model: Arc<LineCtcModel>, parallel: ParallelPolicy) -> Self {
        Self { model, parallel }
    }

    /// The underlying model.
    pub fn model(&self) -> &Arc<LineCtcModel> {
        &self.model
    }

    /// The batching policy.
    pub fn parallel_policy(&self) -> &ParallelPolicy {
        &self.parallel
    }

    /// Recognizes one decoded image.
    pub fn recognize_image(&self, image: &DynamicImage) -> OcrResult<LineRecognition> {
        self.model.recognize(image)
    }

    /// Decodes and recognizes one source.
    pub fn recognize_source(&self, source: &ImageSource) -> LineOutcome {
        let identifier = source.identifier().into_owned();
        let result = source
            .load()
            .and_then(|image| self.model.recognize(&image));

        match &result {
            Ok(recognition) => debug!(
                image = %identifier,
                text = %recognition.text,
                width = recognition.tensor_width,
                "recognized line"
            ),
            Err(err) => warn!(image = %identifier, error = %err, "line recognition failed"),
        }

        LineOutcome { identifier, result }
    }

    /// Recognizes every source, returning outcomes in input order.
    pub fn recognize_batch(&self, sources: &[ImageSource]) -> Vec<LineOutcome> {
        if self.parallel.should_parallelize(sources.len()) {
            sources
                .par_iter()
                .map(|source| self.recognize_source(source))
                .collect()
        } else {
            sources
                .iter()
                .map(|source| self.recognize_source(source))
                .collect()
        }
    }

    /// Recognizes every source and hands the outcomes to `sink` in input order.
    pub fn run_into<S: ResultSink + ?Sized>(
        &self,
        sources: &[ImageSource],
        sink: &mut S,
    ) -> BatchSummary {
        let start = Instant::now();
        let outcomes = self.recognize_batch(sources);

        let mut summary = BatchSummary {
            total: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            if outcome.is_ok() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            sink.accept(outcome);
        }

        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch finished"
        );
        summary
    }
}

/// Builder for [`LineOcr`] from a model file and a charset file.
///
/// # Example
///
/// ```no_run
/// use line_ocr::pipeline::{ImageSource, LineOcrBuilder};
///
/// let ocr = LineOcrBuilder::new("models/common.onnx", "models/charset.json")
///     .session_pool_size(2)
///     .build()
///     .expect("failed to build pipeline");
///
/// for outcome in ocr.recognize_batch(&[ImageSource::path("line.png")]) {
///     println!("{}: {:?}", outcome.identifier, outcome.text());
/// }
/// ```
#[derive(Debug)]
pub struct LineOcrBuilder {
    model_path: PathBuf,
    charset_path: PathBuf,
    prepend_blank: bool,
    config: RecognizerConfig,
}

impl LineOcrBuilder {
    /// Creates a builder with the required model and charset paths.
    pub fn new(model_path: impl Into<PathBuf>, charset_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            charset_path: charset_path.into(),
            prepend_blank: false,
            config: RecognizerConfig::default(),
        }
    }

    /// Replaces the recognizer configuration.
    pub fn config(mut self, config: RecognizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Inserts a blank entry at index 0 of the loaded charset.
    pub fn prepend_blank(mut self, prepend: bool) -> Self {
        self.prepend_blank = prepend;
        self
    }

    /// Sets the ONNX Runtime session configuration.
    pub fn ort_session(mut self, config: OrtSessionConfig) -> Self {
        self.config.ort_session = Some(config);
        self
    }

    /// Sets the session pool size.
    pub fn session_pool_size(mut self, size: usize) -> Self {
        self.config.session_pool_size = size;
        self
    }

    /// Sets the batching policy.
    pub fn parallel_policy(mut self, policy: ParallelPolicy) -> Self {
        self.config.parallel = policy;
        self
    }

    /// Loads the charset and the model.
    ///
    /// # Errors
    ///
    /// [`OCRError::ConfigError`] if the charset cannot be loaded or the
    /// configuration is invalid, [`OCRError::ModelLoad`] if the model cannot be
    /// initialized.
    pub fn build(self) -> Result<LineOcr, OCRError> {
        let charset = Charset::load_with(&self.charset_path, self.prepend_blank)?;
        let parallel = self.config.parallel.clone();
        let model = LineCtcModelBuilder::from_config(self.config)
            .charset(charset)
            .build(&self.model_path)?;

        info!(
            model = %self.model_path.display(),
            charset = %self.charset_path.display(),
            "line recognition pipeline ready"
        );
        Ok(LineOcr::from_model(Arc::new(model), parallel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{FixedSequence, RepeatingPattern};
    use crate::core::SequenceInference;
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    fn abc() -> Charset {
        Charset::from_entries(vec!["".into(), "A".into(), "B".into(), "C".into()]).unwrap()
    }

    fn pipeline(inference: Box<dyn SequenceInference>, policy: ParallelPolicy) -> LineOcr {
        let model = LineCtcModelBuilder::new()
            .charset(abc())
            .build_with_inference(inference)
            .unwrap();
        LineOcr::from_model(Arc::new(model), policy)
    }

    fn line(width: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, 64, Luma([255])))
    }

    fn png(width: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        line(width).write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_one_bad_image_does_not_stop_batch() {
        let ocr = pipeline(
            Box::new(RepeatingPattern(vec![1, 0, 2])),
            ParallelPolicy::default(),
        );
        let sources = vec![
            ImageSource::decoded("first", line(24)),
            ImageSource::bytes("broken", b"definitely not a png".to_vec()),
            ImageSource::bytes("third", png(12)),
        ];

        let mut outcomes = Vec::new();
        let summary = ocr.run_into(&sources, &mut outcomes);

        assert_eq!(
            summary,
            BatchSummary {
                total: 3,
                succeeded: 2,
                failed: 1
            }
        );
        let ids: Vec<&str> = outcomes.iter().map(|o| o.identifier.as_str()).collect();
        assert_eq!(ids, vec!["first", "broken", "third"]);
        // 24 columns -> 6 frames: 1 0 2 1 0 2
        assert_eq!(outcomes[0].text(), Some("ABAB"));
        assert!(matches!(
            outcomes[1].result,
            Err(OCRError::InvalidImageKind { .. })
        ));
        // 12 columns -> 3 frames: 1 0 2
        assert_eq!(outcomes[2].text(), Some("AB"));
    }

    #[test]
    fn test_oversized_image_fails_alone() {
        let model = LineCtcModelBuilder::new()
            .charset(abc())
            .max_tensor_pixels(64 * 256)
            .build_with_inference(Box::new(RepeatingPattern(vec![1, 0])))
            .unwrap();
        let ocr = LineOcr::from_model(Arc::new(model), ParallelPolicy::default());
        let sources = vec![
            ImageSource::decoded("before", line(8)),
            ImageSource::decoded(
                "sliver",
                DynamicImage::ImageLuma8(GrayImage::from_pixel(50_000, 1, Luma([255]))),
            ),
            ImageSource::decoded("after", line(16)),
        ];

        let outcomes = ocr.recognize_batch(&sources);
        // 8 columns -> 2 frames: 1 0
        assert_eq!(outcomes[0].text(), Some("A"));
        assert!(matches!(
            outcomes[1].result,
            Err(OCRError::TensorConstruction { .. })
        ));
        // 16 columns -> 4 frames: 1 0 1 0
        assert_eq!(outcomes[2].text(), Some("AA"));
    }

    #[test]
    fn test_wrong_length_backend_yields_inference_outcomes() {
        let ocr = pipeline(
            Box::new(FixedSequence::new(vec![1, 2])),
            ParallelPolicy::default(),
        );
        let sources = vec![
            ImageSource::decoded("ok", line(8)),
            ImageSource::decoded("too-wide", line(128)),
        ];

        let outcomes = ocr.recognize_batch(&sources);
        assert_eq!(outcomes[0].text(), Some("AB"));
        assert!(matches!(
            outcomes[1].result,
            Err(OCRError::Inference { .. })
        ));
    }

    #[test]
    fn test_parallel_batch_preserves_order() {
        let ocr = pipeline(
            Box::new(RepeatingPattern(vec![3, 0])),
            ParallelPolicy::default().with_utility_threshold(1),
        );
        let sources: Vec<ImageSource> = (1..=16)
            .map(|i| ImageSource::decoded(format!("img-{i}"), line(i * 8)))
            .collect();
        assert!(ocr.parallel_policy().should_parallelize(sources.len()));

        let outcomes = ocr.recognize_batch(&sources);
        assert_eq!(outcomes.len(), 16);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.identifier, format!("img-{}", i + 1));
            // width 8(i+1) -> 2(i+1) frames of "3 0", i.e. i+1 copies of "C"
            assert_eq!(outcome.text().unwrap(), "C".repeat(i + 1));
        }
    }

    #[test]
    fn test_empty_batch() {
        let ocr = pipeline(Box::new(RepeatingPattern(vec![0])), ParallelPolicy::default());
        let mut outcomes = Vec::new();
        let summary = ocr.run_into(&[], &mut outcomes);
        assert_eq!(summary, BatchSummary::default());
        assert!(outcomes.is_empty());
    }

    #[test]
    fn test_builder_fails_fast_on_missing_charset() {
        let err = LineOcrBuilder::new("model.onnx", "no/such/charset.txt")
            .build()
            .unwrap_err();
        assert!(matches!(err, OCRError::ConfigError { .. }));
    }

    #[test]
    fn test_builder_reports_model_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let charset = dir.path().join("charset.json");
        std::fs::write(&charset, r#"["", "a"]"#).unwrap();

        let err = LineOcrBuilder::new(dir.path().join("missing.onnx"), &charset)
            .build()
            .unwrap_err();
        assert!(matches!(err, OCRError::ModelLoad { .. }));
        assert!(!err.is_per_image());
    }
}
