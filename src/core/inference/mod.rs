//! Inference seam for the recognition pipeline.
//!
//! The pipeline only needs one thing from a model: given a normalized
//! `[1, 1, H, W]` tensor, return one class index per output frame. That
//! contract is the [`SequenceInference`] trait. [`OrtInfer`] implements it on
//! top of ONNX Runtime with a small pool of sessions.

mod ort_infer_config;
mod session;

pub use session::load_session;

use crate::core::config::OrtSessionConfig;
use crate::core::errors::OCRError;
use crate::domain::NormalizedTensor;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Runs a recognition model over one normalized tensor.
///
/// Implementations must return exactly `seq_len` class indices on success.
/// The caller checks the length and reports a mismatch as
/// [`OCRError::Inference`], so an implementation may simply forward whatever
/// the model produced.
pub trait SequenceInference: Send + Sync + std::fmt::Debug {
    /// Returns the per-frame class indices for `tensor`.
    fn infer_sequence(
        &self,
        tensor: &NormalizedTensor,
        seq_len: usize,
    ) -> Result<Vec<i64>, OCRError>;

    /// Model name used in error messages and logs.
    fn model_name(&self) -> &str;
}

impl<T: SequenceInference + ?Sized> SequenceInference for std::sync::Arc<T> {
    fn infer_sequence(
        &self,
        tensor: &NormalizedTensor,
        seq_len: usize,
    ) -> Result<Vec<i64>, OCRError> {
        (**self).infer_sequence(tensor, seq_len)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// ONNX Runtime inference engine.
///
/// A session is not reentrant, so each one sits behind a mutex. Calls pick a
/// session round-robin; the pool size is the upper bound on concurrent
/// inference calls.
#[derive(Debug)]
pub struct OrtInfer {
    /// Pool of ONNX Runtime sessions for concurrent predictions.
    sessions: Vec<Mutex<Session>>,
    /// Next index for round-robin session selection.
    next_idx: AtomicUsize,
    /// The name of the input tensor.
    input_name: String,
    /// The path to the model file for error context.
    model_path: PathBuf,
    /// The model name for error context.
    model_name: String,
}

impl OrtInfer {
    /// Creates an engine with a single session and default runtime settings.
    pub fn new(model_path: impl AsRef<Path>) -> Result<Self, OCRError> {
        let path = model_path.as_ref();
        let session = load_session(path)?;
        Self::from_sessions(path, vec![session])
    }

    /// Creates an engine with `pool_size` sessions configured by `ort_config`.
    pub fn with_pool(
        model_path: impl AsRef<Path>,
        pool_size: usize,
        ort_config: Option<&OrtSessionConfig>,
    ) -> Result<Self, OCRError> {
        let path = model_path.as_ref();
        let pool_size = pool_size.max(1);
        let mut sessions = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let session = match ort_config {
                Some(cfg) => session::load_session_with(
                    path,
                    |builder| Self::apply_ort_config(builder, cfg),
                    Some("check the execution provider settings and the model path"),
                )?,
                None => load_session(path)?,
            };
            sessions.push(session);
        }
        Self::from_sessions(path, sessions)
    }

    fn from_sessions(path: &Path, sessions: Vec<Session>) -> Result<Self, OCRError> {
        let input_name = sessions
            .first()
            .and_then(|s| s.inputs.first())
            .map(|input| input.name.clone())
            .ok_or_else(|| {
                OCRError::model_load_error(path, "model declares no inputs", None, None)
            })?;

        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();

        debug!(
            model = %model_name,
            input = %input_name,
            sessions = sessions.len(),
            "ONNX sessions ready"
        );

        Ok(Self {
            sessions: sessions.into_iter().map(Mutex::new).collect(),
            next_idx: AtomicUsize::new(0),
            input_name,
            model_path: path.to_path_buf(),
            model_name,
        })
    }

    /// Returns the model path associated with this inference engine.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Returns the number of sessions in the pool.
    pub fn pool_size(&self) -> usize {
        self.sessions.len()
    }
}

impl SequenceInference for OrtInfer {
    fn infer_sequence(
        &self,
        tensor: &NormalizedTensor,
        seq_len: usize,
    ) -> Result<Vec<i64>, OCRError> {
        let input_tensor = TensorRef::from_array_view(tensor.as_array().view()).map_err(|e| {
            OCRError::tensor_construction(
                tensor.shape(),
                "failed to wrap normalized buffer as an ONNX tensor",
                Some(Box::new(e)),
            )
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let idx = self.next_idx.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        let mut session_guard = self.sessions[idx].lock().map_err(|_| OCRError::Inference {
            model_name: self.model_name.clone(),
            context: format!(
                "failed to acquire session lock for session {}/{}",
                idx,
                self.sessions.len()
            ),
            source: None,
        })?;

        let output_name = session_guard
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| OCRError::Inference {
                model_name: self.model_name.clone(),
                context: "model declares no outputs".to_string(),
                source: None,
            })?;

        let outputs = session_guard.run(inputs).map_err(|e| {
            OCRError::inference_error(
                &self.model_name,
                format!(
                    "forward pass with input shape {:?} (expected {} frames)",
                    tensor.shape(),
                    seq_len
                ),
                e,
            )
        })?;

        let value = &outputs[output_name.as_str()];
        if let Ok((_, data)) = value.try_extract_tensor::<i64>() {
            return Ok(data.to_vec());
        }
        if let Ok((shape, data)) = value.try_extract_tensor::<f32>() {
            return logits_to_indices(shape, data).ok_or_else(|| OCRError::Inference {
                model_name: self.model_name.clone(),
                context: format!("cannot interpret f32 output of shape {:?}", &shape[..]),
                source: None,
            });
        }

        Err(OCRError::Inference {
            model_name: self.model_name.clone(),
            context: format!("output '{output_name}' is neither i64 nor f32"),
            source: None,
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Reduces per-frame class scores to the arg-max class of each frame.
///
/// The last dimension holds the classes; every other dimension is flattened
/// into frames, so `[T, 1, C]` and `[1, T, C]` both yield `T` indices.
fn logits_to_indices(shape: &[i64], data: &[f32]) -> Option<Vec<i64>> {
    let classes = usize::try_from(*shape.last()?).ok()?;
    if classes == 0 || data.len() % classes != 0 {
        return None;
    }
    let indices = data
        .chunks_exact(classes)
        .map(|frame| {
            frame
                .iter()
                .enumerate()
                .fold((0usize, f32::NEG_INFINITY), |best, (i, &score)| {
                    if score > best.1 { (i, score) } else { best }
                })
                .0 as i64
        })
        .collect();
    Some(indices)
}
