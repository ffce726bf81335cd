//! Recognizer configuration, loadable from a JSON file.

use super::{ConfigError, ConfigValidator, OrtSessionConfig, ParallelPolicy};
use crate::core::constants::{DEFAULT_SESSION_POOL_SIZE, FRAME_STRIDE, TARGET_HEIGHT};
use crate::processors::ResampleFilter;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings that shape normalization, inference and batching.
///
/// The defaults match the models this crate is built for: 64-pixel input
/// height, one output frame per four input columns, Lanczos2 resampling.
///
/// ```rust
/// use line_ocr::core::config::RecognizerConfig;
///
/// let config: RecognizerConfig =
///     serde_json::from_str(r#"{ "session_pool_size": 2 }"#).unwrap();
/// assert_eq!(config.target_height, 64);
/// assert_eq!(config.session_pool_size, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Height of the normalized tensor.
    pub target_height: u32,
    /// Input columns per output frame.
    pub frame_stride: usize,
    /// Resampling filter used to reach the target height.
    pub filter: ResampleFilter,
    /// Composite transparent images onto white before normalizing.
    pub flatten_transparency: bool,
    /// Number of ONNX sessions; bounds concurrent inference calls.
    pub session_pool_size: usize,
    /// ONNX Runtime session options.
    pub ort_session: Option<OrtSessionConfig>,
    /// Batch parallelism.
    pub parallel: ParallelPolicy,
    /// Largest tensor, in pixels, an image may normalize to. `None` means no limit.
    pub max_tensor_pixels: Option<usize>,
}

impl RecognizerConfig {
    /// Reads and validates a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::PathNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            target_height: TARGET_HEIGHT,
            frame_stride: FRAME_STRIDE,
            filter: ResampleFilter::default(),
            flatten_transparency: false,
            session_pool_size: DEFAULT_SESSION_POOL_SIZE,
            ort_session: None,
            parallel: ParallelPolicy::default(),
            max_tensor_pixels: None,
        }
    }
}

impl ConfigValidator for RecognizerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_positive("target_height", self.target_height as usize)?;
        self.validate_positive("frame_stride", self.frame_stride)?;
        self.validate_positive("session_pool_size", self.session_pool_size)?;
        if let Some(threads) = self.parallel.max_threads {
            self.validate_positive("parallel.max_threads", threads)?;
        }
        if let Some(pixels) = self.max_tensor_pixels {
            self.validate_positive("max_tensor_pixels", pixels)?;
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = RecognizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target_height, 64);
        assert_eq!(config.frame_stride, 4);
        assert_eq!(config.filter, ResampleFilter::Lanczos2);
    }

    #[test]
    fn test_zero_stride_rejected() {
        let config = RecognizerConfig {
            frame_stride: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_from_file_reads_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "filter": "lanczos3", "flatten_transparency": true, "parallel": {{ "max_threads": 2 }} }}"#
        )
        .unwrap();

        let config = RecognizerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.filter, ResampleFilter::Lanczos3);
        assert!(config.flatten_transparency);
        assert_eq!(config.parallel.max_threads, Some(2));
        assert_eq!(config.parallel.utility_threshold, 4);
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            RecognizerConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_from_file_distinguishes_missing_and_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            RecognizerConfig::from_file(dir.path().join("missing.json")),
            Err(ConfigError::PathNotFound { .. })
        ));

        // A directory exists but cannot be read as a file.
        let err = RecognizerConfig::from_file(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(std::error::Error::source(&err).is_some());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b'{', 0xff, 0xfe, b'}']).unwrap();
        assert!(matches!(
            RecognizerConfig::from_file(file.path()),
            Err(ConfigError::Io { .. })
        ));
    }
}
