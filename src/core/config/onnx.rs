//! ONNX Runtime configuration types.

use serde::{Deserialize, Serialize};

/// Graph optimization levels for ONNX Runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OrtGraphOptimizationLevel {
    /// Disable all optimizations.
    DisableAll,
    /// Enable basic optimizations.
    #[default]
    Level1,
    /// Enable extended optimizations.
    Level2,
    /// Enable all optimizations.
    Level3,
}

/// Execution providers for ONNX Runtime.
///
/// Providers other than `CPU` need the matching cargo feature; requesting one
/// without it fails when the session is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum OrtExecutionProvider {
    /// CPU execution provider (always available)
    #[default]
    CPU,
    /// NVIDIA CUDA execution provider
    CUDA {
        /// CUDA device ID (default: 0)
        device_id: Option<i32>,
        /// Memory limit in bytes (optional)
        gpu_mem_limit: Option<usize>,
    },
    /// DirectML execution provider (Windows only)
    DirectML {
        /// DirectML device ID (default: 0)
        device_id: Option<i32>,
    },
    /// CoreML execution provider (macOS/iOS only)
    CoreML,
}

/// Configuration for ONNX Runtime sessions.
///
/// Every field is optional; unset fields keep the runtime's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrtSessionConfig {
    /// Number of threads used to parallelize execution within nodes
    pub intra_threads: Option<usize>,
    /// Number of threads used to parallelize execution across nodes
    pub inter_threads: Option<usize>,
    /// Graph optimization level
    pub optimization_level: Option<OrtGraphOptimizationLevel>,
    /// Execution providers in order of preference
    pub execution_providers: Option<Vec<OrtExecutionProvider>>,
    /// Log severity level (0=Verbose, 1=Info, 2=Warning, 3=Error, 4=Fatal)
    pub log_severity_level: Option<i32>,
}

impl OrtSessionConfig {
    /// Creates a new OrtSessionConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of intra-op threads.
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    /// Sets the number of inter-op threads.
    pub fn with_inter_threads(mut self, threads: usize) -> Self {
        self.inter_threads = Some(threads);
        self
    }

    /// Sets the graph optimization level.
    pub fn with_optimization_level(mut self, level: OrtGraphOptimizationLevel) -> Self {
        self.optimization_level = Some(level);
        self
    }

    /// Replaces the execution providers.
    pub fn with_execution_providers(mut self, providers: Vec<OrtExecutionProvider>) -> Self {
        self.execution_providers = Some(providers);
        self
    }

    /// Appends a single execution provider.
    pub fn add_execution_provider(mut self, provider: OrtExecutionProvider) -> Self {
        self.execution_providers
            .get_or_insert_with(Vec::new)
            .push(provider);
        self
    }

    /// Sets the log severity level.
    pub fn with_log_severity_level(mut self, level: i32) -> Self {
        self.log_severity_level = Some(level);
        self
    }

    /// Returns the execution providers, defaulting to CPU only.
    pub fn get_execution_providers(&self) -> Vec<OrtExecutionProvider> {
        self.execution_providers
            .clone()
            .unwrap_or_else(|| vec![OrtExecutionProvider::CPU])
    }

    /// Parses a device string into a session configuration.
    ///
    /// `"cpu"` returns `Ok(None)` since the default session already runs on CPU.
    /// `"cuda"` and `"cuda:N"` select a CUDA device with CPU fallback.
    pub fn from_device(device: &str) -> Result<Option<Self>, crate::core::OCRError> {
        let device_lower = device.trim().to_lowercase();

        if device_lower == "cpu" {
            return Ok(None);
        }

        if let Some(rest) = device_lower.strip_prefix("cuda") {
            let device_id = match rest {
                "" => 0,
                _ => rest
                    .strip_prefix(':')
                    .and_then(|id| id.parse::<i32>().ok())
                    .ok_or_else(|| {
                        crate::core::OCRError::invalid_field("device", "'cuda' or 'cuda:N'", device)
                    })?,
            };
            return Ok(Some(Self::new().with_execution_providers(vec![
                OrtExecutionProvider::CUDA {
                    device_id: Some(device_id),
                    gpu_mem_limit: None,
                },
                OrtExecutionProvider::CPU,
            ])));
        }

        match device_lower.as_str() {
            "directml" | "dml" => Ok(Some(Self::new().with_execution_providers(vec![
                OrtExecutionProvider::DirectML { device_id: None },
                OrtExecutionProvider::CPU,
            ]))),
            "coreml" => Ok(Some(Self::new().with_execution_providers(vec![
                OrtExecutionProvider::CoreML,
                OrtExecutionProvider::CPU,
            ]))),
            _ => Err(crate::core::OCRError::invalid_field(
                "device",
                "one of cpu, cuda, cuda:N, directml, coreml",
                device,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ort_session_config_builder() {
        let config = OrtSessionConfig::new()
            .with_intra_threads(4)
            .with_inter_threads(2)
            .with_optimization_level(OrtGraphOptimizationLevel::Level2)
            .add_execution_provider(OrtExecutionProvider::CPU);

        assert_eq!(config.intra_threads, Some(4));
        assert_eq!(config.inter_threads, Some(2));
        assert_eq!(
            config.optimization_level,
            Some(OrtGraphOptimizationLevel::Level2)
        );
        assert_eq!(
            config.get_execution_providers(),
            vec![OrtExecutionProvider::CPU]
        );
    }

    #[test]
    fn test_from_device_cpu_needs_no_config() {
        assert!(OrtSessionConfig::from_device("CPU").unwrap().is_none());
    }

    #[test]
    fn test_from_device_cuda_with_index() {
        let config = OrtSessionConfig::from_device("cuda:1").unwrap().unwrap();
        assert_eq!(
            config.get_execution_providers()[0],
            OrtExecutionProvider::CUDA {
                device_id: Some(1),
                gpu_mem_limit: None
            }
        );
    }

    #[test]
    fn test_from_device_rejects_garbage() {
        assert!(OrtSessionConfig::from_device("cuda:x").is_err());
        assert!(OrtSessionConfig::from_device("tpu").is_err());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: OrtSessionConfig =
            serde_json::from_str(r#"{"intra_threads": 2, "execution_providers": ["CPU"]}"#)
                .unwrap();
        assert_eq!(config.intra_threads, Some(2));
        assert_eq!(config.inter_threads, None);
    }
}
