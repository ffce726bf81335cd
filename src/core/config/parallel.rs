//! Parallel batch processing configuration.

use serde::{Deserialize, Serialize};

/// Controls how a batch of images is spread across threads.
///
/// Each image runs normalize → infer → decode on its own, so a batch can be
/// processed concurrently. Inference itself is still bounded by the size of
/// the session pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelPolicy {
    /// Maximum number of threads in the global rayon pool.
    /// If None, rayon uses its default (typically the number of CPU cores).
    #[serde(default)]
    pub max_threads: Option<usize>,

    /// Batches with at most this many images are processed sequentially.
    #[serde(default = "ParallelPolicy::default_utility_threshold")]
    pub utility_threshold: usize,
}

impl ParallelPolicy {
    /// Create a new ParallelPolicy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of threads.
    pub fn with_max_threads(mut self, max_threads: Option<usize>) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Set the sequential/parallel threshold.
    pub fn with_utility_threshold(mut self, threshold: usize) -> Self {
        self.utility_threshold = threshold;
        self
    }

    /// Returns `true` when a batch of `len` images should use the thread pool.
    pub fn should_parallelize(&self, len: usize) -> bool {
        len > self.utility_threshold && self.max_threads != Some(1)
    }

    /// Install the global rayon thread pool with the configured number of threads.
    ///
    /// Call once at startup, before any batch runs.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the thread pool was configured
    /// - `Ok(false)` if `max_threads` is None
    /// - `Err` if the global pool has already been initialized
    pub fn install_global_thread_pool(&self) -> Result<bool, rayon::ThreadPoolBuildError> {
        if let Some(num_threads) = self.max_threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn default_utility_threshold() -> usize {
        crate::core::constants::DEFAULT_PARALLEL_THRESHOLD
    }
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self {
            max_threads: None,
            utility_threshold: Self::default_utility_threshold(),
        }
    }
}
