//! Constants shared across the pipeline.

/// Height of the normalized tensor the recognition models are trained on.
pub const TARGET_HEIGHT: u32 = 64;

/// Input columns consumed per output frame (the network's horizontal stride).
pub const FRAME_STRIDE: usize = 4;

/// Class index reserved for the CTC blank symbol.
pub const BLANK_INDEX: i64 = 0;

/// Image file extensions picked up when scanning a directory.
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Batches at or below this size are processed sequentially.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4;

/// Sessions created per model unless configured otherwise.
pub const DEFAULT_SESSION_POOL_SIZE: usize = 1;
