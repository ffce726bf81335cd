//! Utility functions for the line recognition pipeline.
//!
//! Image decoding from files, bytes and base64 strings, transparency
//! flattening, and logging setup.

pub mod image;

pub use image::{
    encode_file_base64, flatten_alpha_onto_white, load_image, load_image_from_base64,
    load_image_from_bytes,
};

/// Initializes the tracing subscriber for logging.
///
/// The filter is read from `RUST_LOG`. Calling this more than once panics, so
/// binaries call it exactly once at startup.
///
/// # Example
///
/// ```rust,no_run
/// line_ocr::utils::init_tracing();
/// tracing::info!("ready");
/// ```
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
