//! The line recognition pipeline.
//!
//! - [`LineOcrBuilder`] loads a model and a charset into a [`LineOcr`].
//! - [`ImageSource`] describes where an image comes from; decoding is deferred
//!   so failures stay attached to the image.
//! - [`LineOcr::recognize_batch`] and [`LineOcr::run_into`] produce one
//!   [`LineOutcome`] per source, in input order.

pub mod batch;
pub mod source;

pub use batch::{BatchSummary, LineOcr, LineOcrBuilder, LineOutcome, ResultSink};
pub use source::{ImageSource, collect_image_sources, is_supported_image, sources_from_paths};
