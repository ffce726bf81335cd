//! Image and sequence processors for line recognition.
//!
//! - [`resize`]: fixed-height, aspect-preserving resampling
//! - [`normalization`]: raster to grayscale intensity tensor
//! - [`sequence`]: output sequence length from tensor width
//! - [`decode`]: greedy CTC decoding

pub mod decode;
pub mod normalization;
pub mod resize;
pub mod sequence;
pub mod types;

pub use decode::{CTCGreedyDecode, DecodedSequence};
pub use normalization::{LineNormalizer, pixel_intensity};
pub use resize::LineResize;
pub use sequence::output_sequence_length;
pub use types::ResampleFilter;
