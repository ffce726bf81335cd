//! Recognition models.
//!
//! A model owns the whole per-image path: preprocessing into a tensor,
//! inference through a [`SequenceInference`](crate::core::SequenceInference)
//! backend, and decoding of the backend's output.

pub mod recognition;

pub use recognition::{LineCtcModel, LineCtcModelBuilder};
