//! Text line recognition models.

pub mod line_ctc;

pub use line_ctc::{LineCtcModel, LineCtcModelBuilder};
