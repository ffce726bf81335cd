//! Types used in image processing operations.
use std::str::FromStr;

use crate::core::OCRError;

/// Resampling filter used to bring a line image to the model height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    /// Two-lobe Lanczos.
    #[default]
    Lanczos2,
    /// Three-lobe Lanczos.
    Lanczos3,
    /// Catmull-Rom cubic.
    #[serde(alias = "catmull_rom", alias = "catmull-rom")]
    CatmullRom,
    /// Linear (tent) filter.
    #[serde(alias = "linear", alias = "bilinear")]
    Triangle,
    /// Nearest neighbour.
    Nearest,
}

impl FromStr for ResampleFilter {
    type Err = OCRError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "lanczos2" => Ok(ResampleFilter::Lanczos2),
            "lanczos3" => Ok(ResampleFilter::Lanczos3),
            "catmullrom" | "catmull_rom" | "catmull-rom" => Ok(ResampleFilter::CatmullRom),
            "triangle" | "linear" | "bilinear" => Ok(ResampleFilter::Triangle),
            "nearest" => Ok(ResampleFilter::Nearest),
            other => Err(OCRError::invalid_field(
                "filter",
                "one of lanczos2, lanczos3, catmullrom, triangle, nearest",
                other,
            )),
        }
    }
}
