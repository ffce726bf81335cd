//! Where line images come from.

use crate::core::{OcrResult, SUPPORTED_IMAGE_EXTENSIONS};
use crate::utils::{load_image, load_image_from_base64, load_image_from_bytes};
use image::DynamicImage;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// One image to recognize, together with the identifier reported for it.
///
/// Sources are decoded lazily, so an undecodable source becomes a failed
/// outcome for that image rather than aborting the batch.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// An image file on disk; the path is the identifier.
    Path(PathBuf),
    /// Encoded image bytes (PNG, JPEG, ...).
    Bytes { identifier: String, bytes: Vec<u8> },
    /// A base64-encoded image, optionally as a `data:` URL.
    Base64 { identifier: String, data: String },
    /// An already decoded image.
    Decoded {
        identifier: String,
        image: DynamicImage,
    },
}

impl ImageSource {
    /// Creates a source for a file.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        ImageSource::Path(path.into())
    }

    /// Creates a source for encoded bytes.
    pub fn bytes(identifier: impl Into<String>, bytes: Vec<u8>) -> Self {
        ImageSource::Bytes {
            identifier: identifier.into(),
            bytes,
        }
    }

    /// Creates a source for a base64 string.
    pub fn base64(identifier: impl Into<String>, data: impl Into<String>) -> Self {
        ImageSource::Base64 {
            identifier: identifier.into(),
            data: data.into(),
        }
    }

    /// Creates a source for a decoded image.
    pub fn decoded(identifier: impl Into<String>, image: DynamicImage) -> Self {
        ImageSource::Decoded {
            identifier: identifier.into(),
            image,
        }
    }

    /// The identifier reported with this source's outcome.
    pub fn identifier(&self) -> Cow<'_, str> {
        match self {
            ImageSource::Path(path) => path.to_string_lossy(),
            ImageSource::Bytes { identifier, .. }
            | ImageSource::Base64 { identifier, .. }
            | ImageSource::Decoded { identifier, .. } => Cow::Borrowed(identifier),
        }
    }

    /// Decodes the image.
    pub fn load(&self) -> OcrResult<Cow<'_, DynamicImage>> {
        match self {
            ImageSource::Path(path) => load_image(path).map(Cow::Owned),
            ImageSource::Bytes { bytes, .. } => load_image_from_bytes(bytes).map(Cow::Owned),
            ImageSource::Base64 { data, .. } => load_image_from_base64(data).map(Cow::Owned),
            ImageSource::Decoded { image, .. } => Ok(Cow::Borrowed(image)),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

/// Returns `true` for `.png`, `.jpg` and `.jpeg` paths, in any letter case.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_IMAGE_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Lists the supported image files directly inside `dir`, sorted by name.
///
/// Subdirectories are not traversed.
pub fn collect_image_sources(dir: &Path) -> OcrResult<Vec<ImageSource>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_supported_image(&path) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    tracing::debug!(dir = %dir.display(), images = paths.len(), "collected image sources");
    Ok(paths.into_iter().map(ImageSource::Path).collect())
}

/// Expands a mix of files and directories into image sources.
///
/// Files are taken as given, whatever their extension; directories contribute
/// their supported images via [`collect_image_sources`]. Input order is kept.
/// A path that does not exist is still returned as a source, so it fails as
/// its own outcome when loaded.
///
/// # Errors
///
/// [`OCRError::Io`](crate::core::OCRError::Io) if a directory cannot be listed.
pub fn sources_from_paths<P: AsRef<Path>>(inputs: &[P]) -> OcrResult<Vec<ImageSource>> {
    let mut sources = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            sources.extend(collect_image_sources(input)?);
        } else {
            if !input.exists() {
                tracing::warn!(input = %input.display(), "input does not exist");
            }
            sources.push(ImageSource::path(input));
        }
    }
    Ok(sources)
}
