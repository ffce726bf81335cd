//! Charset table: class index → output string.

use crate::core::{OCRError, OcrResult};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Ordered vocabulary mapping predicted class indices to output strings.
///
/// Index 0 is the CTC blank and never resolves to a glyph during decoding.
/// The table is immutable once built; clones share the same storage, so one
/// charset can be handed to every worker without synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charset {
    entries: Arc<[String]>,
}

/// On-disk JSON layouts accepted by [`Charset::from_json_str`].
#[derive(Deserialize)]
#[serde(untagged)]
enum CharsetDocument {
    /// `["", "a", "b", ...]`
    List(Vec<String>),
    /// `{"charset": ["", "a", ...], ...}` as shipped next to some models.
    Wrapped { charset: Vec<String> },
}

impl Charset {
    /// Builds a charset from entries indexed from 0.
    pub fn from_entries(entries: Vec<String>) -> OcrResult<Self> {
        if entries.is_empty() {
            return Err(OCRError::ConfigError {
                message: "charset must contain at least one entry".to_string(),
            });
        }
        Ok(Self {
            entries: entries.into(),
        })
    }

    /// Builds a charset from a line-per-entry dictionary.
    ///
    /// Empty lines are kept as empty entries so indices stay aligned with the
    /// file. With `prepend_blank`, a blank entry is inserted at index 0 for
    /// dictionaries that list glyphs only.
    pub fn from_dict_lines(content: &str, prepend_blank: bool) -> OcrResult<Self> {
        let mut entries = Vec::new();
        if prepend_blank {
            entries.push(String::new());
        }
        entries.extend(content.lines().map(str::to_string));
        Self::from_entries(entries)
    }

    /// Builds a charset from a JSON array of strings, or an object with a
    /// `charset` array field.
    pub fn from_json_str(content: &str) -> OcrResult<Self> {
        let document: CharsetDocument =
            serde_json::from_str(content).map_err(|e| OCRError::ConfigError {
                message: format!("charset is not a JSON string array: {e}"),
            })?;
        match document {
            CharsetDocument::List(entries) | CharsetDocument::Wrapped { charset: entries } => {
                Self::from_entries(entries)
            }
        }
    }

    /// Loads a charset from disk.
    ///
    /// `.json` files are parsed with [`Charset::from_json_str`]; anything else
    /// is treated as a line-per-entry dictionary.
    pub fn load(path: impl AsRef<Path>) -> OcrResult<Self> {
        Self::load_with(path, false)
    }

    /// Like [`Charset::load`], inserting a blank at index 0 when
    /// `prepend_blank` is set.
    pub fn load_with(path: impl AsRef<Path>, prepend_blank: bool) -> OcrResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| OCRError::ConfigError {
            message: format!("failed to read charset from '{}': {}", path.display(), e),
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let charset = if is_json {
            let charset = Self::from_json_str(&content)?;
            if prepend_blank {
                let mut entries = vec![String::new()];
                entries.extend(charset.entries.iter().cloned());
                Self::from_entries(entries)?
            } else {
                charset
            }
        } else {
            Self::from_dict_lines(&content, prepend_blank)?
        };

        tracing::info!(
            path = %path.display(),
            entries = charset.len(),
            "Loaded charset"
        );
        Ok(charset)
    }

    /// Looks up the string for a class index.
    ///
    /// Negative and out-of-range indices return `None`.
    pub fn get(&self, index: i64) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .map(String::as_str)
    }

    /// Number of entries, including the blank.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false` for a constructed charset; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in index order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
