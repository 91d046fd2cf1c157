//! Shared types used across the scan, grouping and structure stages.

use crate::imaging::{BackendError, Dimensions};
use crate::orientation::{Orientation, classify_by_dimensions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One probed image file.
///
/// Records that could not be decoded, or that report a zero edge, are kept
/// with `valid = false` and no dimensions so they can still be reported.
/// Grouping and layout skip them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub path: PathBuf,
    /// File name including extension.
    pub name: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Equality-based orientation (see [`classify_by_dimensions`]).
    pub orientation: Option<Orientation>,
    pub valid: bool,
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

impl ImageRecord {
    /// A decodable image with known dimensions.
    ///
    /// Zero-sized dimensions produce an invalid record instead.
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        let path = path.into();
        if width == 0 || height == 0 {
            return Self::invalid(path);
        }
        Self {
            name: file_name_of(&path),
            path,
            width: Some(width),
            height: Some(height),
            orientation: Some(classify_by_dimensions(width, height)),
            valid: true,
        }
    }

    /// A file that is present but could not be probed.
    pub fn invalid(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: file_name_of(&path),
            path,
            width: None,
            height: None,
            orientation: None,
            valid: false,
        }
    }

    /// Build a record from a backend probe result.
    pub fn from_probe(path: PathBuf, result: Result<Dimensions, BackendError>) -> Self {
        match result {
            Ok(dims) if dims.is_usable() => {
                log::debug!("{}: {}x{}", path.display(), dims.width, dims.height);
                Self::new(path, dims.width, dims.height)
            }
            Ok(dims) => {
                log::warn!(
                    "{}: unusable dimensions {}x{}",
                    path.display(),
                    dims.width,
                    dims.height
                );
                Self::invalid(path)
            }
            Err(e) => {
                log::warn!("{}: {}", path.display(), e);
                Self::invalid(path)
            }
        }
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => None,
        }
    }

    /// `"WxH"`, or empty when dimensions are unknown.
    pub fn size_label(&self) -> String {
        self.dimensions()
            .map(|(w, h)| format!("{w}x{h}"))
            .unwrap_or_default()
    }
}
