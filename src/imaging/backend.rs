//! Image probing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the single seam between the pipeline and image
//! decoding. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend); tests use the recording
//! `MockBackend` below so orchestration can be exercised without real files.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Both edges are positive.
    pub fn is_usable(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Trait for image probing backends.
///
/// `Sync` so probing can fan out over rayon's thread pool.
pub trait ImageBackend: Sync {
    /// Get image dimensions in pixels.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;
}
