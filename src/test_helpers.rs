//! Shared test utilities for building image trees on disk.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! touch(tmp.path(), "a/placeholder.jpg");      // empty file, for mock backends
//! write_png(&tmp.path().join("b/1.png"), 40, 20); // decodable image
//! ```

use std::fs;
use std::path::{Path, PathBuf};

/// Create an empty file at `root/rel`, creating parent directories.
pub fn touch(root: &Path, rel: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"").unwrap();
    path
}

/// Write a blank RGB PNG of the given size, creating parent directories.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    image::RgbImage::new(width, height).save(path).unwrap();
}
