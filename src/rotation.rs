//! Output rotation: move an existing file aside instead of overwriting it.
//!
//! `out.html` becomes `out[01].html`, or the first free `out[NN].html`.
//! Earlier rotations are never touched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Sibling path `stem[NN].ext` for a rotation index.
pub fn rotated_name(path: &Path, index: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}[{index:02}].{}", ext.to_string_lossy()),
        None => format!("{stem}[{index:02}]"),
    };
    path.with_file_name(name)
}

/// Rename `path` to the first free `stem[NN].ext` sibling if it exists.
///
/// Returns the new location of the old file, or `None` when there was
/// nothing to rotate.
pub fn rotate_if_exists(path: &Path) -> io::Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut index = 1;
    loop {
        let target = rotated_name(path, index);
        if !target.exists() {
            fs::rename(path, &target)?;
            log::warn!(
                "Existing {} moved to {}",
                path.display(),
                target.display()
            );
            return Ok(Some(target));
        }
        index += 1;
    }
}
