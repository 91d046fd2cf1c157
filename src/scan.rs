//! Filesystem scanning and dimension probing.
//!
//! Walks the image root and collects every file whose extension is in the
//! allowed list (case-insensitive), then probes each file's pixel size in
//! parallel. Hidden files and directories (leading `.`) are skipped, which
//! keeps job directories and editor droppings out of the deck.
//!
//! ```text
//! photos/
//! ├── beach_1.jpg          # found
//! ├── notes.txt            # wrong extension
//! ├── .photodeck-jobs/     # hidden, not descended
//! └── 2024/
//!     └── harbor.PNG       # found when recursive
//! ```
//!
//! Extensions without a compiled decoder are dropped before the walk.
//! Unreadable images are not errors: they come back as invalid
//! [`ImageRecord`]s so they can still be listed.

use crate::imaging::{ImageBackend, supported_input_extensions};
use crate::types::ImageRecord;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Path not found: {0}")]
    RootNotFound(PathBuf),
    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// Keep only extensions that have a decoder compiled in.
///
/// Dropped entries are logged; probing them would only produce invalid
/// records.
pub fn decodable_extensions(extensions: Vec<String>) -> Vec<String> {
    let supported = supported_input_extensions();
    let (kept, dropped): (Vec<String>, Vec<String>) = extensions
        .into_iter()
        .partition(|ext| supported.contains(&ext.as_str()));
    if !dropped.is_empty() {
        log::warn!(
            "No decoder for {}; supported: {}",
            dropped.join(", "),
            supported.join(", ")
        );
    }
    kept
}

fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.iter().any(|allowed| *allowed == ext))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Find image files under `root`, sorted by path.
///
/// `extensions` must be lowercase without dots. A root that is itself a
/// file is returned alone when its extension matches. Unreadable
/// subdirectories are skipped with a warning.
pub fn find_images(
    root: &Path,
    recursive: bool,
    extensions: &[String],
) -> Result<Vec<PathBuf>, ScanError> {
    if !root.exists() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }
    if root.is_file() {
        return Ok(if has_allowed_extension(root, extensions) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let mut walker = WalkDir::new(root).follow_links(true);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_entry(|e| !is_hidden(e)) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(ScanError::Walk {
                    path: root.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                log::warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };
        if entry.file_type().is_file() && has_allowed_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    log::info!("Found {} image files under {}", files.len(), root.display());
    Ok(files)
}

/// Probe every path with `backend`, in parallel. Output is sorted by path.
pub fn probe_all(backend: &impl ImageBackend, paths: &[PathBuf]) -> Vec<ImageRecord> {
    let mut records: Vec<ImageRecord> = paths
        .par_iter()
        .map(|path| ImageRecord::from_probe(path.clone(), backend.identify(path)))
        .collect();
    records.sort_by(|a, b| a.path.cmp(&b.path));
    let invalid = records.iter().filter(|r| !r.valid).count();
    if invalid > 0 {
        log::warn!("{invalid} of {} images could not be read", records.len());
    }
    records
}
