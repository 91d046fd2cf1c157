//! Filename and path helpers shared by grouping and the heading builder.
//!
//! Filenames carry structure: `trip_day1_beach.jpg` splits on the configured
//! separator (`_`) into `trip`, `day1`, `beach`, and each chunk is further
//! split on hyphens, whitespace, underscores and dots:
//!
//! - `trip_day1_beach` → `["trip", "day1", "beach"]`
//! - `2024-05 harbor.v2` → `["2024", "05", "harbor", "v2"]`
//!
//! Heading labels are cleaned by stripping leading/trailing whitespace,
//! hyphens and underscores, so an LCP like `"x_"` becomes the heading `x`.

use std::path::{Component, Path, PathBuf};

/// Separator used when a configured separator is empty.
pub const DEFAULT_SEPARATOR: &str = "_";

fn is_secondary_delimiter(c: char) -> bool {
    c == '-' || c == '_' || c == '.' || c.is_whitespace()
}

fn is_label_trim(c: char) -> bool {
    c == '-' || c == '_' || c.is_whitespace()
}

/// Name without its final extension (`a.b.jpg` → `a.b`, `README` → `README`).
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => name,
    }
}

/// Split a filename stem into tokens.
///
/// The stem is split on `separator` first (when present), then every chunk is
/// split on the secondary delimiters. Empty tokens are dropped.
pub fn filename_tokens(stem: &str, separator: &str) -> Vec<String> {
    let chunks: Vec<&str> = if !separator.is_empty() && stem.contains(separator) {
        stem.split(separator).collect()
    } else {
        vec![stem]
    };
    chunks
        .into_iter()
        .flat_map(|chunk| chunk.split(is_secondary_delimiter))
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Strip leading/trailing whitespace, hyphens and underscores; keep the middle.
pub fn clean_label(label: &str) -> &str {
    label.trim_matches(is_label_trim)
}

/// Grouping key taken from a filename: the part before the first separator,
/// or the name without extension when the separator does not occur.
pub fn filename_group_key(name: &str, separator: &str) -> String {
    let sep = if separator.is_empty() {
        DEFAULT_SEPARATOR
    } else {
        separator
    };
    match name.split_once(sep) {
        Some((head, _)) => head.to_string(),
        None => strip_extension(name).to_string(),
    }
}

/// Path relative to `root`, or the path unchanged when it is not under `root`.
pub fn relative_path(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Render a relative path with `/` separators regardless of platform.
pub fn path_key(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::RootDir => Some(String::new()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Directory components of a relative path, excluding the filename.
pub fn directory_components(rel: &Path) -> Vec<String> {
    rel.parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
