//! Grouping engine: partitions probed images into named groups.
//!
//! Three strategies are supported:
//!
//! - **directory**: first path component below the root (`a/b/1.jpg` → `a`).
//!   Files directly in the root go to the [`ROOT_GROUP`] sentinel.
//! - **filename**: filename up to the first separator (`x_1.jpg` → `x`), or
//!   the stem when the separator does not occur.
//! - **mixed**: directory key, falling back to the filename key for files in
//!   the root.
//!
//! Invalid records never appear in any group. Groups are sorted by name and
//! images within a group by lowercase filename.

use crate::naming::{filename_group_key, relative_path};
use crate::types::ImageRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

/// Group key for files directly inside the root directory.
pub const ROOT_GROUP: &str = "_root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingStrategy {
    Directory,
    Filename,
    #[default]
    Mixed,
}

impl GroupingStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupingStrategy::Directory => "directory",
            GroupingStrategy::Filename => "filename",
            GroupingStrategy::Mixed => "mixed",
        }
    }
}

impl fmt::Display for GroupingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "directory" => Ok(GroupingStrategy::Directory),
            "filename" => Ok(GroupingStrategy::Filename),
            "mixed" => Ok(GroupingStrategy::Mixed),
            other => Err(format!(
                "unknown grouping strategy '{other}' (expected directory, filename or mixed)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingOptions {
    pub strategy: GroupingStrategy,
    pub filename_separator: String,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            strategy: GroupingStrategy::Mixed,
            filename_separator: "_".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageGroup {
    pub name: String,
    pub images: Vec<ImageRecord>,
}

fn directory_key(record: &ImageRecord, root: &Path) -> String {
    let rel = relative_path(&record.path, root);
    let mut normal = rel.components().filter_map(|c| match c {
        Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
        _ => None,
    });
    let first = normal.next();
    match (first, normal.next()) {
        (Some(dir), Some(_)) => dir,
        _ => ROOT_GROUP.to_string(),
    }
}

/// Key an image is grouped under for the given options.
pub fn group_key(record: &ImageRecord, root: &Path, options: &GroupingOptions) -> String {
    match options.strategy {
        GroupingStrategy::Directory => directory_key(record, root),
        GroupingStrategy::Filename => {
            filename_group_key(&record.name, &options.filename_separator)
        }
        GroupingStrategy::Mixed => {
            let key = directory_key(record, root);
            if key == ROOT_GROUP {
                filename_group_key(&record.name, &options.filename_separator)
            } else {
                key
            }
        }
    }
}

/// Partition valid records into sorted groups.
pub fn group(items: &[ImageRecord], root: &Path, options: &GroupingOptions) -> Vec<ImageGroup> {
    let mut groups: BTreeMap<String, Vec<ImageRecord>> = BTreeMap::new();
    for record in items.iter().filter(|r| r.valid) {
        groups
            .entry(group_key(record, root, options))
            .or_default()
            .push(record.clone());
    }

    groups
        .into_iter()
        .map(|(name, mut images)| {
            images.sort_by_cached_key(|r| r.name.to_lowercase());
            ImageGroup { name, images }
        })
        .collect()
}
