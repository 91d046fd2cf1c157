//! Structure document: heading hierarchy builder, renderer and parser.
//!
//! `scan` writes a markdown-like document that lists every image under a
//! bounded heading tree; the user may edit it, and `merge` reads it back.
//!
//! ```text
//! # photodeck structure
//!
//! root: /photos
//!
//! ini:
//! - config = photodeck.toml
//!
//! # a
//! - path: a/1.jpg
//!   filename: 1.jpg
//!   title: 1.jpg
//!   size: 1200x800
//!   orientation: landscape
//! # b
//! ## x
//! - path: b/x_1.jpg
//!   ...
//! ```
//!
//! ## Heading derivation
//!
//! Each item gets up to `max_levels` candidate labels: directory components
//! first, then filename tokens. The effective labels are:
//!
//! 1. the directory labels (at most `max_levels`);
//! 2. when there is room, the longest common prefix of the filename stems
//!    sharing the same parent directories, if non-empty;
//! 3. otherwise the first filename token, but only when more than one item
//!    shares that candidate prefix. Singleton token groups never get a
//!    heading of their own.
//!
//! Labels are cleaned of leading/trailing whitespace, hyphens and
//! underscores. Headings are emitted only past the prefix shared with the
//! previous item, so each heading appears once per run of items.
//!
//! ## Parsing
//!
//! Only heading lines and `- path:` lines matter. Every heading starts a new
//! section whose breadcrumb is the heading stack joined with `" / "`; depth
//! jumps pop every stack entry at or below the new depth. Sections without
//! images are dropped.

use crate::naming::{
    clean_label, directory_components, filename_tokens, path_key, relative_path, strip_extension,
};
use crate::orientation::Orientation;
use crate::types::ImageRecord;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// First line of every structure document.
pub const HEADER: &str = "# photodeck structure";

/// Separator between heading labels in a breadcrumb.
pub const BREADCRUMB_SEPARATOR: &str = " / ";

#[derive(Error, Debug)]
pub enum StructureError {
    #[error("failed to read structure document {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write structure document {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One image line block in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemEntry {
    /// Path relative to the root, `/`-separated.
    pub path: String,
    pub filename: String,
    pub title: String,
    /// `"WxH"` or empty.
    pub size: String,
    pub orientation: Option<Orientation>,
}

impl ItemEntry {
    fn from_record(record: &ImageRecord, rel: &str) -> Self {
        Self {
            path: rel.to_string(),
            filename: rel.rsplit('/').next().unwrap_or(rel).to_string(),
            title: record.name.clone(),
            size: record.size_label(),
            orientation: record.orientation,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Heading { depth: usize, label: String },
    Item(ItemEntry),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureDocument {
    pub root: PathBuf,
    /// `key = value` lines for the `ini:` block.
    pub settings: Vec<String>,
    pub entries: Vec<Entry>,
    /// Files that were found but could not be read.
    pub skipped: Vec<ItemEntry>,
}

/// A run of items under one heading, read back from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Label of the heading that opened the section.
    pub title: String,
    /// Labels from depth 1 down to this section, joined with `" / "`.
    pub breadcrumb: String,
    /// Paths exactly as written, usually relative to the document root.
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelSource {
    Directory,
    Token,
}

struct Candidate {
    rel: String,
    dirs: Vec<String>,
    stem: String,
    levels: Vec<(String, LabelSource)>,
}

fn candidate_levels(
    dirs: &[String],
    tokens: &[String],
    max_levels: usize,
) -> Vec<(String, LabelSource)> {
    dirs.iter()
        .map(|d| (d.clone(), LabelSource::Directory))
        .chain(tokens.iter().map(|t| (t.clone(), LabelSource::Token)))
        .take(max_levels)
        .collect()
}

/// Longest common character prefix; comparing the lexicographic extremes is
/// enough since every other string sorts between them.
fn longest_common_prefix<'a>(strings: impl IntoIterator<Item = &'a str>) -> String {
    let mut iter = strings.into_iter();
    let Some(first) = iter.next() else {
        return String::new();
    };
    let (lo, hi) = iter.fold((first, first), |(lo, hi), s| (lo.min(s), hi.max(s)));
    lo.chars()
        .zip(hi.chars())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a)
        .collect()
}

fn labels_for<'a>(
    candidate: &'a Candidate,
    max_levels: usize,
    prefix_counts: &HashMap<Vec<&'a str>, usize>,
    lcp_by_parent: &HashMap<Vec<String>, String>,
) -> Vec<String> {
    let mut names: Vec<String> = candidate
        .levels
        .iter()
        .take_while(|(_, src)| *src == LabelSource::Directory)
        .map(|(name, _)| name.clone())
        .collect();

    if names.len() < max_levels {
        match lcp_by_parent.get(&names).filter(|lcp| !lcp.is_empty()) {
            Some(lcp) => names.push(lcp.clone()),
            None => {
                let depth = names.len() + 1;
                let shared = candidate.levels.get(..depth).map_or(0, |prefix| {
                    let key: Vec<&str> = prefix.iter().map(|(n, _)| n.as_str()).collect();
                    prefix_counts.get(&key).copied().unwrap_or(0)
                });
                if shared > 1
                    && let Some((token, _)) = candidate.levels[names.len()..]
                        .iter()
                        .find(|(_, src)| *src == LabelSource::Token)
                {
                    names.push(token.clone());
                }
            }
        }
    }

    names
        .iter()
        .map(|n| clean_label(n))
        .filter(|n| !n.is_empty())
        .map(String::from)
        .collect()
}

/// Build the structure document for a set of probed records.
///
/// Valid records go into the heading tree sorted by relative path; invalid
/// ones are listed in `skipped`. `max_levels` of zero is treated as one.
pub fn build(
    records: &[ImageRecord],
    root: &Path,
    max_levels: usize,
    separator: &str,
    settings: Vec<String>,
) -> StructureDocument {
    let max_levels = max_levels.max(1);

    let mut valid: Vec<(&ImageRecord, Candidate)> = records
        .iter()
        .filter(|r| r.valid)
        .map(|record| {
            let rel = relative_path(&record.path, root);
            let dirs = directory_components(&rel);
            let filename = rel
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| record.name.clone());
            let stem = strip_extension(&filename).to_string();
            let tokens = filename_tokens(&stem, separator);
            let levels = candidate_levels(&dirs, &tokens, max_levels);
            let candidate = Candidate {
                rel: path_key(&rel),
                dirs,
                stem,
                levels,
            };
            (record, candidate)
        })
        .collect();
    valid.sort_by(|a, b| a.1.rel.cmp(&b.1.rel));

    let mut prefix_counts: HashMap<Vec<&str>, usize> = HashMap::new();
    let mut stems_by_parent: HashMap<Vec<String>, Vec<&str>> = HashMap::new();
    for (_, c) in &valid {
        for i in 1..=c.levels.len() {
            let key = c.levels[..i].iter().map(|(n, _)| n.as_str()).collect();
            *prefix_counts.entry(key).or_default() += 1;
        }
        let parent_depth = c.dirs.len().min(max_levels - 1);
        if parent_depth >= 1 {
            stems_by_parent
                .entry(c.dirs[..parent_depth].to_vec())
                .or_default()
                .push(c.stem.as_str());
        }
    }
    let lcp_by_parent: HashMap<Vec<String>, String> = stems_by_parent
        .into_iter()
        .map(|(key, stems)| (key, longest_common_prefix(stems).trim().to_string()))
        .collect();

    let mut entries = Vec::new();
    let mut previous: Vec<String> = Vec::new();
    for (record, candidate) in &valid {
        let labels = labels_for(candidate, max_levels, &prefix_counts, &lcp_by_parent);
        let common = labels
            .iter()
            .zip(&previous)
            .take_while(|(a, b)| a == b)
            .count();
        for (index, label) in labels.iter().enumerate().skip(common) {
            entries.push(Entry::Heading {
                depth: index + 1,
                label: label.clone(),
            });
        }
        entries.push(Entry::Item(ItemEntry::from_record(record, &candidate.rel)));
        previous = labels;
    }

    let mut skipped: Vec<ItemEntry> = records
        .iter()
        .filter(|r| !r.valid)
        .map(|r| ItemEntry::from_record(r, &path_key(&relative_path(&r.path, root))))
        .collect();
    skipped.sort_by(|a, b| a.path.cmp(&b.path));

    StructureDocument {
        root: root.to_path_buf(),
        settings,
        entries,
        skipped,
    }
}

fn push_field(lines: &mut Vec<String>, key: &str, value: &str) {
    if value.is_empty() {
        lines.push(format!("  {key}:"));
    } else {
        lines.push(format!("  {key}: {value}"));
    }
}

impl StructureDocument {
    /// Render to text. Output always ends with a newline.
    pub fn render(&self) -> String {
        let mut lines = vec![
            HEADER.to_string(),
            String::new(),
            format!("root: {}", self.root.display()),
            String::new(),
        ];
        if !self.settings.is_empty() {
            lines.push("ini:".to_string());
            lines.extend(self.settings.iter().map(|s| format!("- {s}")));
            lines.push(String::new());
        }

        for entry in &self.entries {
            match entry {
                Entry::Heading { depth, label } => {
                    lines.push(format!("{} {}", "#".repeat(*depth), label));
                }
                Entry::Item(item) => {
                    lines.push(format!("- path: {}", item.path));
                    push_field(&mut lines, "filename", &item.filename);
                    push_field(&mut lines, "title", &item.title);
                    push_field(&mut lines, "size", &item.size);
                    push_field(
                        &mut lines,
                        "orientation",
                        item.orientation.map_or("", Orientation::as_str),
                    );
                }
            }
        }

        if !self.skipped.is_empty() {
            lines.push(String::new());
            lines.push("skipped:".to_string());
            for item in &self.skipped {
                lines.push(format!("- file: {}", item.path));
                push_field(&mut lines, "filename", &item.filename);
                push_field(&mut lines, "size", "");
                push_field(&mut lines, "orientation", "");
            }
        }

        lines.push(String::new());
        lines.join("\n")
    }

    /// Number of images in the heading tree.
    pub fn item_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, Entry::Item(_)))
            .count()
    }

    /// Number of heading lines.
    pub fn heading_count(&self) -> usize {
        self.entries.len() - self.item_count()
    }

    /// Write the rendered document, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<(), StructureError> {
        let write_err = |source| StructureError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, self.render()).map_err(write_err)
    }
}

/// Parse document text into sections.
pub fn parse(text: &str) -> Vec<Section> {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let header_line = lines.iter().position(|l| !l.is_empty());

    let mut sections = Vec::new();
    let mut stack: Vec<(usize, String)> = Vec::new();
    let mut current = Section {
        title: String::new(),
        breadcrumb: String::new(),
        images: Vec::new(),
    };

    for (index, line) in lines.iter().enumerate() {
        if line.starts_with('#') {
            if Some(index) == header_line && *line == HEADER {
                continue;
            }
            let depth = line.len() - line.trim_start_matches('#').len();
            let title = line.trim_start_matches('#').trim().to_string();
            while stack.last().is_some_and(|(d, _)| *d >= depth) {
                stack.pop();
            }
            stack.push((depth, title.clone()));
            let breadcrumb = stack
                .iter()
                .map(|(_, label)| label.as_str())
                .collect::<Vec<_>>()
                .join(BREADCRUMB_SEPARATOR);
            let finished = std::mem::replace(
                &mut current,
                Section {
                    title,
                    breadcrumb,
                    images: Vec::new(),
                },
            );
            if !finished.images.is_empty() {
                sections.push(finished);
            }
        } else if let Some(path) = line.strip_prefix("- path:") {
            let path = path.trim();
            if !path.is_empty() {
                current.images.push(path.to_string());
            }
        }
    }
    if !current.images.is_empty() {
        sections.push(current);
    }
    sections
}

/// Read and parse a document from disk.
pub fn load(path: &Path) -> Result<Vec<Section>, StructureError> {
    let text = fs::read_to_string(path).map_err(|source| StructureError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(&text))
}
