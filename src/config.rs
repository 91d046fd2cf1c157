//! Tool configuration.
//!
//! Handles loading, validating, and merging `photodeck.toml`. Stock defaults
//! are serialized to a TOML table and the user file is merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! `photodeck.toml` is read from the image directory when present, or from
//! an explicit `--config` path:
//!
//! ```text
//! photos/
//! ├── photodeck.toml     # optional, overrides stock defaults
//! ├── 2024-trip/
//! │   └── ...
//! └── studio/
//!     └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [scan]
//! recursive = true
//! formats = ["png", "jpg", "jpeg", "gif", "webp", "bmp"]
//!
//! [grouping]
//! strategy = "mixed"          # directory | filename | mixed
//! filename_separator = "_"
//! max_levels = 3              # deepest heading level in the structure file
//!
//! [deck]
//! size = "16:9"               # 16:9 | 4:3 (or set width_in + height_in)
//! landscape_per_slide = 3
//! portrait_per_slide = 4
//! square_per_slide = 4
//! portrait_threshold = "4/5"  # width/height below this → portrait
//! landscape_threshold = "16/9" # width/height above this → landscape
//! cover_page = true
//!
//! [title]                     # inches / points
//! font_size = 28
//! font_name = ""
//! left = 0.5
//! top = 0.3
//! width = 12.4
//! height = 1.25
//!
//! [content]
//! font_size = 10
//! font_name = ""
//! left = 0.5
//! top = 0.8
//! width = 13.0
//! height = 6.5
//!
//! [jobs]
//! root = ".photodeck-jobs"
//! retention_hours = 24.0
//! retention_completed = 48.0
//! retention_failed = 12.0
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::deck::FontSpec;
use crate::grouping::{GroupingOptions, GroupingStrategy};
use crate::layout::{Capacities, LayoutKind, Rect, SlideSize};
use crate::orientation::{Orientation, Thresholds};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the image directory.
pub const CONFIG_FILE: &str = "photodeck.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config not found: {0}")]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `photodeck.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// File discovery settings.
    pub scan: ScanConfig,
    /// Grouping and heading derivation settings.
    pub grouping: GroupingConfig,
    /// Slide size, per-orientation capacity and ratio thresholds.
    pub deck: DeckConfig,
    /// Slide title box and font.
    pub title: TitleConfig,
    /// Slide content box and caption font.
    pub content: ContentConfig,
    /// Job store location and retention.
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Allowed file extensions, case-insensitive, without dots.
    pub formats: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            formats: ["png", "jpg", "jpeg", "gif", "webp", "bmp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupingConfig {
    pub strategy: GroupingStrategy,
    pub filename_separator: String,
    /// Deepest heading level written to the structure document.
    pub max_levels: usize,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            strategy: GroupingStrategy::Mixed,
            filename_separator: "_".to_string(),
            max_levels: 3,
        }
    }
}

/// A width/height ratio, written either as a number or as `"a/b"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RatioRepr", into = "f64")]
pub struct Ratio(pub f64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RatioRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<RatioRepr> for Ratio {
    type Error = String;

    fn try_from(repr: RatioRepr) -> Result<Self, Self::Error> {
        match repr {
            RatioRepr::Number(n) => Ok(Ratio(n)),
            RatioRepr::Text(s) => parse_ratio(&s)
                .map(Ratio)
                .ok_or_else(|| format!("invalid ratio '{s}', expected a number or 'a/b'")),
        }
    }
}

impl From<Ratio> for f64 {
    fn from(r: Ratio) -> f64 {
        r.0
    }
}

/// Parse `"4/5"` or `"0.8"`.
pub fn parse_ratio(text: &str) -> Option<f64> {
    let text = text.trim();
    match text.split_once('/') {
        Some((a, b)) => {
            let a: f64 = a.trim().parse().ok()?;
            let b: f64 = b.trim().parse().ok()?;
            if b == 0.0 { None } else { Some(a / b) }
        }
        None => text.parse().ok(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeckConfig {
    /// Named slide size: `16:9` or `4:3`.
    pub size: String,
    /// Explicit slide width in inches; wins over `size` together with `height_in`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_in: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_in: Option<f64>,
    pub landscape_per_slide: usize,
    pub portrait_per_slide: usize,
    pub square_per_slide: usize,
    pub portrait_threshold: Ratio,
    pub landscape_threshold: Ratio,
    /// Prepend a summary slide with per-group image counts.
    pub cover_page: bool,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            size: "16:9".to_string(),
            width_in: None,
            height_in: None,
            landscape_per_slide: 3,
            portrait_per_slide: 4,
            square_per_slide: 4,
            portrait_threshold: Ratio(4.0 / 5.0),
            landscape_threshold: Ratio(16.0 / 9.0),
            cover_page: true,
        }
    }
}

impl DeckConfig {
    /// Resolve the slide size in inches.
    pub fn slide_size(&self) -> SlideSize {
        if let (Some(width), Some(height)) = (self.width_in, self.height_in) {
            return SlideSize { width, height };
        }
        match self.size.trim().to_lowercase().as_str() {
            "4:3" | "4x3" | "standard" => SlideSize {
                width: 10.0,
                height: 7.5,
            },
            _ => SlideSize::WIDESCREEN,
        }
    }

    pub fn capacities(&self) -> Capacities {
        Capacities {
            landscape: self.landscape_per_slide,
            portrait: self.portrait_per_slide,
            square: self.square_per_slide,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            portrait: self.portrait_threshold.0,
            landscape: self.landscape_threshold.0,
        }
    }
}

/// Slide title box (inches) and font.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TitleConfig {
    pub font_size: u32,
    pub font_name: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            font_size: 28,
            font_name: String::new(),
            left: 0.5,
            top: 0.3,
            width: 12.4,
            height: 1.25,
        }
    }
}

/// Slide content box (inches) and caption font.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    pub font_size: u32,
    pub font_name: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            font_size: 10,
            font_name: String::new(),
            left: 0.5,
            top: 0.8,
            width: 13.0,
            height: 6.5,
        }
    }
}

impl TitleConfig {
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }

    pub fn font(&self) -> FontSpec {
        FontSpec::new(&self.font_name, self.font_size)
    }
}

impl ContentConfig {
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }

    /// Content box centered horizontally on `slide`, no wider than the slide.
    /// Placement ignores `left`.
    pub fn rect_on(&self, slide: SlideSize) -> Rect {
        let width = self.width.min(slide.width);
        Rect::new((slide.width - width) / 2.0, self.top, width, self.height)
    }

    pub fn font(&self) -> FontSpec {
        FontSpec::new(&self.font_name, self.font_size)
    }
}

/// Job store location and retention windows in hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobsConfig {
    pub root: String,
    /// Retention for any status without its own override. `0` disables cleanup.
    pub retention_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_completed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_failed: Option<f64>,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            root: ".photodeck-jobs".to_string(),
            retention_hours: 24.0,
            retention_completed: Some(48.0),
            retention_failed: Some(12.0),
        }
    }
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.formats.iter().all(|f| f.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "scan.formats must not be empty".into(),
            ));
        }
        if self.grouping.max_levels == 0 {
            return Err(ConfigError::Validation(
                "grouping.max_levels must be at least 1".into(),
            ));
        }
        if self.grouping.filename_separator.is_empty() {
            return Err(ConfigError::Validation(
                "grouping.filename_separator must not be empty".into(),
            ));
        }
        let caps = self.deck.capacities();
        if caps.landscape == 0 || caps.portrait == 0 || caps.square == 0 {
            return Err(ConfigError::Validation(
                "deck.*_per_slide values must be at least 1".into(),
            ));
        }
        let t = self.deck.thresholds();
        if !(t.portrait > 0.0 && t.landscape > 0.0) {
            return Err(ConfigError::Validation(
                "deck thresholds must be positive".into(),
            ));
        }
        if t.portrait > t.landscape {
            return Err(ConfigError::Validation(
                "deck.portrait_threshold must not exceed deck.landscape_threshold".into(),
            ));
        }
        if matches!(self.deck.width_in, Some(w) if w <= 0.0)
            || matches!(self.deck.height_in, Some(h) if h <= 0.0)
        {
            return Err(ConfigError::Validation(
                "deck.width_in and deck.height_in must be positive".into(),
            ));
        }
        for (name, rect) in [("title", self.title.rect()), ("content", self.content.rect())] {
            if rect.width <= 0.0 || rect.height <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{name}.width and {name}.height must be positive"
                )));
            }
        }
        let content = self.content.rect_on(self.deck.slide_size());
        for orientation in Orientation::ALL {
            let capacity = caps.for_orientation(orientation);
            if !LayoutKind::for_orientation(orientation).fits(content, capacity) {
                return Err(ConfigError::Validation(format!(
                    "deck.{}_per_slide = {capacity} leaves no room for images in the content box",
                    orientation.as_str()
                )));
            }
        }
        let retention = [
            Some(self.jobs.retention_hours),
            self.jobs.retention_completed,
            self.jobs.retention_failed,
        ];
        if retention.iter().flatten().any(|h| *h < 0.0) {
            return Err(ConfigError::Validation(
                "jobs retention values must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Allowed extensions, lowercased and without leading dots.
    pub fn extensions(&self) -> Vec<String> {
        self.scan
            .formats
            .iter()
            .map(|f| f.trim().trim_start_matches('.').to_lowercase())
            .filter(|f| !f.is_empty())
            .collect()
    }

    pub fn grouping_options(&self) -> GroupingOptions {
        GroupingOptions {
            strategy: self.grouping.strategy,
            filename_separator: self.grouping.filename_separator.clone(),
        }
    }

    /// `key = value` summary written into the structure document header.
    pub fn summary_lines(&self, source: &str) -> Vec<String> {
        let size = self.deck.slide_size();
        let font = |name: &str, pt: u32| {
            format!("{} {}pt", if name.is_empty() { "-" } else { name }, pt)
        };
        let boxed = |r: Rect| {
            format!(
                "left {}, top {}, width {}, height {}",
                r.left, r.top, r.width, r.height
            )
        };
        vec![
            format!("config = {source}"),
            format!("deck.size = {}", self.deck.size),
            format!("deck.slide_inches = {}x{}", size.width, size.height),
            format!("deck.landscape_per_slide = {}", self.deck.landscape_per_slide),
            format!("deck.portrait_per_slide = {}", self.deck.portrait_per_slide),
            format!("deck.square_per_slide = {}", self.deck.square_per_slide),
            format!("deck.portrait_threshold = {}", self.deck.portrait_threshold.0),
            format!("deck.landscape_threshold = {}", self.deck.landscape_threshold.0),
            format!("title.font = {}", font(&self.title.font_name, self.title.font_size)),
            format!("title.box_in = {}", boxed(self.title.rect())),
            format!(
                "content.font = {}",
                font(&self.content.font_name, self.content.font_size)
            ),
            format!("content.box_in = {}", boxed(self.content.rect())),
        ]
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

fn read_toml(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load `photodeck.toml` from a directory, falling back to stock defaults
/// when the file does not exist.
pub fn load_config(dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    let overlay = if path.is_file() {
        Some(read_toml(&path)?)
    } else {
        None
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Load an explicitly named config file. A missing file is an error.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    resolve_config(stock_defaults_value(), Some(read_toml(path)?))
}

/// Returns a fully-commented stock `photodeck.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photodeck configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Scanning
# ---------------------------------------------------------------------------
[scan]
# Descend into subdirectories.
recursive = true

# File extensions to pick up (case-insensitive).
formats = ["png", "jpg", "jpeg", "gif", "webp", "bmp"]

# ---------------------------------------------------------------------------
# Grouping and structure headings
# ---------------------------------------------------------------------------
[grouping]
# directory | filename | mixed
strategy = "mixed"

# Splits filenames into tokens: trip_day1_beach.jpg -> trip, day1, beach
filename_separator = "_"

# Deepest heading level in the structure document.
max_levels = 3

# ---------------------------------------------------------------------------
# Deck
# ---------------------------------------------------------------------------
[deck]
# 16:9 (13.333 x 7.5 in) or 4:3 (10 x 7.5 in).
size = "16:9"

# Explicit slide size in inches; both must be set to take effect.
# width_in = 13.333
# height_in = 7.5

# Images per slide for each orientation.
landscape_per_slide = 3
portrait_per_slide = 4
square_per_slide = 4

# width/height below portrait_threshold is portrait, above
# landscape_threshold is landscape, anything in between is square.
portrait_threshold = "4/5"
landscape_threshold = "16/9"

# Start the deck with a summary slide (date, images per group, total).
cover_page = true

# ---------------------------------------------------------------------------
# Slide title (box in inches, font size in points)
# ---------------------------------------------------------------------------
[title]
font_size = 28
font_name = ""
left = 0.5
top = 0.3
width = 12.4
height = 1.25

# ---------------------------------------------------------------------------
# Slide content area and captions
# ---------------------------------------------------------------------------
# Images are placed in a box of this width centered on the slide; `left` is
# kept for the structure document header only.
[content]
font_size = 10
font_name = ""
left = 0.5
top = 0.8
width = 13.0
height = 6.5

# ---------------------------------------------------------------------------
# Jobs
# ---------------------------------------------------------------------------
[jobs]
# Directory holding one subdirectory per job.
root = ".photodeck-jobs"

# Hours to keep a job before cleanup; 0 keeps jobs forever.
retention_hours = 24.0
retention_completed = 48.0
retention_failed = 12.0
"##
}
