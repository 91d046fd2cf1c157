//! Image orientation classification.
//!
//! Two classifiers live here and they are intentionally kept apart:
//!
//! - [`classify_by_dimensions`] compares width and height directly. It is used
//!   for per-file reporting in the structure document written by `scan`.
//! - [`classify_by_ratio`] compares the width/height ratio against configurable
//!   [`Thresholds`]. It decides which layout template a slide gets in `merge`.
//!
//! A 1920x1080 image is `landscape` to the first and `square` to the second
//! with default thresholds (16/9 is not strictly greater than 16/9).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Orientation bucket of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

impl Orientation {
    /// Bucket order used when splitting a section into slides.
    pub const ALL: [Orientation; 3] = [
        Orientation::Landscape,
        Orientation::Portrait,
        Orientation::Square,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Square => "square",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ratio thresholds for [`classify_by_ratio`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Ratios strictly below this are portrait.
    pub portrait: f64,
    /// Ratios strictly above this are landscape.
    pub landscape: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            portrait: 4.0 / 5.0,
            landscape: 16.0 / 9.0,
        }
    }
}

/// Classify by strict width/height comparison.
pub fn classify_by_dimensions(width: u32, height: u32) -> Orientation {
    if width > height {
        Orientation::Landscape
    } else if height > width {
        Orientation::Portrait
    } else {
        Orientation::Square
    }
}

/// Classify by width/height ratio against thresholds.
///
/// Missing dimensions or a zero height count as ratio 1.0.
pub fn classify_by_ratio(dimensions: Option<(u32, u32)>, thresholds: &Thresholds) -> Orientation {
    let ratio = match dimensions {
        Some((w, h)) if h > 0 => w as f64 / h as f64,
        _ => 1.0,
    };
    if ratio < thresholds.portrait {
        Orientation::Portrait
    } else if ratio > thresholds.landscape {
        Orientation::Landscape
    } else {
        Orientation::Square
    }
}
