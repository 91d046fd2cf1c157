//! Slide planning and layout geometry.
//!
//! Sections read back from the structure document are split per orientation
//! and paginated into [`SlideSpec`]s, which are then placed into the content
//! box with one of three fixed templates:
//!
//! | Orientation | Template          | Cells                              |
//! |-------------|-------------------|------------------------------------|
//! | square      | grid              | 2×2, 0.2in gap, 0.3in caption      |
//! | landscape   | vertical stack    | one row per image, 0.3in caption   |
//! | portrait    | horizontal stack  | one column per image, 0.3in gap    |
//!
//! All lengths are inches. Every image rect keeps the source aspect ratio,
//! stays inside its cell and is centered in the leftover space. Images with
//! unknown dimensions are placed with a per-template fallback size.

use crate::imaging::fit_within;
use crate::orientation::{Orientation, Thresholds, classify_by_ratio};
use crate::structure::{BREADCRUMB_SEPARATOR, Section};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

const GRID_GAP: f64 = 0.2;
const GRID_CAPTION: f64 = 0.3;
const GRID_CELLS: usize = 4;
const VSTACK_GAP: f64 = 0.2;
const VSTACK_CAPTION: f64 = 0.3;
const VSTACK_MIN_HEIGHT: f64 = 0.5;
const HSTACK_GAP: f64 = 0.3;
const HSTACK_CAPTION: f64 = 0.4;
const HSTACK_MARGIN: f64 = 0.1;

/// Pixel dimensions probed for each image path.
pub type DimensionMap = HashMap<PathBuf, (u32, u32)>;

/// Axis-aligned box in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// True when `other` lies inside `self`, allowing for rounding error.
    pub fn contains(&self, other: &Rect) -> bool {
        const EPS: f64 = 1e-9;
        other.left >= self.left - EPS
            && other.top >= self.top - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }
}

/// Slide dimensions in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideSize {
    pub width: f64,
    pub height: f64,
}

impl SlideSize {
    pub const WIDESCREEN: SlideSize = SlideSize {
        width: 13.333,
        height: 7.5,
    };
}

/// Images per slide for each orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacities {
    pub landscape: usize,
    pub portrait: usize,
    pub square: usize,
}

impl Default for Capacities {
    fn default() -> Self {
        Self {
            landscape: 3,
            portrait: 4,
            square: 4,
        }
    }
}

impl Capacities {
    /// Capacity for an orientation, never below one.
    pub fn for_orientation(&self, orientation: Orientation) -> usize {
        let cap = match orientation {
            Orientation::Landscape => self.landscape,
            Orientation::Portrait => self.portrait,
            Orientation::Square => self.square,
        };
        cap.max(1)
    }
}

/// Placement template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    Grid,
    VerticalStack,
    HorizontalStack,
}

impl LayoutKind {
    pub fn for_orientation(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Square => LayoutKind::Grid,
            Orientation::Landscape => LayoutKind::VerticalStack,
            Orientation::Portrait => LayoutKind::HorizontalStack,
        }
    }

    /// Pixel size assumed when an image cannot be probed.
    pub fn fallback_dimensions(self) -> (u32, u32) {
        match self {
            LayoutKind::Grid => (1000, 1000),
            LayoutKind::VerticalStack => (1000, 600),
            LayoutKind::HorizontalStack => (800, 1200),
        }
    }

    /// Whether `capacity` images per slide leave a positive image area in `content`.
    pub fn fits(self, content: Rect, capacity: usize) -> bool {
        let n = capacity.max(1) as f64;
        match self {
            LayoutKind::Grid => {
                content.width > GRID_GAP && (content.height - GRID_GAP) / 2.0 > GRID_CAPTION
            }
            LayoutKind::VerticalStack => content.height / n > VSTACK_GAP,
            LayoutKind::HorizontalStack => {
                (content.width - HSTACK_GAP * (n - 1.0)) / n > HSTACK_MARGIN
                    && content.height > HSTACK_CAPTION
            }
        }
    }
}

/// One page of orientation-homogeneous images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSpec {
    pub title: String,
    pub breadcrumb: String,
    pub images: Vec<PathBuf>,
    pub layout: Orientation,
}

/// Split `items` into consecutive chunks of `capacity` (minimum one).
pub fn paginate<T: Clone>(items: &[T], capacity: usize) -> Vec<Vec<T>> {
    items
        .chunks(capacity.max(1))
        .map(<[T]>::to_vec)
        .collect()
}

/// `"breadcrumb (index/total)"`, or just the breadcrumb for a single page.
pub fn slide_title(breadcrumb: &str, index: usize, total: usize) -> String {
    if total > 1 {
        format!("{breadcrumb} ({index}/{total})")
    } else {
        breadcrumb.to_string()
    }
}

/// Turn parsed sections into slides.
///
/// Section image paths are resolved against `root`. Each image is classified
/// with the ratio thresholds (unknown dimensions count as square), buckets are
/// emitted in landscape, portrait, square order and paginated independently.
/// Sections with an empty breadcrumb use `fallback_title`.
pub fn plan_slides(
    sections: &[Section],
    root: &Path,
    dimensions: &DimensionMap,
    capacities: &Capacities,
    thresholds: &Thresholds,
    fallback_title: &str,
) -> Vec<SlideSpec> {
    let mut slides = Vec::new();
    for section in sections {
        let breadcrumb = [section.breadcrumb.as_str(), section.title.as_str(), fallback_title]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string();

        let mut buckets: BTreeMap<Orientation, Vec<PathBuf>> = BTreeMap::new();
        for image in &section.images {
            let path = root.join(image);
            let orientation = classify_by_ratio(dimensions.get(&path).copied(), thresholds);
            buckets.entry(orientation).or_default().push(path);
        }

        for orientation in Orientation::ALL {
            let Some(paths) = buckets.get(&orientation) else {
                continue;
            };
            let pages = paginate(paths, capacities.for_orientation(orientation));
            let total = pages.len();
            for (index, images) in pages.into_iter().enumerate() {
                slides.push(SlideSpec {
                    title: slide_title(&breadcrumb, index + 1, total),
                    breadcrumb: breadcrumb.clone(),
                    images,
                    layout: orientation,
                });
            }
        }
    }
    log::info!("Planned {} slides from {} sections", slides.len(), sections.len());
    slides
}

/// An image to place: path, display name and probed size if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub path: PathBuf,
    pub name: String,
    pub dimensions: Option<(u32, u32)>,
}

impl ImageInput {
    pub fn from_path(path: &Path, dimensions: &DimensionMap) -> Self {
        Self {
            path: path.to_path_buf(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            dimensions: dimensions.get(path).copied().filter(|(w, h)| *w > 0 && *h > 0),
        }
    }

    /// `"name - (WxH)"` when the size is known.
    pub fn caption_text(&self) -> String {
        match self.dimensions {
            Some((w, h)) => format!("{} - ({}x{})", self.name, w, h),
            None => self.name.clone(),
        }
    }

    fn source_size(&self, kind: LayoutKind) -> (f64, f64) {
        let (w, h) = self.dimensions.unwrap_or_else(|| kind.fallback_dimensions());
        (f64::from(w), f64::from(h))
    }
}

/// Where one image and its caption go on a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub path: PathBuf,
    pub image: Rect,
    pub caption: Rect,
    pub caption_text: String,
    /// Portrait captions wrap inside their narrow column.
    pub wrap_caption: bool,
}

/// 2×2 grid; at most four images are placed.
pub fn place_grid(content: Rect, images: &[ImageInput]) -> Vec<Placement> {
    let cell_w = (content.width - GRID_GAP) / 2.0;
    let cell_h = (content.height - GRID_GAP) / 2.0;
    let max_h = cell_h - GRID_CAPTION;

    images
        .iter()
        .take(GRID_CELLS)
        .enumerate()
        .map(|(idx, img)| {
            let (row, col) = (idx / 2, idx % 2);
            let x = content.left + col as f64 * (cell_w + GRID_GAP);
            let y = content.top + row as f64 * (cell_h + GRID_GAP);
            let (w, h) = fit_within(img.source_size(LayoutKind::Grid), cell_w, max_h);
            Placement {
                path: img.path.clone(),
                image: Rect::new(x + (cell_w - w) / 2.0, y + (max_h - h) / 2.0, w, h),
                caption: Rect::new(x, y + max_h, cell_w, GRID_CAPTION),
                caption_text: img.caption_text(),
                wrap_caption: false,
            }
        })
        .collect()
}

/// One full-width row per image, `min(capacity, n)` rows.
pub fn place_vertical_stack(
    content: Rect,
    images: &[ImageInput],
    capacity: usize,
) -> Vec<Placement> {
    let rows = capacity.min(images.len()).max(1);
    let cell_w = content.width;
    let cell_h = content.height / rows as f64;
    let max_h = (cell_h - VSTACK_CAPTION)
        .max(VSTACK_MIN_HEIGHT)
        .min(cell_h - VSTACK_GAP);

    images
        .iter()
        .take(rows)
        .enumerate()
        .map(|(idx, img)| {
            let y = content.top + idx as f64 * cell_h;
            let (w, h) = fit_within(img.source_size(LayoutKind::VerticalStack), cell_w, max_h);
            Placement {
                path: img.path.clone(),
                image: Rect::new(content.left + (cell_w - w) / 2.0, y, w, h),
                caption: Rect::new(content.left, y + h, cell_w, VSTACK_CAPTION),
                caption_text: img.caption_text(),
                wrap_caption: false,
            }
        })
        .collect()
}

/// One column per image, `min(capacity, n)` columns with captions along the bottom.
pub fn place_horizontal_stack(
    content: Rect,
    images: &[ImageInput],
    capacity: usize,
) -> Vec<Placement> {
    let cols = capacity.min(images.len()).max(1);
    let cell_w = (content.width - HSTACK_GAP * (cols - 1) as f64) / cols as f64;
    let area_h = content.height - HSTACK_CAPTION;

    images
        .iter()
        .take(cols)
        .enumerate()
        .map(|(idx, img)| {
            let x = content.left + idx as f64 * (cell_w + HSTACK_GAP);
            let (w, h) = fit_within(
                img.source_size(LayoutKind::HorizontalStack),
                cell_w - HSTACK_MARGIN,
                area_h,
            );
            Placement {
                path: img.path.clone(),
                image: Rect::new(
                    x + (cell_w - w) / 2.0,
                    content.top + (area_h - h) / 2.0,
                    w,
                    h,
                ),
                caption: Rect::new(x, content.top + area_h, cell_w, HSTACK_CAPTION),
                caption_text: img.caption_text(),
                wrap_caption: true,
            }
        })
        .collect()
}

/// Place images with the template for `kind`.
pub fn place_images(
    kind: LayoutKind,
    content: Rect,
    images: &[ImageInput],
    capacity: usize,
) -> Vec<Placement> {
    match kind {
        LayoutKind::Grid => place_grid(content, images),
        LayoutKind::VerticalStack => place_vertical_stack(content, images, capacity),
        LayoutKind::HorizontalStack => place_horizontal_stack(content, images, capacity),
    }
}

// =============================================================================
// Cover page
// =============================================================================

const COVER_LEFT: f64 = 1.0;
const COVER_TOP: f64 = 1.0;
const COVER_WIDTH: f64 = 11.0;
const COVER_LINE: f64 = 0.6;
const COVER_BLOCK_GAP: f64 = 0.3;
const COVER_COLUMN_GAP: f64 = 0.2;
const COVER_GROUPS_HEIGHT: f64 = 4.0;
const COVER_FONT: u32 = 24;
const COVER_MIN_FONT: u32 = 12;

/// A column of group lines on the cover page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverColumn {
    pub rect: Rect,
    pub lines: Vec<String>,
}

/// Summary slide: date, image count per top-level group, total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverPage {
    pub date_line: String,
    pub date_box: Rect,
    pub groups: Vec<(String, usize)>,
    pub groups_box: Rect,
    pub columns: Vec<CoverColumn>,
    /// Point size for the group lines.
    pub group_font_size: u32,
    pub total: usize,
    pub total_line: String,
    pub total_box: Rect,
    /// Point size for the date and total lines.
    pub font_size: u32,
}

/// Pick a column count (1, 2 or 3) and font size so `n` lines fit the
/// group area; shrink the font when three columns still overflow.
fn cover_columns(n: usize) -> (usize, u32) {
    for cols in 1..=3 {
        let rows = n.div_ceil(cols);
        if rows as f64 * COVER_LINE <= COVER_GROUPS_HEIGHT {
            return (cols, COVER_FONT);
        }
    }
    let needed = n.div_ceil(3) as f64 * COVER_LINE;
    let scaled = (f64::from(COVER_FONT) * COVER_GROUPS_HEIGHT / needed) as u32;
    (3, scaled.clamp(COVER_MIN_FONT, COVER_FONT))
}

/// Build the cover page from the planned slides.
pub fn cover_page(slides: &[SlideSpec], date: NaiveDate) -> CoverPage {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0;
    for slide in slides {
        total += slide.images.len();
        if let Some(first) = slide
            .breadcrumb
            .split(BREADCRUMB_SEPARATOR)
            .next()
            .filter(|s| !s.is_empty())
        {
            *counts.entry(first.to_string()).or_default() += slide.images.len();
        }
    }
    let groups: Vec<(String, usize)> = counts.into_iter().collect();

    let date_box = Rect::new(COVER_LEFT, COVER_TOP, COVER_WIDTH, COVER_LINE);
    let groups_box = Rect::new(
        COVER_LEFT,
        date_box.bottom() + COVER_BLOCK_GAP,
        COVER_WIDTH,
        COVER_GROUPS_HEIGHT,
    );
    let total_box = Rect::new(
        COVER_LEFT,
        groups_box.bottom() + COVER_BLOCK_GAP,
        COVER_WIDTH,
        COVER_LINE,
    );

    let (cols, group_font_size) = cover_columns(groups.len());
    let column_width = (COVER_WIDTH - COVER_COLUMN_GAP * (cols - 1) as f64) / cols as f64;
    let per_column = groups.len().div_ceil(cols).max(1);
    let lines: Vec<String> = groups
        .iter()
        .map(|(name, count)| format!("{name}: {count} images"))
        .collect();
    let columns = lines
        .chunks(per_column)
        .enumerate()
        .map(|(col, chunk)| CoverColumn {
            rect: Rect::new(
                COVER_LEFT + col as f64 * (column_width + COVER_COLUMN_GAP),
                groups_box.top,
                column_width,
                COVER_GROUPS_HEIGHT,
            ),
            lines: chunk.to_vec(),
        })
        .collect();

    CoverPage {
        date_line: format!("Date: {}", date.format("%Y-%m-%d")),
        date_box,
        groups,
        groups_box,
        columns,
        group_font_size,
        total,
        total_line: format!("Total: {total} images"),
        total_box,
        font_size: COVER_FONT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn content() -> Rect {
        Rect::new(0.5, 0.8, 13.0, 6.5)
    }

    fn input(name: &str, dims: Option<(u32, u32)>) -> ImageInput {
        ImageInput {
            path: PathBuf::from(format!("/p/{name}")),
            name: name.to_string(),
            dimensions: dims,
        }
    }

    fn ratio(r: &Rect) -> f64 {
        r.width / r.height
    }

    // =========================================================================
    // Pagination and titles
    // =========================================================================

    #[test]
    fn paginate_seven_by_three() {
        let items: Vec<u32> = (0..7).collect();
        let pages = paginate(&items, 3);
        let sizes: Vec<_> = pages.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(pages.concat(), items);
    }

    #[test]
    fn paginate_zero_capacity_acts_as_one() {
        assert_eq!(paginate(&[1, 2], 0).len(), 2);
    }

    #[test]
    fn paginate_empty() {
        assert!(paginate::<u32>(&[], 3).is_empty());
    }

    #[test]
    fn title_suffix_only_when_paginated() {
        assert_eq!(slide_title("a / b", 1, 1), "a / b");
        assert_eq!(slide_title("a / b", 2, 3), "a / b (2/3)");
    }

    // =========================================================================
    // plan_slides
    // =========================================================================

    #[test]
    fn plan_buckets_by_orientation_in_fixed_order() {
        let sections = vec![Section {
            title: "a".into(),
            breadcrumb: "a".into(),
            images: vec!["a/sq.jpg".into(), "a/wide1.jpg".into(), "a/tall.jpg".into()],
        }];
        let mut dims = DimensionMap::new();
        dims.insert(PathBuf::from("/p/a/sq.jpg"), (1000, 1000));
        dims.insert(PathBuf::from("/p/a/wide1.jpg"), (3000, 1000));
        dims.insert(PathBuf::from("/p/a/tall.jpg"), (600, 1200));

        let slides = plan_slides(
            &sections,
            Path::new("/p"),
            &dims,
            &Capacities::default(),
            &Thresholds::default(),
            "root",
        );
        let layouts: Vec<_> = slides.iter().map(|s| s.layout).collect();
        assert_eq!(
            layouts,
            vec![Orientation::Landscape, Orientation::Portrait, Orientation::Square]
        );
        assert!(slides.iter().all(|s| s.title == "a"));
    }

    #[test]
    fn plan_paginates_each_bucket() {
        let images: Vec<String> = (0..7).map(|i| format!("w{i}.jpg")).collect();
        let mut dims = DimensionMap::new();
        for name in &images {
            dims.insert(Path::new("/p").join(name), (3000, 1000));
        }
        let sections = vec![Section {
            title: "trip".into(),
            breadcrumb: "trip".into(),
            images,
        }];
        let slides = plan_slides(
            &sections,
            Path::new("/p"),
            &dims,
            &Capacities::default(),
            &Thresholds::default(),
            "root",
        );
        let titles: Vec<_> = slides.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["trip (1/3)", "trip (2/3)", "trip (3/3)"]);
        assert_eq!(slides[2].images.len(), 1);
    }

    #[test]
    fn plan_unknown_dimensions_are_square() {
        let sections = vec![Section {
            title: String::new(),
            breadcrumb: String::new(),
            images: vec!["missing.jpg".into()],
        }];
        let slides = plan_slides(
            &sections,
            Path::new("/p"),
            &DimensionMap::new(),
            &Capacities::default(),
            &Thresholds::default(),
            "photos",
        );
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].layout, Orientation::Square);
        assert_eq!(slides[0].title, "photos");
        assert_eq!(slides[0].images, vec![PathBuf::from("/p/missing.jpg")]);
    }

    // =========================================================================
    // Grid
    // =========================================================================

    #[test]
    fn grid_places_four_in_quadrants() {
        let imgs: Vec<_> = (0..5).map(|i| input(&format!("{i}.jpg"), Some((800, 800)))).collect();
        let placed = place_grid(content(), &imgs);
        assert_eq!(placed.len(), 4);

        let cell_w = (13.0 - 0.2) / 2.0;
        let cell_h = (6.5 - 0.2) / 2.0;
        assert!((placed[1].caption.left - (0.5 + cell_w + 0.2)).abs() < EPS);
        assert!((placed[2].caption.top - (0.8 + cell_h + 0.2 + cell_h - 0.3)).abs() < EPS);
        for p in &placed {
            assert!((ratio(&p.image) - 1.0).abs() < EPS);
            assert!((p.image.height - (cell_h - 0.3)).abs() < EPS);
        }
    }

    #[test]
    fn grid_centers_in_cell() {
        let placed = place_grid(content(), &[input("sq.jpg", Some((500, 500)))]);
        let cell_w = (13.0 - 0.2) / 2.0;
        let img = placed[0].image;
        let left_gap = img.left - 0.5;
        let right_gap = 0.5 + cell_w - img.right();
        assert!((left_gap - right_gap).abs() < EPS);
    }

    // =========================================================================
    // Vertical stack
    // =========================================================================

    #[test]
    fn vertical_stack_rows_follow_count() {
        let imgs = vec![input("a.jpg", Some((3000, 1000))), input("b.jpg", Some((3000, 1000)))];
        let placed = place_vertical_stack(content(), &imgs, 3);
        assert_eq!(placed.len(), 2);
        let cell_h = 6.5 / 2.0;
        assert!((placed[1].image.top - (0.8 + cell_h)).abs() < EPS);
        for p in &placed {
            assert!((ratio(&p.image) - 3.0).abs() < EPS);
            assert!(p.image.height <= cell_h - 0.3 + EPS);
            assert!((p.caption.top - p.image.bottom()).abs() < EPS);
        }
    }

    #[test]
    fn vertical_stack_full_width_when_short_enough() {
        let placed = place_vertical_stack(content(), &[input("pano.jpg", Some((5000, 500)))], 3);
        assert!((placed[0].image.width - 13.0).abs() < EPS);
        assert!((placed[0].image.left - 0.5).abs() < EPS);
    }

    #[test]
    fn vertical_stack_fallback_caption_is_name() {
        let placed = place_vertical_stack(content(), &[input("x.jpg", None)], 3);
        assert_eq!(placed[0].caption_text, "x.jpg");
        assert!((ratio(&placed[0].image) - 1000.0 / 600.0).abs() < EPS);
    }

    // =========================================================================
    // Horizontal stack
    // =========================================================================

    #[test]
    fn horizontal_stack_columns_and_captions() {
        let imgs: Vec<_> = (0..4)
            .map(|i| input(&format!("{i}.jpg"), Some((800, 1200))))
            .collect();
        let placed = place_horizontal_stack(content(), &imgs, 4);
        let cell_w = (13.0 - 0.3 * 3.0) / 4.0;
        for (i, p) in placed.iter().enumerate() {
            let x = 0.5 + i as f64 * (cell_w + 0.3);
            assert!(p.wrap_caption);
            assert!((p.caption.left - x).abs() < EPS);
            assert!((p.caption.top - (0.8 + 6.5 - 0.4)).abs() < EPS);
            assert!(p.image.width <= cell_w - 0.1 + EPS);
            assert!((ratio(&p.image) - 800.0 / 1200.0).abs() < EPS);
        }
        assert_eq!(placed[0].caption_text, "0.jpg - (800x1200)");
    }

    #[test]
    fn horizontal_stack_single_image_uses_full_width_cell() {
        let placed = place_horizontal_stack(content(), &[input("t.jpg", Some((400, 1600)))], 4);
        let img = placed[0].image;
        assert!((img.height - 6.1).abs() < EPS);
        assert!((img.left + img.width / 2.0 - (0.5 + 6.5)).abs() < EPS);
    }

    #[test]
    fn placements_stay_inside_content() {
        let imgs: Vec<_> = [(100, 1000), (1000, 100), (1000, 1000), (1, 1)]
            .into_iter()
            .map(|d| input("i.jpg", Some(d)))
            .collect();
        for kind in [LayoutKind::Grid, LayoutKind::VerticalStack, LayoutKind::HorizontalStack] {
            for p in place_images(kind, content(), &imgs, 4) {
                assert!(content().contains(&p.image), "{kind:?} {:?}", p.image);
            }
        }
    }

    #[test]
    fn capacity_fits_only_with_positive_image_area() {
        assert!(LayoutKind::VerticalStack.fits(content(), 3));
        assert!(LayoutKind::VerticalStack.fits(content(), 32));
        // 6.5 / 33 rows is under the 0.2in row gap.
        assert!(!LayoutKind::VerticalStack.fits(content(), 33));
        assert!(LayoutKind::HorizontalStack.fits(content(), 4));
        assert!(!LayoutKind::HorizontalStack.fits(content(), 40));
        assert!(LayoutKind::Grid.fits(content(), 100));
        assert!(!LayoutKind::Grid.fits(Rect::new(0.0, 0.0, 4.0, 0.7), 4));
    }

    // =========================================================================
    // Cover page
    // =========================================================================

    fn slide(breadcrumb: &str, n: usize) -> SlideSpec {
        SlideSpec {
            title: breadcrumb.into(),
            breadcrumb: breadcrumb.into(),
            images: (0..n).map(|i| PathBuf::from(format!("{i}.jpg"))).collect(),
            layout: Orientation::Square,
        }
    }

    #[test]
    fn cover_counts_first_level() {
        let slides = vec![slide("b / x", 2), slide("a", 3), slide("b", 1)];
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let cover = cover_page(&slides, date);
        assert_eq!(cover.groups, vec![("a".to_string(), 3), ("b".to_string(), 3)]);
        assert_eq!(cover.total, 6);
        assert_eq!(cover.date_line, "Date: 2024-05-01");
        assert_eq!(cover.columns.len(), 1);
        assert_eq!(cover.columns[0].lines, vec!["a: 3 images", "b: 3 images"]);
        assert!((cover.groups_box.top - 1.9).abs() < EPS);
        assert!((cover.total_box.top - 6.2).abs() < EPS);
    }

    #[test]
    fn cover_column_choice() {
        assert_eq!(cover_columns(6), (1, 24));
        assert_eq!(cover_columns(7), (2, 24));
        assert_eq!(cover_columns(13), (3, 24));
        assert_eq!(cover_columns(18), (3, 24));
        // 27 lines → 9 rows → 5.4in needed → 24 * 4/5.4 ≈ 17.8pt
        assert_eq!(cover_columns(27), (3, 17));
        assert_eq!(cover_columns(300), (3, 12));
    }

    #[test]
    fn cover_splits_columns() {
        let slides: Vec<_> = (0..8).map(|i| slide(&format!("g{i}"), 1)).collect();
        let cover = cover_page(&slides, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(cover.columns.len(), 2);
        assert_eq!(cover.columns[0].lines.len(), 4);
        assert!((cover.columns[1].rect.left - (1.0 + 5.4 + 0.2)).abs() < EPS);
    }

    #[test]
    fn cover_empty_deck() {
        let cover = cover_page(&[], NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(cover.groups.is_empty());
        assert!(cover.columns.is_empty());
        assert_eq!(cover.total_line, "Total: 0 images");
    }
}
