//! Deck assembly and writers.
//!
//! A [`Deck`] is the fully placed result of `merge`: slide size, fonts, an
//! optional cover page and one [`PlacedSlide`] per [`SlideSpec`]. Writers
//! turn it into a file:
//!
//! - [`HtmlDeckWriter`]: a single self-contained HTML page with one
//!   absolutely positioned `<section>` per slide, lengths in inches and font
//!   sizes in points, so it prints one slide per page.
//! - [`JsonDeckWriter`]: the placement plan as pretty-printed JSON, for
//!   feeding another renderer.
//!
//! The format is picked from the output extension with [`DeckFormat::from_path`].
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Base styles live in `static/deck.css` and are embedded at compile time.

use crate::layout::{
    Capacities, CoverPage, DimensionMap, ImageInput, LayoutKind, Placement, Rect, SlideSize,
    SlideSpec, place_images,
};
use crate::orientation::Orientation;
use maud::{DOCTYPE, Markup, html};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

const CSS: &str = include_str!("../static/deck.css");

/// Font face and size in points. No name means the renderer default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontSpec {
    pub name: Option<String>,
    pub size_pt: u32,
}

impl FontSpec {
    pub fn new(name: &str, size_pt: u32) -> Self {
        let name = name.trim();
        Self {
            name: (!name.is_empty()).then(|| name.to_string()),
            size_pt,
        }
    }

    fn css(&self) -> String {
        match &self.name {
            Some(name) => format!(
                "font-size:{}pt;font-family:'{}'",
                self.size_pt,
                name.replace('\'', "")
            ),
            None => format!("font-size:{}pt", self.size_pt),
        }
    }
}

/// Geometry and fonts shared by every slide.
#[derive(Debug, Clone)]
pub struct DeckSettings {
    pub slide_size: SlideSize,
    pub title_box: Rect,
    pub content_box: Rect,
    pub title_font: FontSpec,
    pub content_font: FontSpec,
    pub capacities: Capacities,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedSlide {
    pub title: String,
    pub breadcrumb: String,
    pub layout: Orientation,
    pub kind: LayoutKind,
    pub title_box: Rect,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Deck {
    pub slide_size: SlideSize,
    pub title_font: FontSpec,
    pub content_font: FontSpec,
    pub cover: Option<CoverPage>,
    pub slides: Vec<PlacedSlide>,
}

impl Deck {
    /// Place every slide's images into the content box.
    pub fn assemble(
        specs: &[SlideSpec],
        dimensions: &DimensionMap,
        settings: &DeckSettings,
        cover: Option<CoverPage>,
    ) -> Self {
        let slides = specs
            .iter()
            .map(|spec| {
                let kind = LayoutKind::for_orientation(spec.layout);
                let inputs: Vec<ImageInput> = spec
                    .images
                    .iter()
                    .map(|p| ImageInput::from_path(p, dimensions))
                    .collect();
                let placements = place_images(
                    kind,
                    settings.content_box,
                    &inputs,
                    settings.capacities.for_orientation(spec.layout),
                );
                log::debug!("{}: {} images as {:?}", spec.title, placements.len(), kind);
                PlacedSlide {
                    title: spec.title.clone(),
                    breadcrumb: spec.breadcrumb.clone(),
                    layout: spec.layout,
                    kind,
                    title_box: settings.title_box,
                    placements,
                }
            })
            .collect();

        Self {
            slide_size: settings.slide_size,
            title_font: settings.title_font.clone(),
            content_font: settings.content_font.clone(),
            cover,
            slides,
        }
    }

    /// Slides including the cover page.
    pub fn page_count(&self) -> usize {
        self.slides.len() + usize::from(self.cover.is_some())
    }

    pub fn image_count(&self) -> usize {
        self.slides.iter().map(|s| s.placements.len()).sum()
    }
}

/// Renders a [`Deck`] to a file.
pub trait DeckWriter {
    fn write(&self, deck: &Deck, path: &Path) -> Result<(), DeckError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckFormat {
    Html,
    Json,
}

impl DeckFormat {
    /// `.json` selects JSON, anything else HTML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DeckFormat::Json,
            _ => DeckFormat::Html,
        }
    }

    pub fn writer(self) -> Box<dyn DeckWriter> {
        match self {
            DeckFormat::Html => Box::new(HtmlDeckWriter),
            DeckFormat::Json => Box::new(JsonDeckWriter),
        }
    }
}

fn ensure_parent(path: &Path) -> Result<(), DeckError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes the placement plan as JSON.
pub struct JsonDeckWriter;

impl DeckWriter for JsonDeckWriter {
    fn write(&self, deck: &Deck, path: &Path) -> Result<(), DeckError> {
        ensure_parent(path)?;
        fs::write(path, serde_json::to_string_pretty(deck)?)?;
        Ok(())
    }
}

/// Writes a printable HTML deck.
pub struct HtmlDeckWriter;

impl DeckWriter for HtmlDeckWriter {
    fn write(&self, deck: &Deck, path: &Path) -> Result<(), DeckError> {
        ensure_parent(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        fs::write(path, render_deck(deck, base).into_string())?;
        Ok(())
    }
}

// ============================================================================
// HTML Components
// ============================================================================

fn position(rect: &Rect) -> String {
    format!(
        "left:{:.3}in;top:{:.3}in;width:{:.3}in;height:{:.3}in",
        rect.left, rect.top, rect.width, rect.height
    )
}

/// Image `src` relative to the deck file when possible.
fn image_src(image: &Path, base: &Path) -> String {
    let rel: PathBuf = match image.strip_prefix(base) {
        Ok(rel) if !base.as_os_str().is_empty() => rel.to_path_buf(),
        _ => image.to_path_buf(),
    };
    rel.to_string_lossy().replace('\\', "/")
}

fn base_document(title: &str, size: SlideSize, content: Markup) -> Markup {
    let page = format!(
        ":root{{--slide-w:{}in;--slide-h:{}in}}@page{{size:{}in {}in;margin:0}}",
        size.width, size.height, size.width, size.height
    );
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (CSS) (page) }
            }
            body {
                (content)
            }
        }
    }
}

fn render_cover(cover: &CoverPage, font: &FontSpec) -> Markup {
    let family = FontSpec {
        name: font.name.clone(),
        size_pt: cover.font_size,
    };
    let groups_font = FontSpec {
        name: font.name.clone(),
        size_pt: cover.group_font_size,
    };
    html! {
        section.slide.cover {
            div.text-box.date style={ (position(&cover.date_box)) ";" (family.css()) } {
                (cover.date_line)
            }
            @for column in &cover.columns {
                div.text-box.groups style={ (position(&column.rect)) ";" (groups_font.css()) } {
                    @for line in &column.lines {
                        div.group-line { (line) }
                    }
                }
            }
            div.text-box.total style={ (position(&cover.total_box)) ";" (family.css()) } {
                (cover.total_line)
            }
        }
    }
}

fn render_slide(slide: &PlacedSlide, deck: &Deck, base: &Path) -> Markup {
    html! {
        section.slide data-layout=(slide.layout.as_str()) {
            h2.slide-title style={ (position(&slide.title_box)) ";" (deck.title_font.css()) } {
                (slide.title)
            }
            @for p in &slide.placements {
                img.slide-image
                    src=(image_src(&p.path, base))
                    alt=(p.caption_text)
                    style=(position(&p.image));
                div class=(if p.wrap_caption { "caption wrap" } else { "caption" })
                    style={ (position(&p.caption)) ";" (deck.content_font.css()) } {
                    (p.caption_text)
                }
            }
        }
    }
}

/// Render the whole deck; image paths are made relative to `base`.
pub fn render_deck(deck: &Deck, base: &Path) -> Markup {
    let title = deck
        .slides
        .first()
        .map(|s| s.breadcrumb.as_str())
        .unwrap_or("photodeck");
    let content = html! {
        @if let Some(cover) = &deck.cover {
            (render_cover(cover, &deck.content_font))
        }
        @for slide in &deck.slides {
            (render_slide(slide, deck, base))
        }
    };
    base_document(title, deck.slide_size, content)
}
