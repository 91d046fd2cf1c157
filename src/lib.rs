//! # photodeck
//!
//! Turns a directory of images into a slide deck. Directories and filename
//! prefixes become section headings, images are split by orientation and
//! laid out a few per slide.
//!
//! # Architecture: Two Commands With a Human in Between
//!
//! ```text
//! 1. Scan    photos/  →  deck_structure.md   (filesystem → editable outline)
//! 2. Merge   outline  →  deck.html           (outline → placed slides)
//! ```
//!
//! The structure document is plain markdown: headings for sections and one
//! record per image. Users reorder, delete or retitle entries between the
//! two steps, and `merge` follows whatever the document says.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the image root and probes dimensions in parallel |
//! | [`structure`] | Builds, renders and parses the structure document |
//! | [`grouping`] | Directory / filename / mixed grouping of probed images |
//! | [`layout`] | Slide planning, pagination, image placement, cover page |
//! | [`deck`] | Placed deck model and the HTML / JSON writers |
//! | [`pipeline`] | `scan`, `merge` and `group` orchestration |
//! | [`jobs`] | Tracked scan/merge jobs with persistent state and retention |
//! | [`config`] | `photodeck.toml` loading, merging and validation |
//! | [`orientation`] | Landscape / portrait / square classification |
//! | [`naming`] | Filename tokenising and relative-path helpers |
//! | [`rotation`] | `name[NN].ext` rotation of existing outputs |
//! | [`imaging`] | Dimension probing behind a backend trait, fit math |
//! | [`types`] | [`types::ImageRecord`], shared by scan, grouping and structure |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Header-Only Probing
//!
//! Layout only needs pixel dimensions, so images are never decoded. The
//! [`imaging::RustBackend`] reads headers through the `image` crate; tests
//! substitute a mock backend and never touch real image data.
//!
//! ## Self-Contained Output
//!
//! The HTML deck is a single file rendered with Maud. Slides are absolutely
//! positioned boxes measured in inches, so the page prints one slide per
//! sheet. Images are referenced by relative path and stay where they are.
//! The JSON writer emits the same placed deck for other renderers.
//!
//! ## Never Overwrite
//!
//! Both commands move an existing output aside (`deck[01].html`,
//! `deck[02].html`, …) before writing, so hand edits to a structure
//! document are never lost to a re-scan.

pub mod config;
pub mod deck;
pub mod grouping;
pub mod imaging;
pub mod jobs;
pub mod layout;
pub mod naming;
pub mod orientation;
pub mod output;
pub mod pipeline;
pub mod rotation;
pub mod scan;
pub mod structure;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
