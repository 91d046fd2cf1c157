//! Scan and merge orchestration.
//!
//! ```text
//! 1. Scan                     2. (edit)               3. Merge
//! ┌──────────────┐            ┌──────────────┐        ┌──────────────┐
//! │ image dir    │ → probe →  │ <name>_      │ → read │ <name>.html  │
//! │              │   build    │ structure.md │  plan  │ or .json     │
//! └──────────────┘            └──────────────┘  place └──────────────┘
//! ```
//!
//! `scan` enumerates and probes images, builds the heading hierarchy and
//! writes the structure document. `merge` reads it back, re-probes every
//! image, splits sections by orientation, paginates, places and writes the
//! deck. Both rotate an existing output file instead of overwriting it.

use crate::config::{AppConfig, ConfigError};
use crate::deck::{Deck, DeckError, DeckSettings, DeckWriter};
use crate::grouping::{self, GroupingStrategy, ImageGroup};
use crate::imaging::ImageBackend;
use crate::layout::{DimensionMap, cover_page, plan_slides};
use crate::rotation::rotate_if_exists;
use crate::scan::{self, ScanError};
use crate::structure::{self, StructureError};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions stripped from the target name before deriving output paths.
const DECK_EXTENSIONS: &[&str] = &["html", "json", "pptx"];

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Structure(#[from] StructureError),
    #[error("Deck error: {0}")]
    Deck(#[from] DeckError),
    #[error("Structure file not found: {0}")]
    StructureNotFound(PathBuf),
}

fn deck_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .filter(|e| DECK_EXTENSIONS.contains(&e.as_str()))
}

fn target_stem(base: &Path) -> PathBuf {
    if deck_extension(base).is_some() {
        base.with_extension("")
    } else {
        base.to_path_buf()
    }
}

/// `<name>_structure.md` next to the target (`out.html` → `out_structure.md`).
pub fn structure_path_for(base: &Path) -> PathBuf {
    let stem = target_stem(base);
    let name = stem
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.with_file_name(format!("{name}_structure.md"))
}

/// Deck output path: kept as-is for `.html`/`.json`, otherwise `.html`.
pub fn deck_path_for(base: &Path) -> PathBuf {
    match deck_extension(base).as_deref() {
        Some("html") | Some("json") => base.to_path_buf(),
        _ => {
            let stem = target_stem(base);
            let mut name = stem.into_os_string();
            name.push(".html");
            PathBuf::from(name)
        }
    }
}

/// Canonical image root; a missing path is a user-facing error.
fn resolve_root(directory: &Path) -> Result<PathBuf, PipelineError> {
    if !directory.exists() {
        return Err(ScanError::RootNotFound(directory.to_path_buf()).into());
    }
    Ok(fs::canonicalize(directory)?)
}

// ============================================================================
// Scan
// ============================================================================

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub directory: PathBuf,
    /// Target deck name; the structure document path is derived from it.
    pub filename: PathBuf,
    /// Overrides `scan.recursive`.
    pub recursive: Option<bool>,
    /// Overrides `scan.formats`.
    pub formats: Option<Vec<String>>,
    /// Where the config came from, recorded in the `ini:` block.
    pub config_source: String,
}

impl ScanRequest {
    pub fn new(directory: impl Into<PathBuf>, filename: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            filename: filename.into(),
            recursive: None,
            formats: None,
            config_source: "defaults".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub structure_path: PathBuf,
    /// Where a previous structure document was moved, if any.
    pub rotated: Option<PathBuf>,
    pub root: PathBuf,
    pub files_found: usize,
    pub valid: usize,
    pub skipped: usize,
    pub headings: usize,
}

/// Scan `directory` and write the structure document.
pub fn scan(
    request: &ScanRequest,
    config: &AppConfig,
    backend: &impl ImageBackend,
) -> Result<ScanOutcome, PipelineError> {
    let root = resolve_root(&request.directory)?;
    let recursive = request.recursive.unwrap_or(config.scan.recursive);
    let extensions: Vec<String> = match &request.formats {
        Some(formats) => formats
            .iter()
            .map(|f| f.trim().trim_start_matches('.').to_lowercase())
            .filter(|f| !f.is_empty())
            .collect(),
        None => config.extensions(),
    };
    let extensions = scan::decodable_extensions(extensions);

    let files = scan::find_images(&root, recursive, &extensions)?;
    let records = scan::probe_all(backend, &files);
    let document = structure::build(
        &records,
        &root,
        config.grouping.max_levels,
        &config.grouping.filename_separator,
        config.summary_lines(&request.config_source),
    );

    let structure_path = structure_path_for(&request.filename);
    let rotated = rotate_if_exists(&structure_path)?;
    document.write_to(&structure_path)?;
    log::info!(
        "Wrote {} ({} images, {} headings)",
        structure_path.display(),
        document.item_count(),
        document.heading_count()
    );

    Ok(ScanOutcome {
        structure_path,
        rotated,
        root,
        files_found: records.len(),
        valid: document.item_count(),
        skipped: document.skipped.len(),
        headings: document.heading_count(),
    })
}

// ============================================================================
// Merge
// ============================================================================

#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub directory: PathBuf,
    /// Target deck name, also used to find the structure document.
    pub filename: PathBuf,
    /// Date printed on the cover page.
    pub date: NaiveDate,
}

impl MergeRequest {
    /// Request dated today (local time).
    pub fn new(directory: impl Into<PathBuf>, filename: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            filename: filename.into(),
            date: chrono::Local::now().date_naive(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub deck_path: PathBuf,
    pub rotated: Option<PathBuf>,
    pub sections: usize,
    /// Slides including the cover page.
    pub slides: usize,
    pub images: usize,
    /// Images placed with fallback dimensions.
    pub unreadable: usize,
}

fn deck_settings(config: &AppConfig) -> DeckSettings {
    let slide_size = config.deck.slide_size();
    DeckSettings {
        slide_size,
        title_box: config.title.rect(),
        content_box: config.content.rect_on(slide_size),
        title_font: config.title.font(),
        content_font: config.content.font(),
        capacities: config.deck.capacities(),
    }
}

/// Read the structure document for `request.filename` and write the deck.
pub fn merge(
    request: &MergeRequest,
    config: &AppConfig,
    backend: &impl ImageBackend,
    writer: &dyn DeckWriter,
) -> Result<MergeOutcome, PipelineError> {
    let root = resolve_root(&request.directory)?;
    let structure_path = structure_path_for(&request.filename);
    if !structure_path.is_file() {
        return Err(PipelineError::StructureNotFound(structure_path));
    }
    let sections = structure::load(&structure_path)?;
    log::info!(
        "Read {} sections from {}",
        sections.len(),
        structure_path.display()
    );

    let unique: BTreeSet<PathBuf> = sections
        .iter()
        .flat_map(|s| s.images.iter().map(|p| root.join(p)))
        .collect();
    let paths: Vec<PathBuf> = unique.into_iter().collect();
    let records = scan::probe_all(backend, &paths);
    let dimensions: DimensionMap = records
        .iter()
        .filter_map(|r| r.dimensions().map(|d| (r.path.clone(), d)))
        .collect();

    let fallback_title = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());
    let specs = plan_slides(
        &sections,
        &root,
        &dimensions,
        &config.deck.capacities(),
        &config.deck.thresholds(),
        &fallback_title,
    );
    let cover = config
        .deck
        .cover_page
        .then(|| cover_page(&specs, request.date));
    let deck = Deck::assemble(&specs, &dimensions, &deck_settings(config), cover);

    let deck_path = deck_path_for(&request.filename);
    let rotated = rotate_if_exists(&deck_path)?;
    writer.write(&deck, &deck_path)?;
    log::info!("Wrote {} ({} slides)", deck_path.display(), deck.page_count());

    Ok(MergeOutcome {
        deck_path,
        rotated,
        sections: sections.len(),
        slides: deck.page_count(),
        images: deck.image_count(),
        unreadable: records.iter().filter(|r| !r.valid).count(),
    })
}

// ============================================================================
// Group
// ============================================================================

/// Scan and group `directory` with the configured or overridden strategy.
pub fn group(
    directory: &Path,
    config: &AppConfig,
    backend: &impl ImageBackend,
    strategy: Option<GroupingStrategy>,
) -> Result<Vec<ImageGroup>, PipelineError> {
    let root = resolve_root(directory)?;
    let extensions = scan::decodable_extensions(config.extensions());
    let files = scan::find_images(&root, config.scan.recursive, &extensions)?;
    let records = scan::probe_all(backend, &files);
    let mut options = config.grouping_options();
    if let Some(strategy) = strategy {
        options.strategy = strategy;
    }
    Ok(grouping::group(&records, &root, &options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::JsonDeckWriter;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::touch;
    use tempfile::TempDir;

    /// Fixture tree with placeholder files and a mock backend answering for them.
    fn fixture() -> (TempDir, PathBuf, MockBackend) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("photos");
        let entries = [
            ("a/1.jpg", 1200, 800),
            ("a/2.jpg", 3000, 1000),
            ("b/x_1.jpg", 800, 1200),
            ("b/x_2.jpg", 1000, 1000),
        ];
        for (rel, _, _) in &entries {
            touch(&root, rel);
        }
        touch(&root, "b/broken.jpg");
        let root = fs::canonicalize(&root).unwrap();
        let backend = MockBackend::with_dimensions(
            entries
                .iter()
                .map(|(rel, w, h)| (root.join(rel), *w, *h))
                .collect(),
        );
        (tmp, root, backend)
    }

    // =========================================================================
    // Path helpers
    // =========================================================================

    #[test]
    fn structure_path_strips_deck_extension() {
        assert_eq!(structure_path_for(Path::new("out")), PathBuf::from("out_structure.md"));
        assert_eq!(
            structure_path_for(Path::new("d/out.pptx")),
            PathBuf::from("d/out_structure.md")
        );
        assert_eq!(
            structure_path_for(Path::new("d/out.html")),
            PathBuf::from("d/out_structure.md")
        );
        assert_eq!(
            structure_path_for(Path::new("trip.2024")),
            PathBuf::from("trip.2024_structure.md")
        );
    }

    #[test]
    fn deck_path_defaults_to_html() {
        assert_eq!(deck_path_for(Path::new("out")), PathBuf::from("out.html"));
        assert_eq!(deck_path_for(Path::new("out.json")), PathBuf::from("out.json"));
        assert_eq!(deck_path_for(Path::new("out.pptx")), PathBuf::from("out.html"));
        assert_eq!(deck_path_for(Path::new("trip.2024")), PathBuf::from("trip.2024.html"));
    }

    // =========================================================================
    // Scan
    // =========================================================================

    #[test]
    fn scan_writes_structure_document() {
        let (tmp, root, backend) = fixture();
        let target = tmp.path().join("out/deck");
        let outcome = scan(&ScanRequest::new(&root, &target), &AppConfig::default(), &backend).unwrap();

        assert_eq!(outcome.structure_path, tmp.path().join("out/deck_structure.md"));
        assert_eq!(outcome.files_found, 5);
        assert_eq!(outcome.valid, 4);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.rotated, None);

        let text = fs::read_to_string(&outcome.structure_path).unwrap();
        assert!(text.starts_with("# photodeck structure\n"));
        assert!(text.contains("\n# a\n"));
        assert!(text.contains("\n## x\n"));
        assert!(text.contains("- file: b/broken.jpg"));
        assert!(text.contains("- config = defaults"));
    }

    #[test]
    fn scan_rotates_previous_document() {
        let (tmp, root, backend) = fixture();
        let target = tmp.path().join("deck");
        let request = ScanRequest::new(&root, &target);
        scan(&request, &AppConfig::default(), &backend).unwrap();
        let second = scan(&request, &AppConfig::default(), &backend).unwrap();
        assert_eq!(second.rotated, Some(tmp.path().join("deck_structure[01].md")));
        assert!(second.structure_path.exists());
    }

    #[test]
    fn scan_missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        let request = ScanRequest::new(tmp.path().join("missing"), tmp.path().join("deck"));
        let result = scan(&request, &AppConfig::default(), &MockBackend::new());
        assert!(matches!(
            result,
            Err(PipelineError::Scan(ScanError::RootNotFound(_)))
        ));
    }

    #[test]
    fn scan_format_override() {
        let (tmp, root, backend) = fixture();
        touch(&root, "c/3.png");
        let mut request = ScanRequest::new(&root, tmp.path().join("deck"));
        request.formats = Some(vec![".PNG".to_string()]);
        let outcome = scan(&request, &AppConfig::default(), &backend).unwrap();
        assert_eq!(outcome.files_found, 1);
        assert_eq!(outcome.valid, 0);
    }

    #[test]
    fn scan_skips_formats_without_decoder() {
        let (tmp, root, backend) = fixture();
        touch(&root, "c/3.png");
        touch(&root, "c/4.heic");
        let mut request = ScanRequest::new(&root, tmp.path().join("deck"));
        request.formats = Some(vec!["png".to_string(), "heic".to_string()]);
        let outcome = scan(&request, &AppConfig::default(), &backend).unwrap();
        assert_eq!(outcome.files_found, 1);

        let text = fs::read_to_string(&outcome.structure_path).unwrap();
        assert!(text.contains("c/3.png"));
        assert!(!text.contains("4.heic"));
    }

    // =========================================================================
    // Merge
    // =========================================================================

    fn merge_request(root: &Path, target: &Path) -> MergeRequest {
        MergeRequest {
            directory: root.to_path_buf(),
            filename: target.to_path_buf(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }
    }

    #[test]
    fn merge_without_structure_is_error() {
        let (tmp, root, backend) = fixture();
        let result = merge(
            &merge_request(&root, &tmp.path().join("deck")),
            &AppConfig::default(),
            &backend,
            &JsonDeckWriter,
        );
        assert!(matches!(result, Err(PipelineError::StructureNotFound(_))));
    }

    #[test]
    fn merge_plans_slides_per_orientation() {
        let (tmp, root, backend) = fixture();
        let target = tmp.path().join("deck.json");
        scan(&ScanRequest::new(&root, &target), &AppConfig::default(), &backend).unwrap();

        let outcome = merge(
            &merge_request(&root, &target),
            &AppConfig::default(),
            &backend,
            &JsonDeckWriter,
        )
        .unwrap();
        assert_eq!(outcome.deck_path, target);
        assert_eq!(outcome.sections, 2);
        assert_eq!(outcome.images, 4);

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
        let titles: Vec<_> = value["slides"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["title"].as_str().unwrap().to_string())
            .collect();
        // a: 1200x800 is square by ratio, 3000x1000 landscape;
        // b / x: 800x1200 portrait, 1000x1000 square
        assert_eq!(titles, vec!["a", "a", "b / x", "b / x"]);
        let layouts: Vec<_> = value["slides"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["layout"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(layouts, vec!["landscape", "square", "portrait", "square"]);
        assert_eq!(value["cover"]["date_line"], "Date: 2024-05-01");
        assert_eq!(outcome.slides, 5);
    }

    #[test]
    fn merge_without_cover_page() {
        let (tmp, root, backend) = fixture();
        let target = tmp.path().join("deck.json");
        let mut config = AppConfig::default();
        config.deck.cover_page = false;
        scan(&ScanRequest::new(&root, &target), &config, &backend).unwrap();
        let outcome = merge(&merge_request(&root, &target), &config, &backend, &JsonDeckWriter).unwrap();
        assert_eq!(outcome.slides, 4);
    }

    #[test]
    fn merge_rotates_existing_deck() {
        let (tmp, root, backend) = fixture();
        let target = tmp.path().join("deck.json");
        scan(&ScanRequest::new(&root, &target), &AppConfig::default(), &backend).unwrap();
        fs::write(&target, "old").unwrap();

        let outcome = merge(
            &merge_request(&root, &target),
            &AppConfig::default(),
            &backend,
            &JsonDeckWriter,
        )
        .unwrap();
        let rotated = tmp.path().join("deck[01].json");
        assert_eq!(outcome.rotated, Some(rotated.clone()));
        assert_eq!(fs::read_to_string(rotated).unwrap(), "old");
    }

    #[test]
    fn default_layout_stays_on_slide() {
        use crate::layout::SlideSpec;
        use crate::orientation::Orientation;

        let mut dims = DimensionMap::new();
        let squares: Vec<PathBuf> = (0..4).map(|i| PathBuf::from(format!("/p/sq{i}.jpg"))).collect();
        for path in &squares {
            dims.insert(path.clone(), (1000, 1000));
        }
        dims.insert(PathBuf::from("/p/pano.jpg"), (10_000, 1000));
        let specs = vec![
            SlideSpec {
                title: "grid".into(),
                breadcrumb: "grid".into(),
                images: squares,
                layout: Orientation::Square,
            },
            SlideSpec {
                title: "pano".into(),
                breadcrumb: "pano".into(),
                images: vec![PathBuf::from("/p/pano.jpg")],
                layout: Orientation::Landscape,
            },
        ];

        let settings = deck_settings(&AppConfig::default());
        let deck = Deck::assemble(&specs, &dims, &settings, None);
        let width = deck.slide_size.width;
        for slide in &deck.slides {
            for p in &slide.placements {
                for rect in [p.image, p.caption] {
                    assert!(rect.left >= 0.0, "{rect:?} starts off the slide");
                    assert!(rect.right() <= width + 1e-9, "{rect:?} ends past {width}");
                }
            }
        }
        // Full-width caption under the panorama is centered.
        let caption = deck.slides[1].placements[0].caption;
        assert!((caption.left - (width - caption.right())).abs() < 1e-9);
    }

    #[test]
    fn merge_tolerates_unreadable_images() {
        let (tmp, root, backend) = fixture();
        let target = tmp.path().join("deck.json");
        fs::write(
            structure_path_for(&target),
            "# photodeck structure\n\n# gone\n- path: gone/1.jpg\n",
        )
        .unwrap();
        let outcome = merge(
            &merge_request(&root, &target),
            &AppConfig::default(),
            &backend,
            &JsonDeckWriter,
        )
        .unwrap();
        assert_eq!(outcome.unreadable, 1);
        assert_eq!(outcome.images, 1);
    }

    // =========================================================================
    // Group
    // =========================================================================

    #[test]
    fn group_uses_strategy_override() {
        let (_tmp, root, backend) = fixture();
        let groups = group(&root, &AppConfig::default(), &backend, None).unwrap();
        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let groups = group(
            &root,
            &AppConfig::default(),
            &backend,
            Some(GroupingStrategy::Filename),
        )
        .unwrap();
        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["1", "2", "x"]);
    }
}
