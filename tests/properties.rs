//! Property tests for grouping, the structure document, pagination and
//! image placement.

use photodeck::config::AppConfig;
use photodeck::grouping::{self, GroupingOptions, GroupingStrategy};
use photodeck::layout::{ImageInput, LayoutKind, SlideSize, paginate, place_images};
use photodeck::structure::{self, Entry};
use photodeck::types::ImageRecord;
use proptest::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const ROOT: &str = "/photos";

/// Relative image paths drawn from a small alphabet so prefixes collide.
fn rel_paths() -> impl Strategy<Value = Vec<String>> {
    let dir = prop::sample::select(vec!["", "a/", "b/", "a/c/", "b/d/e/"]);
    let stem = prop::sample::select(vec!["x_1", "x_2", "y_1", "z", "x-y_3", "yy"]);
    let ext = prop::sample::select(vec!["jpg", "png"]);
    prop::collection::vec((dir, stem, ext), 0..24).prop_map(|parts| {
        let mut seen = HashSet::new();
        parts
            .into_iter()
            .map(|(d, s, e)| format!("{d}{s}.{e}"))
            .filter(|p| seen.insert(p.clone()))
            .collect()
    })
}

fn records(rels: &[String]) -> Vec<ImageRecord> {
    rels.iter()
        .enumerate()
        .map(|(i, rel)| {
            let path = Path::new(ROOT).join(rel);
            // Every fifth file is unreadable.
            if i % 5 == 4 {
                ImageRecord::invalid(path)
            } else {
                ImageRecord::new(path, 100 + i as u32, 80)
            }
        })
        .collect()
}

fn strategy() -> impl Strategy<Value = GroupingStrategy> {
    prop::sample::select(vec![
        GroupingStrategy::Directory,
        GroupingStrategy::Filename,
        GroupingStrategy::Mixed,
    ])
}

proptest! {
    #[test]
    fn grouping_partitions_valid_records(rels in rel_paths(), strategy in strategy()) {
        let records = records(&rels);
        let options = GroupingOptions { strategy, ..GroupingOptions::default() };
        let groups = grouping::group(&records, Path::new(ROOT), &options);

        let grouped: Vec<&PathBuf> = groups.iter().flat_map(|g| g.images.iter().map(|r| &r.path)).collect();
        let unique: HashSet<&PathBuf> = grouped.iter().copied().collect();
        let valid = records.iter().filter(|r| r.valid).count();
        prop_assert_eq!(grouped.len(), valid);
        prop_assert_eq!(unique.len(), valid);

        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        prop_assert_eq!(names, sorted);
        prop_assert!(groups.iter().all(|g| !g.images.is_empty()));
    }

    #[test]
    fn structure_round_trips_item_order(rels in rel_paths(), max_levels in 1usize..5) {
        let records = records(&rels);
        let doc = structure::build(&records, Path::new(ROOT), max_levels, "_", Vec::new());

        let items: Vec<String> = doc.entries.iter().filter_map(|e| match e {
            Entry::Item(item) => Some(item.path.clone()),
            Entry::Heading { .. } => None,
        }).collect();
        let parsed: Vec<String> = structure::parse(&doc.render())
            .into_iter()
            .flat_map(|s| s.images)
            .collect();
        prop_assert_eq!(parsed, items);
        prop_assert_eq!(doc.item_count() + doc.skipped.len(), records.len());
    }

    #[test]
    fn heading_depth_is_bounded(rels in rel_paths(), max_levels in 1usize..5) {
        let doc = structure::build(&records(&rels), Path::new(ROOT), max_levels, "_", Vec::new());
        for entry in &doc.entries {
            if let Entry::Heading { depth, label } = entry {
                prop_assert!(*depth >= 1 && *depth <= max_levels);
                prop_assert!(!label.is_empty());
            }
        }
    }

    #[test]
    fn lone_filename_tokens_get_no_heading(stem in "[a-z]{1,6}") {
        // Stems share no prefix and each token occurs once: only the directory heading.
        let records = vec![
            ImageRecord::new(format!("{ROOT}/only/{stem}_1.jpg"), 10, 10),
            ImageRecord::new(format!("{ROOT}/only/9_other.jpg"), 10, 10),
        ];
        let doc = structure::build(&records, Path::new(ROOT), 3, "_", Vec::new());
        let headings: Vec<&Entry> = doc.entries.iter().filter(|e| matches!(e, Entry::Heading { .. })).collect();
        let expected = Entry::Heading { depth: 1, label: "only".to_string() };
        prop_assert_eq!(headings, vec![&expected]);
    }

    #[test]
    fn pagination_preserves_items(items in prop::collection::vec(0u32..1000, 0..40), capacity in 0usize..6) {
        let pages = paginate(&items, capacity);
        let cap = capacity.max(1);
        prop_assert!(pages.iter().all(|p| !p.is_empty() && p.len() <= cap));
        prop_assert_eq!(pages.len(), items.len().div_ceil(cap));
        let flat: Vec<u32> = pages.into_iter().flatten().collect();
        prop_assert_eq!(flat, items);
    }

    #[test]
    fn placements_fit_and_keep_aspect(
        sizes in prop::collection::vec((1u32..5000, 0.1f64..10.0), 1..6),
        kind in prop::sample::select(vec![LayoutKind::Grid, LayoutKind::VerticalStack, LayoutKind::HorizontalStack]),
    ) {
        let config = AppConfig::default();
        let content = config.content.rect_on(config.deck.slide_size());
        let capacity = 4;
        let images: Vec<ImageInput> = sizes
            .iter()
            .enumerate()
            .map(|(i, (w, ratio))| {
                let h = ((*w as f64) / ratio).round().max(1.0) as u32;
                ImageInput {
                    path: PathBuf::from(format!("{i}.jpg")),
                    name: format!("{i}.jpg"),
                    dimensions: Some((*w, h)),
                }
            })
            .collect();

        let placements = place_images(kind, content, &images, capacity);
        prop_assert_eq!(placements.len(), images.len().min(capacity));
        for (p, input) in placements.iter().zip(&images) {
            prop_assert!(content.contains(&p.image), "{:?} outside {:?}", p.image, content);
            let (w, h) = input.dimensions.unwrap();
            let expected = w as f64 / h as f64;
            let actual = p.image.width / p.image.height;
            prop_assert!((actual - expected).abs() / expected < 1e-6);
        }
    }

    #[test]
    fn placements_stay_on_slide(
        sizes in prop::collection::vec((1u32..5000, 0.1f64..10.0), 1..6),
        kind in prop::sample::select(vec![LayoutKind::Grid, LayoutKind::VerticalStack, LayoutKind::HorizontalStack]),
        size in prop::sample::select(vec!["16:9", "4:3"]),
        content_width in 4.0f64..14.0,
        capacity in 1usize..5,
    ) {
        let mut config = AppConfig::default();
        config.deck.size = size.to_string();
        config.content.width = content_width;
        let slide: SlideSize = config.deck.slide_size();
        let content = config.content.rect_on(slide);
        let images: Vec<ImageInput> = sizes
            .iter()
            .enumerate()
            .map(|(i, (w, ratio))| ImageInput {
                path: PathBuf::from(format!("{i}.jpg")),
                name: format!("{i}.jpg"),
                dimensions: Some((*w, ((*w as f64) / ratio).round().max(1.0) as u32)),
            })
            .collect();

        for p in place_images(kind, content, &images, capacity) {
            for rect in [p.image, p.caption] {
                prop_assert!(rect.left >= -1e-9, "{:?} left of the slide", rect);
                prop_assert!(rect.right() <= slide.width + 1e-9, "{:?} past {}", rect, slide.width);
            }
        }
    }
}
