//! CLI output formatting for scan, group, merge and job commands.
//!
//! Each command has a `format_*` function returning `Vec<String>` and a
//! `print_*` wrapper that writes to stdout. Format functions are pure so the
//! exact layout can be asserted in tests.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Scanned /photos (5 files)
//!     Images: 4
//!     Skipped: 1
//!     Headings: 3
//! Structure → out/deck_structure.md
//!     Previous: out/deck_structure[01].md
//! ```
//!
//! ## Group
//!
//! ```text
//! 001 a (2 images)
//!     001 1.jpg 1200x800 landscape
//!     002 2.jpg 3000x1000 landscape
//! ```
//!
//! ## Merge
//!
//! ```text
//! Deck → out/deck.html
//!     Sections: 2
//!     Slides: 5
//!     Images: 4
//! ```

use crate::grouping::ImageGroup;
use crate::jobs::{CleanupReport, Job};
use crate::pipeline::{MergeOutcome, ScanOutcome};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn previous_line(rotated: Option<&Path>) -> Option<String> {
    rotated.map(|p| format!("{}Previous: {}", indent(1), p.display()))
}

// ============================================================================
// Scan / group / merge
// ============================================================================

pub fn format_scan_output(outcome: &ScanOutcome) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Scanned {} ({})",
            outcome.root.display(),
            plural(outcome.files_found, "file")
        ),
        format!("{}Images: {}", indent(1), outcome.valid),
        format!("{}Skipped: {}", indent(1), outcome.skipped),
        format!("{}Headings: {}", indent(1), outcome.headings),
        format!("Structure → {}", outcome.structure_path.display()),
    ];
    lines.extend(previous_line(outcome.rotated.as_deref()));
    lines
}

pub fn print_scan_output(outcome: &ScanOutcome) {
    for line in format_scan_output(outcome) {
        println!("{}", line);
    }
}

pub fn format_groups(groups: &[ImageGroup]) -> Vec<String> {
    if groups.is_empty() {
        return vec!["No images found".to_string()];
    }
    let mut lines = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            group.name,
            plural(group.images.len(), "image")
        ));
        for (j, image) in group.images.iter().enumerate() {
            let orientation = image.orientation.map(|o| o.as_str()).unwrap_or_default();
            lines.push(format!(
                "{}{} {} {} {}",
                indent(1),
                format_index(j + 1),
                image.name,
                image.size_label(),
                orientation
            ));
        }
    }
    lines
}

pub fn print_groups(groups: &[ImageGroup]) {
    for line in format_groups(groups) {
        println!("{}", line);
    }
}

pub fn format_merge_output(outcome: &MergeOutcome) -> Vec<String> {
    let mut lines = vec![
        format!("Deck → {}", outcome.deck_path.display()),
        format!("{}Sections: {}", indent(1), outcome.sections),
        format!("{}Slides: {}", indent(1), outcome.slides),
        format!("{}Images: {}", indent(1), outcome.images),
    ];
    if outcome.unreadable > 0 {
        lines.push(format!(
            "{}Unreadable: {} (placed with default size)",
            indent(1),
            outcome.unreadable
        ));
    }
    lines.extend(previous_line(outcome.rotated.as_deref()));
    lines
}

pub fn print_merge_output(outcome: &MergeOutcome) {
    for line in format_merge_output(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Jobs
// ============================================================================

pub fn format_job(job: &Job) -> Vec<String> {
    let mut lines = vec![
        format!("{} [{}]", job.id, job.status),
        format!("{}Directory: {}", indent(1), job.directory.display()),
        format!("{}Target: {}", indent(1), job.filename),
        format!("{}Created: {}", indent(1), timestamp(&job.created_at)),
        format!("{}Updated: {}", indent(1), timestamp(&job.updated_at)),
    ];
    if let Some(message) = &job.message {
        lines.push(format!("{}Message: {}", indent(1), message));
    }
    for (key, path) in &job.artifacts {
        lines.push(format!("{}{}: {}", indent(1), key, path.display()));
    }
    lines
}

pub fn print_job(job: &Job) {
    for line in format_job(job) {
        println!("{}", line);
    }
}

pub fn format_job_list(jobs: &[Job]) -> Vec<String> {
    if jobs.is_empty() {
        return vec!["No jobs".to_string()];
    }
    jobs.iter()
        .enumerate()
        .map(|(i, job)| {
            format!(
                "{} {} {:<10} {} ({})",
                format_index(i + 1),
                job.id,
                job.status.as_str(),
                job.filename,
                timestamp(&job.created_at)
            )
        })
        .collect()
}

pub fn print_job_list(jobs: &[Job]) {
    for line in format_job_list(jobs) {
        println!("{}", line);
    }
}

pub fn format_cleanup(report: &CleanupReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Removed {} ({} bytes)",
        plural(report.deleted.len(), "job"),
        report.total_bytes
    )];
    for (status, count) in &report.deleted_by_status {
        lines.push(format!("{}{}: {}", indent(1), status, count));
    }
    for error in &report.errors {
        lines.push(format!("{}Error: {}", indent(1), error));
    }
    lines
}

pub fn print_cleanup(report: &CleanupReport) {
    for line in format_cleanup(report) {
        println!("{}", line);
    }
}
