//! Job tracking for long-running scan/merge work.
//!
//! A job ties an image directory and a target name to the artifacts produced
//! for it, and moves through a fixed lifecycle:
//!
//! ```text
//! uploaded → analyzing → analyzed → generating → completed
//!                 ↘           ↘            ↘
//!                  failed      (rescan)      failed
//! ```
//!
//! Persistence is behind the [`JobStore`] trait. [`FsJobStore`] keeps one
//! directory per job with a `job.json` record and the generated files:
//!
//! ```text
//! .photodeck-jobs/
//! └── 3f2a…c9/
//!     ├── job.json
//!     ├── deck_structure.md
//!     └── deck.html
//! ```
//!
//! [`MemoryJobStore`] keeps records in memory and only writes artifacts.
//! Old jobs are removed by [`cleanup_expired`] according to a
//! [`RetentionPolicy`].

use crate::config::{AppConfig, JobsConfig};
use crate::deck::DeckFormat;
use crate::imaging::ImageBackend;
use crate::pipeline::{self, MergeRequest, PipelineError, ScanRequest};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;
use walkdir::WalkDir;

const JOB_FILE: &str = "job.json";

/// Artifact key for the structure document.
pub const STRUCTURE_ARTIFACT: &str = "structure";
/// Artifact key for the deck.
pub const DECK_ARTIFACT: &str = "deck";

#[derive(Error, Debug)]
pub enum JobError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Job '{0}' not found")]
    NotFound(String),
    #[error("Job '{id}' is {status}; cannot {action}")]
    InvalidState {
        id: String,
        status: JobStatus,
        action: &'static str,
    },
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Uploaded,
    Analyzing,
    Analyzed,
    Generating,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Uploaded => "uploaded",
            JobStatus::Analyzing => "analyzing",
            JobStatus::Analyzed => "analyzed",
            JobStatus::Generating => "generating",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// A scan or merge is currently running.
    pub fn is_busy(self) -> bool {
        matches!(self, JobStatus::Analyzing | JobStatus::Generating)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    /// Target deck name inside the job's output directory.
    pub filename: String,
    /// Image root.
    pub directory: PathBuf,
    pub md_path: Option<PathBuf>,
    pub status: JobStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub artifacts: BTreeMap<String, PathBuf>,
}

impl Job {
    pub fn new(filename: &str, directory: PathBuf, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            filename: filename.to_string(),
            directory,
            md_path: None,
            status: JobStatus::Uploaded,
            message: None,
            created_at: now,
            updated_at: now,
            artifacts: BTreeMap::new(),
        }
    }

    /// File name of an artifact, without its directory.
    pub fn artifact_filename(&self, key: &str) -> Option<String> {
        self.artifacts
            .get(key)
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    fn fail(&mut self, message: String) {
        self.status = JobStatus::Failed;
        self.message = Some(message);
    }
}

/// Persistence for [`Job`] records.
///
/// `save` stamps `updated_at`. Implementations must be safe to share
/// between threads running different jobs.
pub trait JobStore: Send + Sync {
    /// Create and persist a new job in `Uploaded` state.
    fn create(&self, filename: &str, directory: PathBuf) -> Result<Job, JobError>;
    fn load(&self, id: &str) -> Result<Job, JobError>;
    fn save(&self, job: &mut Job) -> Result<(), JobError>;
    /// All jobs, newest first.
    fn list(&self) -> Result<Vec<Job>, JobError>;
    /// Remove the job and everything it produced.
    fn delete(&self, id: &str) -> Result<(), JobError>;
    /// Directory for the job's generated files.
    fn output_dir(&self, id: &str) -> PathBuf;

    /// Bytes used by the job's files.
    fn disk_usage(&self, id: &str) -> u64 {
        dir_size(&self.output_dir(id))
    }
}

fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

fn newest_first(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

// ============================================================================
// Filesystem store
// ============================================================================

/// One directory per job under `root`, holding `job.json` and artifacts.
pub struct FsJobStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FsJobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn job_file(&self, id: &str) -> PathBuf {
        self.output_dir(id).join(JOB_FILE)
    }

    fn write(&self, job: &Job) -> Result<(), JobError> {
        let dir = self.output_dir(&job.id);
        fs::create_dir_all(&dir)?;
        let json = serde_json::to_string_pretty(job)?;
        let tmp = dir.join(format!("{JOB_FILE}.tmp"));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, dir.join(JOB_FILE))?;
        Ok(())
    }

    fn read(&self, id: &str) -> Result<Job, JobError> {
        let path = self.job_file(id);
        if !path.is_file() {
            return Err(JobError::NotFound(id.to_string()));
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

impl JobStore for FsJobStore {
    fn create(&self, filename: &str, directory: PathBuf) -> Result<Job, JobError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let job = Job::new(filename, directory, Utc::now());
        self.write(&job)?;
        log::info!("Created job {}", job.id);
        Ok(job)
    }

    fn load(&self, id: &str) -> Result<Job, JobError> {
        self.read(id)
    }

    fn save(&self, job: &mut Job) -> Result<(), JobError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        job.updated_at = Utc::now();
        self.write(job)
    }

    fn list(&self) -> Result<Vec<Job>, JobError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut jobs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().into_owned();
            match self.read(&id) {
                Ok(job) => jobs.push(job),
                Err(JobError::NotFound(_)) => {}
                Err(e) => log::debug!("Skipping job {id}: {e}"),
            }
        }
        newest_first(&mut jobs);
        Ok(jobs)
    }

    fn delete(&self, id: &str) -> Result<(), JobError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let dir = self.output_dir(id);
        if !dir.is_dir() {
            return Err(JobError::NotFound(id.to_string()));
        }
        fs::remove_dir_all(dir)?;
        Ok(())
    }

    fn output_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Records in memory; artifacts are still written under `output_root`.
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<String, Job>>,
    output_root: PathBuf,
}

impl MemoryJobStore {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            output_root: output_root.into(),
        }
    }

    /// Insert a record as-is, keeping its timestamps.
    pub fn insert(&self, job: Job) {
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(job.id.clone(), job);
    }
}

impl JobStore for MemoryJobStore {
    fn create(&self, filename: &str, directory: PathBuf) -> Result<Job, JobError> {
        let job = Job::new(filename, directory, Utc::now());
        self.insert(job.clone());
        Ok(job)
    }

    fn load(&self, id: &str) -> Result<Job, JobError> {
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    fn save(&self, job: &mut Job) -> Result<(), JobError> {
        job.updated_at = Utc::now();
        self.insert(job.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<Job>, JobError> {
        let mut jobs: Vec<Job> = self
            .jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        newest_first(&mut jobs);
        Ok(jobs)
    }

    fn delete(&self, id: &str) -> Result<(), JobError> {
        let removed = self
            .jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
        if removed.is_none() {
            return Err(JobError::NotFound(id.to_string()));
        }
        let dir = self.output_dir(id);
        if dir.is_dir() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }

    fn output_dir(&self, id: &str) -> PathBuf {
        self.output_root.join(id)
    }
}

// ============================================================================
// Running jobs
// ============================================================================

fn target_for(store: &dyn JobStore, job: &Job) -> PathBuf {
    store.output_dir(&job.id).join(&job.filename)
}

/// Run `scan` for a job: `analyzing`, then `analyzed` or `failed`.
pub fn run_scan_job(
    store: &dyn JobStore,
    id: &str,
    config: &AppConfig,
    backend: &impl ImageBackend,
) -> Result<Job, JobError> {
    let mut job = store.load(id)?;
    if job.status.is_busy() {
        return Err(JobError::InvalidState {
            id: job.id,
            status: job.status,
            action: "scan",
        });
    }
    job.status = JobStatus::Analyzing;
    job.message = None;
    store.save(&mut job)?;

    let mut request = ScanRequest::new(&job.directory, target_for(store, &job));
    request.config_source = "job".to_string();
    match pipeline::scan(&request, config, backend) {
        Ok(outcome) => {
            job.md_path = Some(outcome.structure_path.clone());
            job.artifacts
                .insert(STRUCTURE_ARTIFACT.to_string(), outcome.structure_path);
            job.status = JobStatus::Analyzed;
            job.message = Some(format!(
                "{} images, {} skipped",
                outcome.valid, outcome.skipped
            ));
            store.save(&mut job)?;
            Ok(job)
        }
        Err(e) => {
            log::warn!("Job {} scan failed: {e}", job.id);
            job.fail(format!("scan failed: {e}"));
            store.save(&mut job)?;
            Err(e.into())
        }
    }
}

/// Run `merge` for an analyzed job: `generating`, then `completed` or `failed`.
pub fn run_merge_job(
    store: &dyn JobStore,
    id: &str,
    config: &AppConfig,
    backend: &impl ImageBackend,
    date: NaiveDate,
) -> Result<Job, JobError> {
    let mut job = store.load(id)?;
    let analyzed = job.md_path.as_ref().is_some_and(|p| p.is_file());
    if job.status.is_busy() || !analyzed {
        return Err(JobError::InvalidState {
            id: job.id,
            status: job.status,
            action: "merge",
        });
    }
    job.status = JobStatus::Generating;
    job.message = None;
    store.save(&mut job)?;

    let target = target_for(store, &job);
    let writer = DeckFormat::from_path(&pipeline::deck_path_for(&target)).writer();
    let request = MergeRequest {
        directory: job.directory.clone(),
        filename: target,
        date,
    };
    match pipeline::merge(&request, config, backend, writer.as_ref()) {
        Ok(outcome) => {
            job.artifacts
                .insert(DECK_ARTIFACT.to_string(), outcome.deck_path);
            job.status = JobStatus::Completed;
            job.message = Some(format!(
                "{} slides, {} images",
                outcome.slides, outcome.images
            ));
            store.save(&mut job)?;
            Ok(job)
        }
        Err(e) => {
            log::warn!("Job {} merge failed: {e}", job.id);
            job.fail(format!("merge failed: {e}"));
            store.save(&mut job)?;
            Err(e.into())
        }
    }
}

// ============================================================================
// Retention
// ============================================================================

/// How long jobs are kept, in hours. Non-positive values keep jobs forever.
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionPolicy {
    pub default_hours: f64,
    pub by_status: BTreeMap<JobStatus, f64>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from(&JobsConfig::default())
    }
}

impl From<&JobsConfig> for RetentionPolicy {
    fn from(config: &JobsConfig) -> Self {
        let mut by_status = BTreeMap::new();
        if let Some(hours) = config.retention_completed {
            by_status.insert(JobStatus::Completed, hours);
        }
        if let Some(hours) = config.retention_failed {
            by_status.insert(JobStatus::Failed, hours);
        }
        Self {
            default_hours: config.retention_hours,
            by_status,
        }
    }
}

impl RetentionPolicy {
    /// Retention for a status; `None` means keep forever.
    pub fn hours_for(&self, status: JobStatus) -> Option<f64> {
        if self.default_hours <= 0.0 {
            return None;
        }
        let hours = self
            .by_status
            .get(&status)
            .copied()
            .unwrap_or(self.default_hours);
        (hours > 0.0).then_some(hours)
    }
}

/// Jobs created before their status's retention window.
///
/// A window reaching past the representable date range never expires.
pub fn expired_jobs<'a>(
    jobs: &'a [Job],
    now: DateTime<Utc>,
    policy: &RetentionPolicy,
) -> Vec<&'a Job> {
    jobs.iter()
        .filter(|job| {
            policy.hours_for(job.status).is_some_and(|hours| {
                Duration::try_milliseconds((hours * 3_600_000.0) as i64)
                    .and_then(|window| now.checked_sub_signed(window))
                    .is_some_and(|cutoff| job.created_at < cutoff)
            })
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    pub deleted_by_status: BTreeMap<JobStatus, usize>,
    pub total_bytes: u64,
    pub errors: Vec<String>,
}

/// Delete expired jobs. Individual failures are collected, not fatal.
pub fn cleanup_expired(
    store: &dyn JobStore,
    now: DateTime<Utc>,
    policy: &RetentionPolicy,
) -> Result<CleanupReport, JobError> {
    let jobs = store.list()?;
    let mut report = CleanupReport::default();
    for job in expired_jobs(&jobs, now, policy) {
        let bytes = store.disk_usage(&job.id);
        match store.delete(&job.id) {
            Ok(()) => {
                report.deleted.push(job.id.clone());
                *report.deleted_by_status.entry(job.status).or_default() += 1;
                report.total_bytes += bytes;
            }
            Err(e) => {
                log::warn!("Failed to delete job '{}': {e}", job.id);
                report
                    .errors
                    .push(format!("Failed to delete job '{}': {e}", job.id));
            }
        }
    }
    if !report.deleted.is_empty() {
        log::info!("Removed {} expired jobs", report.deleted.len());
    }
    Ok(report)
}
