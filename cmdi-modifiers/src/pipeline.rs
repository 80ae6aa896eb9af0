//! Applying the configured modifiers to a stream of records.
//!
//! Records are processed one at a time: transformed, reported, optionally
//! saved as they were before modification, and uploaded when live.
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cmdi_record::Record;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::diff::{line_diff, DEFAULT_CONTEXT};
use crate::error::ModifierError;
use crate::identifier::IdentifierFormatError;
use crate::modifier::Modifier;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Replaces a record in the repository.
pub trait Uploader {
    fn replace_record(&self, pid: &str, record: &str) -> Result<(), UploadError>;
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    IdentifierFormat(#[from] IdentifierFormatError),
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Upload rejected: {0}")]
    Rejected(String),
    #[error("Request failed: {0}")]
    Transport(#[source] BoxError),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Cannot harvest records: {0}")]
    Harvest(#[source] BoxError),
    #[error("Cannot process record: {0}")]
    Record(#[from] cmdi_record::Error),
    #[error("Modifier \"{modifier}\" failed on {pid}: {source}")]
    Modifier {
        pid: String,
        modifier: String,
        source: ModifierError,
    },
    #[error("Cannot save original of {pid} to {path}: {source}")]
    Snapshot {
        pid: String,
        path: PathBuf,
        source: io::Error,
    },
    #[error("Cannot write report: {0}")]
    Report(#[from] io::Error),
}

/// How much is written to the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Upload progress only.
    #[default]
    Quiet,
    /// Also a diff of every modified record.
    Changes,
    /// Also a line for every record that was left as it was.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Upload modified records. Without this nothing leaves the machine.
    pub live: bool,
    pub verbosity: Verbosity,
    /// Where to save modified records as they were before modification.
    pub snapshot_dir: Option<PathBuf>,
    pub diff_context: usize,
}

impl PipelineSettings {
    pub fn dry_run() -> Self {
        Self {
            live: false,
            verbosity: Verbosity::Quiet,
            snapshot_dir: None,
            diff_context: DEFAULT_CONTEXT,
        }
    }
}

/// What happened to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    /// Modified, but not uploaded as this is a dry run.
    Skipped,
    Uploaded,
    UploadFailed,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub modified: usize,
    pub uploaded: usize,
    pub failed: usize,
}

impl Summary {
    fn add(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Unchanged => {}
            Outcome::Skipped => self.modified += 1,
            Outcome::Uploaded => {
                self.modified += 1;
                self.uploaded += 1;
            }
            Outcome::UploadFailed => {
                self.modified += 1;
                self.failed += 1;
            }
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} modified, out of which {} uploaded and {} failures.",
            self.total, self.modified, self.uploaded, self.failed
        )
    }
}

/// An ordered list of modifiers and what to do with their results.
pub struct Pipeline {
    modifiers: Vec<Box<dyn Modifier>>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(modifiers: Vec<Box<dyn Modifier>>, settings: PipelineSettings) -> Self {
        Self {
            modifiers,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Process all records in order.
    ///
    /// Modifier failures, record errors and harvest errors stop the run.
    /// Upload failures are counted and the run goes on.
    pub fn run<I, E>(
        &self,
        records: I,
        uploader: &dyn Uploader,
        report: &mut dyn Write,
    ) -> Result<Summary, PipelineError>
    where
        I: IntoIterator<Item = Result<Record, E>>,
        E: Into<BoxError>,
    {
        let mut summary = Summary::default();
        for record in records {
            let record = record.map_err(|e| PipelineError::Harvest(e.into()))?;
            let outcome = self.process(record, uploader, report)?;
            summary.add(outcome);
        }
        Ok(summary)
    }

    /// Transform one record and act on the result.
    ///
    /// If a modifier fails, edits made by the modifiers before it are
    /// dropped together with the record.
    pub fn process(
        &self,
        mut record: Record,
        uploader: &dyn Uploader,
        report: &mut dyn Write,
    ) -> Result<Outcome, PipelineError> {
        let pid = record.pid()?;
        let original = record.serialize(true)?;

        let mut modified = false;
        for modifier in &self.modifiers {
            let changed = modifier.apply(&mut record).map_err(|source| PipelineError::Modifier {
                pid: pid.clone(),
                modifier: modifier.name().to_string(),
                source,
            })?;
            if changed {
                debug!(pid = pid.as_str(), modifier = modifier.name(), "modified");
            }
            modified = changed || modified;
        }

        if !modified {
            if self.settings.verbosity >= Verbosity::All {
                writeln!(report, "No changes made for {pid}")?;
            }
            return Ok(Outcome::Unchanged);
        }

        let serialized = record.serialize(true)?;
        if let Some(dir) = &self.settings.snapshot_dir {
            save_snapshot(dir, &pid, &original)?;
        }
        if self.settings.verbosity >= Verbosity::Changes {
            writeln!(report, "Diff for {pid}:")?;
            writeln!(
                report,
                "{}",
                line_diff(&original, &serialized, self.settings.diff_context)
            )?;
            writeln!(report)?;
        }

        if !self.settings.live {
            return Ok(Outcome::Skipped);
        }
        match uploader.replace_record(&pid, &serialized) {
            Ok(()) => {
                info!(pid = pid.as_str(), "uploaded");
                writeln!(report, "Successfully uploaded {pid}")?;
                Ok(Outcome::Uploaded)
            }
            Err(err) => {
                error!(pid = pid.as_str(), "COMEDI upload failed for record {pid}: {err}");
                Ok(Outcome::UploadFailed)
            }
        }
    }
}

/// The file name an original is saved under: the PID with anything that is
/// not safe in a file name replaced.
pub fn snapshot_file_name(pid: &str) -> String {
    let stem: String = pid
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.xml")
}

fn save_snapshot(dir: &Path, pid: &str, original: &str) -> Result<(), PipelineError> {
    let path = dir.join(snapshot_file_name(pid));
    std::fs::create_dir_all(dir)
        .and_then(|()| std::fs::write(&path, original))
        .map_err(|source| PipelineError::Snapshot {
            pid: pid.to_string(),
            path,
            source,
        })
}
