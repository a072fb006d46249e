//! Per-file and per-run outcome records.

use crate::document::DocumentKind;
use crate::error::PipelineError;
use crate::retention::RetentionOutcome;
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// A step of the per-file pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Reading and parsing the input.
    Read,
    /// Writing an extracted document.
    Write(DocumentKind),
    /// Compressing an extracted document.
    Compress(DocumentKind),
    /// Encrypting an extracted document.
    Encrypt(DocumentKind),
    /// Writing the PNG copy without metadata.
    Strip,
    /// Writing the JPEG rendition of a PNG.
    Convert,
    /// Recompressing a JPEG input.
    Recompress,
    /// Applying the retention policy.
    Retention,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write(kind) => write!(f, "write {kind}"),
            Self::Compress(kind) => write!(f, "compress {kind}"),
            Self::Encrypt(kind) => write!(f, "encrypt {kind}"),
            Self::Strip => f.write_str("strip metadata"),
            Self::Convert => f.write_str("convert to JPEG"),
            Self::Recompress => f.write_str("recompress JPEG"),
            Self::Retention => f.write_str("retention"),
        }
    }
}

/// How a step ended.
#[derive(Debug)]
pub enum StepOutcome {
    /// The step produced this file.
    Done(Utf8PathBuf),
    /// The step did not run.
    Skipped(&'static str),
    /// The step failed.
    Failed(PipelineError),
}

/// One step and its outcome.
#[derive(Debug)]
pub struct StepRecord {
    /// Which step.
    pub step: Step,
    /// What happened.
    pub outcome: StepOutcome,
}

/// Everything that happened to one input file.
#[derive(Debug)]
pub struct FileReport {
    /// The input path as given.
    pub path: Utf8PathBuf,
    /// Steps in execution order.
    pub steps: Vec<StepRecord>,
    /// Retention result, when the policy was applied.
    pub retention: Option<RetentionOutcome>,
}

impl FileReport {
    /// Start an empty report for `path`.
    #[must_use]
    pub fn new(path: &Utf8Path) -> Self {
        Self {
            path: path.to_owned(),
            steps: Vec::new(),
            retention: None,
        }
    }

    /// Append a step record.
    pub fn record(&mut self, step: Step, outcome: StepOutcome) {
        self.steps.push(StepRecord { step, outcome });
    }

    /// Path produced by `step`, if it succeeded.
    #[must_use]
    pub fn produced(&self, step: Step) -> Option<&Utf8Path> {
        self.steps.iter().find_map(|record| match &record.outcome {
            StepOutcome::Done(path) if record.step == step => Some(path.as_path()),
            _ => None,
        })
    }

    /// Every path produced for this file, in step order.
    pub fn outputs(&self) -> impl Iterator<Item = &Utf8Path> {
        self.steps.iter().filter_map(|record| match &record.outcome {
            StepOutcome::Done(path) => Some(path.as_path()),
            _ => None,
        })
    }

    /// Failed steps with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (Step, &PipelineError)> {
        self.steps.iter().filter_map(|record| match &record.outcome {
            StepOutcome::Failed(err) => Some((record.step, err)),
            _ => None,
        })
    }

    /// Returns `true` when any step failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// One report per input, in argument order.
    pub files: Vec<FileReport>,
}

impl RunSummary {
    /// Number of inputs processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.files.len()
    }

    /// Inputs with at least one failed step.
    pub fn failed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|report| report.has_failures())
    }

    /// Number of inputs with at least one failed step.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failed_files().count()
    }

    /// Number of sources removed by the retention policy.
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.files
            .iter()
            .filter(|report| report.retention == Some(RetentionOutcome::Removed))
            .count()
    }
}
