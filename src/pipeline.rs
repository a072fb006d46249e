//! Per-file pipeline orchestration.
//!
//! For a PNG the steps run in a fixed order: read, write documents, compress,
//! encrypt, strip metadata, convert to JPEG, apply retention. JPEG inputs are
//! only recompressed before retention. A failing step skips the steps that
//! consume its output; independent steps still run. Nothing that happens to
//! one file affects the next.

use crate::config::RunConfig;
use crate::document::{DocumentKind, write_document};
use crate::error::{PipelineError, Result};
use crate::jpeg;
use crate::naming::{self, ImageTags};
use crate::report::{FileReport, RunSummary, Step, StepOutcome};
use crate::retention::{DecisionProvider, Safeguards, apply_retention};
use crate::source::{InputKind, SourceImage, read_input};
use crate::tools::{Compressor, Encryptor, JpegConverter};
use camino::{Utf8Path, Utf8PathBuf};
use log::{error, info, warn};

const DISABLED: &str = "disabled";
const NOT_EMBEDDED: &str = "not embedded";
const INPUT_MISSING: &str = "input not produced";
const NO_METADATA: &str = "no metadata to strip";

/// External capabilities the pipeline drives.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Compresses extracted documents.
    pub compressor: &'a dyn Compressor,
    /// Encrypts extracted documents.
    pub encryptor: &'a dyn Encryptor,
    /// Produces JPEG renditions.
    pub converter: &'a dyn JpegConverter,
    /// Answers removal questions in ask mode.
    pub decisions: &'a dyn DecisionProvider,
}

/// Runs the per-file steps for a fixed configuration.
pub struct Pipeline<'a> {
    config: &'a RunConfig,
    tools: Collaborators<'a>,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline.
    #[must_use]
    pub fn new(config: &'a RunConfig, tools: Collaborators<'a>) -> Self {
        Self { config, tools }
    }

    /// Process every file in order and collect the reports.
    ///
    /// Per-file failures are logged with the file and step they concern and
    /// never stop the run.
    pub fn run(&self, files: &[Utf8PathBuf]) -> RunSummary {
        let mut summary = RunSummary::default();
        for path in files {
            let report = self.process_file(path);
            for (step, err) in report.failures() {
                error!("{path}: {step} failed: {err}");
            }
            summary.files.push(report);
        }
        summary
    }

    /// Process one input file.
    pub fn process_file(&self, path: &Utf8Path) -> FileReport {
        info!("processing {path}");
        let mut report = FileReport::new(path);
        match InputKind::detect(path) {
            Ok(InputKind::Png) => self.process_png(path, &mut report),
            Ok(InputKind::Jpeg) => self.process_jpeg(path, &mut report),
            Err(err) => report.record(Step::Read, StepOutcome::Failed(err)),
        }
        report
    }

    fn process_png(&self, path: &Utf8Path, report: &mut FileReport) {
        let source = match SourceImage::read(path) {
            Ok(source) => source,
            Err(err) => {
                report.record(Step::Read, StepOutcome::Failed(err));
                return;
            }
        };
        if !source.has_metadata() {
            info!("{path}: no prompt or workflow embedded");
        }

        for kind in DocumentKind::ALL {
            self.export_document(&source, kind, report);
        }

        let tags = self.image_tags(&source);
        let stripped = self.strip(&source, tags, report);
        self.convert(&source, stripped.as_deref(), tags, report);
        self.retain(path, report);
    }

    fn process_jpeg(&self, path: &Utf8Path, report: &mut FileReport) {
        if !self.config.jpeg {
            report.record(Step::Recompress, StepOutcome::Skipped(DISABLED));
            self.retain(path, report);
            return;
        }

        let bytes = match read_input(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                report.record(Step::Read, StepOutcome::Failed(err));
                return;
            }
        };
        if !jpeg::is_jpeg(&bytes) {
            let err = PipelineError::InvalidJpeg {
                path: path.to_owned(),
                reason: "missing start-of-image marker".to_owned(),
            };
            report.record(Step::Read, StepOutcome::Failed(err));
            return;
        }

        let size = if self.config.size_in_name {
            let size = jpeg::dimensions(&bytes);
            if size.is_none() {
                warn!("{path}: no frame header found, size left out of the name");
            }
            size
        } else {
            None
        };
        let output = naming::recompressed_jpeg_path(path, size, self.config.quality);
        let outcome = match self
            .tools
            .converter
            .convert(path, &output, self.config.quality)
        {
            Ok(()) => {
                info!("wrote {output}");
                StepOutcome::Done(output)
            }
            Err(err) => StepOutcome::Failed(err),
        };
        report.record(Step::Recompress, outcome);
        self.retain(path, report);
    }

    /// Write, compress and encrypt one document.
    fn export_document(&self, source: &SourceImage, kind: DocumentKind, report: &mut FileReport) {
        let enabled = match kind {
            DocumentKind::Prompt => self.config.extraction.prompt,
            DocumentKind::Workflow => self.config.extraction.workflow,
        };
        let skip_chain = |report: &mut FileReport, reason| {
            for step in [Step::Write(kind), Step::Compress(kind), Step::Encrypt(kind)] {
                report.record(step, StepOutcome::Skipped(reason));
            }
        };
        if !enabled {
            skip_chain(report, DISABLED);
            return;
        }
        let Some(document) = source.document(kind) else {
            skip_chain(report, NOT_EMBEDDED);
            return;
        };

        let written = record(report, Step::Write(kind), || {
            write_document(source.path(), document)
        });
        let Some(plain) = written else {
            report.record(Step::Compress(kind), StepOutcome::Skipped(INPUT_MISSING));
            report.record(Step::Encrypt(kind), StepOutcome::Skipped(INPUT_MISSING));
            return;
        };

        let to_encrypt = match self.config.compression {
            None => {
                report.record(Step::Compress(kind), StepOutcome::Skipped(DISABLED));
                Some(plain)
            }
            Some(algorithm) => {
                let compressed = record(report, Step::Compress(kind), || {
                    self.tools.compressor.compress(&plain, algorithm)
                });
                if compressed.is_some() {
                    self.discard(&plain);
                }
                compressed
            }
        };

        let Some(recipient) = self.config.recipient.as_deref() else {
            report.record(Step::Encrypt(kind), StepOutcome::Skipped(DISABLED));
            return;
        };
        let Some(input) = to_encrypt else {
            report.record(Step::Encrypt(kind), StepOutcome::Skipped(INPUT_MISSING));
            return;
        };
        let encrypted = record(report, Step::Encrypt(kind), || {
            self.tools.encryptor.encrypt(&input, recipient)
        });
        if encrypted.is_some() {
            self.discard(&input);
        }
    }

    fn image_tags(&self, source: &SourceImage) -> ImageTags {
        let seed = if self.config.seed_in_name {
            source.seed()
        } else {
            None
        };
        let size = if self.config.size_in_name {
            source.dimensions()
        } else {
            None
        };
        ImageTags { seed, size }
    }

    fn strip(
        &self,
        source: &SourceImage,
        tags: ImageTags,
        report: &mut FileReport,
    ) -> Option<Utf8PathBuf> {
        if !self.config.stripped_png {
            report.record(Step::Strip, StepOutcome::Skipped(DISABLED));
            return None;
        }
        if !source.has_metadata_chunks() {
            report.record(Step::Strip, StepOutcome::Skipped(NO_METADATA));
            return None;
        }

        let output = naming::stripped_png_path(source.path(), tags, &self.config.stripped_suffix);
        record(report, Step::Strip, || {
            if output == source.path() {
                return Err(PipelineError::WouldOverwriteSource {
                    path: output.clone(),
                });
            }
            std::fs::write(&output, source.stripped_bytes()).map_err(|err| {
                PipelineError::WriteFailed {
                    path: output.clone(),
                    source: err,
                }
            })?;
            info!("wrote {output}");
            Ok(output.clone())
        })
    }

    fn convert(
        &self,
        source: &SourceImage,
        stripped: Option<&Utf8Path>,
        tags: ImageTags,
        report: &mut FileReport,
    ) {
        if !self.config.jpeg {
            report.record(Step::Convert, StepOutcome::Skipped(DISABLED));
            return;
        }

        let input = stripped.unwrap_or_else(|| source.path());
        let output = naming::jpeg_path(source.path(), tags);
        let converted = record(report, Step::Convert, || {
            self.tools
                .converter
                .convert(input, &output, self.config.quality)?;
            info!("wrote {output}");
            Ok(output.clone())
        });
        if converted.is_some()
            && let Some(stripped) = stripped
        {
            self.discard(stripped);
        }
    }

    fn retain(&self, path: &Utf8Path, report: &mut FileReport) {
        let jpeg_written = report.produced(Step::Convert).is_some()
            || report.produced(Step::Recompress).is_some();
        let safeguards = Safeguards {
            any_failed: report.has_failures(),
            jpeg_enabled: self.config.jpeg,
            jpeg_written,
            stripped_written: report.produced(Step::Strip).is_some(),
        };
        match apply_retention(
            path,
            self.config.retention,
            safeguards,
            self.tools.decisions,
        ) {
            Ok(outcome) => report.retention = Some(outcome),
            Err(err) => report.record(Step::Retention, StepOutcome::Failed(err)),
        }
    }

    /// Remove an intermediate file once the step consuming it succeeded.
    fn discard(&self, path: &Utf8Path) {
        if !self.config.discard_intermediate {
            return;
        }
        match std::fs::remove_file(path) {
            Ok(()) => info!("removed intermediate {path}"),
            Err(err) => warn!("could not remove intermediate {path}: {err}"),
        }
    }
}

/// Run `action` as `step`, recording its outcome and returning the produced
/// path on success.
fn record(
    report: &mut FileReport,
    step: Step,
    action: impl FnOnce() -> Result<Utf8PathBuf>,
) -> Option<Utf8PathBuf> {
    match action() {
        Ok(path) => {
            report.record(step, StepOutcome::Done(path.clone()));
            Some(path)
        }
        Err(err) => {
            report.record(step, StepOutcome::Failed(err));
            None
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
