//! Output formatting for the command-line front ends.
//!
//! Diagnostics go through `log`; this module only renders the few texts that
//! are always shown on stderr: dry-run information, the closing summary and
//! fatal errors.

use crate::config::RunConfig;
use crate::report::RunSummary;
use camino::Utf8PathBuf;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; ignore write failures.
    }
}

/// One-line summary of a run.
///
/// # Example
///
/// ```
/// use prompt_extract::output::summary_message;
/// use prompt_extract::report::RunSummary;
///
/// let summary = RunSummary::default();
/// assert_eq!(summary_message(&summary), "Processed 0 files, all succeeded");
/// ```
#[must_use]
pub fn summary_message(summary: &RunSummary) -> String {
    let total = summary.total();
    let files = if total == 1 { "file" } else { "files" };
    let mut message = match summary.failure_count() {
        0 => format!("Processed {total} {files}, all succeeded"),
        failed => format!("Processed {total} {files}, {failed} with failures"),
    };
    let removed = summary.removed_count();
    if removed > 0 {
        message.push_str(&format!(", {removed} removed"));
    }
    message
}

/// Configuration information for dry-run output.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use prompt_extract::config::RunConfig;
/// use prompt_extract::output::DryRunInfo;
///
/// let config = RunConfig::default();
/// let files = vec![Utf8PathBuf::from("art.png")];
/// let info = DryRunInfo {
///     config: &config,
///     converter: "magick",
///     files: &files,
/// };
///
/// let output = info.display_text();
/// assert!(output.contains("Dry run"));
/// assert!(output.contains("art.png"));
/// ```
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// Resolved configuration.
    pub config: &'a RunConfig,
    /// ImageMagick program that would run.
    pub converter: &'a str,
    /// Files that would be processed.
    pub files: &'a [Utf8PathBuf],
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let config = self.config;
        let enabled = |flag: bool| if flag { "yes" } else { "no" };
        let compression = config
            .compression
            .map_or_else(|| "disabled".to_owned(), |algorithm| algorithm.to_string());
        let recipient = config.recipient.as_deref().unwrap_or("disabled");

        let mut lines = vec![
            "Dry run - no files will be modified".to_owned(),
            String::new(),
            format!("Extract prompt: {}", enabled(config.extraction.prompt)),
            format!("Extract workflow: {}", enabled(config.extraction.workflow)),
            format!("Compression: {compression}"),
            format!("Encryption recipient: {recipient}"),
            format!(
                "Stripped PNG: {} (suffix {})",
                enabled(config.stripped_png),
                config.stripped_suffix
            ),
            format!(
                "JPEG: {} (quality {}, via {})",
                enabled(config.jpeg),
                config.quality,
                self.converter
            ),
            format!("Seed in name: {}", enabled(config.seed_in_name)),
            format!("Size in name: {}", enabled(config.size_in_name)),
            format!(
                "Discard intermediate files: {}",
                enabled(config.discard_intermediate)
            ),
            format!("Retention: {}", config.retention),
        ];

        lines.push(String::new());
        lines.push("Files to process:".to_owned());
        for file in self.files {
            lines.push(format!("  - {file}"));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::report::{FileReport, Step, StepOutcome};
    use crate::retention::{RetentionMode, RetentionOutcome};
    use crate::tools::CompressionAlgorithm;
    use camino::Utf8Path;
    use rstest::rstest;

    fn failed(path: &str) -> FileReport {
        let mut report = FileReport::new(Utf8Path::new(path));
        report.record(
            Step::Read,
            StepOutcome::Failed(PipelineError::MissingInput { path: path.into() }),
        );
        report
    }

    #[test]
    fn write_stderr_line_appends_newline() {
        let mut stderr = Vec::new();
        write_stderr_line(&mut stderr, "hello");
        assert_eq!(stderr, b"hello\n");
    }

    #[rstest]
    #[case::one_ok(vec![FileReport::new(Utf8Path::new("a.png"))], "Processed 1 file, all succeeded")]
    #[case::one_failed(
        vec![FileReport::new(Utf8Path::new("a.png")), failed("b.png")],
        "Processed 2 files, 1 with failures"
    )]
    fn summary_counts_failures(#[case] files: Vec<FileReport>, #[case] expected: &str) {
        assert_eq!(summary_message(&RunSummary { files }), expected);
    }

    #[test]
    fn summary_mentions_removed_sources() {
        let mut removed = FileReport::new(Utf8Path::new("a.png"));
        removed.retention = Some(RetentionOutcome::Removed);
        let summary = RunSummary {
            files: vec![removed],
        };
        assert_eq!(
            summary_message(&summary),
            "Processed 1 file, all succeeded, 1 removed"
        );
    }

    #[test]
    fn dry_run_lists_resolved_settings() {
        let config = RunConfig {
            compression: Some(CompressionAlgorithm::Bzip2),
            recipient: Some("me@example.com".to_owned()),
            retention: RetentionMode::Remove,
            ..RunConfig::default()
        };
        let files = vec![Utf8PathBuf::from("a.png"), Utf8PathBuf::from("b.jpg")];
        let text = DryRunInfo {
            config: &config,
            converter: "convert",
            files: &files,
        }
        .display_text();

        assert!(text.contains("Compression: bzip2"));
        assert!(text.contains("Encryption recipient: me@example.com"));
        assert!(text.contains("quality 85, via convert"));
        assert!(text.contains("Retention: remove"));
        assert!(text.contains("  - b.jpg"));
    }

    #[test]
    fn dry_run_shows_disabled_tools() {
        let config = RunConfig::default();
        let text = DryRunInfo {
            config: &config,
            converter: "magick",
            files: &[],
        }
        .display_text();

        assert!(text.contains("Compression: disabled"));
        assert!(text.contains("Encryption recipient: disabled"));
    }
}
