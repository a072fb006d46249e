//! Compression of extracted documents with external tools.

use super::{CommandExecutor, run_tool};
use crate::error::{PipelineError, Result};
use crate::naming;
use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use log::warn;
use std::fmt;

/// Supported compression algorithms, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompressionAlgorithm {
    /// `lzma`, producing `.lzma`.
    Lzma,
    /// `bzip2`, producing `.bz2`.
    Bzip2,
    /// `gzip`, producing `.gz`.
    Gzip,
}

impl CompressionAlgorithm {
    /// All algorithms, most space-efficient first.
    pub const PREFERENCE: [Self; 3] = [Self::Lzma, Self::Bzip2, Self::Gzip];

    /// Program implementing the algorithm.
    #[must_use]
    pub const fn tool(self) -> &'static str {
        match self {
            Self::Lzma => "lzma",
            Self::Bzip2 => "bzip2",
            Self::Gzip => "gzip",
        }
    }

    /// Extension appended to compressed files, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Lzma => "lzma",
            Self::Bzip2 => "bz2",
            Self::Gzip => "gz",
        }
    }

    /// Map a file extension back to its algorithm.
    ///
    /// # Examples
    ///
    /// ```
    /// use prompt_extract::tools::CompressionAlgorithm;
    ///
    /// assert_eq!(CompressionAlgorithm::from_extension("bz2"), Some(CompressionAlgorithm::Bzip2));
    /// assert_eq!(CompressionAlgorithm::from_extension("zip"), None);
    /// ```
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::PREFERENCE.into_iter().find(|a| a.extension() == ext)
    }

    /// Pick the algorithm to use for a run.
    ///
    /// An explicit request must be installed. Without one, the first installed
    /// algorithm in [`Self::PREFERENCE`] order wins; `Ok(None)` means none is
    /// installed and compression is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::CompressorUnavailable`] when the requested
    /// algorithm's tool is not installed.
    pub fn select(
        requested: Option<Self>,
        executor: &dyn CommandExecutor,
    ) -> Result<Option<Self>> {
        if let Some(algorithm) = requested {
            if executor.is_installed(algorithm.tool()) {
                return Ok(Some(algorithm));
            }
            return Err(PipelineError::CompressorUnavailable {
                tool: algorithm.tool(),
            });
        }

        for algorithm in Self::PREFERENCE {
            if executor.is_installed(algorithm.tool()) {
                return Ok(Some(algorithm));
            }
            warn!("no {} tool installed", algorithm.tool());
        }
        warn!("no compression tool installed, compression disabled");
        Ok(None)
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool())
    }
}

/// Capability: compress a file into a sibling file.
#[cfg_attr(test, mockall::automock)]
pub trait Compressor {
    /// Compress `input` with `algorithm`, returning the path of the new file.
    ///
    /// The input file is left in place.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ToolFailed`] if the tool is missing or fails.
    fn compress(&self, input: &Utf8Path, algorithm: CompressionAlgorithm) -> Result<Utf8PathBuf>;
}

/// [`Compressor`] backed by the `lzma`, `bzip2` and `gzip` programs.
pub struct ExternalCompressor<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> ExternalCompressor<'a> {
    /// Create a compressor that runs tools through `executor`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }
}

impl Compressor for ExternalCompressor<'_> {
    fn compress(&self, input: &Utf8Path, algorithm: CompressionAlgorithm) -> Result<Utf8PathBuf> {
        // -k keeps the input, -f replaces a stale output from an earlier run.
        run_tool(
            self.executor,
            algorithm.tool(),
            &["-9", "-k", "-f", input.as_str()],
            input,
        )?;
        Ok(naming::compressed_path(input, algorithm))
    }
}

/// Decompress `input` in place with `algorithm`, returning the path of the
/// restored file (`input` without its last extension).
///
/// The compressed file is consumed by the tool.
///
/// # Errors
///
/// Returns [`PipelineError::ToolFailed`] if the tool is missing or fails.
pub fn decompress(
    executor: &dyn CommandExecutor,
    input: &Utf8Path,
    algorithm: CompressionAlgorithm,
) -> Result<Utf8PathBuf> {
    run_tool(
        executor,
        algorithm.tool(),
        &["-d", "-f", input.as_str()],
        input,
    )?;
    Ok(input.with_extension(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor};
    use crate::tools::MockCommandExecutor;
    use rstest::rstest;

    #[rstest]
    #[case::lzma(CompressionAlgorithm::Lzma, "lzma", "art.prompt.json.lzma")]
    #[case::bzip2(CompressionAlgorithm::Bzip2, "bzip2", "art.prompt.json.bz2")]
    #[case::gzip(CompressionAlgorithm::Gzip, "gzip", "art.prompt.json.gz")]
    fn compress_runs_tool_and_names_output(
        #[case] algorithm: CompressionAlgorithm,
        #[case] tool: &'static str,
        #[case] expected: &str,
    ) {
        let executor = StubExecutor::new(vec![ExpectedCall::succeeding(
            tool,
            &["-9", "-k", "-f", "art.prompt.json"],
        )]);

        let output = ExternalCompressor::new(&executor)
            .compress(Utf8Path::new("art.prompt.json"), algorithm)
            .expect("compression should succeed");

        assert_eq!(output, expected);
        executor.assert_finished();
    }

    #[test]
    fn compress_surfaces_tool_failure() {
        let executor = StubExecutor::new(vec![ExpectedCall::failing(
            "lzma",
            &["-9", "-k", "-f", "a.json"],
            "lzma: a.json: Permission denied",
        )]);

        let err = ExternalCompressor::new(&executor)
            .compress(Utf8Path::new("a.json"), CompressionAlgorithm::Lzma)
            .expect_err("compression should fail");
        assert!(err.to_string().contains("Permission denied"));
    }

    #[rstest]
    #[case::lzma(CompressionAlgorithm::Lzma, "lzma", "/t/a.json.lzma")]
    #[case::bzip2(CompressionAlgorithm::Bzip2, "bzip2", "/t/a.json.bz2")]
    #[case::gzip(CompressionAlgorithm::Gzip, "gzip", "/t/a.json.gz")]
    fn decompress_strips_extension(
        #[case] algorithm: CompressionAlgorithm,
        #[case] tool: &'static str,
        #[case] input: &str,
    ) {
        let executor = StubExecutor::new(vec![ExpectedCall::succeeding(tool, &["-d", "-f", input])]);

        let output = decompress(&executor, Utf8Path::new(input), algorithm)
            .expect("decompression should succeed");

        assert_eq!(output, "/t/a.json");
        executor.assert_finished();
    }

    #[test]
    fn select_honours_installed_explicit_choice() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_is_installed()
            .withf(|program| program == "gzip")
            .return_const(true);

        let selected = CompressionAlgorithm::select(Some(CompressionAlgorithm::Gzip), &executor)
            .expect("gzip is installed");
        assert_eq!(selected, Some(CompressionAlgorithm::Gzip));
    }

    #[test]
    fn select_rejects_missing_explicit_choice() {
        let mut executor = MockCommandExecutor::new();
        executor.expect_is_installed().return_const(false);

        let err = CompressionAlgorithm::select(Some(CompressionAlgorithm::Lzma), &executor)
            .expect_err("missing tool should be a configuration error");
        assert!(err.is_fatal());
        assert!(err.to_string().contains("lzma"));
    }

    #[rstest]
    #[case::all(&["lzma", "bzip2", "gzip"], Some(CompressionAlgorithm::Lzma))]
    #[case::no_lzma(&["bzip2", "gzip"], Some(CompressionAlgorithm::Bzip2))]
    #[case::gzip_only(&["gzip"], Some(CompressionAlgorithm::Gzip))]
    #[case::none(&[], None)]
    fn select_falls_back_in_preference_order(
        #[case] installed: &'static [&'static str],
        #[case] expected: Option<CompressionAlgorithm>,
    ) {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_is_installed()
            .returning(move |program| installed.iter().any(|tool| *tool == program));

        let selected =
            CompressionAlgorithm::select(None, &executor).expect("fallback never fails");
        assert_eq!(selected, expected);
    }

    #[test]
    fn extensions_round_trip() {
        for algorithm in CompressionAlgorithm::PREFERENCE {
            assert_eq!(
                CompressionAlgorithm::from_extension(algorithm.extension()),
                Some(algorithm)
            );
        }
    }
}
