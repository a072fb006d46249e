//! JPEG rendition and recompression through ImageMagick.

use super::{CommandExecutor, run_tool};
use crate::config::Quality;
use crate::error::Result;
use camino::Utf8Path;
use log::debug;

/// Capability: write a JPEG rendition of an image.
#[cfg_attr(test, mockall::automock)]
pub trait JpegConverter {
    /// Convert `input` (PNG or JPEG) into a JPEG at `output` with `quality`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PipelineError::ToolFailed`] if the converter is
    /// missing or fails.
    fn convert(&self, input: &Utf8Path, output: &Utf8Path, quality: Quality) -> Result<()>;
}

/// [`JpegConverter`] backed by ImageMagick.
///
/// ImageMagick 7 ships a single `magick` entrypoint while version 6 exposes
/// `convert`; [`ImageMagickConverter::detect`] picks whichever is installed.
pub struct ImageMagickConverter<'a> {
    executor: &'a dyn CommandExecutor,
    program: &'static str,
}

impl<'a> ImageMagickConverter<'a> {
    /// Create a converter that runs `program` through `executor`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, program: &'static str) -> Self {
        Self { executor, program }
    }

    /// Prefer `magick`, falling back to `convert`.
    ///
    /// A missing ImageMagick is not detected as an error here; each
    /// conversion will then fail on its own.
    #[must_use]
    pub fn detect(executor: &'a dyn CommandExecutor) -> Self {
        let program = if executor.is_installed("magick") {
            "magick"
        } else {
            "convert"
        };
        debug!("using {program} for JPEG conversion");
        Self::new(executor, program)
    }

    /// The program this converter runs.
    #[must_use]
    pub fn program(&self) -> &'static str {
        self.program
    }
}

impl JpegConverter for ImageMagickConverter<'_> {
    fn convert(&self, input: &Utf8Path, output: &Utf8Path, quality: Quality) -> Result<()> {
        let quality = quality.to_string();
        run_tool(
            self.executor,
            self.program,
            &[input.as_str(), "-quality", &quality, output.as_str()],
            input,
        )
    }
}
