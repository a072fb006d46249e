//! CLI argument definitions for the prompt extractor.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::config::{DEFAULT_STRIPPED_SUFFIX, Quality};
use crate::retention::RetentionMode;
use crate::tools::CompressionAlgorithm;
use camino::Utf8PathBuf;
use clap::Parser;

/// Extract ComfyUI prompt and workflow metadata from PNG images.
#[derive(Parser, Debug, Clone)]
#[command(name = "prompt-extract")]
#[command(version, about)]
#[command(long_about = concat!(
    "Extract ComfyUI prompt and workflow metadata from PNG images.\n\n",
    "For every PNG given, the embedded `prompt` and `workflow` JSON documents are ",
    "written beside the image, compressed and encrypted for a gpg recipient. A copy ",
    "of the PNG without those documents and a JPEG rendition are produced, and the ",
    "original can then be kept, removed, or removed after confirmation.\n\n",
    "JPEG inputs are recompressed at the requested quality instead.\n\n",
    "Compression and encryption use the lzma, bzip2, gzip and gpg programs; JPEG ",
    "conversion uses ImageMagick (`magick` or `convert`).",
))]
#[command(after_help = concat!(
    "ENVIRONMENT:\n",
    "  PROMPT_EXTRACT_EMAIL    Recipient used when --email is not given\n",
    "  PROMPT_EXTRACT_LOG      Log filter overriding -v/-q (e.g. debug)\n\n",
    "EXAMPLES:\n",
    "  Extract, compress and encrypt, asking before removing each original:\n",
    "    $ prompt-extract -e me@example.com ComfyUI_*.png\n\n",
    "  Keep originals, write plain JSON only:\n",
    "    $ prompt-extract --no-encrypt --no-compress -r keep art.png\n\n",
    "  Recompress JPEGs at quality 70:\n",
    "    $ prompt-extract -Q 70 --no-encrypt photos/*.jpg\n\n",
    "  Show the resolved configuration:\n",
    "    $ prompt-extract --dry-run -e me@example.com art.png\n\n",
    "Decode an encrypted document with prompt-extract-decode FILE.json.lzma.gpg",
))]
pub struct Cli {
    /// Images to process (.png, or .jpg/.jpeg for recompression).
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<Utf8PathBuf>,

    /// JPEG quality (1-100).
    #[arg(
        short = 'Q',
        long,
        value_name = "N",
        default_value = "85",
        value_parser = parse_quality
    )]
    pub quality: Quality,

    /// What to do with each original once its outputs exist.
    ///
    /// `remove` and `ask` only delete a source when every step for it
    /// succeeded and its JPEG was written (with `--no-jpg`, its stripped PNG).
    /// Any other file is kept.
    #[arg(short, long, value_enum, default_value_t = RetentionMode::Ask)]
    pub retention: RetentionMode,

    /// Do not produce a JPEG rendition (or recompress JPEG inputs).
    #[arg(long)]
    pub no_jpg: bool,

    /// Do not produce the PNG copy without metadata.
    #[arg(long)]
    pub no_png: bool,

    /// Do not extract the prompt document.
    #[arg(long)]
    pub no_prompt: bool,

    /// Do not extract the workflow document.
    #[arg(long)]
    pub no_workflow: bool,

    /// Do not compress extracted documents.
    #[arg(long)]
    pub no_compress: bool,

    /// Do not encrypt extracted documents.
    #[arg(long, visible_alias = "no-cypher")]
    pub no_encrypt: bool,

    /// Encryption recipient [env: PROMPT_EXTRACT_EMAIL].
    #[arg(short, long, value_name = "EMAIL")]
    pub email: Option<String>,

    /// Compression algorithm [default: first installed of lzma, bzip2, gzip].
    #[arg(short, long, value_enum, value_name = "ALGORITHM")]
    pub compression: Option<CompressionAlgorithm>,

    /// Suffix of the PNG copy without metadata.
    #[arg(long, value_name = "SUFFIX", default_value = DEFAULT_STRIPPED_SUFFIX)]
    pub stripped_suffix: String,

    /// Add the generation seed to image output names.
    #[arg(long)]
    pub seed_in_name: bool,

    /// Add the image size to image output names.
    #[arg(long)]
    pub size_in_name: bool,

    /// Remove intermediate files once the step consuming them succeeded.
    #[arg(long)]
    pub discard_intermediate: bool,

    /// Show configuration and exit without processing.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only report warnings and errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Default for Cli {
    /// Creates a `Cli` matching the parser defaults with no files.
    ///
    /// Useful for tests and programmatic construction where only specific
    /// fields need to be set.
    ///
    /// # Examples
    ///
    /// ```
    /// use prompt_extract::cli::Cli;
    ///
    /// let cli = Cli::default();
    /// assert!(cli.files.is_empty());
    /// assert_eq!(cli.quality.get(), 85);
    /// assert_eq!(cli.stripped_suffix, "_no_prompt");
    /// ```
    fn default() -> Self {
        Self {
            files: Vec::new(),
            quality: Quality::default(),
            retention: RetentionMode::Ask,
            no_jpg: false,
            no_png: false,
            no_prompt: false,
            no_workflow: false,
            no_compress: false,
            no_encrypt: false,
            email: None,
            compression: None,
            stripped_suffix: DEFAULT_STRIPPED_SUFFIX.to_owned(),
            seed_in_name: false,
            size_in_name: false,
            discard_intermediate: false,
            dry_run: false,
            verbosity: 0,
            quiet: false,
        }
    }
}

fn parse_quality(raw: &str) -> Result<Quality, String> {
    raw.parse::<u8>()
        .ok()
        .and_then(Quality::new)
        .ok_or_else(|| format!("`{raw}` is not a quality between 1 and 100"))
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
