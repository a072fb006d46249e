//! Immutable run configuration.
//!
//! [`RunConfig`] is resolved exactly once, before any file is processed, from
//! the parsed command line and the recipient environment fallback. Steps
//! receive it by reference and never consult the environment themselves.

use crate::cli::Cli;
use crate::error::{PipelineError, Result};
use crate::retention::RetentionMode;
use crate::tools::cipher::verify_recipient;
use crate::tools::{CommandExecutor, CompressionAlgorithm};
use std::fmt;

/// Environment variable consulted when `--email` is not given.
pub const RECIPIENT_ENV: &str = "PROMPT_EXTRACT_EMAIL";

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 85;

/// Default suffix distinguishing the stripped PNG from its source.
pub const DEFAULT_STRIPPED_SUFFIX: &str = "_no_prompt";

/// JPEG quality level in `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    /// Validate a quality level.
    ///
    /// # Examples
    ///
    /// ```
    /// use prompt_extract::config::Quality;
    ///
    /// assert!(Quality::new(85).is_some());
    /// assert!(Quality::new(0).is_none());
    /// assert!(Quality::new(101).is_none());
    /// ```
    #[must_use]
    pub fn new(value: u8) -> Option<Self> {
        (1..=100).contains(&value).then_some(Self(value))
    }

    /// The numeric level.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(DEFAULT_QUALITY)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which embedded documents to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extraction {
    /// Extract the `prompt` document.
    pub prompt: bool,
    /// Extract the `workflow` document.
    pub workflow: bool,
}

/// Settings shared by every step of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// JPEG quality for renditions and recompression.
    pub quality: Quality,
    /// Compression algorithm, or `None` when compression is disabled.
    pub compression: Option<CompressionAlgorithm>,
    /// Encryption recipient, or `None` when encryption is disabled.
    pub recipient: Option<String>,
    /// What to do with the source file afterwards.
    pub retention: RetentionMode,
    /// Produce a JPEG rendition / recompress JPEG inputs.
    pub jpeg: bool,
    /// Produce the metadata-free PNG copy.
    pub stripped_png: bool,
    /// Documents to extract.
    pub extraction: Extraction,
    /// Suffix of the stripped PNG name.
    pub stripped_suffix: String,
    /// Add the generation seed to image output names.
    pub seed_in_name: bool,
    /// Add the image size to image output names.
    pub size_in_name: bool,
    /// Remove intermediate files once the step consuming them succeeded.
    pub discard_intermediate: bool,
}

impl Default for RunConfig {
    /// Defaults of the command line with compression and encryption
    /// disabled, which is what a caller without external tools gets.
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            compression: None,
            recipient: None,
            retention: RetentionMode::default(),
            jpeg: true,
            stripped_png: true,
            extraction: Extraction {
                prompt: true,
                workflow: true,
            },
            stripped_suffix: DEFAULT_STRIPPED_SUFFIX.to_owned(),
            seed_in_name: false,
            size_in_name: false,
            discard_intermediate: false,
        }
    }
}

impl RunConfig {
    /// Resolve the run configuration.
    ///
    /// `env_recipient` is the value of [`RECIPIENT_ENV`], read once by the
    /// caller. `executor` is used to look for compression tools and the
    /// recipient's key.
    ///
    /// # Errors
    ///
    /// Returns a configuration-class [`PipelineError`] when the stripped
    /// suffix is unusable, encryption is enabled without a usable recipient
    /// or an explicitly requested compressor is missing.
    pub fn resolve(
        cli: &Cli,
        env_recipient: Option<String>,
        executor: &dyn CommandExecutor,
    ) -> Result<Self> {
        validate_stripped_suffix(&cli.stripped_suffix)?;

        let recipient = if cli.no_encrypt {
            None
        } else {
            let recipient = resolve_recipient(cli.email.as_deref(), env_recipient)?;
            verify_recipient(executor, &recipient)?;
            Some(recipient)
        };

        let compression = if cli.no_compress {
            None
        } else {
            CompressionAlgorithm::select(cli.compression, executor)?
        };

        Ok(Self {
            quality: cli.quality,
            compression,
            recipient,
            retention: cli.retention,
            jpeg: !cli.no_jpg,
            stripped_png: !cli.no_png,
            extraction: Extraction {
                prompt: !cli.no_prompt,
                workflow: !cli.no_workflow,
            },
            stripped_suffix: cli.stripped_suffix.clone(),
            seed_in_name: cli.seed_in_name,
            size_in_name: cli.size_in_name,
            discard_intermediate: cli.discard_intermediate,
        })
    }
}

/// Check that `suffix` yields a sibling name distinct from the source.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidStrippedSuffix`] for an empty suffix or
/// one containing a path separator.
///
/// # Examples
///
/// ```
/// use prompt_extract::config::validate_stripped_suffix;
///
/// assert!(validate_stripped_suffix("_clean").is_ok());
/// assert!(validate_stripped_suffix("").is_err());
/// assert!(validate_stripped_suffix("/../x").is_err());
/// ```
pub fn validate_stripped_suffix(suffix: &str) -> Result<()> {
    let reason = if suffix.is_empty() {
        "the stripped copy would replace the source"
    } else if suffix.contains(['/', '\\']) {
        "path separators are not allowed"
    } else {
        return Ok(());
    };
    Err(PipelineError::InvalidStrippedSuffix {
        suffix: suffix.to_owned(),
        reason,
    })
}

/// Read the recipient fallback from the process environment.
#[must_use]
pub fn recipient_from_env() -> Option<String> {
    std::env::var(RECIPIENT_ENV).ok()
}

/// Pick the recipient: the command line wins over the environment; blank
/// values count as absent.
///
/// # Errors
///
/// Returns [`PipelineError::MissingRecipient`] when neither source provides
/// a non-blank value.
pub fn resolve_recipient(cli_email: Option<&str>, env_email: Option<String>) -> Result<String> {
    cli_email
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            env_email
                .map(|email| email.trim().to_owned())
                .filter(|email| !email.is_empty())
        })
        .ok_or(PipelineError::MissingRecipient {
            env_var: RECIPIENT_ENV,
        })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
