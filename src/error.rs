//! Error types for the prompt extractor.
//!
//! Every failure the pipeline can report is a [`PipelineError`] variant. The
//! variants fall into four classes (see [`ErrorClass`]): configuration errors
//! abort the run before any file is touched, while input, tool and filesystem
//! errors are contained to one file or one step of one file.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Broad category of a [`PipelineError`], used to decide how far it
/// propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Invalid run configuration. Fatal for the whole run.
    Configuration,
    /// The input file itself is unusable. Fatal for that file only.
    Input,
    /// An external tool was missing or failed. Fatal for one step.
    ToolInvocation,
    /// A filesystem write failed. Fatal for one step.
    Filesystem,
}

/// Errors that can occur while extracting metadata and deriving files.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Encryption is enabled but no recipient was given on the command line
    /// or through the environment.
    #[error(
        "encryption enabled but no recipient configured; pass --email, set {env_var}, or use --no-encrypt"
    )]
    MissingRecipient {
        /// Environment variable consulted as a fallback.
        env_var: &'static str,
    },

    /// The cipher tool is missing or holds no public key for the recipient.
    #[error("no usable gpg public key for {recipient}: {reason}")]
    RecipientKeyUnavailable {
        /// Recipient e-mail address.
        recipient: String,
        /// Why the key could not be used.
        reason: String,
    },

    /// An explicitly requested compression tool is not installed.
    #[error("compression tool {tool} is not installed; choose another with --compression")]
    CompressorUnavailable {
        /// Name of the missing tool.
        tool: &'static str,
    },

    /// The stripped PNG suffix is empty or not a plain name fragment.
    #[error("invalid stripped PNG suffix {suffix:?}: {reason}")]
    InvalidStrippedSuffix {
        /// The rejected suffix.
        suffix: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A derived file would have replaced its own source.
    #[error("{path}: derived file would overwrite its source")]
    WouldOverwriteSource {
        /// The source path.
        path: Utf8PathBuf,
    },

    /// The input path does not exist or is not a regular file.
    #[error("{path}: missing or not a regular file")]
    MissingInput {
        /// The offending path.
        path: Utf8PathBuf,
    },

    /// The input has an extension the pipeline does not handle.
    #[error("{path}: unsupported file type (expected .png, .jpg or .jpeg)")]
    UnsupportedInput {
        /// The offending path.
        path: Utf8PathBuf,
    },

    /// The input could not be parsed as a PNG image.
    #[error("{path}: not a valid PNG: {reason}")]
    InvalidPng {
        /// The offending path.
        path: Utf8PathBuf,
        /// Description of the structural problem.
        reason: String,
    },

    /// The input could not be parsed as a JPEG image.
    #[error("{path}: not a valid JPEG: {reason}")]
    InvalidJpeg {
        /// The offending path.
        path: Utf8PathBuf,
        /// Description of the structural problem.
        reason: String,
    },

    /// An external tool could not be started or exited unsuccessfully.
    #[error("{tool} failed on {path}: {message}")]
    ToolFailed {
        /// Program name.
        tool: String,
        /// File the tool was working on.
        path: Utf8PathBuf,
        /// Captured diagnostic output or spawn error.
        message: String,
    },

    /// Writing a derived file failed.
    #[error("failed to write {path}")]
    WriteFailed {
        /// Destination path.
        path: Utf8PathBuf,
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },

    /// The decoder was given a name whose extensions it cannot reverse.
    #[error("{path}: unrecognised extension; expected FILE.json[.gz|.bz2|.lzma][.gpg]")]
    UnrecognisedExtension {
        /// The offending path.
        path: Utf8PathBuf,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl PipelineError {
    /// Classify the error for propagation decisions.
    ///
    /// # Examples
    ///
    /// ```
    /// use prompt_extract::error::{ErrorClass, PipelineError};
    ///
    /// let err = PipelineError::MissingRecipient { env_var: "PROMPT_EXTRACT_EMAIL" };
    /// assert_eq!(err.class(), ErrorClass::Configuration);
    /// ```
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingRecipient { .. }
            | Self::RecipientKeyUnavailable { .. }
            | Self::CompressorUnavailable { .. }
            | Self::InvalidStrippedSuffix { .. } => ErrorClass::Configuration,
            Self::MissingInput { .. }
            | Self::UnsupportedInput { .. }
            | Self::InvalidPng { .. }
            | Self::InvalidJpeg { .. }
            | Self::UnrecognisedExtension { .. } => ErrorClass::Input,
            Self::ToolFailed { .. } => ErrorClass::ToolInvocation,
            Self::WriteFailed { .. } | Self::WouldOverwriteSource { .. } | Self::Io(_) => {
                ErrorClass::Filesystem
            }
            #[cfg(any(test, feature = "test-support"))]
            Self::StubMismatch { .. } => ErrorClass::ToolInvocation,
        }
    }

    /// Returns `true` when the error must abort the whole run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Configuration
    }
}

/// Result type alias using [`PipelineError`].
pub type Result<T> = std::result::Result<T, PipelineError>;
