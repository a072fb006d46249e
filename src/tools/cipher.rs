//! Asymmetric encryption of extracted documents with `gpg`.
//!
//! Key material is never managed here: the recipient's public key must
//! already be in the invoking user's keyring.

use super::{CommandExecutor, run_tool};
use crate::error::{PipelineError, Result};
use crate::naming;
use camino::{Utf8Path, Utf8PathBuf};

const GPG: &str = "gpg";

/// Capability: encrypt a file for a recipient.
#[cfg_attr(test, mockall::automock)]
pub trait Encryptor {
    /// Encrypt `input` for `recipient`, returning the path of `<input>.gpg`.
    ///
    /// The input file is left in place.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ToolFailed`] if `gpg` is missing or fails.
    fn encrypt(&self, input: &Utf8Path, recipient: &str) -> Result<Utf8PathBuf>;
}

/// [`Encryptor`] backed by the `gpg` program.
pub struct GpgEncryptor<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> GpgEncryptor<'a> {
    /// Create an encryptor that runs `gpg` through `executor`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }
}

impl Encryptor for GpgEncryptor<'_> {
    fn encrypt(&self, input: &Utf8Path, recipient: &str) -> Result<Utf8PathBuf> {
        let output = naming::encrypted_path(input);
        run_tool(
            self.executor,
            GPG,
            &[
                "--batch",
                "--yes",
                "--encrypt",
                "--recipient",
                recipient,
                "--output",
                output.as_str(),
                input.as_str(),
            ],
            input,
        )?;
        Ok(output)
    }
}

/// Decrypt `input` into `output` with the caller's secret key.
///
/// # Errors
///
/// Returns [`PipelineError::ToolFailed`] if `gpg` is missing or fails.
pub fn decrypt(executor: &dyn CommandExecutor, input: &Utf8Path, output: &Utf8Path) -> Result<()> {
    run_tool(
        executor,
        GPG,
        &[
            "--batch",
            "--yes",
            "--decrypt",
            "--output",
            output.as_str(),
            input.as_str(),
        ],
        input,
    )
}

/// Check that `gpg` is installed and holds a usable public key for
/// `recipient`.
///
/// A key is usable when its validity is full, ultimate or marginal. An
/// imported key nobody has certified is listed by `gpg` but refused by
/// `gpg --encrypt --batch`, so it is rejected here before any file is touched.
///
/// # Errors
///
/// Returns [`PipelineError::RecipientKeyUnavailable`] otherwise.
pub fn verify_recipient(executor: &dyn CommandExecutor, recipient: &str) -> Result<()> {
    let unavailable = |reason: String| PipelineError::RecipientKeyUnavailable {
        recipient: recipient.to_owned(),
        reason,
    };

    if !executor.is_installed(GPG) {
        return Err(unavailable("gpg is not installed".to_owned()));
    }

    let output = executor
        .run(GPG, &["--batch", "--with-colons", "--list-keys", recipient])
        .map_err(|err| unavailable(err.to_string()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(unavailable(format!(
            "key not found in keyring ({})",
            stderr.trim()
        )));
    }

    let listing = String::from_utf8_lossy(&output.stdout);
    let validities: Vec<char> = primary_key_validities(&listing).collect();
    if validities.iter().any(|v| matches!(v, 'f' | 'u' | 'm')) {
        return Ok(());
    }
    let reason = match validities.first() {
        None => "key not found in keyring",
        Some('e') => "key has expired",
        Some('r') => "key has been revoked",
        Some('d' | 'i') => "key is disabled or invalid",
        Some(_) => "key is not trusted; certify it or set its owner trust",
    };
    Err(unavailable(reason.to_owned()))
}

/// Validity field of every `pub` record in a `--with-colons` listing.
fn primary_key_validities(listing: &str) -> impl Iterator<Item = char> + '_ {
    listing.lines().filter_map(|line| {
        let mut fields = line.split(':');
        (fields.next() == Some("pub"))
            .then(|| fields.next().and_then(|v| v.chars().next()).unwrap_or('-'))
    })
}
