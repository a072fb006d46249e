//! Reversal of the document transformation chain.
//!
//! Given `FILE.json.<ext>.gpg`, `FILE.json.gpg` or `FILE.json.<ext>`, the
//! layers are peeled off in a private temporary directory beside the input
//! and the plain `FILE.json` is moved next to it. The input is never modified.

use crate::error::{PipelineError, Result};
use crate::naming::EncodedName;
use crate::tools::CommandExecutor;
use crate::tools::cipher::decrypt;
use crate::tools::compress::decompress;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use tempfile::TempDir;

/// Decode `input`, returning the path of the restored plain document.
///
/// # Errors
///
/// Returns [`PipelineError::UnrecognisedExtension`] if the name does not
/// describe a known chain, [`PipelineError::MissingInput`] if the file does
/// not exist, [`PipelineError::ToolFailed`] if `gpg` or the decompressor
/// fails, and [`PipelineError::WriteFailed`] if the result cannot be moved
/// into place.
pub fn decode_file(executor: &dyn CommandExecutor, input: &Utf8Path) -> Result<Utf8PathBuf> {
    let chain = EncodedName::parse(input).ok_or_else(|| PipelineError::UnrecognisedExtension {
        path: input.to_owned(),
    })?;
    if !input.is_file() {
        return Err(PipelineError::MissingInput {
            path: input.to_owned(),
        });
    }

    let (_guard, scratch) = scratch_dir(input)?;
    let file_name = input
        .file_name()
        .ok_or_else(|| PipelineError::UnrecognisedExtension {
            path: input.to_owned(),
        })?;
    let mut current = scratch.join(file_name);

    if chain.encrypted {
        let decrypted = current.with_extension("");
        debug!("decrypting {input} into {decrypted}");
        decrypt(executor, input, &decrypted)?;
        current = decrypted;
    } else {
        std::fs::copy(input, &current).map_err(|source| PipelineError::WriteFailed {
            path: current.clone(),
            source,
        })?;
    }

    if let Some(algorithm) = chain.compression {
        debug!("decompressing {current} with {algorithm}");
        current = decompress(executor, &current, algorithm)?;
    }

    std::fs::rename(&current, &chain.plain).map_err(|source| PipelineError::WriteFailed {
        path: chain.plain.clone(),
        source,
    })?;
    info!("wrote {}", chain.plain);
    Ok(chain.plain)
}

/// A temporary directory in the input's directory, so the final rename stays
/// on one filesystem.
fn scratch_dir(input: &Utf8Path) -> Result<(TempDir, Utf8PathBuf)> {
    let parent = match input.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let dir = tempfile::Builder::new()
        .prefix(".prompt-extract-")
        .tempdir_in(parent)?;
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).map_err(|path| {
        std::io::Error::other(format!(
            "temporary directory {} is not valid UTF-8",
            path.display()
        ))
    })?;
    Ok((dir, path))
}
