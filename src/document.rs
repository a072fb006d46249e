//! Extracted metadata documents and their on-disk form.

use crate::error::{PipelineError, Result};
use crate::naming;
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use std::fmt;

/// The two documents ComfyUI embeds in its PNG output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// The executed node graph, keyed `prompt`.
    Prompt,
    /// The editor workflow, keyed `workflow`.
    Workflow,
}

impl DocumentKind {
    /// Both kinds, in processing order.
    pub const ALL: [Self; 2] = [Self::Prompt, Self::Workflow];

    /// Text chunk keyword carrying this document.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Workflow => "workflow",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A document lifted out of a source image, exactly as embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// Which document this is.
    pub kind: DocumentKind,
    /// Raw text bytes.
    pub text: Vec<u8>,
}

impl ExtractedDocument {
    /// Whether the text parses as JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        serde_json::from_slice::<serde_json::Value>(&self.text).is_ok()
    }
}

/// Write `document` beside `source` as `<stem>.<kind>.json`, replacing any
/// existing file, and return its path.
///
/// # Errors
///
/// Returns [`PipelineError::WriteFailed`] if the file cannot be written.
pub fn write_document(source: &Utf8Path, document: &ExtractedDocument) -> Result<Utf8PathBuf> {
    let path = naming::document_path(source, document.kind);
    std::fs::write(&path, &document.text).map_err(|source| PipelineError::WriteFailed {
        path: path.clone(),
        source,
    })?;
    info!("wrote {path}");
    Ok(path)
}
