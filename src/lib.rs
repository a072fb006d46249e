//! Prompt extractor library.
//!
//! This crate lifts the `prompt` and `workflow` JSON documents out of PNG
//! images produced by ComfyUI, writes them beside the image, optionally
//! compresses and encrypts them with external tools, and derives a PNG copy
//! without the documents and a JPEG rendition. It backs the `prompt-extract`
//! and `prompt-extract-decode` binaries.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Immutable run configuration resolved once per run
//! - [`decode`] - Reversal of the compress/encrypt chain
//! - [`document`] - Extracted documents and their on-disk form
//! - [`error`] - Error types and their propagation classes
//! - [`jpeg`] - JPEG dimension reader
//! - [`logging`] - Stderr log subscriber setup for the binaries
//! - [`naming`] - Output naming policy
//! - [`output`] - Dry-run and summary rendering
//! - [`pipeline`] - Per-file step orchestration
//! - [`png`] - PNG chunk codec
//! - [`report`] - Per-file and per-run outcome records
//! - [`retention`] - Retention policy for source images
//! - [`source`] - Source image reading
//! - [`tools`] - External tool invocation (compression, gpg, ImageMagick)

pub mod cli;
pub mod config;
pub mod decode;
pub mod document;
pub mod error;
pub mod jpeg;
pub mod logging;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod png;
pub mod report;
pub mod retention;
pub mod source;
pub mod tools;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
