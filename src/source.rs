//! Source image reading.
//!
//! [`InputKind::detect`] sorts command-line arguments into PNG sources and
//! JPEG recompression inputs; [`SourceImage::read`] lifts the embedded
//! documents out of a PNG.

use crate::document::{DocumentKind, ExtractedDocument};
use crate::error::{PipelineError, Result};
use crate::png::PngImage;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use serde_json::Value;

/// How an input file is handled, decided from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A PNG whose metadata is extracted.
    Png,
    /// A JPEG that is only recompressed.
    Jpeg,
}

impl InputKind {
    /// Classify `path` by its (case-insensitive) extension.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnsupportedInput`] for any other extension.
    pub fn detect(path: &Utf8Path) -> Result<Self> {
        let ext = path.extension().map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("png") => Ok(Self::Png),
            Some("jpg" | "jpeg") => Ok(Self::Jpeg),
            _ => Err(PipelineError::UnsupportedInput {
                path: path.to_owned(),
            }),
        }
    }
}

/// Read the whole of an input file.
///
/// # Errors
///
/// Returns [`PipelineError::MissingInput`] when `path` is not a regular file
/// and [`PipelineError::Io`] when it cannot be read.
pub fn read_input(path: &Utf8Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        return Err(PipelineError::MissingInput {
            path: path.to_owned(),
        });
    }
    Ok(std::fs::read(path)?)
}

/// A PNG produced by ComfyUI and the documents found in it.
#[derive(Debug, Clone)]
pub struct SourceImage {
    path: Utf8PathBuf,
    image: PngImage,
    prompt: Option<ExtractedDocument>,
    workflow: Option<ExtractedDocument>,
}

impl SourceImage {
    /// Metadata keywords removed from the stripped copy.
    pub const METADATA_KEYS: [&'static str; 2] =
        [DocumentKind::Prompt.key(), DocumentKind::Workflow.key()];

    /// Read and parse the PNG at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingInput`] if the file does not exist and
    /// [`PipelineError::InvalidPng`] if it is not a structurally valid PNG.
    pub fn read(path: &Utf8Path) -> Result<Self> {
        let bytes = read_input(path)?;
        Self::from_bytes(path, &bytes)
    }

    /// Parse an already loaded PNG stream read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidPng`] if `bytes` is not a valid PNG.
    pub fn from_bytes(path: &Utf8Path, bytes: &[u8]) -> Result<Self> {
        let image = PngImage::parse(bytes).map_err(|err| PipelineError::InvalidPng {
            path: path.to_owned(),
            reason: err.to_string(),
        })?;

        let lift = |kind: DocumentKind| {
            let text = image.text(kind.key())?;
            let document = ExtractedDocument { kind, text };
            if !document.is_json() {
                warn!("{path}: {kind} is not valid JSON, keeping it verbatim");
            }
            debug!("{path}: found {kind} ({} bytes)", document.text.len());
            Some(document)
        };
        let prompt = lift(DocumentKind::Prompt);
        let workflow = lift(DocumentKind::Workflow);

        Ok(Self {
            path: path.to_owned(),
            image,
            prompt,
            workflow,
        })
    }

    /// Path the image was read from.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The embedded document of `kind`, if present.
    #[must_use]
    pub fn document(&self, kind: DocumentKind) -> Option<&ExtractedDocument> {
        match kind {
            DocumentKind::Prompt => self.prompt.as_ref(),
            DocumentKind::Workflow => self.workflow.as_ref(),
        }
    }

    /// Returns `true` when at least one document is embedded.
    #[must_use]
    pub fn has_metadata(&self) -> bool {
        self.prompt.is_some() || self.workflow.is_some()
    }

    /// Returns `true` when a prompt or workflow chunk is present, whether or
    /// not its text could be decoded.
    #[must_use]
    pub fn has_metadata_chunks(&self) -> bool {
        self.image.has_any_key(&Self::METADATA_KEYS)
    }

    /// Width and height from the image header.
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.dimensions()
    }

    /// Generation seed: the first integer `inputs.seed` among the prompt's
    /// nodes, in document order.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        let prompt = self.prompt.as_ref()?;
        let graph: Value = serde_json::from_slice(&prompt.text).ok()?;
        graph
            .as_object()?
            .values()
            .filter_map(|node| node.get("inputs")?.get("seed")?.as_u64())
            .next()
    }

    /// The PNG stream with the prompt and workflow chunks removed.
    #[must_use]
    pub fn stripped_bytes(&self) -> Vec<u8> {
        self.image.encode_without(&Self::METADATA_KEYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::PngFixture;
    use rstest::rstest;
    use tempfile::TempDir;

    const GRAPH: &str = r#"{"4":{"class_type":"CheckpointLoader","inputs":{"ckpt":"x"}},"3":{"class_type":"KSampler","inputs":{"seed":1234,"steps":20}},"9":{"inputs":{"seed":99}}}"#;

    fn parse(fixture: &PngFixture) -> SourceImage {
        SourceImage::from_bytes(Utf8Path::new("art.png"), &fixture.build()).expect("valid png")
    }

    #[rstest]
    #[case::png("a.png", InputKind::Png)]
    #[case::upper_png("A.PNG", InputKind::Png)]
    #[case::jpg("b.jpg", InputKind::Jpeg)]
    #[case::jpeg("b.JPEG", InputKind::Jpeg)]
    fn detects_input_kind(#[case] path: &str, #[case] expected: InputKind) {
        assert_eq!(InputKind::detect(Utf8Path::new(path)).expect("supported"), expected);
    }

    #[rstest]
    #[case::webp("c.webp")]
    #[case::none("README")]
    fn rejects_other_inputs(#[case] path: &str) {
        let err = InputKind::detect(Utf8Path::new(path)).expect_err("unsupported");
        assert!(matches!(err, PipelineError::UnsupportedInput { .. }));
    }

    #[test]
    fn reads_both_documents() {
        let source = parse(
            &PngFixture::new(4, 3)
                .with_text("prompt", GRAPH)
                .with_ztxt("workflow", r#"{"nodes":[]}"#),
        );

        let prompt = source.document(DocumentKind::Prompt).expect("prompt");
        let workflow = source.document(DocumentKind::Workflow).expect("workflow");
        assert_eq!(prompt.text, GRAPH.as_bytes());
        assert_eq!(workflow.text, br#"{"nodes":[]}"#);
        assert_eq!(source.dimensions(), Some((4, 3)));
        assert!(source.has_metadata());
    }

    #[test]
    fn image_without_documents_has_no_metadata() {
        let source = parse(&PngFixture::new(2, 2).with_text("Software", "GIMP"));
        assert!(!source.has_metadata());
        assert!(source.document(DocumentKind::Prompt).is_none());
    }

    #[test]
    fn seed_is_first_integer_in_document_order() {
        let source = parse(&PngFixture::new(1, 1).with_text("prompt", GRAPH));
        assert_eq!(source.seed(), Some(1234));
    }

    #[rstest]
    #[case::no_seed(r#"{"1":{"inputs":{"steps":3}}}"#)]
    #[case::string_seed(r#"{"1":{"inputs":{"seed":"abc"}}}"#)]
    #[case::not_json("a cat, best quality")]
    fn seed_absent(#[case] prompt: &str) {
        let source = parse(&PngFixture::new(1, 1).with_text("prompt", prompt));
        assert_eq!(source.seed(), None);
    }

    #[test]
    fn non_json_text_is_kept_verbatim() {
        let source = parse(&PngFixture::new(1, 1).with_itxt("prompt", "a cat"));
        let prompt = source.document(DocumentKind::Prompt).expect("prompt");
        assert_eq!(prompt.text, b"a cat");
    }

    #[test]
    fn stripped_bytes_have_no_documents() {
        let source = parse(
            &PngFixture::new(3, 3)
                .with_text("prompt", "{}")
                .with_text("workflow", "{}"),
        );
        let stripped = PngImage::parse(&source.stripped_bytes()).expect("still a png");
        assert!(!stripped.has_any_key(&SourceImage::METADATA_KEYS));
        assert_eq!(stripped.dimensions(), Some((3, 3)));
    }

    #[test]
    fn undecodable_chunk_still_counts_as_metadata() {
        let source = parse(&PngFixture::new(2, 2).with_malformed_ztxt("prompt"));
        assert!(!source.has_metadata());
        assert!(source.has_metadata_chunks());
        let stripped = PngImage::parse(&source.stripped_bytes()).expect("still a png");
        assert!(!stripped.has_any_key(&SourceImage::METADATA_KEYS));
    }

    #[test]
    fn missing_file_is_input_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("gone.png")).expect("utf-8");
        let err = SourceImage::read(&path).expect_err("file is missing");
        assert!(matches!(err, PipelineError::MissingInput { .. }));
    }

    #[test]
    fn corrupt_png_is_input_error() {
        let mut bytes = PngFixture::new(2, 2).with_text("prompt", "{}").build();
        bytes[20] ^= 0xFF;
        let err = SourceImage::from_bytes(Utf8Path::new("bad.png"), &bytes)
            .expect_err("header CRC is wrong");
        assert!(matches!(err, PipelineError::InvalidPng { .. }));
        assert!(err.to_string().contains("bad.png"));
    }
}
