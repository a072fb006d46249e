//! Output naming policy.
//!
//! Every derived file lives beside its source and encodes its lineage in its
//! name, so that the decoder can reverse a chain by looking only at the two
//! rightmost extensions:
//!
//! | Artifact | Name |
//! |---|---|
//! | Extracted document | `<stem>.<kind>.json` |
//! | Compressed | `<input>.<lzma\|bz2\|gz>` |
//! | Encrypted | `<input>.gpg` |
//! | Stripped PNG | `<stem>[_<seed>][_<W>x<H>]<suffix>.png` |
//! | JPEG rendition | `<stem>[_<seed>][_<W>x<H>].jpg` |
//! | Recompressed JPEG | `<stem>[_<W>x<H>]_q<quality>.jpg` |

use crate::config::Quality;
use crate::document::DocumentKind;
use crate::tools::CompressionAlgorithm;
use camino::{Utf8Path, Utf8PathBuf};

/// Extension added by the encryptor.
pub const ENCRYPTED_EXTENSION: &str = "gpg";

/// Extension of extracted documents.
pub const DOCUMENT_EXTENSION: &str = "json";

/// Optional decorations added to image output names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageTags {
    /// Generation seed, when known and requested.
    pub seed: Option<u64>,
    /// Width and height, when requested.
    pub size: Option<(u32, u32)>,
}

impl ImageTags {
    fn render(self) -> String {
        let mut tags = String::new();
        if let Some(seed) = self.seed {
            tags.push_str(&format!("_{seed}"));
        }
        if let Some((width, height)) = self.size {
            tags.push_str(&format!("_{width}x{height}"));
        }
        tags
    }
}

/// File stem of `path`, or the whole file name when it has no extension.
fn stem(path: &Utf8Path) -> &str {
    path.file_stem().unwrap_or_else(|| path.as_str())
}

fn sibling(path: &Utf8Path, file_name: &str) -> Utf8PathBuf {
    path.with_file_name(file_name)
}

/// Append `.ext` to the full file name of `path`.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use prompt_extract::naming::append_extension;
///
/// assert_eq!(append_extension(Utf8Path::new("a.json"), "gz"), "a.json.gz");
/// ```
#[must_use]
pub fn append_extension(path: &Utf8Path, ext: &str) -> Utf8PathBuf {
    let mut name = path.as_str().to_owned();
    name.push('.');
    name.push_str(ext);
    Utf8PathBuf::from(name)
}

/// `<dir>/<stem>.<kind>.json` for a source image.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use prompt_extract::document::DocumentKind;
/// use prompt_extract::naming::document_path;
///
/// let path = document_path(Utf8Path::new("out/art.png"), DocumentKind::Prompt);
/// assert_eq!(path, "out/art.prompt.json");
/// ```
#[must_use]
pub fn document_path(source: &Utf8Path, kind: DocumentKind) -> Utf8PathBuf {
    sibling(
        source,
        &format!("{}.{kind}.{DOCUMENT_EXTENSION}", stem(source)),
    )
}

/// `<input>.<ext>` for a compressed file.
#[must_use]
pub fn compressed_path(input: &Utf8Path, algorithm: CompressionAlgorithm) -> Utf8PathBuf {
    append_extension(input, algorithm.extension())
}

/// `<input>.gpg` for an encrypted file.
#[must_use]
pub fn encrypted_path(input: &Utf8Path) -> Utf8PathBuf {
    append_extension(input, ENCRYPTED_EXTENSION)
}

/// Name of the metadata-free PNG copy.
#[must_use]
pub fn stripped_png_path(source: &Utf8Path, tags: ImageTags, suffix: &str) -> Utf8PathBuf {
    sibling(
        source,
        &format!("{}{}{suffix}.png", stem(source), tags.render()),
    )
}

/// Name of the JPEG rendition of a PNG source.
#[must_use]
pub fn jpeg_path(source: &Utf8Path, tags: ImageTags) -> Utf8PathBuf {
    sibling(source, &format!("{}{}.jpg", stem(source), tags.render()))
}

/// Name of a recompressed JPEG; the quality tag keeps it distinct from the
/// input.
#[must_use]
pub fn recompressed_jpeg_path(
    source: &Utf8Path,
    size: Option<(u32, u32)>,
    quality: Quality,
) -> Utf8PathBuf {
    let tags = ImageTags { seed: None, size };
    sibling(
        source,
        &format!("{}{}_q{quality}.jpg", stem(source), tags.render()),
    )
}

/// Transformation chain recovered from an encoded document name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedName {
    /// The final plain document, e.g. `art.prompt.json`.
    pub plain: Utf8PathBuf,
    /// Compression applied before encryption, if any.
    pub compression: Option<CompressionAlgorithm>,
    /// Whether the outermost layer is `gpg` encryption.
    pub encrypted: bool,
}

impl EncodedName {
    /// Recover the chain from the two rightmost extensions of `path`.
    ///
    /// Accepted shapes: `FILE.<ext>.gpg`, `FILE.json.gpg` and `FILE.<ext>`
    /// where `<ext>` is one of `lzma`, `bz2` or `gz`. Returns `None` for
    /// anything else.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use prompt_extract::naming::EncodedName;
    /// use prompt_extract::tools::CompressionAlgorithm;
    ///
    /// let name = EncodedName::parse(Utf8Path::new("art.prompt.json.lzma.gpg")).expect("known chain");
    /// assert_eq!(name.plain, "art.prompt.json");
    /// assert_eq!(name.compression, Some(CompressionAlgorithm::Lzma));
    /// assert!(name.encrypted);
    /// ```
    #[must_use]
    pub fn parse(path: &Utf8Path) -> Option<Self> {
        let outer = path.extension()?;
        if outer == ENCRYPTED_EXTENSION {
            let inner_path = path.with_extension("");
            let inner = inner_path.extension()?;
            if inner == DOCUMENT_EXTENSION {
                return Some(Self {
                    plain: inner_path,
                    compression: None,
                    encrypted: true,
                });
            }
            let algorithm = CompressionAlgorithm::from_extension(inner)?;
            return Some(Self {
                plain: inner_path.with_extension(""),
                compression: Some(algorithm),
                encrypted: true,
            });
        }

        let algorithm = CompressionAlgorithm::from_extension(outer)?;
        Some(Self {
            plain: path.with_extension(""),
            compression: Some(algorithm),
            encrypted: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn quality(value: u8) -> Quality {
        Quality::new(value).expect("quality in range")
    }

    #[rstest]
    #[case::prompt(DocumentKind::Prompt, "dir/art.prompt.json")]
    #[case::workflow(DocumentKind::Workflow, "dir/art.workflow.json")]
    fn document_names_use_source_stem(#[case] kind: DocumentKind, #[case] expected: &str) {
        assert_eq!(document_path(Utf8Path::new("dir/art.png"), kind), expected);
    }

    #[test]
    fn document_name_keeps_inner_dots() {
        assert_eq!(
            document_path(Utf8Path::new("ComfyUI_00001_.v2.png"), DocumentKind::Prompt),
            "ComfyUI_00001_.v2.prompt.json"
        );
    }

    #[test]
    fn chained_names_encode_lineage() {
        let json = document_path(Utf8Path::new("foo.png"), DocumentKind::Prompt);
        let compressed = compressed_path(&json, CompressionAlgorithm::Lzma);
        let encrypted = encrypted_path(&compressed);
        assert_eq!(encrypted, "foo.prompt.json.lzma.gpg");
    }

    #[rstest]
    #[case::plain(ImageTags::default(), "art_no_prompt.png", "art.jpg")]
    #[case::seed(
        ImageTags { seed: Some(42), size: None },
        "art_42_no_prompt.png",
        "art_42.jpg"
    )]
    #[case::seed_and_size(
        ImageTags { seed: Some(7), size: Some((1024, 768)) },
        "art_7_1024x768_no_prompt.png",
        "art_7_1024x768.jpg"
    )]
    fn image_names_carry_tags(
        #[case] tags: ImageTags,
        #[case] stripped: &str,
        #[case] jpeg: &str,
    ) {
        let source = Utf8Path::new("art.png");
        assert_eq!(stripped_png_path(source, tags, "_no_prompt"), stripped);
        assert_eq!(jpeg_path(source, tags), jpeg);
    }

    #[rstest]
    #[case::without_size(None, "photo_q70.jpg")]
    #[case::with_size(Some((640, 480)), "photo_640x480_q70.jpg")]
    fn recompressed_names_differ_from_input(
        #[case] size: Option<(u32, u32)>,
        #[case] expected: &str,
    ) {
        assert_eq!(
            recompressed_jpeg_path(Utf8Path::new("photo.jpg"), size, quality(70)),
            expected
        );
    }

    #[rstest]
    #[case::gz("a.prompt.json.gz.gpg", "a.prompt.json", Some(CompressionAlgorithm::Gzip), true)]
    #[case::bz2("a.prompt.json.bz2.gpg", "a.prompt.json", Some(CompressionAlgorithm::Bzip2), true)]
    #[case::plain_gpg("a.workflow.json.gpg", "a.workflow.json", None, true)]
    #[case::compressed_only("a.workflow.json.lzma", "a.workflow.json", Some(CompressionAlgorithm::Lzma), false)]
    fn encoded_names_are_reversible(
        #[case] input: &str,
        #[case] plain: &str,
        #[case] compression: Option<CompressionAlgorithm>,
        #[case] encrypted: bool,
    ) {
        let parsed = EncodedName::parse(Utf8Path::new(input)).expect("known chain");
        assert_eq!(
            parsed,
            EncodedName {
                plain: Utf8PathBuf::from(plain),
                compression,
                encrypted,
            }
        );
    }

    #[rstest]
    #[case::zip("a.prompt.json.zip.gpg")]
    #[case::bare("a.prompt.json")]
    #[case::unknown_outer("a.prompt.json.xz")]
    #[case::no_extension("README")]
    fn unknown_chains_are_rejected(#[case] input: &str) {
        assert_eq!(EncodedName::parse(Utf8Path::new(input)), None);
    }
}
