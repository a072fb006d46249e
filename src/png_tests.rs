//! Unit tests for the PNG chunk codec.

use super::*;
use crate::test_utils::PngFixture;
use rstest::rstest;

const METADATA_KEYS: [&str; 2] = ["prompt", "workflow"];

fn parse(bytes: &[u8]) -> PngImage {
    PngImage::parse(bytes).expect("fixture should parse")
}

fn kinds(image: &PngImage) -> Vec<String> {
    image.chunks().iter().map(|c| c.kind().to_string()).collect()
}

#[test]
fn parses_dimensions_from_header() {
    let image = parse(&PngFixture::new(7, 3).build());
    assert_eq!(image.dimensions(), Some((7, 3)));
    assert_eq!(kinds(&image), ["IHDR", "gAMA", "IDAT", "IEND"]);
}

#[rstest]
#[case::text(PngFixture::new(2, 2).with_text("prompt", r#"{"a":1}"#))]
#[case::ztxt(PngFixture::new(2, 2).with_ztxt("prompt", r#"{"a":1}"#))]
#[case::itxt(PngFixture::new(2, 2).with_itxt("prompt", r#"{"a":1}"#))]
fn decodes_every_textual_chunk_type(#[case] fixture: PngFixture) {
    let image = parse(&fixture.build());
    assert_eq!(image.text("prompt"), Some(br#"{"a":1}"#.to_vec()));
    assert_eq!(image.text("workflow"), None);
}

#[test]
fn keys_are_matched_exactly() {
    let image = parse(&PngFixture::new(1, 1).with_text("Prompt", "x").build());
    assert_eq!(image.text("prompt"), None);
    assert!(!image.has_any_key(&METADATA_KEYS));
}

#[test]
fn rejects_missing_signature() {
    assert_eq!(
        PngImage::parse(b"GIF89a not a png"),
        Err(PngError::BadSignature)
    );
}

#[test]
fn rejects_truncated_stream() {
    let bytes = PngFixture::new(2, 2).build();
    let cut = bytes.get(..bytes.len() - 6).expect("fixture longer than 6 bytes");
    assert!(matches!(
        PngImage::parse(cut),
        Err(PngError::Truncated { .. })
    ));
}

#[test]
fn rejects_corrupted_crc() {
    let mut bytes = PngFixture::new(2, 2).with_text("prompt", "{}").build();
    // Flip one bit of the IHDR payload (signature 8 + length 4 + type 4).
    if let Some(byte) = bytes.get_mut(16) {
        *byte ^= 0x01;
    }
    assert!(matches!(
        PngImage::parse(&bytes),
        Err(PngError::CrcMismatch { .. })
    ));
}

#[test]
fn rejects_stream_without_header() {
    let mut bytes = PNG_SIGNATURE.to_vec();
    Chunk::new(ChunkType::new(*b"IEND"), Vec::new()).encode_into(&mut bytes);
    assert_eq!(PngImage::parse(&bytes), Err(PngError::MissingHeader));
}

#[test]
fn ignores_trailing_bytes_after_end() {
    let mut bytes = PngFixture::new(1, 1).build();
    bytes.extend_from_slice(b"garbage");
    let image = parse(&bytes);
    assert_eq!(image.chunks().last().map(|c| c.kind().to_string()), Some("IEND".to_owned()));
}

#[test]
fn stripping_drops_only_metadata_chunks() {
    let source = PngFixture::new(4, 4)
        .with_text("prompt", "{}")
        .with_ztxt("workflow", "{}")
        .with_text("Software", "ComfyUI")
        .build();
    let image = parse(&source);

    let stripped = parse(&image.encode_without(&METADATA_KEYS));

    assert!(!stripped.has_any_key(&METADATA_KEYS));
    assert_eq!(stripped.text("Software"), Some(b"ComfyUI".to_vec()));

    let kept: Vec<&Chunk> = image
        .chunks()
        .iter()
        .filter(|c| {
            c.keyword()
                .is_none_or(|kw| kw != b"prompt" && kw != b"workflow")
        })
        .collect();
    let emitted: Vec<&Chunk> = stripped.chunks().iter().collect();
    assert_eq!(kept, emitted);
}

#[test]
fn stripping_without_metadata_is_identity() {
    let source = PngFixture::new(3, 2).with_text("Software", "x").build();
    let image = parse(&source);
    assert_eq!(image.encode_without(&METADATA_KEYS), source);
}

#[test]
fn malformed_text_chunk_is_skipped() {
    let mut bytes = PNG_SIGNATURE.to_vec();
    let fixture = parse(&PngFixture::new(1, 1).build());
    for chunk in fixture.chunks() {
        if chunk.kind().to_string() == "IEND" {
            Chunk::new(ChunkType::new(*b"zTXt"), b"prompt\0\0not zlib".to_vec())
                .encode_into(&mut bytes);
        }
        chunk.encode_into(&mut bytes);
    }

    let image = parse(&bytes);
    assert_eq!(image.text("prompt"), None);
    assert!(image.has_any_key(&METADATA_KEYS));
}
