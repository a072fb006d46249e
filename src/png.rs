//! PNG chunk codec.
//!
//! Only the chunk layer of the format is handled here: the signature, the
//! length/type/data/CRC framing, the `IHDR` dimensions and the three textual
//! chunk types (`tEXt`, `zTXt`, `iTXt`). Pixel data is never decoded; chunks
//! the pipeline does not care about are carried through byte-for-byte.

use flate2::read::ZlibDecoder;
use log::{debug, warn};
use std::fmt;
use std::io::Read;
use thiserror::Error;

/// The eight-byte signature every PNG file starts with.
pub const PNG_SIGNATURE: [u8; 8] = *b"\x89PNG\r\n\x1a\n";

/// Largest chunk length a PNG chunk may declare (2^31 - 1).
const MAX_CHUNK_LEN: u32 = 0x7FFF_FFFF;

const IHDR: [u8; 4] = *b"IHDR";
const IEND: [u8; 4] = *b"IEND";
const TEXT: [u8; 4] = *b"tEXt";
const ZTXT: [u8; 4] = *b"zTXt";
const ITXT: [u8; 4] = *b"iTXt";

/// Structural problems found while parsing a PNG stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PngError {
    /// The stream does not start with [`PNG_SIGNATURE`].
    #[error("missing PNG signature")]
    BadSignature,
    /// The stream ended in the middle of a chunk or before `IEND`.
    #[error("truncated stream at offset {offset}")]
    Truncated {
        /// Byte offset where more data was expected.
        offset: usize,
    },
    /// A chunk declared a length above the format limit.
    #[error("chunk at offset {offset} declares oversized length {length}")]
    OversizedChunk {
        /// Byte offset of the chunk header.
        offset: usize,
        /// Declared length.
        length: u32,
    },
    /// The stored CRC does not match the chunk contents.
    #[error("CRC mismatch in {kind} chunk at offset {offset}")]
    CrcMismatch {
        /// Chunk type.
        kind: ChunkType,
        /// Byte offset of the chunk header.
        offset: usize,
    },
    /// The first chunk is not a well-formed `IHDR`.
    #[error("first chunk is not a valid IHDR")]
    MissingHeader,
}

/// A four-byte chunk type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType([u8; 4]);

impl ChunkType {
    /// Wrap a raw type code.
    #[must_use]
    pub const fn new(code: [u8; 4]) -> Self {
        Self(code)
    }

    /// Return the raw type code.
    #[must_use]
    pub const fn bytes(self) -> [u8; 4] {
        self.0
    }

    /// Returns `true` for `tEXt`, `zTXt` and `iTXt`.
    #[must_use]
    pub fn is_textual(self) -> bool {
        matches!(self.0, TEXT | ZTXT | ITXT)
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// One framed chunk, kept verbatim so it can be re-emitted unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    kind: ChunkType,
    data: Vec<u8>,
    crc: u32,
}

impl Chunk {
    /// Build a chunk and compute its CRC.
    ///
    /// # Examples
    ///
    /// ```
    /// use prompt_extract::png::{Chunk, ChunkType};
    ///
    /// let chunk = Chunk::new(ChunkType::new(*b"IEND"), Vec::new());
    /// assert_eq!(chunk.crc(), 0xAE42_6082);
    /// ```
    #[must_use]
    pub fn new(kind: ChunkType, data: Vec<u8>) -> Self {
        let crc = chunk_crc(kind, &data);
        Self { kind, data, crc }
    }

    /// Chunk type.
    #[must_use]
    pub fn kind(&self) -> ChunkType {
        self.kind
    }

    /// Chunk payload.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Stored CRC.
    #[must_use]
    pub fn crc(&self) -> u32 {
        self.crc
    }

    /// Keyword of a textual chunk, i.e. the bytes before the first NUL.
    #[must_use]
    pub fn keyword(&self) -> Option<&[u8]> {
        if !self.kind.is_textual() {
            return None;
        }
        self.data.split(|b| *b == 0).next()
    }

    /// Append the framed chunk (length, type, data, CRC) to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let len = u32::try_from(self.data.len()).unwrap_or(MAX_CHUNK_LEN);
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&self.kind.bytes());
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&self.crc.to_be_bytes());
    }

    /// Decode the keyword and text of a textual chunk.
    ///
    /// Returns `Ok(None)` for non-textual chunks.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the textual payload is
    /// malformed or a compressed text fails to inflate.
    pub fn text_entry(&self) -> Result<Option<TextEntry>, String> {
        if !self.kind.is_textual() {
            return Ok(None);
        }
        let (keyword, rest) = split_nul(&self.data)
            .ok_or_else(|| format!("{} chunk without keyword separator", self.kind))?;
        let keyword = latin1_to_string(keyword);
        let text = match self.kind.bytes() {
            TEXT => rest.to_vec(),
            ZTXT => match rest.split_first() {
                Some((0, compressed)) => inflate(compressed)?,
                Some((method, _)) => return Err(format!("unknown zTXt compression {method}")),
                None => return Err("zTXt chunk without compression method".to_owned()),
            },
            _ => decode_itxt_body(rest)?,
        };
        Ok(Some(TextEntry { keyword, text }))
    }
}

/// Keyword and decoded text of a textual chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    /// Chunk keyword.
    pub keyword: String,
    /// Uncompressed text bytes, exactly as stored.
    pub text: Vec<u8>,
}

/// A parsed PNG stream: the signature followed by every chunk up to and
/// including `IEND`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngImage {
    chunks: Vec<Chunk>,
}

impl PngImage {
    /// Parse a PNG stream, verifying the signature, chunk framing and CRCs.
    ///
    /// Bytes after `IEND` are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`PngError`] describing the first structural problem found.
    pub fn parse(bytes: &[u8]) -> Result<Self, PngError> {
        let body = bytes
            .strip_prefix(&PNG_SIGNATURE)
            .ok_or(PngError::BadSignature)?;
        let mut offset = PNG_SIGNATURE.len();
        let mut rest = body;
        let mut chunks = Vec::new();

        loop {
            let (chunk, consumed) = read_chunk(rest, offset)?;
            debug!("chunk {} ({} bytes) at {offset}", chunk.kind, chunk.data.len());
            let is_end = chunk.kind.bytes() == IEND;
            chunks.push(chunk);
            if is_end {
                break;
            }
            offset += consumed;
            rest = rest.get(consumed..).ok_or(PngError::Truncated { offset })?;
        }

        let image = Self { chunks };
        if image.dimensions().is_none() {
            return Err(PngError::MissingHeader);
        }
        Ok(image)
    }

    /// All chunks in stream order.
    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Width and height from the `IHDR` chunk.
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let header = self.chunks.first().filter(|c| c.kind.bytes() == IHDR)?;
        if header.data.len() != 13 {
            return None;
        }
        let width = read_be_u32(header.data.get(0..4)?)?;
        let height = read_be_u32(header.data.get(4..8)?)?;
        Some((width, height))
    }

    /// Decoded text of the first textual chunk whose keyword equals `key`.
    ///
    /// Malformed textual chunks are skipped with a warning.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<Vec<u8>> {
        self.chunks.iter().find_map(|chunk| match chunk.text_entry() {
            Ok(Some(entry)) if entry.keyword == key => Some(entry.text),
            Ok(_) => None,
            Err(reason) => {
                warn!("ignoring malformed {} chunk: {reason}", chunk.kind);
                None
            }
        })
    }

    /// Re-encode the image without textual chunks keyed by any of `keys`.
    ///
    /// Every other chunk is emitted unchanged, including its original CRC.
    #[must_use]
    pub fn encode_without(&self, keys: &[&str]) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        for chunk in &self.chunks {
            let dropped = chunk
                .keyword()
                .is_some_and(|kw| keys.iter().any(|key| key.as_bytes() == kw));
            if dropped {
                debug!("dropping {} chunk", chunk.kind);
                continue;
            }
            chunk.encode_into(&mut out);
        }
        out
    }

    /// Returns `true` when any textual chunk is keyed by one of `keys`.
    #[must_use]
    pub fn has_any_key(&self, keys: &[&str]) -> bool {
        self.chunks.iter().any(|chunk| {
            chunk
                .keyword()
                .is_some_and(|kw| keys.iter().any(|key| key.as_bytes() == kw))
        })
    }
}

fn read_chunk(rest: &[u8], offset: usize) -> Result<(Chunk, usize), PngError> {
    let truncated = PngError::Truncated { offset };
    let length = rest.get(0..4).and_then(read_be_u32).ok_or(truncated.clone())?;
    if length > MAX_CHUNK_LEN {
        return Err(PngError::OversizedChunk { offset, length });
    }
    let data_len = usize::try_from(length).map_err(|_| truncated.clone())?;
    let kind: [u8; 4] = rest
        .get(4..8)
        .and_then(|b| b.try_into().ok())
        .ok_or(truncated.clone())?;
    let kind = ChunkType::new(kind);
    let data = rest.get(8..8 + data_len).ok_or(truncated.clone())?;
    let crc = rest
        .get(8 + data_len..12 + data_len)
        .and_then(read_be_u32)
        .ok_or(truncated)?;

    if chunk_crc(kind, data) != crc {
        return Err(PngError::CrcMismatch { kind, offset });
    }

    let chunk = Chunk {
        kind,
        data: data.to_vec(),
        crc,
    };
    Ok((chunk, 12 + data_len))
}

fn chunk_crc(kind: ChunkType, data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&kind.bytes());
    hasher.update(data);
    hasher.finalize()
}

fn read_be_u32(bytes: &[u8]) -> Option<u32> {
    bytes.try_into().ok().map(u32::from_be_bytes)
}

fn split_nul(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = bytes.iter().position(|b| *b == 0)?;
    Some((bytes.get(..pos)?, bytes.get(pos + 1..)?))
}

fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| char::from(*b)).collect()
}

fn inflate(compressed: &[u8]) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    ZlibDecoder::new(compressed)
        .read_to_end(&mut out)
        .map_err(|e| format!("zlib stream is corrupt: {e}"))?;
    Ok(out)
}

/// `iTXt` after the keyword: flag, method, language NUL, translated NUL, text.
fn decode_itxt_body(rest: &[u8]) -> Result<Vec<u8>, String> {
    let (flag, method, tail) = match rest {
        [flag, method, tail @ ..] => (*flag, *method, tail),
        _ => return Err("iTXt chunk too short".to_owned()),
    };
    let (_language, tail) = split_nul(tail).ok_or("iTXt chunk without language tag")?;
    let (_translated, text) = split_nul(tail).ok_or("iTXt chunk without translated keyword")?;
    match (flag, method) {
        (0, _) => Ok(text.to_vec()),
        (1, 0) => inflate(text),
        (1, other) => Err(format!("unknown iTXt compression {other}")),
        (other, _) => Err(format!("invalid iTXt compression flag {other}")),
    }
}

#[cfg(test)]
#[path = "png_tests.rs"]
mod tests;
