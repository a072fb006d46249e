//! JPEG dimension reader.
//!
//! Walks the marker segments of a JPEG stream until the first start-of-frame
//! marker and reads the image size from it. Used only for naming recompressed
//! files; the image itself is handled by the external converter.

/// Start-of-image marker every JPEG stream begins with.
const SOI: [u8; 2] = [0xFF, 0xD8];

/// Returns `true` when `bytes` starts with the JPEG start-of-image marker.
#[must_use]
pub fn is_jpeg(bytes: &[u8]) -> bool {
    bytes.starts_with(&SOI)
}

/// Read `(width, height)` from the first SOFn segment.
///
/// Returns `None` when the stream is not a JPEG or ends before a frame
/// header is found.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-support")]
/// # {
/// use prompt_extract::jpeg::dimensions;
/// use prompt_extract::test_utils::jpeg_fixture;
///
/// assert_eq!(dimensions(&jpeg_fixture(640, 480)), Some((640, 480)));
/// # }
/// ```
#[must_use]
pub fn dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let mut rest = bytes.strip_prefix(&SOI)?;

    loop {
        // Skip fill bytes before the marker code.
        let skip = rest.iter().take_while(|b| **b == 0xFF).count();
        if skip == 0 {
            return None;
        }
        let (&marker, tail) = rest.get(skip..)?.split_first()?;
        rest = tail;

        if is_standalone(marker) {
            continue;
        }

        let length = usize::from(u16::from_be_bytes(rest.get(0..2)?.try_into().ok()?));
        if is_start_of_frame(marker) {
            let frame = rest.get(2..length)?;
            let height = u16::from_be_bytes(frame.get(1..3)?.try_into().ok()?);
            let width = u16::from_be_bytes(frame.get(3..5)?.try_into().ok()?);
            return Some((u32::from(width), u32::from(height)));
        }
        rest = rest.get(length..)?;
    }
}

/// SOF0..SOF15 excluding DHT (C4), JPG (C8) and DAC (CC).
fn is_start_of_frame(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

/// Markers without a length field: TEM, RSTn, SOI, EOI.
fn is_standalone(marker: u8) -> bool {
    matches!(marker, 0x01 | 0xD0..=0xD9)
}
