//! EXIF capture from source images and re-attachment to JPEG output.

use exif::Reader;
use std::io::Cursor;

/// JPEG APP1 payloads start with this identifier.
const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

/// Extracts and re-inserts EXIF metadata.
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Extract the raw EXIF block (TIFF structure) from an encoded image.
    ///
    /// Returns `None` if the file has no EXIF data or if parsing fails. The
    /// block is returned verbatim so capture metadata survives re-encoding.
    pub fn extract_raw(bytes: &[u8]) -> Option<Vec<u8>> {
        let exif = Reader::new()
            .read_from_container(&mut Cursor::new(bytes))
            .ok()?;
        if exif.buf().is_empty() {
            return None;
        }
        Some(exif.buf().to_vec())
    }

    /// Insert `raw` as the APP1 segment of an encoded JPEG, replacing any
    /// existing EXIF segment. Leaves `jpeg` untouched if it is not a JPEG
    /// stream or the block does not fit in a single segment.
    pub fn insert_into_jpeg(jpeg: &mut Vec<u8>, raw: &[u8]) {
        if jpeg.len() < 2 || jpeg[0] != 0xFF || jpeg[1] != 0xD8 {
            return;
        }

        let mut payload = Vec::with_capacity(EXIF_HEADER.len() + raw.len());
        if !raw.starts_with(EXIF_HEADER) {
            payload.extend_from_slice(EXIF_HEADER);
        }
        payload.extend_from_slice(raw);

        if payload.len() + 2 > u16::MAX as usize {
            tracing::warn!("Skipping EXIF attachment: {} bytes is too large", raw.len());
            return;
        }

        Self::remove_exif_segment(jpeg);

        // Place APP1 after SOI and any APP0 (JFIF) segment
        let mut insert_at = 2;
        if jpeg.len() >= 6 && jpeg[2] == 0xFF && jpeg[3] == 0xE0 {
            let len = ((jpeg[4] as usize) << 8) | jpeg[5] as usize;
            insert_at = (4 + len).min(jpeg.len());
        }

        let segment_len = (payload.len() + 2) as u16;
        let mut segment = Vec::with_capacity(payload.len() + 4);
        segment.extend_from_slice(&[0xFF, 0xE1]);
        segment.extend_from_slice(&segment_len.to_be_bytes());
        segment.extend_from_slice(&payload);
        jpeg.splice(insert_at..insert_at, segment);
    }

    /// Drop the first APP1 EXIF segment found before the scan data.
    fn remove_exif_segment(jpeg: &mut Vec<u8>) {
        let mut scan = 2;
        while scan + 4 <= jpeg.len() && jpeg[scan] == 0xFF {
            let marker = jpeg[scan + 1];
            // Stop at start of scan or end of image
            if marker == 0xDA || marker == 0xD9 {
                break;
            }
            if marker == 0xD8 || marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
                scan += 2;
                continue;
            }
            let len = ((jpeg[scan + 2] as usize) << 8) | jpeg[scan + 3] as usize;
            if len < 2 {
                break;
            }
            let end = (scan + 2 + len).min(jpeg.len());
            if marker == 0xE1 && jpeg[scan + 4..end].starts_with(EXIF_HEADER) {
                jpeg.drain(scan..end);
                break;
            }
            scan = end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::{In, Tag};

    fn orientation(raw: &[u8]) -> Option<u32> {
        let exif = Reader::new().read_raw(raw.to_vec()).ok()?;
        exif.get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
    }

    /// Minimal little-endian TIFF block with a single Orientation = 6 entry.
    fn tiff_with_orientation() -> Vec<u8> {
        let mut tiff = vec![b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        tiff.extend_from_slice(&[0x01, 0x00]); // one entry
        tiff.extend_from_slice(&[0x12, 0x01]); // tag 0x0112 Orientation
        tiff.extend_from_slice(&[0x03, 0x00]); // SHORT
        tiff.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]); // count 1
        tiff.extend_from_slice(&[0x06, 0x00, 0x00, 0x00]); // value 6
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // no next IFD
        tiff
    }

    fn tiny_jpeg() -> Vec<u8> {
        let mut buf = Vec::new();
        image::DynamicImage::new_rgb8(4, 4)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
            .unwrap();
        buf
    }

    #[test]
    fn test_extract_raw_without_exif() {
        assert!(MetadataExtractor::extract_raw(&tiny_jpeg()).is_none());
        assert!(MetadataExtractor::extract_raw(b"garbage").is_none());
    }

    #[test]
    fn test_orientation_from_raw_block() {
        assert_eq!(orientation(&tiff_with_orientation()), Some(6));
    }

    #[test]
    fn test_insert_then_extract() {
        let mut jpeg = tiny_jpeg();
        MetadataExtractor::insert_into_jpeg(&mut jpeg, &tiff_with_orientation());

        let raw = MetadataExtractor::extract_raw(&jpeg).expect("exif present");
        assert_eq!(orientation(&raw), Some(6));
        // Still decodes as an image
        assert!(image::load_from_memory(&jpeg).is_ok());
    }

    #[test]
    fn test_insert_replaces_existing_segment() {
        let mut jpeg = tiny_jpeg();
        MetadataExtractor::insert_into_jpeg(&mut jpeg, &tiff_with_orientation());
        let once = jpeg.len();
        MetadataExtractor::insert_into_jpeg(&mut jpeg, &tiff_with_orientation());
        assert_eq!(jpeg.len(), once);
    }

    #[test]
    fn test_segments_after_end_of_image_untouched() {
        // SOI, EOI, then bytes that would parse as an EXIF APP1 if the
        // scan ran past the end marker
        let mut trailing = vec![0x00, 0x02, 0xFF, 0xE1, 0x00, 0x08];
        trailing.extend_from_slice(EXIF_HEADER);
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xD9];
        jpeg.extend_from_slice(&trailing);
        let before = jpeg.len();

        let raw = tiff_with_orientation();
        MetadataExtractor::insert_into_jpeg(&mut jpeg, &raw);

        assert!(jpeg.ends_with(&trailing));
        assert_eq!(jpeg.len(), before + 4 + EXIF_HEADER.len() + raw.len());
    }

    #[test]
    fn test_insert_ignores_non_jpeg() {
        let mut png = vec![0x89, b'P', b'N', b'G'];
        MetadataExtractor::insert_into_jpeg(&mut png, &tiff_with_orientation());
        assert_eq!(png, vec![0x89, b'P', b'N', b'G']);
    }
}
