//! Content types for uploaded file parts.
//!
//! The upload endpoint rejects file parts labelled `text/plain`, so a declared
//! `text/plain` is discarded in favour of a type guessed from the image
//! content or file name, and anything unrecognised is sent as
//! `application/octet-stream`.
use std::path::Path;

use image::ImageFormat;
use mediatype::{names, MediaType};

/// Fallback for file parts of unknown type.
pub const APPLICATION_OCTET_STREAM: MediaType =
    MediaType::new(names::APPLICATION, names::OCTET_STREAM);
const TEXT_PLAIN: MediaType = MediaType::new(names::TEXT, names::PLAIN);

/// Picks the content type of an uploaded file part.
///
/// A valid `declared` type is used unless it is `text/plain`. Otherwise the
/// image format is guessed from the leading bytes, then from the file name's
/// extension.
pub fn file_part_media_type(
    declared: Option<&str>,
    file_name: Option<&str>,
    bytes: &[u8],
) -> String {
    if let Some(declared) = declared.and_then(|value| MediaType::parse(value.trim()).ok()) {
        if is_text_plain(&declared) {
            tracing::debug!(declared = %declared, "dropping text/plain from file part");
        } else {
            return declared.to_string();
        }
    }

    let guessed = image::guess_format(bytes)
        .ok()
        .or_else(|| file_name.and_then(|name| ImageFormat::from_path(Path::new(name)).ok()));

    match guessed {
        Some(format) => format.to_mime_type().to_string(),
        None => APPLICATION_OCTET_STREAM.to_string(),
    }
}

fn is_text_plain(media_type: &MediaType) -> bool {
    media_type.ty == TEXT_PLAIN.ty && media_type.subty == TEXT_PLAIN.subty
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn declared_type_wins() {
        assert_eq!(
            file_part_media_type(Some("image/webp"), Some("a.png"), PNG_MAGIC),
            "image/webp"
        );
    }

    #[test]
    fn text_plain_is_never_sent() {
        assert_eq!(
            file_part_media_type(Some("text/plain"), None, PNG_MAGIC),
            "image/png"
        );
        assert_eq!(
            file_part_media_type(Some("text/plain; charset=utf-8"), None, b"hello"),
            "application/octet-stream"
        );
    }

    #[test]
    fn guesses_from_content_then_name() {
        assert_eq!(
            file_part_media_type(None, Some("a.gif"), PNG_MAGIC),
            "image/png"
        );
        assert_eq!(
            file_part_media_type(None, Some("photo.JPG"), b"????"),
            "image/jpeg"
        );
    }

    #[test]
    fn unknown_falls_back_to_octet_stream() {
        assert_eq!(
            file_part_media_type(None, Some("notes.txt"), b"hello"),
            "application/octet-stream"
        );
        assert_eq!(
            file_part_media_type(Some("not a type"), None, b""),
            "application/octet-stream"
        );
    }
}
