//! Magic-byte verification of declared media types.
//!
//! Uploads declare a MIME type, but the payload is what counts: a renamed
//! executable or a corrupt file must be rejected before any decoding or
//! store write happens.

use paperflow_core::{Error, MediaType, Result};
use tracing::debug;

/// Verify that the payload's magic bytes agree with the declared media
/// type. Undetectable or mismatching payloads are the one fatal condition
/// of text extraction.
pub fn verify_media_type(bytes: &[u8], declared: MediaType) -> Result<()> {
    let detected = infer::get(bytes).ok_or_else(|| {
        Error::UnsupportedMediaType(format!(
            "payload is not recognizable as {}",
            declared.mime()
        ))
    })?;

    let detected_mime = detected.mime_type();
    if !mimes_agree(detected_mime, declared) {
        return Err(Error::UnsupportedMediaType(format!(
            "declared {} but payload is {}",
            declared.mime(),
            detected_mime
        )));
    }

    debug!(mime = detected_mime, "Verified media type");
    Ok(())
}

fn mimes_agree(detected: &str, declared: MediaType) -> bool {
    match declared {
        MediaType::Pdf => detected == "application/pdf",
        MediaType::Jpeg => detected == "image/jpeg",
        MediaType::Png => detected == "image/png",
        MediaType::Tiff => detected == "image/tiff",
        MediaType::Webp => detected == "image/webp",
        MediaType::Bmp => detected == "image/bmp",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];

    #[test]
    fn test_accepts_matching_png() {
        verify_media_type(PNG_MAGIC, MediaType::Png).unwrap();
    }

    #[test]
    fn test_accepts_matching_pdf() {
        let bytes = b"%PDF-1.7\n%rest of document";
        verify_media_type(bytes, MediaType::Pdf).unwrap();
    }

    #[test]
    fn test_rejects_mismatched_declaration() {
        let err = verify_media_type(JPEG_MAGIC, MediaType::Pdf).unwrap_err();
        assert!(matches!(err, Error::UnsupportedMediaType(_)), "{err}");
    }

    #[test]
    fn test_rejects_undetectable_payload() {
        let err = verify_media_type(b"hello world, plain text", MediaType::Png).unwrap_err();
        assert!(matches!(err, Error::UnsupportedMediaType(_)));
    }
}
