//! # paperflow-extract
//!
//! Text acquisition for the paperflow ingestion pipeline.
//!
//! Converts an input document (image or PDF) into plain text:
//! - PDF: embedded text layer first (pages concatenated in page order);
//!   scanned pages fall back to OCR of the embedded page images.
//! - Image: always OCR.
//!
//! Producing *no* text is a valid outcome — the classifier maps empty text
//! to `Unknown` downstream. The only fatal condition is a payload whose
//! declared media type cannot be parsed at all.

pub mod media;
pub mod pdf;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use paperflow_core::{defaults, ExtractedText, MediaType, OcrBackend, RawDocument, Result};
use paperflow_inference::RetryPolicy;

pub use media::verify_media_type;

/// The text extractor: PDF decoding plus a black-box OCR capability.
///
/// OCR calls go through the same bounded retry as the other capability
/// calls, so a transient vision-model failure does not turn a readable
/// scan into empty text.
pub struct DocumentTextExtractor {
    ocr: Arc<dyn OcrBackend>,
    retry: RetryPolicy,
}

impl DocumentTextExtractor {
    pub fn new(ocr: Arc<dyn OcrBackend>) -> Self {
        Self {
            ocr,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the OCR retry schedule.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Convert a raw document into plain text, consuming the payload.
    pub async fn extract(&self, doc: RawDocument) -> Result<ExtractedText> {
        let start = Instant::now();
        media::verify_media_type(&doc.bytes, doc.media_type)?;

        let result = match doc.media_type {
            MediaType::Pdf => self.extract_pdf(&doc.bytes).await?,
            media => self.extract_image(&doc.bytes, media).await?,
        };

        info!(
            subsystem = "extract",
            op = "extract",
            duration_ms = start.elapsed().as_millis() as u64,
            text_len = result.text.len(),
            ocr_used = result.ocr_used,
            empty = result.is_empty(),
            "Text extraction complete"
        );
        Ok(result)
    }

    async fn extract_pdf(&self, bytes: &[u8]) -> Result<ExtractedText> {
        pdf::validate_container(bytes).await?;

        let text = pdf::extract_text_layer(bytes).await?;
        if text.len() >= defaults::PDF_TEXT_LAYER_MIN_CHARS {
            return Ok(ExtractedText::new(text));
        }

        debug!(
            text_layer_len = text.len(),
            "Text layer below threshold, falling back to OCR of page images"
        );

        let images = pdf::extract_page_images(bytes).await?;
        let mut pages = Vec::new();
        for image in &images {
            match self
                .retry
                .run("ocr", || self.ocr.recognize(&image.data, image.mime_type))
                .await
            {
                Ok(page_text) if !page_text.trim().is_empty() => pages.push(page_text),
                Ok(_) => {}
                Err(e) => {
                    warn!(page = image.page, error = %e, "OCR failed for page image");
                }
            }
        }

        if pages.is_empty() {
            // Keep whatever thin text layer existed rather than dropping it.
            if text.is_empty() {
                Ok(ExtractedText::empty())
            } else {
                Ok(ExtractedText::new(text))
            }
        } else {
            Ok(ExtractedText::from_ocr(pages.join("\n")))
        }
    }

    async fn extract_image(&self, bytes: &[u8], media: MediaType) -> Result<ExtractedText> {
        match self
            .retry
            .run("ocr", || self.ocr.recognize(bytes, media.mime()))
            .await
        {
            Ok(text) if !text.trim().is_empty() => Ok(ExtractedText::from_ocr(text)),
            Ok(_) => Ok(ExtractedText::empty()),
            Err(e) => {
                warn!(error = %e, "OCR failed for image, producing empty text");
                Ok(ExtractedText::empty())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperflow_core::Error;
    use paperflow_inference::MockInferenceBackend;

    const JPEG_MAGIC: &[u8] = &[
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01,
    ];

    fn extractor_with_ocr(text: &str) -> DocumentTextExtractor {
        DocumentTextExtractor::new(Arc::new(
            MockInferenceBackend::new().with_ocr_text(text),
        ))
    }

    #[tokio::test]
    async fn test_image_goes_through_ocr() {
        let extractor = extractor_with_ocr("Invoice #A-100, Total: $250.00");
        let doc = RawDocument::new(JPEG_MAGIC.to_vec(), MediaType::Jpeg);
        let text = extractor.extract(doc).await.unwrap();
        assert!(text.ocr_used);
        assert_eq!(text.text, "Invoice #A-100, Total: $250.00");
    }

    #[tokio::test]
    async fn test_blank_image_yields_empty_not_error() {
        let extractor = extractor_with_ocr("");
        let doc = RawDocument::new(JPEG_MAGIC.to_vec(), MediaType::Jpeg);
        let text = extractor.extract(doc).await.unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_transient_ocr_failure_is_retried() {
        let backend = MockInferenceBackend::new()
            .with_ocr_text("Invoice #A-100, Total: $250.00")
            .fail_recognition_times(2);
        let extractor = DocumentTextExtractor::new(Arc::new(backend.clone()))
            .with_retry_policy(RetryPolicy::immediate(3));
        let doc = RawDocument::new(JPEG_MAGIC.to_vec(), MediaType::Jpeg);
        let text = extractor.extract(doc).await.unwrap();
        assert_eq!(text.text, "Invoice #A-100, Total: $250.00");
        assert_eq!(backend.call_count("recognize"), 3);
    }

    #[tokio::test]
    async fn test_ocr_exhaustion_yields_empty_text() {
        let backend = MockInferenceBackend::new()
            .with_ocr_text("never seen")
            .fail_recognition_times(10);
        let extractor = DocumentTextExtractor::new(Arc::new(backend.clone()))
            .with_retry_policy(RetryPolicy::immediate(3));
        let doc = RawDocument::new(JPEG_MAGIC.to_vec(), MediaType::Jpeg);
        let text = extractor.extract(doc).await.unwrap();
        assert!(text.is_empty());
        assert_eq!(backend.call_count("recognize"), 3);
    }

    #[tokio::test]
    async fn test_mismatched_media_type_is_fatal() {
        let extractor = extractor_with_ocr("irrelevant");
        let doc = RawDocument::new(JPEG_MAGIC.to_vec(), MediaType::Pdf);
        let err = extractor.extract(doc).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedMediaType(_)));
    }

    #[tokio::test]
    async fn test_undetectable_payload_is_fatal() {
        let extractor = extractor_with_ocr("irrelevant");
        let doc = RawDocument::new(b"just some text".to_vec(), MediaType::Png);
        let err = extractor.extract(doc).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedMediaType(_)));
    }
}
