//! PDF decoding: embedded text layer and per-page scan images.
//!
//! Uses pdf-extract for the text layer and lopdf to pull embedded page
//! images for the OCR fallback on scanned documents. Both are blocking
//! parsers and run under `spawn_blocking`.

use lopdf::Document;
use paperflow_core::{Error, Result};
use tracing::{debug, warn};

/// One embedded image in page order, ready for OCR.
pub struct PageImage {
    pub page: u32,
    pub data: Vec<u8>,
    pub mime_type: &'static str,
}

/// Extraction limits; a scan is one full-page image per page, so these only
/// guard against pathological documents.
const MAX_IMAGES: usize = 50;
const MIN_DIMENSION: i64 = 50;

/// Extract the embedded text layer, pages concatenated in page order.
///
/// A parse failure yields an empty string rather than an error: the caller
/// has already validated the PDF container and falls back to OCR.
pub async fn extract_text_layer(bytes: &[u8]) -> Result<String> {
    let owned = bytes.to_vec();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&owned))
        .await
        .map_err(|e| Error::Internal(format!("PDF task join error: {e}")))?;

    match text {
        Ok(text) => Ok(text.trim().to_string()),
        Err(e) => {
            warn!(error = %e, "PDF text layer extraction failed, treating as scanned");
            Ok(String::new())
        }
    }
}

/// Validate that the payload parses as a PDF container at all.
///
/// This is the fatal path: a file that declared `application/pdf` but does
/// not parse aborts the ingestion run.
pub async fn validate_container(bytes: &[u8]) -> Result<()> {
    let owned = bytes.to_vec();
    tokio::task::spawn_blocking(move || Document::load_mem(&owned))
        .await
        .map_err(|e| Error::Internal(format!("PDF task join error: {e}")))?
        .map_err(|e| Error::UnsupportedMediaType(format!("corrupt PDF: {e}")))?;
    Ok(())
}

/// Pull embedded images in page order for the OCR fallback.
///
/// Scanned PDFs embed each page as a single JPEG (`DCTDecode`) or JPEG2000
/// (`JPXDecode`) image; other filters are skipped with a debug log.
pub async fn extract_page_images(bytes: &[u8]) -> Result<Vec<PageImage>> {
    let owned = bytes.to_vec();
    tokio::task::spawn_blocking(move || collect_page_images(&owned))
        .await
        .map_err(|e| Error::Internal(format!("PDF task join error: {e}")))
}

fn collect_page_images(bytes: &[u8]) -> Vec<PageImage> {
    let doc = match Document::load_mem(bytes) {
        Ok(d) => d,
        Err(e) => {
            warn!(error = %e, "Failed to load PDF for image extraction");
            return Vec::new();
        }
    };

    let mut images = Vec::new();
    for (page_num, page_id) in doc.get_pages() {
        if images.len() >= MAX_IMAGES {
            break;
        }
        let page_images = match doc.get_page_images(page_id) {
            Ok(imgs) => imgs,
            Err(e) => {
                debug!(page = page_num, error = %e, "No images on page");
                continue;
            }
        };
        for pdf_image in page_images {
            if images.len() >= MAX_IMAGES {
                break;
            }
            if pdf_image.width < MIN_DIMENSION || pdf_image.height < MIN_DIMENSION {
                continue;
            }
            let Some(filters) = pdf_image.filters.as_ref() else {
                continue;
            };
            let mime_type = if filters.iter().any(|f| f == "DCTDecode") {
                "image/jpeg"
            } else if filters.iter().any(|f| f == "JPXDecode") {
                "image/jp2"
            } else {
                debug!(page = page_num, ?filters, "Unsupported image filter, skipping");
                continue;
            };
            images.push(PageImage {
                page: page_num,
                data: pdf_image.content.to_vec(),
                mime_type,
            });
        }
    }

    debug!(image_count = images.len(), "Collected page images for OCR");
    images
}
