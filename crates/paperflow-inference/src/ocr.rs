//! Vision-model OCR backend.
//!
//! Scanned pages and photographed documents carry no text layer; a vision
//! LLM transcribes them. The backend is a black-box text-recognition
//! capability behind [`OcrBackend`].

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use paperflow_core::{Error, OcrBackend, Result};

use crate::config::OllamaConfig;

/// Transcription prompt. The model must return the raw text only so that
/// downstream classification sees document content, not commentary.
const OCR_PROMPT: &str = "Transcribe all text visible in this image exactly as written, \
preserving line breaks. Output only the transcribed text with no commentary. \
If the image contains no readable text, output nothing.";

/// Ollama-based OCR backend using a vision model (e.g. qwen2.5vl, llava).
pub struct OllamaOcrBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout_secs: u64,
}

impl OllamaOcrBackend {
    pub fn new(config: &OllamaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            model: config.ocr_model.clone(),
            timeout_secs: config.ocr_timeout_secs,
        }
    }
}

#[derive(Serialize)]
struct OcrGenerateRequest {
    model: String,
    prompt: String,
    images: Vec<String>, // base64 encoded
    stream: bool,
}

#[derive(Deserialize)]
struct OcrGenerateResponse {
    response: String,
}

#[async_trait]
impl OcrBackend for OllamaOcrBackend {
    #[instrument(skip(self, image_data), fields(subsystem = "inference", component = "ocr", op = "recognize", model = %self.model, image_bytes = image_data.len()))]
    async fn recognize(&self, image_data: &[u8], _mime_type: &str) -> Result<String> {
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(image_data);

        let request = OcrGenerateRequest {
            model: self.model.clone(),
            prompt: OCR_PROMPT.to_string(),
            images: vec![image_b64],
            stream: false,
        };

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Inference(format!("OCR request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "OCR API returned {}: {}",
                status, body
            )));
        }

        let result: OcrGenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse OCR response: {}", e)))?;

        debug!(response_len = result.response.len(), "OCR complete");
        Ok(result.response.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
