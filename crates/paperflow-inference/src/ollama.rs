//! Ollama inference backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use paperflow_core::{EmbeddingBackend, Error, GenerationBackend, Result, Vector};

use crate::config::OllamaConfig;

/// Ollama inference backend covering generation and embeddings.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    gen_model: String,
    embed_model: String,
    dimension: usize,
    gen_timeout_secs: u64,
    embed_timeout_secs: u64,
}

impl OllamaBackend {
    /// Create a backend from an immutable config.
    pub fn new(config: &OllamaConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.gen_timeout_secs))
            .build()
            .unwrap_or_default();

        debug!(
            base_url = %config.base_url,
            gen_model = %config.generation_model,
            embed_model = %config.embedding_model,
            "Initializing Ollama backend"
        );

        Self {
            client,
            base_url: config.base_url.clone(),
            gen_model: config.generation_model.clone(),
            embed_model: config.embedding_model.clone(),
            dimension: config.embedding_dimension,
            gen_timeout_secs: config.gen_timeout_secs,
            embed_timeout_secs: config.embed_timeout_secs,
        }
    }

    /// Create from environment variables (see [`crate::config`]).
    pub fn from_env() -> Self {
        Self::new(&crate::config::InferenceConfig::from_env().ollama)
    }

    /// Check if the backend is available and responding.
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Internal generation method shared by all generate variants.
    ///
    /// Uses the `/api/chat` endpoint; `format` set to `"json"` enforces
    /// valid JSON output for extraction prompts.
    async fn generate_internal(
        &self,
        prompt: &str,
        format: Option<serde_json::Value>,
    ) -> Result<String> {
        let start = Instant::now();

        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }];

        let think = if format.is_some() { Some(false) } else { None };
        let request = ChatRequest {
            model: self.gen_model.clone(),
            messages,
            stream: false,
            format,
            think,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .timeout(Duration::from_secs(self.gen_timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        let content = result.message.content;
        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = content.len(),
            duration_ms = elapsed,
            "Generation complete"
        );
        if elapsed > 30000 {
            warn!(
                duration_ms = elapsed,
                prompt_len = prompt.len(),
                slow = true,
                "Slow generation operation"
            );
        }
        Ok(content)
    }
}

/// Chat API message for `/api/chat`.
#[derive(Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Request payload for the Ollama `/api/chat` endpoint.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    /// Ollama format enforcement. Set to `"json"` for guaranteed valid JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<serde_json::Value>,
    /// Disable thinking/reasoning for models that support it; reasoning
    /// leaking into JSON output breaks extraction parsing.
    #[serde(skip_serializing_if = "Option::is_none")]
    think: Option<bool>,
}

/// Response from the Ollama `/api/chat` endpoint.
#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    #[instrument(skip(self, prompt), fields(subsystem = "inference", component = "ollama", op = "generate", prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_internal(prompt, None).await
    }

    #[instrument(skip(self, prompt), fields(subsystem = "inference", component = "ollama", op = "generate_json", prompt_len = prompt.len()))]
    async fn generate_json(&self, prompt: &str) -> Result<String> {
        self.generate_internal(prompt, Some(serde_json::json!("json")))
            .await
    }

    fn model_name(&self) -> &str {
        &self.gen_model
    }
}

#[async_trait]
impl EmbeddingBackend for OllamaBackend {
    #[instrument(skip(self, texts), fields(subsystem = "inference", component = "ollama", op = "embed_texts", model = %self.embed_model, input_count = texts.len()))]
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let start = Instant::now();

        let request = EmbeddingRequest {
            model: self.embed_model.clone(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .timeout(Duration::from_secs(self.embed_timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        if result.embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                result.embeddings.len()
            )));
        }

        for emb in &result.embeddings {
            if emb.len() != self.dimension {
                warn!(
                    expected = self.dimension,
                    actual = emb.len(),
                    model = %self.embed_model,
                    "Embedding dimension mismatch"
                );
            }
        }

        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            input_count = texts.len(),
            "Embedding complete"
        );

        Ok(result.embeddings.into_iter().map(Vector::from).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.embed_model
    }
}
