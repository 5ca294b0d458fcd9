//! Mock inference backend for deterministic testing.
//!
//! Provides scripted generation/OCR responses, deterministic embeddings,
//! failure injection for retry-path tests, and a call log for assertions.
//! Enabled for this crate's own tests and for downstream test suites via
//! the `mock` feature.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use paperflow_core::{
    EmbeddingBackend, Error, GenerationBackend, OcrBackend, Result, Vector,
};

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    /// Prompt-substring → response. First match wins.
    response_mappings: Vec<(String, String)>,
    default_response: String,
    ocr_text: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            response_mappings: Vec::new(),
            default_response: "unknown".to_string(),
            ocr_text: String::new(),
        }
    }
}

/// One logged backend call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<MockCall>,
    generate_failures_remaining: u32,
    embed_failures_remaining: u32,
    recognize_failures_remaining: u32,
}

/// Mock backend implementing generation, embedding, and OCR.
#[derive(Clone)]
pub struct MockInferenceBackend {
    config: Arc<MockConfig>,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockInferenceBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInferenceBackend {
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Set the fallback generation response.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Respond with `output` whenever the prompt contains `needle`.
    pub fn with_response_mapping(
        mut self,
        needle: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .response_mappings
            .push((needle.into(), output.into()));
        self
    }

    /// Set the text returned by OCR recognition.
    pub fn with_ocr_text(mut self, text: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).ocr_text = text.into();
        self
    }

    /// Fail the next `n` generation calls with a transient inference error.
    pub fn fail_generation_times(self, n: u32) -> Self {
        self.state.lock().unwrap().generate_failures_remaining = n;
        self
    }

    /// Fail the next `n` embedding calls with a transient embedding error.
    pub fn fail_embedding_times(self, n: u32) -> Self {
        self.state.lock().unwrap().embed_failures_remaining = n;
        self
    }

    /// Fail the next `n` OCR calls with a transient inference error.
    pub fn fail_recognition_times(self, n: u32) -> Self {
        self.state.lock().unwrap().recognize_failures_remaining = n;
        self
    }

    /// All logged calls, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of calls for one operation ("generate", "embed", "recognize").
    pub fn call_count(&self, operation: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn log(&self, operation: &str, input: &str) {
        self.state.lock().unwrap().calls.push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
    }

    fn respond(&self, prompt: &str) -> String {
        for (needle, output) in &self.config.response_mappings {
            if prompt.contains(needle.as_str()) {
                return output.clone();
            }
        }
        self.config.default_response.clone()
    }

    /// Deterministic embedding: byte histogram folded into the configured
    /// dimension. Identical text always embeds identically, so similarity
    /// ranking in tests is stable.
    fn embed_one(&self, text: &str) -> Vector {
        let dim = self.config.dimension;
        let mut v = vec![0.0f32; dim];
        for (i, b) in text.bytes().enumerate() {
            v[(b as usize + i) % dim] += 1.0;
        }
        // Leave the zero vector for empty text.
        Vector::from(v)
    }
}

#[async_trait]
impl GenerationBackend for MockInferenceBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.log("generate", prompt);
        {
            let mut state = self.state.lock().unwrap();
            if state.generate_failures_remaining > 0 {
                state.generate_failures_remaining -= 1;
                return Err(Error::Inference("mock: injected failure".to_string()));
            }
        }
        Ok(self.respond(prompt))
    }

    async fn generate_json(&self, prompt: &str) -> Result<String> {
        self.generate(prompt).await
    }

    fn model_name(&self) -> &str {
        "mock-gen"
    }
}

#[async_trait]
impl EmbeddingBackend for MockInferenceBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        {
            let mut state = self.state.lock().unwrap();
            for text in texts {
                state.calls.push(MockCall {
                    operation: "embed".to_string(),
                    input: text.clone(),
                });
            }
            if state.embed_failures_remaining > 0 {
                state.embed_failures_remaining -= 1;
                return Err(Error::Embedding("mock: injected failure".to_string()));
            }
        }
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

#[async_trait]
impl OcrBackend for MockInferenceBackend {
    async fn recognize(&self, _image_data: &[u8], mime_type: &str) -> Result<String> {
        self.log("recognize", mime_type);
        {
            let mut state = self.state.lock().unwrap();
            if state.recognize_failures_remaining > 0 {
                state.recognize_failures_remaining -= 1;
                return Err(Error::Inference("mock: injected failure".to_string()));
            }
        }
        Ok(self.config.ocr_text.clone())
    }

    fn model_name(&self) -> &str {
        "mock-ocr"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_response_mapping_precedes_default() {
        let backend = MockInferenceBackend::new()
            .with_fixed_response("unknown")
            .with_response_mapping("classify", "invoice");
        assert_eq!(backend.generate("please classify this").await.unwrap(), "invoice");
        assert_eq!(backend.generate("something else").await.unwrap(), "unknown");
        assert_eq!(backend.call_count("generate"), 2);
    }

    #[tokio::test]
    async fn test_failure_injection_is_bounded() {
        let backend = MockInferenceBackend::new()
            .with_fixed_response("ok")
            .fail_generation_times(2);
        assert!(backend.generate("a").await.is_err());
        assert!(backend.generate("b").await.is_err());
        assert_eq!(backend.generate("c").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_embeddings_are_deterministic() {
        let backend = MockInferenceBackend::new().with_dimension(64);
        let a = backend.embed_texts(&["hello".to_string()]).await.unwrap();
        let b = backend.embed_texts(&["hello".to_string()]).await.unwrap();
        assert_eq!(a[0].as_slice(), b[0].as_slice());
        assert_eq!(a[0].as_slice().len(), 64);
    }
}
