//! # paperflow-inference
//!
//! LLM inference backend layer for paperflow.
//!
//! This crate provides:
//! - An Ollama backend implementing the generation and embedding traits
//! - A vision-model OCR backend for scanned pages and photographs
//! - Bounded retry with exponential backoff for all capability calls
//! - TOML/env configuration, loaded once at startup and passed by value
//! - A deterministic mock backend (feature `mock`) for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use paperflow_inference::{InferenceConfig, OllamaBackend};
//! use paperflow_core::GenerationBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = InferenceConfig::load().expect("config");
//!     let backend = OllamaBackend::new(&config.ollama);
//!     let reply = backend.generate("Classify this document").await.unwrap();
//!     println!("{reply}");
//! }
//! ```

pub mod config;
pub mod ocr;
pub mod ollama;
pub mod retry;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use config::{ConfigError, ConfigResult, InferenceConfig, OllamaConfig, RetrySettings};
pub use ocr::OllamaOcrBackend;
pub use ollama::OllamaBackend;
pub use retry::{is_retryable, RetryPolicy};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockInferenceBackend;
