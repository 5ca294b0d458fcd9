//! Centralized default constants for the paperflow system.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates should reference these constants instead of defining
//! their own magic numbers.

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Ollama endpoint.
pub const OLLAMA_URL: &str = "http://localhost:11434";

/// Default generation model used for classification and field extraction.
pub const GEN_MODEL: &str = "qwen3:8b";

/// Default vision model used for OCR transcription.
pub const OCR_MODEL: &str = "qwen2.5vl:7b";

/// Timeout for generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Timeout for OCR transcription requests (seconds).
pub const OCR_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// EMBEDDING
// =============================================================================

/// Default embedding model name (Ollama).
pub const EMBED_MODEL: &str = "nomic-embed-text";

/// Default embedding vector dimension for nomic-embed-text.
pub const EMBED_DIMENSION: usize = 768;

/// Timeout for embedding requests (seconds).
pub const EMBED_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// RETRY / BACKOFF
// =============================================================================

/// Maximum attempts per inference or embedding call.
pub const LLM_MAX_ATTEMPTS: u32 = 3;

/// Base delay before the first retry (milliseconds). Doubles per attempt.
pub const RETRY_BASE_DELAY_MS: u64 = 1000;

/// Upper bound on the backoff delay (milliseconds).
pub const RETRY_MAX_DELAY_MS: u64 = 8000;

// =============================================================================
// PROMPTING
// =============================================================================

/// Maximum characters of document text included in a classification prompt.
pub const CLASSIFY_TEXT_LIMIT: usize = 2000;

/// Maximum characters of document text included in an extraction prompt.
pub const EXTRACT_TEXT_LIMIT: usize = 3000;

// =============================================================================
// TEXT EXTRACTION
// =============================================================================

/// Minimum characters for a PDF text layer to count as usable.
/// Below this the page set is treated as scanned and routed through OCR.
pub const PDF_TEXT_LAYER_MIN_CHARS: usize = 50;

// =============================================================================
// NORMALIZATION
// =============================================================================

/// Decimal places in the canonical currency representation.
pub const CURRENCY_DECIMALS: usize = 2;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// Env var overriding the Ollama base URL.
pub const ENV_OLLAMA_BASE: &str = "OLLAMA_BASE";

/// Env var overriding the generation model.
pub const ENV_GEN_MODEL: &str = "PAPERFLOW_GEN_MODEL";

/// Env var overriding the embedding model.
pub const ENV_EMBED_MODEL: &str = "PAPERFLOW_EMBED_MODEL";

/// Env var overriding the embedding dimension.
pub const ENV_EMBED_DIM: &str = "PAPERFLOW_EMBED_DIM";

/// Env var overriding the OCR vision model.
pub const ENV_OCR_MODEL: &str = "PAPERFLOW_OCR_MODEL";

/// Env var pointing at the inference TOML config file.
pub const ENV_INFERENCE_CONFIG: &str = "PAPERFLOW_INFERENCE_CONFIG";
