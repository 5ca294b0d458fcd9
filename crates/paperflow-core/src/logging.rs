//! Structured logging schema and field name constants for paperflow.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |

/// Subsystem originating the log event.
/// Values: "extract", "inference", "db", "pipeline"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "ollama", "pool", "classifier", "record_store"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "classify", "extract_fields", "upsert", "search"
pub const OPERATION: &str = "op";

/// DocumentID being operated on (UUIDv7, joins relational and vector rows).
pub const DOCUMENT_ID: &str = "document_id";

/// Document category ("invoice", "insurance", "identity_document", "unknown").
pub const CATEGORY: &str = "category";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search or query.
pub const RESULT_COUNT: &str = "result_count";

/// Byte length of a prompt or input text.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Retry attempt number (1-based).
pub const ATTEMPT: &str = "attempt";

/// Initialize the tracing subscriber from `RUST_LOG` (default `info`).
///
/// Intended for binaries and integration tests; library code only emits
/// events and never installs a subscriber.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
