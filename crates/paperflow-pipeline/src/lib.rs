//! # paperflow-pipeline
//!
//! The ingestion core: classification, schema-driven field extraction,
//! and the orchestrator enforcing the dual-store consistency contract.
//!
//! Every ingested document yields a category (possibly `Unknown`) and a
//! record (possibly all-null) — inference failures are absorbed, and only
//! an unreadable payload or a failed relational commit ends a run without
//! a persisted record.

pub mod classifier;
pub mod extractor;
pub mod ingest;

pub use classifier::DocumentClassifier;
pub use extractor::FieldExtractor;
pub use ingest::{CancelSignal, IngestReport, IngestStage, IngestionPipeline};

/// Truncate to at most `limit` characters on a char boundary.
pub(crate) fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_chars;

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        // Multi-byte characters are not split.
        assert_eq!(truncate_chars("ééééé", 2), "éé");
    }
}
