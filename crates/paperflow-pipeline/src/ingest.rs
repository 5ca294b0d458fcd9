//! Ingestion orchestration.
//!
//! One state machine per document:
//! `Received → TextExtracted → Classified → Extracted → Persisted | Failed`.
//!
//! The DocumentID is generated once and reused for both store writes.
//! The relational write goes first and is authoritative; the vector write
//! is best-effort, and its failure degrades the [`PersistenceResult`]
//! without failing the run. There is no cross-store transaction and no
//! rollback of a committed relational write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use paperflow_core::{
    Category, Error, ExtractedText, PersistenceResult, RawDocument, RecordStore, Result,
    StructuredRecord, VectorStore,
};
use paperflow_extract::DocumentTextExtractor;

use crate::classifier::DocumentClassifier;
use crate::extractor::FieldExtractor;

/// Pipeline stage a run ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Received,
    TextExtracted,
    Classified,
    Extracted,
    Persisted,
    Failed,
}

impl std::fmt::Display for IngestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::TextExtracted => "text_extracted",
            Self::Classified => "classified",
            Self::Extracted => "extracted",
            Self::Persisted => "persisted",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Cooperative cancellation flag, checked between pipeline stages.
///
/// Cancellation never rolls back a committed store write.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Bail out of a run if cancellation was requested, logging the stage
    /// the document had reached.
    fn checkpoint(&self, document_id: Uuid, stage: IngestStage) -> Result<()> {
        if self.is_cancelled() {
            warn!(
                subsystem = "pipeline",
                component = "ingest",
                document_id = %document_id,
                stage = %stage,
                "Ingestion cancelled"
            );
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub document_id: Uuid,
    pub category: Category,
    pub record: StructuredRecord,
    pub text: ExtractedText,
    pub persistence: PersistenceResult,
    pub state: IngestStage,
}

/// The full ingestion pipeline, composed from its stages.
pub struct IngestionPipeline {
    text_extractor: DocumentTextExtractor,
    classifier: DocumentClassifier,
    field_extractor: FieldExtractor,
    records: Arc<dyn RecordStore>,
    vectors: Arc<dyn VectorStore>,
}

impl IngestionPipeline {
    pub fn new(
        text_extractor: DocumentTextExtractor,
        classifier: DocumentClassifier,
        field_extractor: FieldExtractor,
        records: Arc<dyn RecordStore>,
        vectors: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            text_extractor,
            classifier,
            field_extractor,
            records,
            vectors,
        }
    }

    /// Ingest a document under a fresh DocumentID.
    pub async fn ingest(&self, doc: RawDocument, cancel: &CancelSignal) -> Result<IngestReport> {
        self.ingest_with_id(Uuid::now_v7(), doc, cancel).await
    }

    /// Ingest a document under a caller-supplied DocumentID.
    ///
    /// Re-running with the same ID replaces both store entries, so retried
    /// calls converge on the latest write instead of duplicating.
    ///
    /// Errors only on an unreadable payload (`UnsupportedMediaType`) or
    /// cancellation; every other failure mode is absorbed into the report
    /// per pipeline policy.
    pub async fn ingest_with_id(
        &self,
        document_id: Uuid,
        doc: RawDocument,
        cancel: &CancelSignal,
    ) -> Result<IngestReport> {
        let start = Instant::now();
        cancel.checkpoint(document_id, IngestStage::Received)?;

        // Received → TextExtracted. The only fatal stage short of the
        // relational commit.
        let text = self.text_extractor.extract(doc).await?;
        cancel.checkpoint(document_id, IngestStage::TextExtracted)?;

        // TextExtracted → Classified. Total.
        let category = self.classifier.classify(&text).await;
        cancel.checkpoint(document_id, IngestStage::Classified)?;

        // Classified → Extracted. Total.
        let record = self
            .field_extractor
            .extract_fields(&text, category, document_id)
            .await;
        cancel.checkpoint(document_id, IngestStage::Extracted)?;

        // Extracted → Persisted | Failed. Relational first, authoritative.
        if let Err(err) = self.records.upsert(&record).await {
            warn!(
                subsystem = "pipeline",
                component = "ingest",
                document_id = %document_id,
                error = %err,
                "Relational write failed, vector write skipped"
            );
            return Ok(IngestReport {
                document_id,
                category,
                record,
                text,
                persistence: PersistenceResult::failed(err.to_string()),
                state: IngestStage::Failed,
            });
        }
        cancel.checkpoint(document_id, IngestStage::Extracted)?;

        // Vector write is best-effort; failure degrades, never fails.
        let persistence = match self
            .vectors
            .upsert(document_id, &text, category, record.metadata())
            .await
        {
            Ok(()) => PersistenceResult::complete(),
            Err(err) => {
                warn!(
                    subsystem = "pipeline",
                    component = "ingest",
                    document_id = %document_id,
                    error = %err,
                    "Vector write failed, record persisted relational-only"
                );
                PersistenceResult::relational_only(err.to_string())
            }
        };

        info!(
            subsystem = "pipeline",
            component = "ingest",
            op = "ingest",
            document_id = %document_id,
            category = %category,
            degraded = persistence.is_degraded(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Ingestion complete"
        );

        Ok(IngestReport {
            document_id,
            category,
            record,
            text,
            persistence,
            state: IngestStage::Persisted,
        })
    }
}
