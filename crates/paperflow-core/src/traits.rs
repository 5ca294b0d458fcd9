//! Core traits for paperflow abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Category, ExtractedText, SearchHit, StructuredRecord};
use crate::schema;

// =============================================================================
// INFERENCE BACKEND TRAITS
// =============================================================================

/// Backend for text generation (classification and field extraction).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text with the backend instructed to emit valid JSON.
    async fn generate_json(&self, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for embedding generation.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts, one vector per input.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<pgvector::Vector>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for OCR text recognition on raster images.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Transcribe all text visible in the image.
    async fn recognize(&self, image_data: &[u8], mime_type: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

// =============================================================================
// RECORD FILTER
// =============================================================================

/// Comparison operator for a typed field predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateOp {
    Eq,
    Gte,
    Lte,
}

/// One predicate against a schema field. Values are passed as strings and
/// coerced per the field's [`schema::FieldKind`] by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPredicate {
    pub field: String,
    pub op: PredicateOp,
    pub value: String,
}

/// Exact and range predicates for relational queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Exact match on the DocumentID join key.
    pub document_id: Option<Uuid>,
    pub predicates: Vec<FieldPredicate>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document_id(mut self, id: Uuid) -> Self {
        self.document_id = Some(id);
        self
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push(FieldPredicate {
            field: field.into(),
            op: PredicateOp::Eq,
            value: value.into(),
        });
        self
    }

    pub fn gte(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push(FieldPredicate {
            field: field.into(),
            op: PredicateOp::Gte,
            value: value.into(),
        });
        self
    }

    pub fn lte(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push(FieldPredicate {
            field: field.into(),
            op: PredicateOp::Lte,
            value: value.into(),
        });
        self
    }

    /// Validate every predicate against the category's schema.
    ///
    /// Field queries against `Unknown` fail with [`Error::UnknownCategory`]
    /// since it carries no schema.
    pub fn validate(&self, category: Category) -> Result<()> {
        if !self.predicates.is_empty() && !category.is_known() {
            return Err(Error::UnknownCategory(category.to_string()));
        }
        for pred in &self.predicates {
            if schema::field(category, &pred.field).is_none() {
                return Err(Error::InvalidInput(format!(
                    "field '{}' is not in the {} schema",
                    pred.field, category
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// STORE TRAITS
// =============================================================================

/// Relational store for structured records, one logical table per category.
///
/// `upsert` is keyed by DocumentID: re-ingestion under the same ID replaces
/// the prior record rather than duplicating it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or replace a record, keyed by DocumentID.
    async fn upsert(&self, record: &StructuredRecord) -> Result<()>;

    /// Fetch one record by DocumentID, if present.
    async fn fetch(&self, document_id: Uuid) -> Result<Option<StructuredRecord>>;

    /// Query a category's records with exact and range predicates.
    async fn query(&self, category: Category, filter: &RecordFilter)
        -> Result<Vec<StructuredRecord>>;

    /// List every record of a category, newest first.
    async fn list_all(&self, category: Category) -> Result<Vec<StructuredRecord>>;

    /// Delete a record by DocumentID. Returns true if a record existed.
    async fn delete(&self, document_id: Uuid) -> Result<bool>;
}

/// Vector store holding one embedding per DocumentID plus denormalized
/// metadata, queryable by semantic similarity.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed the text and insert or replace the entry for this DocumentID.
    async fn upsert(
        &self,
        document_id: Uuid,
        text: &ExtractedText,
        category: Category,
        metadata: Map<String, JsonValue>,
    ) -> Result<()>;

    /// Similarity search, ordered by descending score; ties broken by most
    /// recent creation timestamp. Optionally restricted to one category.
    async fn search(
        &self,
        query_text: &str,
        k: i64,
        category: Option<Category>,
    ) -> Result<Vec<SearchHit>>;

    /// Delete the entry for a DocumentID. Returns true if one existed.
    async fn delete(&self, document_id: Uuid) -> Result<bool>;

    /// Number of stored entries.
    async fn count(&self) -> Result<i64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_builder() {
        let id = Uuid::now_v7();
        let filter = RecordFilter::new()
            .with_document_id(id)
            .eq("vendor_name", "Acme HVAC")
            .gte("total_amount", "100.00");
        assert_eq!(filter.document_id, Some(id));
        assert_eq!(filter.predicates.len(), 2);
        assert_eq!(filter.predicates[1].op, PredicateOp::Gte);
    }

    #[test]
    fn test_filter_validates_against_schema() {
        let filter = RecordFilter::new().eq("vendor_name", "Acme");
        assert!(filter.validate(Category::Invoice).is_ok());

        let bad = RecordFilter::new().eq("no_such_field", "x");
        assert!(matches!(
            bad.validate(Category::Invoice),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_field_predicates_rejected_for_unknown_category() {
        let filter = RecordFilter::new().eq("vendor_name", "Acme");
        assert!(matches!(
            filter.validate(Category::Unknown),
            Err(Error::UnknownCategory(_))
        ));
        // A bare DocumentID lookup is fine for Unknown records.
        let by_id = RecordFilter::new().with_document_id(Uuid::now_v7());
        assert!(by_id.validate(Category::Unknown).is_ok());
    }
}
