//! In-memory store implementations.
//!
//! Same semantics as the PostgreSQL stores, backed by hash maps. Used by
//! pipeline tests and useful for local experiments with no database.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use tokio::sync::RwLock;
use uuid::Uuid;

use paperflow_core::traits::{FieldPredicate, PredicateOp};
use paperflow_core::{
    normalize, schema, Category, EmbeddingBackend, Error, ExtractedText, FieldKind, RecordFilter,
    RecordStore, Result, SearchHit, StructuredRecord, VectorStore,
};

/// In-memory implementation of [`RecordStore`].
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<Uuid, StructuredRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn predicate_matches(category: Category, record: &StructuredRecord, pred: &FieldPredicate) -> bool {
        let Some(spec) = schema::field(category, &pred.field) else {
            return false;
        };
        let metadata = record.metadata();
        let Some(JsonValue::String(stored)) = metadata.get(spec.name) else {
            // Null or missing field never satisfies a predicate.
            return false;
        };

        let ordering = match spec.kind {
            FieldKind::Date => {
                match (normalize::parse_date(stored), normalize::parse_date(&pred.value)) {
                    (Some(a), Some(b)) => a.cmp(&b),
                    _ => return false,
                }
            }
            FieldKind::Currency => {
                match (stored.parse::<f64>(), pred.value.parse::<f64>()) {
                    (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                    _ => return false,
                }
            }
            FieldKind::Text | FieldKind::Identifier => stored.as_str().cmp(pred.value.as_str()),
        };

        match pred.op {
            PredicateOp::Eq => ordering == Ordering::Equal,
            PredicateOp::Gte => ordering != Ordering::Less,
            PredicateOp::Lte => ordering != Ordering::Greater,
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn upsert(&self, record: &StructuredRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.document_id, record.clone());
        Ok(())
    }

    async fn fetch(&self, document_id: Uuid) -> Result<Option<StructuredRecord>> {
        Ok(self.records.read().await.get(&document_id).cloned())
    }

    async fn query(
        &self,
        category: Category,
        filter: &RecordFilter,
    ) -> Result<Vec<StructuredRecord>> {
        filter.validate(category)?;
        let records = self.records.read().await;
        let mut matched: Vec<StructuredRecord> = records
            .values()
            .filter(|r| r.category == category)
            .filter(|r| filter.document_id.map_or(true, |id| r.document_id == id))
            .filter(|r| {
                filter
                    .predicates
                    .iter()
                    .all(|p| Self::predicate_matches(category, r, p))
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn list_all(&self, category: Category) -> Result<Vec<StructuredRecord>> {
        self.query(category, &RecordFilter::new()).await
    }

    async fn delete(&self, document_id: Uuid) -> Result<bool> {
        Ok(self.records.write().await.remove(&document_id).is_some())
    }
}

struct StoredEmbedding {
    category: Category,
    metadata: Map<String, JsonValue>,
    embedding: Vec<f32>,
    created_at: DateTime<Utc>,
}

/// In-memory implementation of [`VectorStore`] using cosine similarity.
pub struct MemoryVectorStore {
    embedder: Arc<dyn EmbeddingBackend>,
    entries: RwLock<HashMap<Uuid, StoredEmbedding>>,
}

impl MemoryVectorStore {
    pub fn new(embedder: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let input = if text.trim().is_empty() { " " } else { text };
        let mut vectors = self.embedder.embed_texts(&[input.to_string()]).await?;
        vectors
            .pop()
            .map(|v| v.to_vec())
            .ok_or_else(|| Error::Embedding("backend returned no vector".to_string()))
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            0.0
        } else {
            dot / (norm_a * norm_b)
        }
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(
        &self,
        document_id: Uuid,
        text: &ExtractedText,
        category: Category,
        metadata: Map<String, JsonValue>,
    ) -> Result<()> {
        let embedding = self.embed_one(&text.text).await?;
        self.entries.write().await.insert(
            document_id,
            StoredEmbedding {
                category,
                metadata,
                embedding,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn search(
        &self,
        query_text: &str,
        k: i64,
        category: Option<Category>,
    ) -> Result<Vec<SearchHit>> {
        let query = self.embed_one(query_text).await?;
        let entries = self.entries.read().await;
        let mut hits: Vec<SearchHit> = entries
            .iter()
            .filter(|(_, e)| category.map_or(true, |c| e.category == c))
            .map(|(id, e)| SearchHit {
                document_id: *id,
                score: Self::cosine_similarity(&query, &e.embedding),
                category: e.category,
                metadata: e.metadata.clone(),
                created_at: e.created_at,
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        hits.truncate(k.max(0) as usize);
        Ok(hits)
    }

    async fn delete(&self, document_id: Uuid) -> Result<bool> {
        Ok(self.entries.write().await.remove(&document_id).is_some())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.entries.read().await.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use paperflow_core::{DocumentFields, InvoiceFields};
    use paperflow_inference::MockInferenceBackend;

    fn invoice_record(vendor: &str, total: &str, date: &str) -> StructuredRecord {
        StructuredRecord::new(
            Uuid::now_v7(),
            DocumentFields::Invoice(InvoiceFields {
                vendor_name: Some(vendor.to_string()),
                total_amount: Some(total.to_string()),
                invoice_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
                ..Default::default()
            }),
        )
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_document_id() {
        let store = MemoryRecordStore::new();
        let mut record = invoice_record("Acme HVAC", "250.00", "2024-03-01");
        store.upsert(&record).await.unwrap();

        record.fields = DocumentFields::Invoice(InvoiceFields {
            vendor_name: Some("Acme HVAC Inc".to_string()),
            ..Default::default()
        });
        store.upsert(&record).await.unwrap();

        let all = store.list_all(Category::Invoice).await.unwrap();
        assert_eq!(all.len(), 1);
        let fetched = store.fetch(record.document_id).await.unwrap().unwrap();
        assert_eq!(
            fetched.metadata().get("vendor_name"),
            Some(&JsonValue::String("Acme HVAC Inc".to_string()))
        );
    }

    #[tokio::test]
    async fn test_query_with_typed_predicates() {
        let store = MemoryRecordStore::new();
        store
            .upsert(&invoice_record("Acme HVAC", "250.00", "2024-03-01"))
            .await
            .unwrap();
        store
            .upsert(&invoice_record("Globex", "90.00", "2024-05-20"))
            .await
            .unwrap();

        let pricey = store
            .query(
                Category::Invoice,
                &RecordFilter::new().gte("total_amount", "100.00"),
            )
            .await
            .unwrap();
        assert_eq!(pricey.len(), 1);

        let by_vendor = store
            .query(
                Category::Invoice,
                &RecordFilter::new().eq("vendor_name", "Globex"),
            )
            .await
            .unwrap();
        assert_eq!(by_vendor.len(), 1);

        let spring = store
            .query(
                Category::Invoice,
                &RecordFilter::new()
                    .gte("invoice_date", "2024-01-01")
                    .lte("invoice_date", "2024-04-01"),
            )
            .await
            .unwrap();
        assert_eq!(spring.len(), 1);
    }

    #[tokio::test]
    async fn test_null_fields_never_match_predicates() {
        let store = MemoryRecordStore::new();
        let record = StructuredRecord::new(
            Uuid::now_v7(),
            DocumentFields::Invoice(InvoiceFields::default()),
        );
        store.upsert(&record).await.unwrap();

        let hits = store
            .query(
                Category::Invoice,
                &RecordFilter::new().eq("vendor_name", "Acme"),
            )
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_category_rejects_field_predicates() {
        let store = MemoryRecordStore::new();
        let err = store
            .query(
                Category::Unknown,
                &RecordFilter::new().eq("vendor_name", "Acme"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownCategory(_)));
    }

    #[tokio::test]
    async fn test_vector_search_ranks_by_similarity() {
        let embedder = Arc::new(MockInferenceBackend::new().with_dimension(16));
        let store = MemoryVectorStore::new(embedder);

        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        store
            .upsert(
                a,
                &ExtractedText::new("heating repair invoice from Acme".to_string()),
                Category::Invoice,
                Map::new(),
            )
            .await
            .unwrap();
        store
            .upsert(
                b,
                &ExtractedText::new("passport issued in 1999".to_string()),
                Category::IdentityDocument,
                Map::new(),
            )
            .await
            .unwrap();

        let hits = store
            .search("heating repair invoice from Acme", 5, None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document_id, a);
        assert!(hits[0].score >= hits[1].score);

        let only_ids = store
            .search("passport", 5, Some(Category::IdentityDocument))
            .await
            .unwrap();
        assert_eq!(only_ids.len(), 1);
        assert_eq!(only_ids[0].document_id, b);
    }

    #[tokio::test]
    async fn test_blank_text_still_embeddable() {
        let embedder = Arc::new(MockInferenceBackend::new().with_dimension(8));
        let store = MemoryVectorStore::new(embedder);
        store
            .upsert(Uuid::now_v7(), &ExtractedText::empty(), Category::Unknown, Map::new())
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = MemoryRecordStore::new();
        let record = invoice_record("Acme", "10.00", "2024-01-01");
        store.upsert(&record).await.unwrap();
        assert!(store.delete(record.document_id).await.unwrap());
        assert!(!store.delete(record.document_id).await.unwrap());
    }
}
