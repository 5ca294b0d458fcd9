//! pgvector-backed embedding store.
//!
//! One row per DocumentID carrying the full extracted text, the category,
//! denormalized field metadata, and the embedding itself. Writes here are
//! best-effort from the pipeline's point of view; the relational store is
//! authoritative.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use pgvector::Vector;
use serde_json::{Map, Value as JsonValue};
use sqlx::{PgPool, Row};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use paperflow_core::{
    Category, EmbeddingBackend, Error, ExtractedText, Result, SearchHit, VectorStore,
};

/// PostgreSQL + pgvector implementation of [`VectorStore`].
#[derive(Clone)]
pub struct PgVectorStore {
    pool: PgPool,
    embedder: Arc<dyn EmbeddingBackend>,
}

impl PgVectorStore {
    pub fn new(pool: PgPool, embedder: Arc<dyn EmbeddingBackend>) -> Self {
        Self { pool, embedder }
    }

    async fn embed_one(&self, text: &str) -> Result<Vector> {
        // Embedding models reject empty input; a lone space keeps blank
        // documents representable without special-casing callers.
        let input = if text.trim().is_empty() { " " } else { text };
        let mut vectors = self.embedder.embed_texts(&[input.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::Embedding("backend returned no vector".to_string()))
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    #[instrument(skip(self, text, metadata), fields(subsystem = "db", component = "vector_store", op = "upsert", document_id = %document_id, category = %category))]
    async fn upsert(
        &self,
        document_id: Uuid,
        text: &ExtractedText,
        category: Category,
        metadata: Map<String, JsonValue>,
    ) -> Result<()> {
        let start = Instant::now();
        let embedding = self.embed_one(&text.text).await?;

        sqlx::query(
            r#"
            INSERT INTO document_embedding (document_id, category, content, metadata, embedding, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (document_id) DO UPDATE SET
                category = EXCLUDED.category,
                content = EXCLUDED.content,
                metadata = EXCLUDED.metadata,
                embedding = EXCLUDED.embedding,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(document_id)
        .bind(category.as_str())
        .bind(&text.text)
        .bind(JsonValue::Object(metadata))
        .bind(embedding)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            content_len = text.text.len(),
            "Embedding upserted"
        );
        Ok(())
    }

    #[instrument(skip(self, query_text), fields(subsystem = "db", component = "vector_store", op = "search", k))]
    async fn search(
        &self,
        query_text: &str,
        k: i64,
        category: Option<Category>,
    ) -> Result<Vec<SearchHit>> {
        let start = Instant::now();
        let query_vector = self.embed_one(query_text).await?;

        let sql = if category.is_some() {
            r#"
            SELECT document_id, category, metadata, created_at,
                   (1.0 - (embedding <=> $1))::float4 AS score
            FROM document_embedding
            WHERE category = $3
            ORDER BY embedding <=> $1, created_at DESC
            LIMIT $2
            "#
        } else {
            r#"
            SELECT document_id, category, metadata, created_at,
                   (1.0 - (embedding <=> $1))::float4 AS score
            FROM document_embedding
            ORDER BY embedding <=> $1, created_at DESC
            LIMIT $2
            "#
        };

        let mut query = sqlx::query(sql).bind(query_vector).bind(k);
        if let Some(cat) = category {
            query = query.bind(cat.as_str());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(Error::Database)?;

        let hits = rows
            .iter()
            .map(|row| -> Result<SearchHit> {
                let category: Category = row.get::<String, _>("category").parse()?;
                let metadata = match row.get::<JsonValue, _>("metadata") {
                    JsonValue::Object(map) => map,
                    _ => Map::new(),
                };
                Ok(SearchHit {
                    document_id: row.get("document_id"),
                    score: row.get::<f32, _>("score"),
                    category,
                    metadata,
                    created_at: row.get("created_at"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            subsystem = "db",
            component = "vector_store",
            op = "search",
            result_count = hits.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Similarity search complete"
        );
        Ok(hits)
    }

    async fn delete(&self, document_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM document_embedding WHERE document_id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM document_embedding")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.get::<i64, _>("n"))
    }
}
