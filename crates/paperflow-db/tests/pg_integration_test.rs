//! Integration tests for the PostgreSQL stores.
//!
//! This test suite validates:
//! - Base + detail row upsert keyed by DocumentID
//! - Typed predicate queries (text, currency, date)
//! - Unknown-category records as base rows only
//! - Embedding upsert, similarity search, and category filtering
//!
//! **IMPORTANT**: These tests require a PostgreSQL database with the
//! pgvector extension available. Set `DATABASE_URL` and run with
//! `cargo test -- --ignored`.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Map;
use uuid::Uuid;

use paperflow_core::{
    Category, DocumentFields, ExtractedText, InvoiceFields, RecordFilter, RecordStore,
    StructuredRecord, VectorStore,
};
use paperflow_db::{create_pool, init_schema, PgRecordStore, PgVectorStore};
use paperflow_inference::MockInferenceBackend;

const TEST_DIMENSION: usize = 16;

async fn setup() -> (PgRecordStore, PgVectorStore) {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    let pool = create_pool(&database_url)
        .await
        .expect("Failed to connect to test database");
    init_schema(&pool, TEST_DIMENSION)
        .await
        .expect("Failed to initialize schema");

    let embedder = Arc::new(MockInferenceBackend::new().with_dimension(TEST_DIMENSION));
    (
        PgRecordStore::new(pool.clone()),
        PgVectorStore::new(pool, embedder),
    )
}

fn invoice(vendor: &str, total: &str, date: &str) -> StructuredRecord {
    StructuredRecord::new(
        Uuid::now_v7(),
        DocumentFields::Invoice(InvoiceFields {
            invoice_number: Some("A-100".to_string()),
            vendor_name: Some(vendor.to_string()),
            total_amount: Some(total.to_string()),
            invoice_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            ..Default::default()
        }),
    )
}

#[tokio::test]
#[ignore = "requires PostgreSQL with pgvector"]
async fn test_record_upsert_fetch_delete_roundtrip() {
    let (records, _) = setup().await;

    let record = invoice("Acme HVAC", "250.00", "2024-03-01");
    records.upsert(&record).await.expect("upsert failed");

    let fetched = records
        .fetch(record.document_id)
        .await
        .expect("fetch failed")
        .expect("record missing");
    assert_eq!(fetched.category, Category::Invoice);
    match &fetched.fields {
        DocumentFields::Invoice(f) => {
            assert_eq!(f.vendor_name.as_deref(), Some("Acme HVAC"));
            // NUMERIC round-trips back to the canonical two-decimal string.
            assert_eq!(f.total_amount.as_deref(), Some("250.00"));
            assert_eq!(
                f.invoice_date,
                NaiveDate::parse_from_str("2024-03-01", "%Y-%m-%d").ok()
            );
        }
        other => panic!("expected invoice fields, got {other:?}"),
    }

    assert!(records.delete(record.document_id).await.unwrap());
    assert!(records.fetch(record.document_id).await.unwrap().is_none());
    assert!(!records.delete(record.document_id).await.unwrap());
}

#[tokio::test]
#[ignore = "requires PostgreSQL with pgvector"]
async fn test_upsert_same_id_replaces() {
    let (records, _) = setup().await;

    let mut record = invoice("Acme HVAC", "250.00", "2024-03-01");
    records.upsert(&record).await.unwrap();
    record.fields = DocumentFields::Invoice(InvoiceFields {
        vendor_name: Some("Acme HVAC Inc".to_string()),
        total_amount: Some("300.00".to_string()),
        ..Default::default()
    });
    records.upsert(&record).await.unwrap();

    let fetched = records.fetch(record.document_id).await.unwrap().unwrap();
    match &fetched.fields {
        DocumentFields::Invoice(f) => {
            assert_eq!(f.vendor_name.as_deref(), Some("Acme HVAC Inc"));
            assert_eq!(f.total_amount.as_deref(), Some("300.00"));
        }
        other => panic!("expected invoice fields, got {other:?}"),
    }

    records.delete(record.document_id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL with pgvector"]
async fn test_typed_predicate_queries() {
    let (records, _) = setup().await;

    let cheap = invoice("Globex", "90.00", "2024-05-20");
    let pricey = invoice("Acme HVAC", "250.00", "2024-03-01");
    records.upsert(&cheap).await.unwrap();
    records.upsert(&pricey).await.unwrap();

    let over_100 = records
        .query(
            Category::Invoice,
            &RecordFilter::new()
                .with_document_id(pricey.document_id)
                .gte("total_amount", "100.00"),
        )
        .await
        .unwrap();
    assert_eq!(over_100.len(), 1);
    assert_eq!(over_100[0].document_id, pricey.document_id);

    let none_over_500 = records
        .query(
            Category::Invoice,
            &RecordFilter::new()
                .with_document_id(pricey.document_id)
                .gte("total_amount", "500.00"),
        )
        .await
        .unwrap();
    assert!(none_over_500.is_empty());

    let by_date = records
        .query(
            Category::Invoice,
            &RecordFilter::new()
                .with_document_id(cheap.document_id)
                .gte("invoice_date", "2024-05-01"),
        )
        .await
        .unwrap();
    assert_eq!(by_date.len(), 1);

    records.delete(cheap.document_id).await.unwrap();
    records.delete(pricey.document_id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL with pgvector"]
async fn test_unknown_category_base_row_only() {
    let (records, _) = setup().await;

    let id = Uuid::now_v7();
    let record = StructuredRecord::new(id, DocumentFields::Unknown);
    records.upsert(&record).await.unwrap();

    let fetched = records.fetch(id).await.unwrap().unwrap();
    assert_eq!(fetched.category, Category::Unknown);
    assert!(matches!(fetched.fields, DocumentFields::Unknown));

    records.delete(id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL with pgvector"]
async fn test_vector_upsert_and_search() {
    let (_, vectors) = setup().await;

    let a = Uuid::now_v7();
    let b = Uuid::now_v7();
    vectors
        .upsert(
            a,
            &ExtractedText::new("heating repair invoice from Acme HVAC".to_string()),
            Category::Invoice,
            Map::new(),
        )
        .await
        .unwrap();
    vectors
        .upsert(
            b,
            &ExtractedText::new("passport issued by the state department".to_string()),
            Category::IdentityDocument,
            Map::new(),
        )
        .await
        .unwrap();

    let hits = vectors
        .search("heating repair invoice from Acme HVAC", 5, None)
        .await
        .unwrap();
    assert!(hits.len() >= 2);
    assert_eq!(hits[0].document_id, a);

    let filtered = vectors
        .search("anything", 5, Some(Category::IdentityDocument))
        .await
        .unwrap();
    assert!(filtered.iter().all(|h| h.category == Category::IdentityDocument));

    vectors.delete(a).await.unwrap();
    vectors.delete(b).await.unwrap();
}
