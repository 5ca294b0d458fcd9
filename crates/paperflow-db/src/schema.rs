//! Schema bootstrap.
//!
//! One base `document` table holds every ingested document; the three
//! known categories each get a typed detail table keyed by DocumentID.
//! Unknown-category documents exist as a base row only, so degraded
//! ingestions stay visible. The vector side is a single `document_embedding`
//! table with one row per DocumentID.

use sqlx::PgPool;
use tracing::info;

use paperflow_core::{Error, Result};

/// Create the pgvector extension and all tables if absent.
///
/// `dimension` must match the configured embedding backend.
pub async fn init_schema(pool: &PgPool, dimension: usize) -> Result<()> {
    let statements = vec![
        "CREATE EXTENSION IF NOT EXISTS vector".to_string(),
        r#"
        CREATE TABLE IF NOT EXISTS document (
            document_id UUID PRIMARY KEY,
            category TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            extraction_failed BOOLEAN NOT NULL DEFAULT FALSE
        )"#
        .to_string(),
        r#"
        CREATE TABLE IF NOT EXISTS invoice (
            document_id UUID PRIMARY KEY REFERENCES document(document_id) ON DELETE CASCADE,
            invoice_number TEXT,
            vendor_name TEXT,
            invoice_date DATE,
            due_date DATE,
            total_amount NUMERIC(14,2),
            subtotal NUMERIC(14,2),
            tax_amount NUMERIC(14,2),
            service_description TEXT,
            vendor_address TEXT,
            vendor_phone TEXT
        )"#
        .to_string(),
        r#"
        CREATE TABLE IF NOT EXISTS insurance_policy (
            document_id UUID PRIMARY KEY REFERENCES document(document_id) ON DELETE CASCADE,
            policy_number TEXT,
            policyholder_name TEXT,
            insurance_company TEXT,
            policy_type TEXT,
            coverage_amount NUMERIC(14,2),
            premium_amount NUMERIC(14,2),
            effective_date DATE,
            expiry_date DATE,
            property_address TEXT,
            deductible NUMERIC(14,2)
        )"#
        .to_string(),
        r#"
        CREATE TABLE IF NOT EXISTS identity_document (
            document_id UUID PRIMARY KEY REFERENCES document(document_id) ON DELETE CASCADE,
            document_kind TEXT,
            id_number TEXT,
            full_name TEXT,
            date_of_birth DATE,
            issue_date DATE,
            expiry_date DATE,
            address TEXT,
            state TEXT,
            country TEXT,
            gender TEXT
        )"#
        .to_string(),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS document_embedding (
                document_id UUID PRIMARY KEY,
                category TEXT NOT NULL,
                content TEXT NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                embedding vector({dimension}) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )"#
        ),
        "CREATE INDEX IF NOT EXISTS idx_document_category ON document(category, created_at DESC)"
            .to_string(),
        "CREATE INDEX IF NOT EXISTS idx_embedding_category ON document_embedding(category)"
            .to_string(),
    ];

    for statement in statements {
        sqlx::query(&statement)
            .execute(pool)
            .await
            .map_err(Error::Database)?;
    }

    info!(
        subsystem = "db",
        component = "schema",
        op = "init",
        dimension,
        "Schema initialized"
    );
    Ok(())
}
