//! # paperflow-db
//!
//! Persistence layer for paperflow: a relational record store and a
//! pgvector embedding store over one PostgreSQL database, plus in-memory
//! equivalents for tests and local runs.
//!
//! The two stores are deliberately independent — the ingestion pipeline
//! writes the relational record first (authoritative) and the embedding
//! second (best-effort), both keyed by the same DocumentID.

pub mod memory;
pub mod pool;
pub mod records;
pub mod schema;
pub mod vectors;

pub use memory::{MemoryRecordStore, MemoryVectorStore};
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use records::PgRecordStore;
pub use schema::init_schema;
pub use vectors::PgVectorStore;
