//! # paperflow-core
//!
//! Core types, traits, and abstractions for the paperflow document
//! ingestion pipeline.
//!
//! This crate provides the foundational data structures and trait
//! definitions that the other paperflow crates depend on: the closed
//! [`Category`] enumeration, per-category field schemas, the
//! [`StructuredRecord`] tagged union, store and inference backend traits,
//! and the shared error type.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod schema;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::{
    Category, DocumentFields, ExtractedText, IdentityFields, InsuranceFields, InvoiceFields,
    MediaType, PersistenceResult, PersistenceStatus, RawDocument, SearchHit, StructuredRecord,
};
pub use schema::{FieldKind, FieldSpec};
pub use traits::{
    EmbeddingBackend, FieldPredicate, GenerationBackend, OcrBackend, PredicateOp, RecordFilter,
    RecordStore, VectorStore,
};

/// Vector type shared with the pgvector column type.
pub use pgvector::Vector;
