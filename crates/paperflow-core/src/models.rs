//! Core data model for the ingestion pipeline.
//!
//! The per-category field sets are a closed, strongly-typed tagged union
//! ([`DocumentFields`]) selected by explicit matching. The schema that
//! drives extraction prompts and query validation lives in [`crate::schema`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

// =============================================================================
// RAW DOCUMENT
// =============================================================================

/// Supported input media types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Pdf,
    Png,
    Jpeg,
    Tiff,
    Webp,
    Bmp,
}

impl MediaType {
    /// Parse a declared MIME type into a supported media type.
    pub fn from_mime(mime: &str) -> crate::Result<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "application/pdf" => Ok(Self::Pdf),
            "image/png" => Ok(Self::Png),
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/tiff" => Ok(Self::Tiff),
            "image/webp" => Ok(Self::Webp),
            "image/bmp" => Ok(Self::Bmp),
            other => Err(Error::UnsupportedMediaType(other.to_string())),
        }
    }

    /// Canonical MIME string for this media type.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Tiff => "image/tiff",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
        }
    }

    /// True for raster image inputs (always OCR'd).
    pub fn is_image(&self) -> bool {
        !matches!(self, Self::Pdf)
    }
}

/// An uploaded document payload with its declared media type.
///
/// Ephemeral: exists only for the duration of one ingestion call and is
/// consumed by the text extractor.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
}

impl RawDocument {
    pub fn new(bytes: Vec<u8>, media_type: MediaType) -> Self {
        Self { bytes, media_type }
    }

    /// Build from a declared MIME string, rejecting unsupported types.
    pub fn from_mime(bytes: Vec<u8>, mime: &str) -> crate::Result<Self> {
        Ok(Self {
            bytes,
            media_type: MediaType::from_mime(mime)?,
        })
    }
}

// =============================================================================
// EXTRACTED TEXT
// =============================================================================

/// Plain text recovered from a document. Immutable once produced.
///
/// An empty value is a valid outcome (blank page, unreadable scan) — the
/// classifier maps it to [`Category::Unknown`] rather than failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    /// True when any portion of the text came from OCR rather than an
    /// embedded text layer.
    pub ocr_used: bool,
}

impl ExtractedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ocr_used: false,
        }
    }

    pub fn from_ocr(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ocr_used: true,
        }
    }

    /// Empty extraction result (no recoverable text).
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            ocr_used: false,
        }
    }

    /// Whitespace-only text counts as empty.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

// =============================================================================
// CATEGORY
// =============================================================================

/// Closed classification of a document's purpose.
///
/// `Unknown` is terminal: no schema-driven extraction is attempted for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Invoice,
    Insurance,
    IdentityDocument,
    Unknown,
}

impl Category {
    /// All categories, Unknown last.
    pub const ALL: [Category; 4] = [
        Category::Invoice,
        Category::Insurance,
        Category::IdentityDocument,
        Category::Unknown,
    ];

    /// The three categories that carry a field schema.
    pub const KNOWN: [Category; 3] = [
        Category::Invoice,
        Category::Insurance,
        Category::IdentityDocument,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Insurance => "insurance",
            Self::IdentityDocument => "identity_document",
            Self::Unknown => "unknown",
        }
    }

    /// True when the category has a field schema.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invoice" => Ok(Self::Invoice),
            "insurance" => Ok(Self::Insurance),
            "identity_document" | "identity" | "id" => Ok(Self::IdentityDocument),
            "unknown" => Ok(Self::Unknown),
            other => Err(Error::UnknownCategory(other.to_string())),
        }
    }
}

// =============================================================================
// PER-CATEGORY FIELD SETS
// =============================================================================

/// Fields extracted from an invoice. Currency amounts are canonical
/// two-decimal strings with no symbols.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceFields {
    pub invoice_number: Option<String>,
    pub vendor_name: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub total_amount: Option<String>,
    pub subtotal: Option<String>,
    pub tax_amount: Option<String>,
    pub service_description: Option<String>,
    pub vendor_address: Option<String>,
    pub vendor_phone: Option<String>,
}

/// Fields extracted from an insurance policy document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsuranceFields {
    pub policy_number: Option<String>,
    pub policyholder_name: Option<String>,
    pub insurance_company: Option<String>,
    pub policy_type: Option<String>,
    pub coverage_amount: Option<String>,
    pub premium_amount: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub property_address: Option<String>,
    pub deductible: Option<String>,
}

/// Fields extracted from an identity document (license, passport, state ID).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityFields {
    pub document_kind: Option<String>,
    pub id_number: Option<String>,
    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub gender: Option<String>,
}

/// Tagged union of per-category field sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentFields {
    Invoice(InvoiceFields),
    Insurance(InsuranceFields),
    IdentityDocument(IdentityFields),
    Unknown,
}

impl DocumentFields {
    /// The category this field set belongs to.
    pub fn category(&self) -> Category {
        match self {
            Self::Invoice(_) => Category::Invoice,
            Self::Insurance(_) => Category::Insurance,
            Self::IdentityDocument(_) => Category::IdentityDocument,
            Self::Unknown => Category::Unknown,
        }
    }

    /// An all-null field set for the given category.
    pub fn empty_for(category: Category) -> Self {
        match category {
            Category::Invoice => Self::Invoice(InvoiceFields::default()),
            Category::Insurance => Self::Insurance(InsuranceFields::default()),
            Category::IdentityDocument => Self::IdentityDocument(IdentityFields::default()),
            Category::Unknown => Self::Unknown,
        }
    }

    /// Flatten to a JSON map keyed by schema field name, for vector-store
    /// metadata denormalization and filter evaluation. Absent fields map to
    /// `Null`; Unknown has no fields.
    pub fn metadata(&self) -> Map<String, JsonValue> {
        fn put(map: &mut Map<String, JsonValue>, key: &str, v: &Option<String>) {
            map.insert(
                key.to_string(),
                v.as_ref()
                    .map(|s| JsonValue::String(s.clone()))
                    .unwrap_or(JsonValue::Null),
            );
        }
        fn put_date(map: &mut Map<String, JsonValue>, key: &str, v: &Option<NaiveDate>) {
            map.insert(
                key.to_string(),
                v.map(|d| JsonValue::String(d.format("%Y-%m-%d").to_string()))
                    .unwrap_or(JsonValue::Null),
            );
        }

        let mut map = Map::new();
        match self {
            Self::Invoice(f) => {
                put(&mut map, "invoice_number", &f.invoice_number);
                put(&mut map, "vendor_name", &f.vendor_name);
                put_date(&mut map, "invoice_date", &f.invoice_date);
                put_date(&mut map, "due_date", &f.due_date);
                put(&mut map, "total_amount", &f.total_amount);
                put(&mut map, "subtotal", &f.subtotal);
                put(&mut map, "tax_amount", &f.tax_amount);
                put(&mut map, "service_description", &f.service_description);
                put(&mut map, "vendor_address", &f.vendor_address);
                put(&mut map, "vendor_phone", &f.vendor_phone);
            }
            Self::Insurance(f) => {
                put(&mut map, "policy_number", &f.policy_number);
                put(&mut map, "policyholder_name", &f.policyholder_name);
                put(&mut map, "insurance_company", &f.insurance_company);
                put(&mut map, "policy_type", &f.policy_type);
                put(&mut map, "coverage_amount", &f.coverage_amount);
                put(&mut map, "premium_amount", &f.premium_amount);
                put_date(&mut map, "effective_date", &f.effective_date);
                put_date(&mut map, "expiry_date", &f.expiry_date);
                put(&mut map, "property_address", &f.property_address);
                put(&mut map, "deductible", &f.deductible);
            }
            Self::IdentityDocument(f) => {
                put(&mut map, "document_kind", &f.document_kind);
                put(&mut map, "id_number", &f.id_number);
                put(&mut map, "full_name", &f.full_name);
                put_date(&mut map, "date_of_birth", &f.date_of_birth);
                put_date(&mut map, "issue_date", &f.issue_date);
                put_date(&mut map, "expiry_date", &f.expiry_date);
                put(&mut map, "address", &f.address);
                put(&mut map, "state", &f.state);
                put(&mut map, "country", &f.country);
                put(&mut map, "gender", &f.gender);
            }
            Self::Unknown => {}
        }
        map
    }
}

// =============================================================================
// STRUCTURED RECORD
// =============================================================================

/// A classified, field-extracted document, keyed by its DocumentID.
///
/// The DocumentID is generated once per ingestion run and reused for both
/// the relational and vector writes — it is the join key between the stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecord {
    pub document_id: Uuid,
    pub category: Category,
    pub fields: DocumentFields,
    pub created_at: DateTime<Utc>,
    /// True when the extraction stage exhausted its retry budget and the
    /// record was persisted with all fields null.
    pub extraction_failed: bool,
}

impl StructuredRecord {
    pub fn new(document_id: Uuid, fields: DocumentFields) -> Self {
        Self {
            document_id,
            category: fields.category(),
            fields,
            created_at: Utc::now(),
            extraction_failed: false,
        }
    }

    /// An all-null record marking a failed extraction. Still persistable:
    /// a document with failed extraction is still a document.
    pub fn extraction_failed(document_id: Uuid, category: Category) -> Self {
        Self {
            document_id,
            category,
            fields: DocumentFields::empty_for(category),
            created_at: Utc::now(),
            extraction_failed: true,
        }
    }

    /// Flat metadata map for vector-store denormalization.
    pub fn metadata(&self) -> Map<String, JsonValue> {
        self.fields.metadata()
    }
}

// =============================================================================
// PERSISTENCE RESULT
// =============================================================================

/// Outcome classification of a dual-store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceStatus {
    /// Both stores hold the document.
    Complete,
    /// Relational write succeeded; vector write failed. The relational
    /// record is authoritative, the vector write may be retried alone.
    RelationalOnly,
    /// Vector entry exists without a relational record. Never produced by
    /// the orchestrator (relational writes go first); reported by
    /// reconciliation tooling.
    VectorOnly,
    /// Neither store holds the document.
    Failed,
}

/// Outcome of a dual write, with per-store error detail.
///
/// Silent partial writes are forbidden: any discrepancy between the two
/// stores must be visible here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceResult {
    pub status: PersistenceStatus,
    pub relational_error: Option<String>,
    pub vector_error: Option<String>,
}

impl PersistenceResult {
    pub fn complete() -> Self {
        Self {
            status: PersistenceStatus::Complete,
            relational_error: None,
            vector_error: None,
        }
    }

    pub fn relational_only(vector_error: impl Into<String>) -> Self {
        Self {
            status: PersistenceStatus::RelationalOnly,
            relational_error: None,
            vector_error: Some(vector_error.into()),
        }
    }

    pub fn failed(relational_error: impl Into<String>) -> Self {
        Self {
            status: PersistenceStatus::Failed,
            relational_error: Some(relational_error.into()),
            vector_error: None,
        }
    }

    /// True when the two stores disagree.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self.status,
            PersistenceStatus::RelationalOnly | PersistenceStatus::VectorOnly
        )
    }
}

// =============================================================================
// SEARCH
// =============================================================================

/// A vector-search hit: DocumentID plus denormalized metadata so result
/// sets are self-describing without a join back to the relational store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub document_id: Uuid,
    /// Cosine similarity, higher is better.
    pub score: f32,
    pub category: Category,
    pub metadata: Map<String, JsonValue>,
    pub created_at: DateTime<Utc>,
}
