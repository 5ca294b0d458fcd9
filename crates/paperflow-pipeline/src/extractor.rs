//! Schema-driven field extraction.
//!
//! Builds a JSON prompt from the category's field schema, validates the
//! model response field by field, and canonicalizes values before they
//! reach either store. Partial extraction beats total failure: a field
//! that does not validate becomes null, and only retry exhaustion or an
//! unparseable response marks the whole record as extraction-failed.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use tracing::{info, warn};
use uuid::Uuid;

use paperflow_core::{
    defaults, normalize, schema, Category, DocumentFields, ExtractedText, GenerationBackend,
    IdentityFields, InsuranceFields, InvoiceFields, StructuredRecord,
};
use paperflow_inference::RetryPolicy;

use crate::truncate_chars;

/// First JSON-looking object in a response, tolerating markdown fences
/// and surrounding prose.
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

pub struct FieldExtractor {
    backend: Arc<dyn GenerationBackend>,
    retry: RetryPolicy,
}

impl FieldExtractor {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Extract a structured record for a classified document.
    ///
    /// Total over its inputs: `Unknown` short-circuits to an empty record,
    /// and inference failure yields an all-null record flagged
    /// `extraction_failed` rather than an error.
    pub async fn extract_fields(
        &self,
        text: &ExtractedText,
        category: Category,
        document_id: Uuid,
    ) -> StructuredRecord {
        if !category.is_known() {
            return StructuredRecord::new(document_id, DocumentFields::Unknown);
        }

        let start = Instant::now();
        let prompt = extraction_prompt(category, &text.text);
        let response = self
            .retry
            .run("extract_fields", || self.backend.generate_json(&prompt))
            .await;

        let record = match response {
            Ok(raw) => match parse_json_object(&raw) {
                Some(object) => {
                    StructuredRecord::new(document_id, fields_from_json(category, &object))
                }
                None => {
                    warn!(
                        subsystem = "pipeline",
                        component = "extractor",
                        category = %category,
                        response_len = raw.len(),
                        "Model response contained no JSON object"
                    );
                    StructuredRecord::extraction_failed(document_id, category)
                }
            },
            Err(err) => {
                warn!(
                    subsystem = "pipeline",
                    component = "extractor",
                    category = %category,
                    error = %err,
                    "Field extraction failed after retries"
                );
                StructuredRecord::extraction_failed(document_id, category)
            }
        };

        info!(
            subsystem = "pipeline",
            component = "extractor",
            op = "extract_fields",
            category = %category,
            extraction_failed = record.extraction_failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Field extraction complete"
        );
        record
    }
}

/// Build the extraction prompt: a JSON template listing every schema
/// field with its expected type, followed by the document text.
fn extraction_prompt(category: Category, text: &str) -> String {
    let template = schema::fields(category)
        .iter()
        .map(|spec| format!("  \"{}\": \"{} or null\"", spec.name, spec.kind.prompt_hint()))
        .collect::<Vec<_>>()
        .join(",\n");
    let sample = truncate_chars(text, defaults::EXTRACT_TEXT_LIMIT);
    format!(
        "Extract the following information from this {category} document. \
         Return ONLY valid JSON with these exact keys:\n\
         \n\
         {{\n{template}\n}}\n\
         \n\
         Document:\n\
         {sample}\n\
         \n\
         Return ONLY the JSON object, no explanation or markdown formatting."
    )
}

/// Parse the model response as a JSON object, falling back to the first
/// brace-delimited span for fenced or chatty output.
fn parse_json_object(response: &str) -> Option<Map<String, JsonValue>> {
    if let Ok(JsonValue::Object(map)) = serde_json::from_str(response) {
        return Some(map);
    }
    let span = JSON_OBJECT.find(response)?;
    match serde_json::from_str(span.as_str()) {
        Ok(JsonValue::Object(map)) => Some(map),
        _ => None,
    }
}

/// A raw JSON field value as a cleaned string, accepting both string and
/// numeric forms.
fn raw_value(object: &Map<String, JsonValue>, name: &str) -> Option<String> {
    match object.get(name)? {
        JsonValue::String(s) => normalize::clean_text(s),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn take_text(object: &Map<String, JsonValue>, name: &str) -> Option<String> {
    raw_value(object, name)
}

fn take_currency(object: &Map<String, JsonValue>, name: &str) -> Option<String> {
    raw_value(object, name).and_then(|v| normalize::normalize_currency(&v))
}

fn take_date(object: &Map<String, JsonValue>, name: &str) -> Option<NaiveDate> {
    raw_value(object, name).and_then(|v| normalize::parse_date(&v))
}

/// Validate a parsed response against the category schema, field by
/// field. Invalid values become null; the record always materializes.
fn fields_from_json(category: Category, object: &Map<String, JsonValue>) -> DocumentFields {
    match category {
        Category::Invoice => DocumentFields::Invoice(InvoiceFields {
            invoice_number: take_text(object, "invoice_number"),
            vendor_name: take_text(object, "vendor_name"),
            invoice_date: take_date(object, "invoice_date"),
            due_date: take_date(object, "due_date"),
            total_amount: take_currency(object, "total_amount"),
            subtotal: take_currency(object, "subtotal"),
            tax_amount: take_currency(object, "tax_amount"),
            service_description: take_text(object, "service_description"),
            vendor_address: take_text(object, "vendor_address"),
            vendor_phone: take_text(object, "vendor_phone"),
        }),
        Category::Insurance => DocumentFields::Insurance(InsuranceFields {
            policy_number: take_text(object, "policy_number"),
            policyholder_name: take_text(object, "policyholder_name"),
            insurance_company: take_text(object, "insurance_company"),
            policy_type: take_text(object, "policy_type"),
            coverage_amount: take_currency(object, "coverage_amount"),
            premium_amount: take_currency(object, "premium_amount"),
            effective_date: take_date(object, "effective_date"),
            expiry_date: take_date(object, "expiry_date"),
            property_address: take_text(object, "property_address"),
            deductible: take_currency(object, "deductible"),
        }),
        Category::IdentityDocument => DocumentFields::IdentityDocument(IdentityFields {
            document_kind: take_text(object, "document_kind"),
            id_number: take_text(object, "id_number"),
            full_name: take_text(object, "full_name"),
            date_of_birth: take_date(object, "date_of_birth"),
            issue_date: take_date(object, "issue_date"),
            expiry_date: take_date(object, "expiry_date"),
            address: take_text(object, "address"),
            state: take_text(object, "state"),
            country: take_text(object, "country"),
            gender: take_text(object, "gender"),
        }),
        Category::Unknown => DocumentFields::Unknown,
    }
}
