//! Per-category field schemas.
//!
//! Fixed at build time: each known [`Category`] maps to a static list of
//! [`FieldSpec`]s that drives extraction prompts, field validation, and
//! query-filter validation. Unknown has no fields.

use serde::{Deserialize, Serialize};

use crate::models::Category;

/// Expected semantic type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Date,
    Currency,
    Identifier,
}

impl FieldKind {
    /// Human-readable type hint embedded in extraction prompts.
    pub fn prompt_hint(&self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Date => "date in YYYY-MM-DD format",
            Self::Currency => "decimal amount without currency symbols",
            Self::Identifier => "identifier string",
        }
    }
}

/// One named, typed field of a category schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

const INVOICE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("invoice_number", FieldKind::Identifier),
    FieldSpec::optional("vendor_name", FieldKind::Text),
    FieldSpec::optional("invoice_date", FieldKind::Date),
    FieldSpec::optional("due_date", FieldKind::Date),
    FieldSpec::optional("total_amount", FieldKind::Currency),
    FieldSpec::optional("subtotal", FieldKind::Currency),
    FieldSpec::optional("tax_amount", FieldKind::Currency),
    FieldSpec::optional("service_description", FieldKind::Text),
    FieldSpec::optional("vendor_address", FieldKind::Text),
    FieldSpec::optional("vendor_phone", FieldKind::Text),
];

const INSURANCE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("policy_number", FieldKind::Identifier),
    FieldSpec::optional("policyholder_name", FieldKind::Text),
    FieldSpec::optional("insurance_company", FieldKind::Text),
    FieldSpec::optional("policy_type", FieldKind::Text),
    FieldSpec::optional("coverage_amount", FieldKind::Currency),
    FieldSpec::optional("premium_amount", FieldKind::Currency),
    FieldSpec::optional("effective_date", FieldKind::Date),
    FieldSpec::optional("expiry_date", FieldKind::Date),
    FieldSpec::optional("property_address", FieldKind::Text),
    FieldSpec::optional("deductible", FieldKind::Currency),
];

const IDENTITY_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional("document_kind", FieldKind::Text),
    FieldSpec::required("id_number", FieldKind::Identifier),
    FieldSpec::optional("full_name", FieldKind::Text),
    FieldSpec::optional("date_of_birth", FieldKind::Date),
    FieldSpec::optional("issue_date", FieldKind::Date),
    FieldSpec::optional("expiry_date", FieldKind::Date),
    FieldSpec::optional("address", FieldKind::Text),
    FieldSpec::optional("state", FieldKind::Text),
    FieldSpec::optional("country", FieldKind::Text),
    FieldSpec::optional("gender", FieldKind::Text),
];

/// The field schema for a category. Unknown returns an empty slice.
pub fn fields(category: Category) -> &'static [FieldSpec] {
    match category {
        Category::Invoice => INVOICE_FIELDS,
        Category::Insurance => INSURANCE_FIELDS,
        Category::IdentityDocument => IDENTITY_FIELDS,
        Category::Unknown => &[],
    }
}

/// Look up a single field spec by name within a category's schema.
pub fn field(category: Category, name: &str) -> Option<&'static FieldSpec> {
    fields(category).iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories_have_ten_fields() {
        for cat in Category::KNOWN {
            assert_eq!(fields(cat).len(), 10, "{cat}");
        }
    }

    #[test]
    fn test_unknown_has_no_fields() {
        assert!(fields(Category::Unknown).is_empty());
    }

    #[test]
    fn test_field_lookup() {
        let spec = field(Category::Invoice, "total_amount").unwrap();
        assert_eq!(spec.kind, FieldKind::Currency);
        assert!(field(Category::Invoice, "policy_number").is_none());
    }

    #[test]
    fn test_schema_field_names_match_metadata_keys() {
        use crate::models::DocumentFields;
        for cat in Category::KNOWN {
            let meta = DocumentFields::empty_for(cat).metadata();
            for spec in fields(cat) {
                assert!(meta.contains_key(spec.name), "{cat} missing {}", spec.name);
            }
            assert_eq!(meta.len(), fields(cat).len(), "{cat}");
        }
    }

    #[test]
    fn test_each_known_schema_has_required_identifier() {
        for cat in Category::KNOWN {
            assert!(
                fields(cat)
                    .iter()
                    .any(|f| f.required && f.kind == FieldKind::Identifier),
                "{cat}"
            );
        }
    }
}
