//! Document classification.
//!
//! `classify` is total over its input domain: any text, including the
//! empty string, maps to a [`Category`]. Inference failures are absorbed
//! into `Unknown` after the retry budget is exhausted, never surfaced as
//! errors.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use paperflow_core::{defaults, Category, ExtractedText, GenerationBackend};
use paperflow_inference::RetryPolicy;

use crate::truncate_chars;

/// Category tokens matched against the model response, most specific
/// first so "identity_document" wins over its "id" substring.
const RESPONSE_TOKENS: &[(&str, Category)] = &[
    ("invoice", Category::Invoice),
    ("insurance", Category::Insurance),
    ("identity", Category::IdentityDocument),
    ("id", Category::IdentityDocument),
];

pub struct DocumentClassifier {
    backend: Arc<dyn GenerationBackend>,
    retry: RetryPolicy,
}

impl DocumentClassifier {
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

    /// Classify extracted text into one of the four categories.
    ///
    /// Empty text short-circuits to `Unknown` without an inference call.
    pub async fn classify(&self, text: &ExtractedText) -> Category {
        if text.is_empty() {
            debug!(
                subsystem = "pipeline",
                component = "classifier",
                "Empty text, classifying as unknown"
            );
            return Category::Unknown;
        }

        let start = Instant::now();
        let prompt = classification_prompt(&text.text);
        let response = self
            .retry
            .run("classify", || self.backend.generate(&prompt))
            .await;

        let category = match response {
            Ok(raw) => parse_category(&raw),
            Err(err) => {
                warn!(
                    subsystem = "pipeline",
                    component = "classifier",
                    error = %err,
                    "Classification failed after retries, falling back to unknown"
                );
                Category::Unknown
            }
        };

        info!(
            subsystem = "pipeline",
            component = "classifier",
            op = "classify",
            category = %category,
            duration_ms = start.elapsed().as_millis() as u64,
            "Document classified"
        );
        category
    }
}

fn classification_prompt(text: &str) -> String {
    let sample = truncate_chars(text, defaults::CLASSIFY_TEXT_LIMIT);
    format!(
        "You are a document classifier for a property management company.\n\
         \n\
         Analyze the following document and classify it into ONE of these categories:\n\
         - invoice (vendor bills, payment requests)\n\
         - insurance (renters insurance policies, coverage documents)\n\
         - identity_document (driver's license, passport, state ID, tenant identification)\n\
         - unknown (if none of the above)\n\
         \n\
         Document text:\n\
         {sample}\n\
         \n\
         Respond with ONLY the category name in lowercase, nothing else."
    )
}

/// Map a raw model response to a category.
///
/// Exact token first, then a substring scan so chatty responses like
/// "This is an invoice." still land; anything else is `Unknown`.
fn parse_category(response: &str) -> Category {
    let normalized = response.trim().to_ascii_lowercase();
    if let Ok(category) = normalized.parse::<Category>() {
        return category;
    }
    for (token, category) in RESPONSE_TOKENS {
        if normalized.contains(token) {
            return *category;
        }
    }
    Category::Unknown
}
