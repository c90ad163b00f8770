//! Collaborator traits: the document store and the text generator.
//!
//! Implementations live in `gurukul-providers` (Firestore, Gemini) and in
//! [`crate::memory`] for the in-process store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{Document, DocumentKey, FieldValue, Fields};

// ---------------------------------------------------------------------------
// Document store trait
// ---------------------------------------------------------------------------

/// Key-addressed, schema-less record store.
///
/// Each call is a single request; there is no multi-request atomicity.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Human-readable backend name (e.g. "memory").
    fn name(&self) -> &str;

    /// Read a document, or `None` if it does not exist.
    async fn get(&self, key: &DocumentKey) -> Result<Option<Document>, StoreError>;

    /// Create or fully overwrite a document.
    async fn set(&self, key: &DocumentKey, fields: Fields) -> Result<(), StoreError>;

    /// Merge the given fields into an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] if the document does not exist.
    async fn update(&self, key: &DocumentKey, fields: Fields) -> Result<(), StoreError>;

    /// Create a document with a store-generated id and return that id.
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Run a filtered, ordered, limited query over one collection.
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError>;
}

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Equal,
    ArrayContains,
}

/// A single `field op value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: FieldValue,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::Equal,
            value: value.into(),
        }
    }

    pub fn array_contains(field: &str, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::ArrayContains,
            value: value.into(),
        }
    }

    /// Whether a document's fields satisfy this condition.
    pub fn matches(&self, fields: &Fields) -> bool {
        let Some(actual) = fields.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Equal => values_equal(actual, &self.value),
            FilterOp::ArrayContains => actual
                .as_array()
                .map(|items| items.iter().any(|item| values_equal(item, &self.value)))
                .unwrap_or(false),
        }
    }
}

fn values_equal(a: &FieldValue, b: &FieldValue) -> bool {
    a.compare(b) == std::cmp::Ordering::Equal
}

/// Sort direction for [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A query over one collection. All filters must match.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(name: &str) -> Self {
        Self {
            collection: name.to_string(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

// ---------------------------------------------------------------------------
// Text generator trait
// ---------------------------------------------------------------------------

/// Trait for generative-text backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable generator name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Generate text for a prompt.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse>;
}

/// Request to generate text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The prompt.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Top-k sampling cutoff.
    pub top_k: u32,
    /// Nucleus sampling cutoff.
    pub top_p: f64,
    /// Maximum tokens to generate.
    pub max_output_tokens: u32,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, temperature: f64) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

/// Response from a text generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated text; empty when the backend returned no candidate.
    pub text: String,
    /// Model that produced the text.
    pub model: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}
