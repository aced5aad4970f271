use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod pinecone;

pub use pinecone::{PineconeConfig, PineconeStore};

pub type KnowledgeStoreFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<RetrievedRecord>, KnowledgeStoreError>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeQuery {
    pub namespace: String,
    pub text: String,
    pub top_k: usize,
}

/// One ranked hit. `fields` keeps the order the store returned them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedRecord {
    pub id: String,
    pub score: Option<f64>,
    pub fields: Map<String, Value>,
}

impl RetrievedRecord {
    pub fn text_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .values()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum KnowledgeStoreError {
    #[error("knowledge store request failed: {0}")]
    RequestFailed(String),
    #[error("knowledge store returned status {status}: {code}")]
    Status { status: u16, code: String },
    #[error("knowledge store returned an invalid payload: {0}")]
    InvalidPayload(String),
}

impl KnowledgeStoreError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RequestFailed(_) => "request_failed",
            Self::Status { .. } => "status",
            Self::InvalidPayload(_) => "invalid_payload",
        }
    }
}

const CONTEXT_SEPARATOR: &str = "\n\n";

pub trait KnowledgeStore: Send + Sync {
    fn search<'a>(&'a self, query: KnowledgeQuery) -> KnowledgeStoreFuture<'a>;
}

/// Joins every text field, within and across records, with a blank line.
/// Falls back to [`crate::llm::NO_CONTEXT_NOTICE`] when nothing
/// textual came back.
pub fn assemble_context(records: &[RetrievedRecord]) -> String {
    let snippets = records
        .iter()
        .flat_map(|record| record.text_fields())
        .collect::<Vec<_>>();

    if snippets.is_empty() {
        return crate::llm::NO_CONTEXT_NOTICE.to_string();
    }

    snippets.join(CONTEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::{RetrievedRecord, assemble_context};
    use crate::llm::NO_CONTEXT_NOTICE;

    fn record(id: &str, fields: Value) -> RetrievedRecord {
        let fields: Map<String, Value> = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        RetrievedRecord {
            id: id.to_string(),
            score: None,
            fields,
        }
    }

    #[test]
    fn empty_results_use_the_fallback_notice() {
        assert_eq!(assemble_context(&[]), NO_CONTEXT_NOTICE);
    }

    #[test]
    fn separates_every_text_field_with_a_blank_line() {
        let records = vec![
            record(
                "b",
                json!({ "title": "Box breathing", "chunk_text": "Inhale for four counts." }),
            ),
            record("a", json!({ "chunk_text": "Short walks lift energy." })),
        ];

        assert_eq!(
            assemble_context(&records),
            "Box breathing\n\nInhale for four counts.\n\nShort walks lift energy."
        );
    }

    #[test]
    fn skips_non_text_and_blank_fields() {
        let records = vec![
            record("a", json!({ "rank": 3, "tags": ["sleep"], "chunk_text": "  " })),
            record("b", json!({ "chunk_text": "Dim the lights an hour before bed." })),
        ];

        assert_eq!(assemble_context(&records), "Dim the lights an hour before bed.");
    }

    #[test]
    fn records_without_any_text_fall_back() {
        let records = vec![record("a", json!({ "rank": 1 }))];
        assert_eq!(assemble_context(&records), NO_CONTEXT_NOTICE);
    }
}
