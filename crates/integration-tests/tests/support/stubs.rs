#![allow(dead_code)]

use std::sync::Mutex;

use serde_json::{Map, Value};
use shared::knowledge::{
    KnowledgeQuery, KnowledgeStore, KnowledgeStoreError, KnowledgeStoreFuture, RetrievedRecord,
};
use shared::llm::{
    LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmGatewayRequest, LlmGatewayResponse,
};

pub struct StubStore {
    records: Option<Vec<RetrievedRecord>>,
    queries: Mutex<Vec<KnowledgeQuery>>,
}

impl StubStore {
    pub fn with_records(records: Vec<RetrievedRecord>) -> Self {
        Self {
            records: Some(records),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn unavailable() -> Self {
        Self {
            records: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<KnowledgeQuery> {
        self.queries.lock().expect("queries lock").clone()
    }
}

impl KnowledgeStore for StubStore {
    fn search<'a>(&'a self, query: KnowledgeQuery) -> KnowledgeStoreFuture<'a> {
        Box::pin(async move {
            self.queries.lock().expect("queries lock").push(query);
            self.records.clone().ok_or(KnowledgeStoreError::Status {
                status: 503,
                code: "UNAVAILABLE".to_string(),
            })
        })
    }
}

pub struct StubGateway {
    content: Option<String>,
    requests: Mutex<Vec<LlmGatewayRequest>>,
}

impl StubGateway {
    pub fn replying(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            content: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<LlmGatewayRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl LlmGateway for StubGateway {
    fn generate<'a>(&'a self, request: LlmGatewayRequest) -> LlmGatewayFuture<'a> {
        Box::pin(async move {
            self.requests.lock().expect("requests lock").push(request);
            let content = self
                .content
                .clone()
                .ok_or_else(|| LlmGatewayError::ProviderFailure("status=503".to_string()))?;
            Ok(LlmGatewayResponse {
                model: "stub-model".to_string(),
                provider_request_id: Some("stub-request".to_string()),
                content,
                usage: None,
            })
        })
    }
}

pub fn text_record(id: &str, chunk_text: &str) -> RetrievedRecord {
    let mut fields = Map::new();
    fields.insert(
        "chunk_text".to_string(),
        Value::String(chunk_text.to_string()),
    );
    RetrievedRecord {
        id: id.to_string(),
        score: Some(0.9),
        fields,
    }
}

pub const TIRED_PRACTICE_REPLY: &str = r#"{
  "reply": "Low energy days are real. Let's wake the body up gently.",
  "miniPractice": {
    "title": "Two-minute desk reset",
    "moodTags": ["tired", "unfocused"],
    "energyLevel": "low",
    "environment": "at_desk",
    "duration": "2 minutes",
    "steps": [
      "Roll your shoulders back five times",
      "Take three slow breaths, longer on the exhale",
      "Sip some water"
    ]
  }
}"#;
