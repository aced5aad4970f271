use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;

use super::{
    KnowledgeQuery, KnowledgeStore, KnowledgeStoreError, KnowledgeStoreFuture, RetrievedRecord,
};
use crate::config::ConfigError;
use crate::config_env::{
    ensure_http_url, optional_trimmed_env, parse_optional_u64_env, require_env,
};

const DEFAULT_CONTROL_URL: &str = "https://api.pinecone.io";
const DEFAULT_API_VERSION: &str = "2025-01";
const API_KEY_HEADER: &str = "Api-Key";
const API_VERSION_HEADER: &str = "X-Pinecone-API-Version";

#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    pub index_name: String,
    pub index_host: Option<String>,
    pub control_url: String,
    pub api_version: String,
    pub timeout_ms: Option<u64>,
}

impl PineconeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let control_url = optional_trimmed_env("PINECONE_CONTROL_URL")
            .unwrap_or_else(|| DEFAULT_CONTROL_URL.to_string());
        ensure_http_url("PINECONE_CONTROL_URL", &control_url)?;

        Ok(Self {
            api_key: require_env("PINECONE_API_KEY")?,
            index_name: require_env("PINECONE_INDEX")?,
            index_host: optional_trimmed_env("PINECONE_INDEX_HOST"),
            control_url,
            api_version: optional_trimmed_env("PINECONE_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            timeout_ms: parse_optional_u64_env("PINECONE_TIMEOUT_MS")?,
        })
    }
}

#[derive(Clone)]
pub struct PineconeStore {
    client: reqwest::Client,
    index_host: Url,
    api_key: String,
    api_version: String,
}

impl PineconeStore {
    /// Builds the store, asking the control plane for the index host when the
    /// config does not name one.
    pub async fn connect(config: PineconeConfig) -> Result<Self, KnowledgeStoreError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder
            .build()
            .map_err(|err| KnowledgeStoreError::RequestFailed(err.to_string()))?;

        let index_host = match config.index_host.as_deref() {
            Some(host) => host.to_string(),
            None => describe_index_host(&client, &config).await?,
        };
        info!(
            index = %config.index_name,
            index_host = %index_host,
            "pinecone index host resolved"
        );

        Self::with_client(client, &index_host, config.api_key, config.api_version)
    }

    pub fn with_client(
        client: reqwest::Client,
        index_host: &str,
        api_key: String,
        api_version: String,
    ) -> Result<Self, KnowledgeStoreError> {
        let index_host = parse_base_url("index host", &normalize_host(index_host))?;

        Ok(Self {
            client,
            index_host,
            api_key,
            api_version,
        })
    }

    fn search_url(&self, namespace: &str) -> Url {
        with_path_segments(&self.index_host, &["records", "namespaces", namespace, "search"])
    }

    async fn search_once(
        &self,
        query: &KnowledgeQuery,
    ) -> Result<Vec<RetrievedRecord>, KnowledgeStoreError> {
        let request_body = json!({
            "query": {
                "inputs": { "text": query.text },
                "top_k": query.top_k,
            }
        });

        let response = self
            .client
            .post(self.search_url(&query.namespace))
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_VERSION_HEADER, &self.api_version)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    KnowledgeStoreError::RequestFailed("timeout".to_string())
                } else {
                    KnowledgeStoreError::RequestFailed("request_unavailable".to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|_| {
            KnowledgeStoreError::InvalidPayload("response_body_read_failed".to_string())
        })?;

        if !status.is_success() {
            return Err(KnowledgeStoreError::Status {
                status: status.as_u16(),
                code: parse_error_code(&body),
            });
        }

        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|_| {
            KnowledgeStoreError::InvalidPayload("response_json_parse_failed".to_string())
        })?;

        Ok(parsed
            .result
            .hits
            .into_iter()
            .map(|hit| RetrievedRecord {
                id: hit.id,
                score: hit.score,
                fields: hit.fields,
            })
            .collect())
    }
}

impl KnowledgeStore for PineconeStore {
    fn search<'a>(&'a self, query: KnowledgeQuery) -> KnowledgeStoreFuture<'a> {
        Box::pin(async move { self.search_once(&query).await })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

async fn describe_index_host(
    client: &reqwest::Client,
    config: &PineconeConfig,
) -> Result<String, KnowledgeStoreError> {
    let url = describe_index_url(&config.control_url, &config.index_name)?;
    let response = client
        .get(url)
        .header(API_KEY_HEADER, &config.api_key)
        .header(API_VERSION_HEADER, &config.api_version)
        .send()
        .await
        .map_err(|err| KnowledgeStoreError::RequestFailed(err.to_string()))?;

    let status = response.status();
    let body = response.text().await.map_err(|_| {
        KnowledgeStoreError::InvalidPayload("response_body_read_failed".to_string())
    })?;
    if !status.is_success() {
        return Err(KnowledgeStoreError::Status {
            status: status.as_u16(),
            code: parse_error_code(&body),
        });
    }

    let parsed: DescribeIndexResponse = serde_json::from_str(&body).map_err(|_| {
        KnowledgeStoreError::InvalidPayload("describe_index_parse_failed".to_string())
    })?;
    let host = parsed.host.trim();
    if host.is_empty() {
        return Err(KnowledgeStoreError::InvalidPayload(
            "describe_index_missing_host".to_string(),
        ));
    }

    Ok(host.to_string())
}

fn describe_index_url(control_url: &str, index_name: &str) -> Result<Url, KnowledgeStoreError> {
    let control_url = parse_base_url("control url", control_url)?;
    Ok(with_path_segments(&control_url, &["indexes", index_name]))
}

fn parse_base_url(label: &str, raw: &str) -> Result<Url, KnowledgeStoreError> {
    let url = Url::parse(raw)
        .map_err(|err| KnowledgeStoreError::InvalidPayload(format!("invalid {label}: {err}")))?;
    if url.cannot_be_a_base() {
        return Err(KnowledgeStoreError::InvalidPayload(format!(
            "invalid {label}: cannot be a base url"
        )));
    }
    Ok(url)
}

/// Appends percent-encoded segments; `/` inside a segment is encoded too.
fn with_path_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

fn normalize_host(host: &str) -> String {
    let trimmed = host.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

fn parse_error_code(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: Option<ErrorDetails>,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        code: Option<Value>,
    }

    let code = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|details| details.code);

    match code {
        Some(Value::String(code)) => code,
        Some(Value::Number(code)) => code.to_string(),
        _ => "unknown".to_string(),
    }
}
