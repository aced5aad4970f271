use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Message;

pub type LlmGatewayFuture<'a> =
    Pin<Box<dyn Future<Output = Result<LlmGatewayResponse, LlmGatewayError>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq)]
pub struct LlmGatewayRequest {
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub json_output: bool,
}

impl LlmGatewayRequest {
    pub fn json_object(messages: Vec<Message>, temperature: f32) -> Self {
        Self {
            messages,
            temperature,
            json_output: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmTokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A single completion. `content` is the raw text the provider produced and
/// may not be valid JSON even when `json_output` was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmGatewayResponse {
    pub model: String,
    pub provider_request_id: Option<String>,
    pub content: String,
    pub usage: Option<LlmTokenUsage>,
}

#[derive(Debug, Error)]
pub enum LlmGatewayError {
    #[error("llm provider request timed out")]
    Timeout,
    #[error("llm provider request failed: {0}")]
    ProviderFailure(String),
    #[error("llm provider returned an invalid payload: {0}")]
    InvalidProviderPayload(String),
}

impl LlmGatewayError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ProviderFailure(_) => "provider_failure",
            Self::InvalidProviderPayload(_) => "invalid_provider_payload",
        }
    }
}

pub trait LlmGateway: Send + Sync {
    fn generate<'a>(&'a self, request: LlmGatewayRequest) -> LlmGatewayFuture<'a>;
}
