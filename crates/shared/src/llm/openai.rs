use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};

use super::gateway::{
    LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmGatewayRequest, LlmGatewayResponse,
    LlmTokenUsage,
};
use crate::config::ConfigError;
use crate::config_env::{
    ensure_http_url, optional_trimmed_env, parse_optional_u64_env, require_env,
};

const DEFAULT_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct OpenAiGatewayConfig {
    pub chat_completions_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_ms: Option<u64>,
}

impl OpenAiGatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = require_env("OPENAI_API_KEY")?;
        let chat_completions_url = optional_trimmed_env("OPENAI_CHAT_COMPLETIONS_URL")
            .unwrap_or_else(|| DEFAULT_CHAT_COMPLETIONS_URL.to_string());
        ensure_http_url("OPENAI_CHAT_COMPLETIONS_URL", &chat_completions_url)?;

        Ok(Self {
            chat_completions_url,
            api_key,
            model: optional_trimmed_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout_ms: parse_optional_u64_env("OPENAI_TIMEOUT_MS")?,
        })
    }
}

#[derive(Clone)]
pub struct OpenAiGateway {
    client: reqwest::Client,
    config: OpenAiGatewayConfig,
}

impl OpenAiGateway {
    pub fn new(config: OpenAiGatewayConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder.build().map_err(|err| {
            ConfigError::InvalidConfiguration(format!("failed to build OpenAI http client: {err}"))
        })?;

        Ok(Self { client, config })
    }

    async fn send_once(
        &self,
        request: &LlmGatewayRequest,
    ) -> Result<LlmGatewayResponse, LlmGatewayError> {
        let mut request_body = json!({
            "model": self.config.model,
            "messages": request.messages,
            "temperature": request.temperature,
        });
        if request.json_output
            && let Value::Object(entries) = &mut request_body
        {
            entries.insert(
                "response_format".to_string(),
                json!({ "type": "json_object" }),
            );
        }

        let response = self
            .client
            .post(&self.config.chat_completions_url)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    LlmGatewayError::Timeout
                } else {
                    LlmGatewayError::ProviderFailure("request_unavailable".to_string())
                }
            })?;

        let status = response.status();
        let header_request_id = header_request_id(response.headers());
        let body = response.text().await.map_err(|_| {
            LlmGatewayError::InvalidProviderPayload("response_body_read_failed".to_string())
        })?;

        if !status.is_success() {
            let provider_code = parse_provider_error_code(&body);
            return Err(LlmGatewayError::ProviderFailure(format!(
                "status={} code={provider_code}",
                status.as_u16()
            )));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|_| {
            LlmGatewayError::InvalidProviderPayload("response_json_parse_failed".to_string())
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmGatewayError::InvalidProviderPayload("missing_choice".to_string()))?
            .message
            .content
            .ok_or_else(|| {
                LlmGatewayError::InvalidProviderPayload("missing_content".to_string())
            })?;

        Ok(LlmGatewayResponse {
            model: parsed.model.unwrap_or_else(|| self.config.model.clone()),
            provider_request_id: header_request_id.or(parsed.id),
            content,
            usage: parsed.usage.map(|usage| LlmTokenUsage {
                prompt_tokens: clamp_u64_to_u32(usage.prompt_tokens.unwrap_or(0)),
                completion_tokens: clamp_u64_to_u32(usage.completion_tokens.unwrap_or(0)),
                total_tokens: clamp_u64_to_u32(usage.total_tokens.unwrap_or(0)),
            }),
        })
    }
}

impl LlmGateway for OpenAiGateway {
    fn generate<'a>(&'a self, request: LlmGatewayRequest) -> LlmGatewayFuture<'a> {
        Box::pin(async move { self.send_once(&request).await })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    id: Option<String>,
    model: Option<String>,
    choices: Vec<ChatCompletionChoice>,
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

fn header_request_id(headers: &reqwest::header::HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

fn parse_provider_error_code(body: &str) -> String {
    #[derive(Deserialize)]
    struct ProviderErrorEnvelope {
        error: Option<ProviderErrorDetails>,
    }

    #[derive(Deserialize)]
    struct ProviderErrorDetails {
        code: Option<Value>,
        #[serde(rename = "type")]
        kind: Option<String>,
    }

    let Some(details) = serde_json::from_str::<ProviderErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
    else {
        return "unknown".to_string();
    };

    match details.code {
        Some(Value::String(code)) => code,
        Some(Value::Number(code)) => code.to_string(),
        _ => details.kind.unwrap_or_else(|| "unknown".to_string()),
    }
}

fn clamp_u64_to_u32(value: u64) -> u32 {
    value.min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::parse_provider_error_code;

    #[test]
    fn provider_error_code_prefers_code_then_type() {
        assert_eq!(
            parse_provider_error_code(r#"{"error":{"code":"invalid_api_key","type":"auth"}}"#),
            "invalid_api_key"
        );
        assert_eq!(
            parse_provider_error_code(r#"{"error":{"code":null,"type":"server_error"}}"#),
            "server_error"
        );
        assert_eq!(parse_provider_error_code(r#"{"error":{"code":429}}"#), "429");
        assert_eq!(parse_provider_error_code("<html>bad gateway</html>"), "unknown");
    }
}
