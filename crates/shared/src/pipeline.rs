use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::knowledge::{KnowledgeQuery, KnowledgeStore, KnowledgeStoreError, assemble_context};
use crate::llm::{
    APOLOGY_REPLY, LlmGateway, LlmGatewayError, LlmGatewayRequest, build_generation_messages,
    generate_with_telemetry, log_telemetry, validate_reply_json,
};
use crate::models::{KoaReply, Message, Role};

pub const DEFAULT_RETRIEVAL_TOP_K: usize = 5;
pub const DEFAULT_KNOWLEDGE_NAMESPACE: &str = "koa-knowledge";
pub const GENERATION_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub namespace: String,
    pub top_k: usize,
    pub temperature: f32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_KNOWLEDGE_NAMESPACE.to_string(),
            top_k: DEFAULT_RETRIEVAL_TOP_K,
            temperature: GENERATION_TEMPERATURE,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no user message provided")]
    NoUserMessage,
}

#[derive(Debug, Error)]
pub enum UpstreamFailure {
    #[error(transparent)]
    KnowledgeStore(#[from] KnowledgeStoreError),
    #[error(transparent)]
    Generation(#[from] LlmGatewayError),
}

impl UpstreamFailure {
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::KnowledgeStore(_) => "knowledge_store",
            Self::Generation(_) => "generation",
        }
    }
}

#[derive(Debug)]
pub enum FallbackReason {
    UpstreamUnavailable(UpstreamFailure),
    MalformedOutput(String),
}

/// Either the model's reply or the apology reply plus why it was used.
#[derive(Debug)]
pub enum ReplyOutcome {
    Generated(KoaReply),
    Fallback {
        reason: FallbackReason,
        reply: KoaReply,
    },
}

impl ReplyOutcome {
    fn fallback(reason: FallbackReason) -> Self {
        Self::Fallback {
            reason,
            reply: KoaReply::text_only(APOLOGY_REPLY),
        }
    }

    pub fn reply(&self) -> &KoaReply {
        match self {
            Self::Generated(reply) | Self::Fallback { reply, .. } => reply,
        }
    }

    pub fn into_reply(self) -> KoaReply {
        match self {
            Self::Generated(reply) | Self::Fallback { reply, .. } => reply,
        }
    }

    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            Self::Fallback {
                reason: FallbackReason::UpstreamUnavailable(_),
                ..
            }
        )
    }
}

#[derive(Clone)]
pub struct ReplyPipeline {
    store: Arc<dyn KnowledgeStore>,
    gateway: Arc<dyn LlmGateway>,
    settings: PipelineSettings,
}

impl ReplyPipeline {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        gateway: Arc<dyn LlmGateway>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            gateway,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn reply(&self, history: &[Message]) -> Result<ReplyOutcome, PipelineError> {
        let query = latest_user_message(history).ok_or(PipelineError::NoUserMessage)?;

        let records = match self
            .store
            .search(KnowledgeQuery {
                namespace: self.settings.namespace.clone(),
                text: query.content.clone(),
                top_k: self.settings.top_k,
            })
            .await
        {
            Ok(records) => records,
            Err(err) => {
                warn!(
                    error = %err,
                    error_type = err.kind(),
                    namespace = %self.settings.namespace,
                    "knowledge store search failed"
                );
                return Ok(ReplyOutcome::fallback(FallbackReason::UpstreamUnavailable(
                    err.into(),
                )));
            }
        };
        debug!(
            retrieved = records.len(),
            namespace = %self.settings.namespace,
            "knowledge snippets retrieved"
        );

        let context = assemble_context(&records);
        let request = LlmGatewayRequest::json_object(
            build_generation_messages(&context, history),
            self.settings.temperature,
        );

        let (result, telemetry) = generate_with_telemetry(self.gateway.as_ref(), request).await;
        log_telemetry(&telemetry);

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "reply generation failed");
                return Ok(ReplyOutcome::fallback(FallbackReason::UpstreamUnavailable(
                    err.into(),
                )));
            }
        };

        match validate_reply_json(&response.content) {
            Ok(reply) => Ok(ReplyOutcome::Generated(reply)),
            Err(err) => {
                warn!(
                    reason = err.reason(),
                    model = %response.model,
                    "generated reply was malformed: {err}"
                );
                Ok(ReplyOutcome::fallback(FallbackReason::MalformedOutput(
                    err.reason().to_string(),
                )))
            }
        }
    }
}

pub fn latest_user_message(history: &[Message]) -> Option<&Message> {
    history
        .iter()
        .rev()
        .find(|message| message.role == Role::User)
}
