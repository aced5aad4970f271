use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::models::ChatRequest;
use shared::pipeline::{FallbackReason, PipelineError, ReplyOutcome};
use tracing::{error, warn};

use super::AppState;
use super::errors::{bad_request_response, upstream_failure_response};
use super::observability::{ChatOutcome, ChatSummary};

const NO_USER_MESSAGE_ERROR: &str = "No user message provided";
const INVALID_BODY_ERROR: &str = "Request body must be JSON of the form {\"messages\": [...]}";

pub(super) async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("rejected chat request body: {rejection}");
            return summarized(
                bad_request_response(INVALID_BODY_ERROR),
                ChatOutcome::InvalidBody,
                0,
            );
        }
    };

    let message_count = request.messages.len();
    match state.pipeline.reply(&request.messages).await {
        Ok(outcome) => outcome_response(outcome, message_count),
        Err(PipelineError::NoUserMessage) => summarized(
            bad_request_response(NO_USER_MESSAGE_ERROR),
            ChatOutcome::NoUserMessage,
            message_count,
        ),
    }
}

fn outcome_response(outcome: ReplyOutcome, message_count: usize) -> Response {
    match outcome {
        ReplyOutcome::Generated(reply) => summarized(
            (StatusCode::OK, Json(reply)).into_response(),
            ChatOutcome::Generated,
            message_count,
        ),
        ReplyOutcome::Fallback {
            reason: FallbackReason::MalformedOutput(reason),
            reply,
        } => {
            warn!(reason = %reason, "generation output was malformed, sending apology");
            summarized(
                (StatusCode::OK, Json(reply)).into_response(),
                ChatOutcome::MalformedOutput,
                message_count,
            )
        }
        ReplyOutcome::Fallback {
            reason: FallbackReason::UpstreamUnavailable(failure),
            reply,
        } => {
            error!(stage = failure.stage(), "chat reply failed upstream: {failure}");
            summarized(
                upstream_failure_response(reply),
                ChatOutcome::UpstreamUnavailable,
                message_count,
            )
        }
    }
}

fn summarized(mut response: Response, outcome: ChatOutcome, message_count: usize) -> Response {
    response.extensions_mut().insert(ChatSummary {
        outcome,
        message_count,
    });
    response
}
