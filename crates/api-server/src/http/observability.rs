use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{Instrument, Span, info, info_span, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;

/// How a chat request ended. The chat handler attaches it to its response so
/// the request log line can carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    Generated,
    MalformedOutput,
    UpstreamUnavailable,
    NoUserMessage,
    InvalidBody,
}

impl ChatOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::MalformedOutput => "malformed_output",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::NoUserMessage => "no_user_message",
            Self::InvalidBody => "invalid_body",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatSummary {
    pub outcome: ChatOutcome,
    pub message_count: usize,
}

/// Tags every request with an `x-request-id` (taken from the caller when it is
/// well formed) and runs the handler inside a span carrying it, so handler
/// logs share the id. Emits one completion line per request.
pub(super) async fn request_span_middleware(req: Request, next: Next) -> Response {
    let request_id = caller_request_id(&req).unwrap_or_else(|| Uuid::new_v4().to_string());
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let span = info_span!(
        "koa_request",
        request_id = %request_id,
        method = %req.method(),
        route = %route,
    );

    let started_at = Instant::now();
    let mut response = next.run(req).instrument(span.clone()).await;
    let latency_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    let summary = response.extensions().get::<ChatSummary>().copied();
    log_completion(&span, response.status().as_u16(), latency_ms, summary);
    response
}

fn log_completion(span: &Span, status: u16, latency_ms: u64, summary: Option<ChatSummary>) {
    let _entered = span.enter();
    let outcome = summary.map_or("none", |summary| summary.outcome.as_str());
    let message_count = summary.map_or(0, |summary| summary.message_count);

    if status >= 500 {
        warn!(
            status,
            latency_ms,
            outcome,
            message_count,
            metric_name = "koa_http_request",
            "request finished with server error"
        );
    } else {
        info!(
            status,
            latency_ms,
            outcome,
            message_count,
            metric_name = "koa_http_request",
            "request finished"
        );
    }
}

fn caller_request_id(req: &Request) -> Option<String> {
    let raw = req.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    let well_formed = !raw.is_empty()
        && raw.len() <= MAX_REQUEST_ID_LEN
        && raw
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.'));
    well_formed.then(|| raw.to_string())
}
