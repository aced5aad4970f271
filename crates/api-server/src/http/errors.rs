use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::models::{ErrorResponse, KoaReply};

pub(super) fn bad_request_response(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub(super) fn upstream_failure_response(reply: KoaReply) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(reply)).into_response()
}
