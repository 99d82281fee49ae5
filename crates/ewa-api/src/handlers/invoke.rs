//! Support endpoint
//!
//! Wraps a plain HTTP request in the same event shape an API gateway
//! delivers, so the server and the Lambda entry point share one handler.
//!
//! Author: hephaex@gmail.com

use crate::handler::handle_event;
use crate::response::{AnswerBody, AskRequest, ErrorBody, GatewayResponse, ValidationErrorBody};
use crate::state::AppState;
use axum::{body::Bytes, extract::State, http::Method};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::sync::Arc;

/// Build a gateway-style event from an HTTP method and raw body
///
/// Invalid UTF-8 is replaced with U+FFFD before normalization.
pub fn http_event(method: &Method, body: &[u8]) -> Value {
    let text = String::from_utf8_lossy(body);
    if let Cow::Owned(_) = text {
        tracing::debug!(
            bytes = body.len(),
            "Request body is not valid UTF-8; invalid sequences replaced"
        );
    }

    json!({
        "requestContext": { "http": { "method": method.as_str() } },
        "body": text,
    })
}

/// Ask the support assistant a question
#[utoipa::path(
    post,
    path = "/",
    tag = "support",
    request_body = AskRequest,
    responses(
        (status = 200, description = "Answer generated", body = AnswerBody),
        (status = 400, description = "No question in the request", body = ValidationErrorBody),
        (status = 500, description = "Embedding, index or LLM failure", body = ErrorBody)
    )
)]
pub async fn ask_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Bytes,
) -> GatewayResponse {
    handle_event(&state, http_event(&method, &body)).await
}

/// CORS preflight
#[utoipa::path(
    options,
    path = "/",
    tag = "support",
    responses(
        (status = 200, description = "Preflight accepted")
    )
)]
pub async fn preflight_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
) -> GatewayResponse {
    handle_event(&state, http_event(&method, &[])).await
}
