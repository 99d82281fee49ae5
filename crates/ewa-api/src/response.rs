//! Gateway response envelope
//!
//! Every invocation produces exactly one [`GatewayResponse`]. The body is
//! always a JSON-encoded string and the CORS header set is the same on
//! every path.
//!
//! Author: hephaex@gmail.com

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";
pub const PREFLIGHT_ALLOW_HEADERS: &str =
    "Content-Type, X-Amz-Date, Authorization, X-Api-Key, X-Amz-Security-Token";
pub const PREFLIGHT_MAX_AGE_SECS: u32 = 86400;

/// Request body accepted by the endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AskRequest {
    /// Customer question
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "How do I book a barber?")]
    pub question: Option<String>,

    /// Alias for `question`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Successful answer body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnswerBody {
    #[schema(example = "Open the Ewa app, choose a service and pick a time slot.")]
    pub answer: String,
}

/// Validation failure body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorBody {
    pub error: String,

    /// The parsed payload, echoed back
    #[schema(value_type = Object)]
    pub received: serde_json::Value,
}

/// Internal failure body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Transport envelope returned for every invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl GatewayResponse {
    fn with_body<T: Serialize>(status_code: u16, body: &T) -> Self {
        let body = serde_json::to_string(body).unwrap_or_else(|e| {
            tracing::error!("Failed to encode response body: {}", e);
            "{}".to_string()
        });

        Self {
            status_code,
            headers: cors_headers(ALLOW_HEADERS),
            body,
        }
    }

    /// 200 with an empty body, cacheable for a day
    pub fn preflight() -> Self {
        let mut headers = cors_headers(PREFLIGHT_ALLOW_HEADERS);
        headers.insert(
            "Access-Control-Max-Age".to_string(),
            PREFLIGHT_MAX_AGE_SECS.to_string(),
        );

        Self {
            status_code: 200,
            headers,
            body: String::new(),
        }
    }

    /// 200 with `{"answer": ...}`
    pub fn answer(answer: impl Into<String>) -> Self {
        Self::with_body(
            200,
            &AnswerBody {
                answer: answer.into(),
            },
        )
    }

    /// 400 with `{"error": ..., "received": ...}`
    pub fn validation_error(error: impl Into<String>, received: serde_json::Value) -> Self {
        Self::with_body(
            400,
            &ValidationErrorBody {
                error: error.into(),
                received,
            },
        )
    }

    /// 500 with `{"error": ...}`
    pub fn internal_error(error: impl Into<String>) -> Self {
        Self::with_body(
            500,
            &ErrorBody {
                error: error.into(),
            },
        )
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

fn cors_headers(allow_headers: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Content-Type".to_string(), "application/json".to_string()),
        (
            "Access-Control-Allow-Origin".to_string(),
            ALLOW_ORIGIN.to_string(),
        ),
        (
            "Access-Control-Allow-Methods".to_string(),
            ALLOW_METHODS.to_string(),
        ),
        (
            "Access-Control-Allow-Headers".to_string(),
            allow_headers.to_string(),
        ),
    ])
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Skipping invalid response header"),
            }
        }

        response
    }
}
