//! API error handling
//!
//! Author: hephaex@gmail.com

use crate::response::GatewayResponse;
use ewa_core::EwaError;

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// No usable question in the payload
    Validation {
        message: String,
        received: serde_json::Value,
    },
    /// Embedding, index, or generation failure
    Upstream(EwaError),
}

impl From<EwaError> for AppError {
    fn from(err: EwaError) -> Self {
        AppError::Upstream(err)
    }
}

impl From<AppError> for GatewayResponse {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation { message, received } => {
                tracing::warn!("Rejected request: {}", message);
                GatewayResponse::validation_error(message, received)
            }
            AppError::Upstream(err) => {
                tracing::error!("Error processing request: {}", err);
                // The message goes back verbatim and may name internal hosts.
                GatewayResponse::internal_error(err.to_string())
            }
        }
    }
}
