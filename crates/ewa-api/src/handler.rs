//! Top-level event handler
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::event::{InboundEvent, SupportRequest};
use crate::response::GatewayResponse;
use crate::state::AppState;
use serde_json::Value;

/// Handle one invocation and produce its envelope
///
/// Preflight returns before any payload work. Everything after that runs
/// through [`process`], whose error is mapped to a status code in one place.
pub async fn handle_event(state: &AppState, event: Value) -> GatewayResponse {
    tracing::info!("EVENT RECEIVED: {}", event);

    match InboundEvent::classify(event) {
        InboundEvent::Preflight => GatewayResponse::preflight(),
        event => match process(state, event).await {
            Ok(answer) => GatewayResponse::answer(answer),
            Err(err) => err.into(),
        },
    }
}

async fn process(state: &AppState, event: InboundEvent) -> Result<String, AppError> {
    let request = SupportRequest::try_from(event.into_payload())?;
    let answer = state.pipeline.answer(&request.question).await?;
    Ok(answer)
}
