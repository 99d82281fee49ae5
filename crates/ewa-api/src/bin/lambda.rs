//! Ewa Lambda entry point
//!
//! Receives raw gateway or direct-invocation events and returns the
//! `{statusCode, headers, body}` envelope.
//!
//! Author: hephaex@gmail.com

use ewa_api::{handle_event, telemetry::init_lambda_tracing, AppState, GatewayResponse};
use ewa_core::config::AppConfig;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_lambda_tracing(&config.logging);

    // Clients are built once per cold start and reused across invocations
    let state = Arc::new(AppState::initialize(config).await?);

    run(service_fn(move |event: LambdaEvent<Value>| {
        let state = state.clone();
        async move { Ok::<GatewayResponse, Error>(handle_event(&state, event.payload).await) }
    }))
    .await
}
