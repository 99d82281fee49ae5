//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::handlers::{health, invoke};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create the support and health routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            post(invoke::ask_handler).options(invoke::preflight_handler),
        )
        .route("/health", get(health::health_check))
}
