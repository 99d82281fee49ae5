//! Ewa API - support assistant front end
//!
//! One handler, [`handle_event`], serves every entry point: the axum
//! server, the Lambda runtime and the CLI.
//!
//! Author: hephaex@gmail.com

pub mod error;
pub mod event;
pub mod handler;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;
pub mod telemetry;

#[cfg(feature = "test-utils")]
pub mod testing;

pub use error::AppError;
pub use event::{InboundEvent, Payload, SupportRequest, MISSING_QUESTION};
pub use handler::handle_event;
pub use response::GatewayResponse;
pub use state::AppState;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI document
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ewa Support API",
        description = "Answers customer questions about Ewa, an on-demand barbing service platform"
    ),
    paths(
        handlers::invoke::ask_handler,
        handlers::invoke::preflight_handler,
        handlers::health::health_check,
    ),
    components(schemas(
        response::AskRequest,
        response::AnswerBody,
        response::ValidationErrorBody,
        response::ErrorBody,
        handlers::health::HealthResponse,
    )),
    tags(
        (name = "support", description = "Support question answering"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// Build the HTTP router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}
