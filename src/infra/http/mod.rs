pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Router, middleware as axum_middleware, routing::get};

use middleware::{log_responses, set_request_context};

/// Full application router with request context and response logging.
pub fn build_router(state: ApiState) -> Router {
    build_api_router(state.clone())
        .route("/health", get(health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn health() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
