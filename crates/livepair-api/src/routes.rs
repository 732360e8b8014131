//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::live::process_live;
use crate::handlers::video::process_video;
use crate::handlers::{health, unknown_route};
use crate::middleware::{cors_layer, enforce_upload_ceiling, request_id, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/process-live", post(process_live))
        .route("/process-video", post(process_video))
        // Backstop for chunked bodies without a declared length
        .layer(RequestBodyLimitLayer::new(state.config.max_upload_bytes))
        // Declared-length check runs first and returns the JSON envelope
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_upload_ceiling,
        ));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health))
        .fallback(unknown_route)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origin))
        .with_state(state)
}
