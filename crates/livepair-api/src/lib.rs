//! Axum HTTP API for Live Photo pairing.
//!
//! This crate provides:
//! - Multipart upload handling for the pairing and video-only endpoints
//! - The Remux -> Inject -> Package request pipelines
//! - Request-scoped scratch storage with delayed cleanup

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod scratch;
pub mod state;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
