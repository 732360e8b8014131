//! HTTP handlers.

pub mod forms;
pub mod live;
pub mod video;

use std::path::Path;

use axum::body::Body;
use axum::http::header;
use axum::response::Response;
use axum::Json;
use tokio_util::io::ReaderStream;

use crate::error::{ApiError, ApiResult};

/// Health check endpoint.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Fallback for unknown routes.
pub async fn unknown_route() -> ApiError {
    ApiError::NotFound
}

/// Stream a finished deliverable as a download attachment.
pub(crate) async fn attachment_response(
    path: &Path,
    content_type: &str,
    filename: &str,
) -> ApiResult<Response> {
    let len = tokio::fs::metadata(path).await?.len();
    let file = tokio::fs::File::open(path).await?;
    let stream = ReaderStream::new(file);

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, len)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::internal(e.to_string()))
}
