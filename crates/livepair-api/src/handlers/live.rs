//! Live Photo pairing endpoint.

use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::response::Response;
use tracing::info;

use crate::error::ApiResult;
use crate::handlers::{attachment_response, forms};
use crate::pipeline;
use crate::scratch::{remove_now, Workspace};
use crate::state::AppState;

/// POST /api/process-live
///
/// Takes a still image, a video and the identity fields, writes the same
/// pairing identifier into both files, and returns them as one ZIP bundle.
pub async fn process_live(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let ws = Workspace::new(&state.config.upload_dir);

    let form = match forms::collect_live(&mut multipart, &ws).await {
        Ok(form) => form,
        Err(e) => {
            // Rejected before processing: leave no trace in scratch storage
            remove_now(&ws.tracked());
            return Err(e);
        }
    };

    info!(
        "process-live | make={} model={} asset_id={}",
        form.identity.make, form.identity.model, form.pairing
    );

    match pipeline::run_live(&state, &ws, &form).await {
        Ok(outcome) => {
            // Intermediates go now; the bundle survives the retention window
            state
                .janitor
                .schedule(ws.tracked_except(&outcome.bundle), Duration::ZERO);
            state
                .janitor
                .schedule(vec![outcome.bundle.clone()], state.config.retention);
            attachment_response(&outcome.bundle, "application/zip", &outcome.download_name).await
        }
        Err(e) => {
            state.janitor.schedule(ws.tracked(), Duration::ZERO);
            Err(e)
        }
    }
}
