//! Video-only metadata rewrite endpoint.

use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::response::Response;
use tracing::info;

use crate::error::ApiResult;
use crate::handlers::{attachment_response, forms};
use crate::pipeline;
use crate::scratch::{remove_now, Workspace};
use crate::state::AppState;

/// POST /api/process-video
///
/// Remuxes the upload into MOV and rewrites its identity metadata across
/// every namespace, without any pairing identifier.
pub async fn process_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let ws = Workspace::new(&state.config.upload_dir);

    let form = match forms::collect_video(&mut multipart, &ws).await {
        Ok(form) => form,
        Err(e) => {
            remove_now(&ws.tracked());
            return Err(e);
        }
    };

    info!(
        "process-video | make={} model={}",
        form.identity.make, form.identity.model
    );

    match pipeline::run_video(&state, &ws, &form).await {
        Ok(outcome) => {
            state
                .janitor
                .schedule(ws.tracked_except(&outcome.output), Duration::ZERO);
            state
                .janitor
                .schedule(vec![outcome.output.clone()], state.config.retention);
            attachment_response(&outcome.output, "video/quicktime", &outcome.download_name).await
        }
        Err(e) => {
            state.janitor.schedule(ws.tracked(), Duration::ZERO);
            Err(e)
        }
    }
}
