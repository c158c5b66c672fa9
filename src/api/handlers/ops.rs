use axum::{extract::State, Extension, Json};

use crate::api::dto::RefreshRequest;
use crate::api::state::AppState;
use crate::domain::{Actor, KanbanError};
use crate::services::RealtimeService;

pub async fn kanban_refresh(
    State(state): State<AppState>,
    Extension(_actor): Extension<Actor>,
    Json(req): Json<RefreshRequest>,
) -> Json<String> {
    let ack = RealtimeService::kanban_refresh(
        &state.sse_tx,
        state.config.refresh_delay(),
        &req.doctype,
        &req.name,
        &state.config.refresh_notify_user,
    )
    .await;
    Json(ack.to_string())
}

pub async fn freeze_queue_position(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<String>, KanbanError> {
    tracing::info!(user = actor.user.as_str(), "Forwarding queue freeze request");
    let body =
        RealtimeService::freeze_queue_position(&state.http_client, &state.config.queue_service_url)
            .await?;
    Ok(Json(body))
}
