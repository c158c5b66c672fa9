use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::api::dto::RewriteFiltersRequest;
use crate::api::state::AppState;
use crate::domain::{Actor, KanbanError, SettingsData};

pub async fn get_user_settings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(doctype): Path<String>,
) -> Result<Json<SettingsData>, KanbanError> {
    let settings = state.settings_service()?.get(&actor, &doctype).await?;
    Ok(Json(settings))
}

pub async fn save_user_settings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(doctype): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<SettingsData>, KanbanError> {
    let settings = state
        .settings_service()?
        .save(&actor, &doctype, payload)
        .await?;
    Ok(Json(settings))
}

pub async fn sync_user_settings(
    State(state): State<AppState>,
    Extension(_actor): Extension<Actor>,
) -> Result<Json<Value>, KanbanError> {
    let synced = state.settings_service()?.sync_all().await?;
    Ok(Json(json!({ "synced": synced })))
}

pub async fn rewrite_filters(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<RewriteFiltersRequest>,
) -> Result<Json<Value>, KanbanError> {
    if !actor.is_administrator() {
        return Err(KanbanError::Forbidden(
            "Only Administrator can rewrite saved filters".into(),
        ));
    }

    let changed = state
        .settings_service()?
        .rewrite_filter_values(req.slot, &req.old, &req.new, req.condition.as_ref())
        .await?;
    Ok(Json(json!({ "changed": changed })))
}
