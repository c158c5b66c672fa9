use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::api::dto::{
    AddCardRequest, BulkOrderRequest, BulkOrderResponse, MoveCardRequest, MoveCardResponse,
};
use crate::api::handlers::sse::SseEvent;
use crate::api::AppState;
use crate::domain::{Actor, Board, KanbanError};
use crate::services::RealtimeService;

pub async fn move_card(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<MoveCardRequest>,
) -> Result<Json<MoveCardResponse>, KanbanError> {
    let event = SseEvent::CardMoved {
        board_id: id.clone(),
        item: req.item.clone(),
        from_column: req.from_column.clone(),
        to_column: req.to_column.clone(),
    };

    let response = state.board_service()?.move_card(&actor, &id, req).await?;

    if response.outcome.is_moved() {
        RealtimeService::publish(&state.sse_tx, &event);
    }

    Ok(Json(response))
}

pub async fn add_card(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<AddCardRequest>,
) -> Result<Json<Board>, KanbanError> {
    let board = state
        .board_service()?
        .add_card(&actor, &id, &req.item, &req.column)
        .await?;

    RealtimeService::publish(
        &state.sse_tx,
        &SseEvent::CardAdded {
            board_id: id,
            item: req.item,
            column: req.column,
        },
    );

    Ok(Json(board))
}

pub async fn bulk_set_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<BulkOrderRequest>,
) -> Result<Json<BulkOrderResponse>, KanbanError> {
    let response = state
        .board_service()?
        .bulk_set_order(&actor, &id, req)
        .await?;

    RealtimeService::publish(
        &state.sse_tx,
        &SseEvent::OrderUpdated {
            board_id: id,
            changed: response.updated_cards.len(),
        },
    );

    Ok(Json(response))
}
