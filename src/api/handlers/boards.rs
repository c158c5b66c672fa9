use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use crate::api::dto::{
    AddColumnRequest, BoardSettingsRequest, ColumnStatusRequest, CreateBoardRequest,
    ListBoardsQuery, QuickBoardRequest, ReorderColumnsRequest, SetIndicatorRequest,
};
use crate::api::handlers::sse::SseEvent;
use crate::api::state::AppState;
use crate::domain::{Actor, Board, BoardSummary, Column, KanbanError};
use crate::services::RealtimeService;

pub async fn list_boards(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListBoardsQuery>,
) -> Result<Json<Vec<BoardSummary>>, KanbanError> {
    let boards = state
        .board_service()?
        .list_boards(&actor, query.doctype.as_deref())
        .await?;
    Ok(Json(boards))
}

pub async fn create_board(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateBoardRequest>,
) -> Result<(StatusCode, Json<Board>), KanbanError> {
    let board = state.board_service()?.create_board(&actor, req).await?;
    notify_created(&state, &board);
    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn quick_board(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<QuickBoardRequest>,
) -> Result<(StatusCode, Json<Board>), KanbanError> {
    let board = state.board_service()?.quick_board(&actor, req).await?;
    notify_created(&state, &board);
    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn get_board(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Board>, KanbanError> {
    let board = state.board_service()?.get_board(&actor, &id).await?;
    Ok(Json(board))
}

pub async fn add_column(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<AddColumnRequest>,
) -> Result<(StatusCode, Json<Vec<Column>>), KanbanError> {
    let columns = state
        .board_service()?
        .add_column(&actor, &id, &req.column_title)
        .await?;
    notify_updated(&state, &id);
    Ok((StatusCode::CREATED, Json(columns)))
}

pub async fn archive_restore_column(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<ColumnStatusRequest>,
) -> Result<Json<Vec<Column>>, KanbanError> {
    let columns = state
        .board_service()?
        .archive_restore_column(&actor, &id, &req.column_title, req.status)
        .await?;
    notify_updated(&state, &id);
    Ok(Json(columns))
}

pub async fn set_indicator(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<SetIndicatorRequest>,
) -> Result<Json<Board>, KanbanError> {
    let board = state
        .board_service()?
        .set_indicator(&actor, &id, &req.column_name, &req.indicator)
        .await?;
    notify_updated(&state, &id);
    Ok(Json(board))
}

pub async fn reorder_columns(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<ReorderColumnsRequest>,
) -> Result<Json<Board>, KanbanError> {
    let board = state
        .board_service()?
        .reorder_columns(&actor, &id, &req.order)
        .await?;
    notify_updated(&state, &id);
    Ok(Json(board))
}

pub async fn save_settings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<BoardSettingsRequest>,
) -> Result<Json<Board>, KanbanError> {
    let board = state
        .board_service()?
        .save_settings(&actor, &id, req)
        .await?;
    notify_updated(&state, &id);
    Ok(Json(board))
}

fn notify_created(state: &AppState, board: &Board) {
    RealtimeService::publish(
        &state.sse_tx,
        &SseEvent::BoardCreated {
            board_id: board.id.clone(),
            name: board.name.clone(),
        },
    );
}

fn notify_updated(state: &AppState, board_id: &str) {
    RealtimeService::publish(
        &state.sse_tx,
        &SseEvent::BoardUpdated {
            board_id: board_id.to_string(),
        },
    );
}
