use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::api::AppState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SseEvent {
    BoardCreated { board_id: String, name: String },
    BoardUpdated { board_id: String },
    CardMoved { board_id: String, item: String, from_column: String, to_column: String },
    CardAdded { board_id: String, item: String, column: String },
    OrderUpdated { board_id: String, changed: usize },
    KanbanRefresh,
    ListUpdate { doctype: String, name: String, user: String },
}

pub async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.sse_tx.subscribe();
    let stream = BroadcastStream::new(rx);

    let event_stream = stream.filter_map(|result| match result {
        Ok(event_json) => Some(Ok(Event::default().data(event_json))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(event_stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
