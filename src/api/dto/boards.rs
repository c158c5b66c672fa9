use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Board, ColumnStatus, FilterCondition, MoveOutcome};

#[derive(Debug, Deserialize)]
pub struct ListBoardsQuery {
    #[serde(default)]
    pub doctype: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBoardRequest {
    pub name: String,
    pub reference_doctype: String,
    pub field_name: String,
    #[serde(default)]
    pub filters: Vec<FilterCondition>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub show_labels: bool,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub columns: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuickBoardRequest {
    pub doctype: String,
    pub board_name: String,
    pub field_name: String,
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddColumnRequest {
    pub column_title: String,
}

#[derive(Debug, Deserialize)]
pub struct ColumnStatusRequest {
    pub column_title: String,
    pub status: ColumnStatus,
}

#[derive(Debug, Deserialize)]
pub struct SetIndicatorRequest {
    pub column_name: String,
    pub indicator: String,
}

#[derive(Debug, Deserialize)]
pub struct ReorderColumnsRequest {
    pub order: Vec<String>,
}

/// `fields` arrives either as a list or as a JSON-encoded list.
#[derive(Debug, Deserialize)]
pub struct BoardSettingsRequest {
    pub fields: Value,
    #[serde(default)]
    pub show_labels: bool,
}

#[derive(Debug, Deserialize)]
pub struct MoveCardRequest {
    pub item: String,
    pub from_column: String,
    pub to_column: String,
    pub old_index: usize,
    pub new_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct AddCardRequest {
    pub item: String,
    pub column: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkOrderRequest {
    pub order: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct MoveCardResponse {
    pub outcome: MoveOutcome,
    pub board: Board,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedCard {
    pub name: String,
    pub column: String,
}

#[derive(Debug, Serialize)]
pub struct BulkOrderResponse {
    pub board: Board,
    pub updated_cards: Vec<UpdatedCard>,
}
