use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::error::KanbanError;
use super::filter::FilterCondition;

pub const DEFAULT_INDICATOR: &str = "Gray";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnStatus {
    #[default]
    Active,
    Archived,
}

impl ColumnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnStatus::Active => "active",
            ColumnStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ColumnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" | "Active" => Ok(ColumnStatus::Active),
            "archived" | "Archived" => Ok(ColumnStatus::Archived),
            _ => Err(format!("Invalid column status: {}", s)),
        }
    }
}

/// A named bucket within a board. `order` is the authoritative position of
/// every entity currently grouped into this column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub status: ColumnStatus,
    #[serde(default = "default_indicator")]
    pub indicator: String,
    #[serde(default)]
    pub order: Vec<String>,
}

fn default_indicator() -> String {
    DEFAULT_INDICATOR.into()
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ColumnStatus::Active,
            indicator: default_indicator(),
            order: Vec::new(),
        }
    }

    pub fn with_order(mut self, order: Vec<String>) -> Self {
        self.order = order;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    pub reference_doctype: String,
    pub field_name: String,
    pub filters: Vec<FilterCondition>,
    pub private: bool,
    pub show_labels: bool,
    pub fields: Vec<String>,
    pub owner: String,
    pub columns: Vec<Column>,
    pub created_at: String,
    pub updated_at: String,
}

impl Board {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Checked before every save: names are non-empty and unique (exact match).
    pub fn validate(&self) -> Result<(), KanbanError> {
        if self.name.trim().is_empty() {
            return Err(KanbanError::Validation("Board name cannot be empty".into()));
        }
        if self.field_name.trim().is_empty() {
            return Err(KanbanError::Validation("Field name cannot be empty".into()));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.is_empty() {
                return Err(KanbanError::Validation("Column Name cannot be empty".into()));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(KanbanError::Validation(format!(
                    "Column {} already exists",
                    column.name
                )));
            }
        }

        Ok(())
    }

    pub fn from_rows(row: BoardRow, columns: Vec<ColumnRow>) -> Result<Self, KanbanError> {
        let filters = match row.filters.as_deref() {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw)?,
            _ => Vec::new(),
        };
        let fields = serde_json::from_str(&row.fields).unwrap_or_default();
        let columns = columns
            .into_iter()
            .map(Column::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: row.id,
            name: row.name,
            reference_doctype: row.reference_doctype,
            field_name: row.field_name,
            filters,
            private: row.private,
            show_labels: row.show_labels,
            fields,
            owner: row.owner,
            columns,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: String,
    pub name: String,
    pub reference_doctype: String,
    pub filters: Vec<FilterCondition>,
    pub private: bool,
}

impl From<&Board> for BoardSummary {
    fn from(board: &Board) -> Self {
        Self {
            id: board.id.clone(),
            name: board.name.clone(),
            reference_doctype: board.reference_doctype.clone(),
            filters: board.filters.clone(),
            private: board.private,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BoardRow {
    pub id: String,
    pub name: String,
    pub reference_doctype: String,
    pub field_name: String,
    pub filters: Option<String>,
    pub private: bool,
    pub show_labels: bool,
    pub fields: String,
    pub owner: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ColumnRow {
    pub board_id: String,
    pub idx: i64,
    pub column_name: String,
    pub status: String,
    pub indicator: String,
    pub item_order: String,
}

impl TryFrom<ColumnRow> for Column {
    type Error = KanbanError;

    fn try_from(row: ColumnRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(KanbanError::Internal)?;
        let order = if row.item_order.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&row.item_order)?
        };

        Ok(Self {
            name: row.column_name,
            status,
            indicator: row.indicator,
            order,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditNote {
    pub id: String,
    pub reference_doctype: String,
    pub reference_name: String,
    pub content: String,
    pub comment_by: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(columns: Vec<Column>) -> Board {
        Board {
            id: "b1".into(),
            name: "Tasks".into(),
            reference_doctype: "Task".into(),
            field_name: "status".into(),
            filters: vec![],
            private: false,
            show_labels: false,
            fields: vec![],
            owner: "alice".into(),
            columns,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn validate_rejects_empty_column_name() {
        let err = board(vec![Column::new("Open"), Column::new("")])
            .validate()
            .unwrap_err();
        assert!(matches!(err, KanbanError::Validation(msg) if msg == "Column Name cannot be empty"));
    }

    #[test]
    fn validate_rejects_duplicate_column_name() {
        let err = board(vec![Column::new("Open"), Column::new("Open")])
            .validate()
            .unwrap_err();
        assert!(matches!(err, KanbanError::Validation(_)));
    }

    #[test]
    fn column_names_are_case_sensitive() {
        assert!(board(vec![Column::new("Open"), Column::new("open")])
            .validate()
            .is_ok());
    }

    #[test]
    fn column_status_parses_both_spellings() {
        assert_eq!("Archived".parse::<ColumnStatus>(), Ok(ColumnStatus::Archived));
        assert_eq!("active".parse::<ColumnStatus>(), Ok(ColumnStatus::Active));
        assert!("closed".parse::<ColumnStatus>().is_err());
    }

    #[test]
    fn column_row_decodes_order_list() {
        let row = ColumnRow {
            board_id: "b1".into(),
            idx: 0,
            column_name: "Open".into(),
            status: "archived".into(),
            indicator: "Red".into(),
            item_order: r#"["A","B"]"#.into(),
        };
        let column = Column::try_from(row).unwrap();
        assert_eq!(column.order, vec!["A", "B"]);
        assert_eq!(column.status, ColumnStatus::Archived);
    }
}
