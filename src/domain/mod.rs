pub mod actor;
pub mod board;
pub mod error;
pub mod filter;
pub mod reorder;
pub mod settings;

pub use actor::{Actor, ADMINISTRATOR};
pub use board::{AuditNote, Board, BoardSummary, Column, ColumnStatus};
pub use error::KanbanError;
pub use filter::{FilterCondition, FilterOperator};
pub use reorder::MoveOutcome;
pub use settings::{SettingsData, SettingsKey};
