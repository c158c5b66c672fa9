use chrono::Utc;
use serde_json::Value;
use sqlx::{Sqlite, SqliteExecutor, SqlitePool, Transaction};
use uuid::Uuid;

use crate::api::dto::{
    BoardSettingsRequest, BulkOrderRequest, BulkOrderResponse, CreateBoardRequest,
    MoveCardRequest, MoveCardResponse, QuickBoardRequest, UpdatedCard,
};
use crate::domain::board::{BoardRow, ColumnRow};
use crate::domain::reorder;
use crate::domain::{
    Actor, Board, BoardSummary, Column, ColumnStatus, FilterCondition, KanbanError, MoveOutcome,
};
use crate::infrastructure::SettingsCache;
use crate::services::{AuditService, EntityStore, PermissionService, SettingsService};

/// Doctypes whose quick boards are private to their creator.
const PRIVATE_DOCTYPES: [&str; 2] = ["Note", "ToDo"];

/// Boards over this doctype keep every column sorted by the global queue.
const QUEUE_RANKED_DOCTYPE: &str = "Project";

pub struct BoardService {
    pool: SqlitePool,
    settings: SettingsService,
}

impl BoardService {
    pub fn new(pool: SqlitePool, cache: SettingsCache) -> Self {
        Self {
            settings: SettingsService::new(pool.clone(), cache),
            pool,
        }
    }

    // ── Loading ────────────────────────────────────────────────

    pub async fn load_board(&self, id: &str) -> Result<Board, KanbanError> {
        let row: BoardRow = sqlx::query_as("SELECT * FROM boards WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| KanbanError::NotFound(format!("Board not found: {}", id)))?;

        let columns: Vec<ColumnRow> =
            sqlx::query_as("SELECT * FROM board_columns WHERE board_id = ? ORDER BY idx ASC")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;

        Board::from_rows(row, columns)
    }

    pub async fn get_board(&self, actor: &Actor, id: &str) -> Result<Board, KanbanError> {
        let board = self.load_board(id).await?;
        if !PermissionService::can_access_board(actor, &board) {
            return Err(KanbanError::Forbidden(format!(
                "No permission to access board {}",
                board.name
            )));
        }
        Ok(board)
    }

    pub async fn list_boards(
        &self,
        actor: &Actor,
        doctype: Option<&str>,
    ) -> Result<Vec<BoardSummary>, KanbanError> {
        let rows: Vec<BoardRow> = sqlx::query_as(
            "SELECT * FROM boards
             WHERE (?1 IS NULL OR reference_doctype = ?1)
               AND (private = 0 OR owner = ?2 OR ?3)
             ORDER BY name ASC",
        )
        .bind(doctype)
        .bind(&actor.user)
        .bind(actor.is_administrator())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Board::from_rows(row, Vec::new()).map(|board| BoardSummary::from(&board)))
            .collect()
    }

    // ── Creation ───────────────────────────────────────────────

    pub async fn create_board(
        &self,
        actor: &Actor,
        req: CreateBoardRequest,
    ) -> Result<Board, KanbanError> {
        let now = Utc::now().to_rfc3339();
        let mut board = Board {
            id: Uuid::new_v4().to_string(),
            name: req.name,
            reference_doctype: req.reference_doctype,
            field_name: req.field_name,
            filters: req.filters,
            private: req.private,
            show_labels: req.show_labels,
            fields: req.fields,
            owner: actor.user.clone(),
            columns: req.columns.into_iter().map(Column::new).collect(),
            created_at: now.clone(),
            updated_at: now,
        };
        board.validate()?;

        for i in 0..board.columns.len() {
            let order = Self::initial_column_order(&self.pool, &board, &board.columns[i].name).await?;
            board.columns[i].order = order;
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO boards (id, name, reference_doctype, field_name, filters, private, show_labels, fields, owner, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&board.id)
        .bind(&board.name)
        .bind(&board.reference_doctype)
        .bind(&board.field_name)
        .bind(encode_filters(&board.filters)?)
        .bind(board.private)
        .bind(board.show_labels)
        .bind(serde_json::to_string(&board.fields)?)
        .bind(&board.owner)
        .bind(&board.created_at)
        .bind(&board.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                KanbanError::Conflict(format!("Board {} already exists", board.name))
            }
            other => KanbanError::Database(other),
        })?;
        Self::write_columns(&mut tx, &board).await?;
        tx.commit().await?;

        self.settings.invalidate_all().await;

        tracing::info!(
            board_id = board.id.as_str(),
            board = board.name.as_str(),
            doctype = board.reference_doctype.as_str(),
            columns = board.columns.len(),
            "Board created"
        );

        Ok(board)
    }

    /// Creates a board whose columns are the declared options of `field_name`.
    pub async fn quick_board(
        &self,
        actor: &Actor,
        req: QuickBoardRequest,
    ) -> Result<Board, KanbanError> {
        let options = EntityStore::field_options(&self.pool, &req.doctype, &req.field_name)
            .await?
            .unwrap_or_default();

        let columns: Vec<String> = options
            .lines()
            .filter(|option| !option.is_empty())
            .map(str::to_string)
            .collect();

        let filters = match req.project {
            Some(project) => vec![FilterCondition::eq(&req.doctype, "project", project)],
            None => Vec::new(),
        };

        let private = PRIVATE_DOCTYPES.contains(&req.doctype.as_str());

        self.create_board(
            actor,
            CreateBoardRequest {
                name: req.board_name,
                reference_doctype: req.doctype,
                field_name: req.field_name,
                filters,
                private,
                show_labels: false,
                fields: Vec::new(),
                columns,
            },
        )
        .await
    }

    /// Entities currently grouped under `column_name` that also satisfy the
    /// board filters, in default sort order.
    pub async fn initial_column_order<'e, E>(
        executor: E,
        board: &Board,
        column_name: &str,
    ) -> Result<Vec<String>, KanbanError>
    where
        E: SqliteExecutor<'e>,
    {
        let mut filters = vec![FilterCondition::eq(
            &board.reference_doctype,
            &board.field_name,
            column_name,
        )];
        filters.extend(board.filters.iter().cloned());

        EntityStore::query_names(executor, &board.reference_doctype, &filters).await
    }

    // ── Column management ──────────────────────────────────────

    pub async fn add_column(
        &self,
        actor: &Actor,
        board_id: &str,
        title: &str,
    ) -> Result<Vec<Column>, KanbanError> {
        let mut board = self.get_board(actor, board_id).await?;
        if board.has_column(title) {
            return Err(KanbanError::Validation(format!("Column {} already exists", title)));
        }

        board.columns.push(Column::new(title));
        self.save(&mut board).await?;
        Ok(board.columns)
    }

    pub async fn archive_restore_column(
        &self,
        actor: &Actor,
        board_id: &str,
        title: &str,
        status: ColumnStatus,
    ) -> Result<Vec<Column>, KanbanError> {
        let mut board = self.get_board(actor, board_id).await?;
        let column = board
            .column_mut(title)
            .ok_or_else(|| KanbanError::ColumnNotFound(title.to_string()))?;
        column.status = status;

        self.save(&mut board).await?;
        Ok(board.columns)
    }

    pub async fn set_indicator(
        &self,
        actor: &Actor,
        board_id: &str,
        column_name: &str,
        indicator: &str,
    ) -> Result<Board, KanbanError> {
        let mut board = self.get_board(actor, board_id).await?;
        let column = board
            .column_mut(column_name)
            .ok_or_else(|| KanbanError::ColumnNotFound(column_name.to_string()))?;
        column.indicator = indicator.to_string();

        self.save(&mut board).await?;
        Ok(board)
    }

    pub async fn reorder_columns(
        &self,
        actor: &Actor,
        board_id: &str,
        desired: &[String],
    ) -> Result<Board, KanbanError> {
        let mut board = self.get_board(actor, board_id).await?;
        board.columns = reorder::reorder_columns(std::mem::take(&mut board.columns), desired);

        self.save(&mut board).await?;
        Ok(board)
    }

    pub async fn save_settings(
        &self,
        actor: &Actor,
        board_id: &str,
        req: BoardSettingsRequest,
    ) -> Result<Board, KanbanError> {
        let mut board = self.get_board(actor, board_id).await?;
        board.fields = parse_display_fields(req.fields)?;
        board.show_labels = req.show_labels;

        self.save(&mut board).await?;
        Ok(board)
    }

    // ── Card placement ─────────────────────────────────────────

    pub async fn move_card(
        &self,
        actor: &Actor,
        board_id: &str,
        req: MoveCardRequest,
    ) -> Result<MoveCardResponse, KanbanError> {
        let mut board = self.get_board(actor, board_id).await?;
        PermissionService::require_write(&self.pool, actor, &board.reference_doctype).await?;

        let outcome = reorder::move_card(
            &mut board.columns,
            &req.item,
            &req.from_column,
            &req.to_column,
            req.old_index,
            req.new_index,
        )?;

        if outcome == MoveOutcome::ItemNotFound {
            return Ok(MoveCardResponse { outcome, board });
        }

        board.validate()?;
        let mut tx = self.pool.begin().await?;
        Self::write_board(&mut tx, &mut board).await?;

        if outcome.is_cross_column() {
            EntityStore::set_field(
                &mut *tx,
                &board.reference_doctype,
                &req.item,
                &board.field_name,
                &req.to_column,
            )
            .await?;
            AuditService::record_column_change(
                &mut *tx,
                &board.reference_doctype,
                &req.item,
                &req.from_column,
                &req.to_column,
                actor,
            )
            .await?;
        }

        tx.commit().await?;
        self.settings.invalidate_all().await;

        tracing::info!(
            board_id,
            item = req.item.as_str(),
            from_column = req.from_column.as_str(),
            to_column = req.to_column.as_str(),
            user = actor.user.as_str(),
            "Card moved"
        );

        Ok(MoveCardResponse { outcome, board })
    }

    pub async fn add_card(
        &self,
        actor: &Actor,
        board_id: &str,
        item: &str,
        column: &str,
    ) -> Result<Board, KanbanError> {
        let mut board = self.get_board(actor, board_id).await?;
        PermissionService::require_write(&self.pool, actor, &board.reference_doctype).await?;

        reorder::add_card(&mut board.columns, item, column)?;

        self.save(&mut board).await?;
        Ok(board)
    }

    /// Replaces every listed column's order and brings the grouping field of
    /// each listed entity in line with the column it now sits in. Without
    /// write permission the stored board comes back untouched.
    pub async fn bulk_set_order(
        &self,
        actor: &Actor,
        board_id: &str,
        req: BulkOrderRequest,
    ) -> Result<BulkOrderResponse, KanbanError> {
        let mut board = self.get_board(actor, board_id).await?;

        if !PermissionService::can_write(&self.pool, actor, &board.reference_doctype).await? {
            tracing::info!(
                board_id,
                user = actor.user.as_str(),
                "Bulk order skipped: no write permission"
            );
            return Ok(BulkOrderResponse {
                board,
                updated_cards: Vec::new(),
            });
        }

        let mut updated_cards = Vec::new();
        let mut tx = self.pool.begin().await?;

        let order = if board.reference_doctype == QUEUE_RANKED_DOCTYPE {
            let ranking =
                EntityStore::names_by_queue_position(&mut *tx, &board.reference_doctype).await?;
            reorder::order_by_ranking(&req.order, &ranking)
        } else {
            req.order
        };

        for (column, items) in &order {
            for item in items {
                let current = match EntityStore::get_field(
                    &mut *tx,
                    &board.reference_doctype,
                    item,
                    &board.field_name,
                )
                .await
                {
                    Ok(value) => value,
                    Err(KanbanError::NotFound(msg)) => {
                        tracing::warn!(board_id, item = item.as_str(), "Skipping card: {}", msg);
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                if current.as_deref() != Some(column.as_str()) {
                    EntityStore::set_field(
                        &mut *tx,
                        &board.reference_doctype,
                        item,
                        &board.field_name,
                        column,
                    )
                    .await?;
                    updated_cards.push(UpdatedCard {
                        name: item.clone(),
                        column: column.clone(),
                    });
                }
            }
        }

        let unknown = reorder::replace_orders(&mut board.columns, &order);
        if !unknown.is_empty() {
            tracing::warn!(board_id, ?unknown, "Order submitted for unknown columns");
        }

        board.validate()?;
        Self::write_board(&mut tx, &mut board).await?;
        tx.commit().await?;
        self.settings.invalidate_all().await;

        Ok(BulkOrderResponse {
            board,
            updated_cards,
        })
    }

    // ── Persistence ────────────────────────────────────────────

    async fn save(&self, board: &mut Board) -> Result<(), KanbanError> {
        board.validate()?;

        let mut tx = self.pool.begin().await?;
        Self::write_board(&mut tx, board).await?;
        tx.commit().await?;

        // board changes alter what list and kanban views show
        self.settings.invalidate_all().await;
        Ok(())
    }

    async fn write_board(
        tx: &mut Transaction<'_, Sqlite>,
        board: &mut Board,
    ) -> Result<(), KanbanError> {
        board.updated_at = Utc::now().to_rfc3339();

        sqlx::query(
            "UPDATE boards SET name = ?, reference_doctype = ?, field_name = ?, filters = ?, private = ?, show_labels = ?, fields = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&board.name)
        .bind(&board.reference_doctype)
        .bind(&board.field_name)
        .bind(encode_filters(&board.filters)?)
        .bind(board.private)
        .bind(board.show_labels)
        .bind(serde_json::to_string(&board.fields)?)
        .bind(&board.updated_at)
        .bind(&board.id)
        .execute(&mut **tx)
        .await?;

        Self::write_columns(tx, board).await
    }

    async fn write_columns(
        tx: &mut Transaction<'_, Sqlite>,
        board: &Board,
    ) -> Result<(), KanbanError> {
        sqlx::query("DELETE FROM board_columns WHERE board_id = ?")
            .bind(&board.id)
            .execute(&mut **tx)
            .await?;

        for (idx, column) in board.columns.iter().enumerate() {
            sqlx::query(
                "INSERT INTO board_columns (board_id, idx, column_name, status, indicator, item_order) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&board.id)
            .bind(idx as i64)
            .bind(&column.name)
            .bind(column.status.as_str())
            .bind(&column.indicator)
            .bind(serde_json::to_string(&column.order)?)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

fn encode_filters(filters: &[FilterCondition]) -> Result<Option<String>, KanbanError> {
    if filters.is_empty() {
        Ok(None)
    } else {
        Ok(Some(serde_json::to_string(filters)?))
    }
}

fn parse_display_fields(fields: Value) -> Result<Vec<String>, KanbanError> {
    let fields = match fields {
        Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|e| KanbanError::Validation(format!("Invalid fields list: {}", e)))?,
        Value::Null => Value::Array(Vec::new()),
        other => other,
    };

    serde_json::from_value(fields)
        .map_err(|e| KanbanError::Validation(format!("Invalid fields list: {}", e)))
}
