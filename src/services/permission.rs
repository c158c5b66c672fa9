use sqlx::SqlitePool;

use crate::domain::{Actor, Board, KanbanError};

pub struct PermissionService;

impl PermissionService {
    pub async fn can_write(pool: &SqlitePool, actor: &Actor, doctype: &str) -> Result<bool, KanbanError> {
        if actor.is_administrator() {
            return Ok(true);
        }

        let row: Option<(bool,)> = sqlx::query_as(
            "SELECT can_write FROM doctype_permissions WHERE user = ? AND doctype = ?",
        )
        .bind(&actor.user)
        .bind(doctype)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|(allowed,)| allowed).unwrap_or(false))
    }

    pub async fn can_read(pool: &SqlitePool, actor: &Actor, doctype: &str) -> Result<bool, KanbanError> {
        if actor.is_administrator() {
            return Ok(true);
        }

        let row: Option<(bool, bool)> = sqlx::query_as(
            "SELECT can_read, can_write FROM doctype_permissions WHERE user = ? AND doctype = ?",
        )
        .bind(&actor.user)
        .bind(doctype)
        .fetch_optional(pool)
        .await?;

        Ok(row.is_some_and(|(read, write)| read || write))
    }

    pub async fn require_write(pool: &SqlitePool, actor: &Actor, doctype: &str) -> Result<(), KanbanError> {
        if Self::can_write(pool, actor, doctype).await? {
            Ok(())
        } else {
            tracing::warn!(user = actor.user.as_str(), doctype, "Write permission denied");
            Err(KanbanError::Forbidden(format!(
                "No permission to write {}",
                doctype
            )))
        }
    }

    pub async fn require_read(pool: &SqlitePool, actor: &Actor, doctype: &str) -> Result<(), KanbanError> {
        if Self::can_read(pool, actor, doctype).await? {
            Ok(())
        } else {
            Err(KanbanError::Forbidden(format!(
                "No permission to read {}",
                doctype
            )))
        }
    }

    /// Public boards are visible to everyone; private ones to their owner.
    pub fn can_access_board(actor: &Actor, board: &Board) -> bool {
        !board.private || actor.is_administrator() || board.owner == actor.user
    }

    pub async fn grant(
        pool: &SqlitePool,
        user: &str,
        doctype: &str,
        can_read: bool,
        can_write: bool,
    ) -> Result<(), KanbanError> {
        sqlx::query(
            "INSERT INTO doctype_permissions (user, doctype, can_read, can_write) VALUES (?, ?, ?, ?)
             ON CONFLICT(user, doctype) DO UPDATE SET can_read = excluded.can_read, can_write = excluded.can_write",
        )
        .bind(user)
        .bind(doctype)
        .bind(can_read)
        .bind(can_write)
        .execute(pool)
        .await?;

        Ok(())
    }
}
