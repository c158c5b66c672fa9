use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use crate::domain::{Actor, AuditNote, KanbanError};

/// Append-only change notes attached to an entity.
pub struct AuditService;

impl AuditService {
    pub async fn record_column_change<'e, E>(
        executor: E,
        doctype: &str,
        name: &str,
        from_column: &str,
        to_column: &str,
        actor: &Actor,
    ) -> Result<AuditNote, KanbanError>
    where
        E: SqliteExecutor<'e>,
    {
        let note = AuditNote {
            id: Uuid::new_v4().to_string(),
            reference_doctype: doctype.to_string(),
            reference_name: name.to_string(),
            content: format!(
                "Moved from {} to {}. Modified by: {}",
                from_column, to_column, actor.user
            ),
            comment_by: actor.user.clone(),
            created_at: Utc::now().to_rfc3339(),
        };

        sqlx::query(
            "INSERT INTO comments (id, reference_doctype, reference_name, content, comment_by, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&note.id)
        .bind(&note.reference_doctype)
        .bind(&note.reference_name)
        .bind(&note.content)
        .bind(&note.comment_by)
        .bind(&note.created_at)
        .execute(executor)
        .await?;

        Ok(note)
    }

    pub async fn list_for(
        pool: &SqlitePool,
        doctype: &str,
        name: &str,
    ) -> Result<Vec<AuditNote>, KanbanError> {
        let notes: Vec<AuditNote> = sqlx::query_as(
            "SELECT * FROM comments WHERE reference_doctype = ? AND reference_name = ? ORDER BY created_at ASC",
        )
        .bind(doctype)
        .bind(name)
        .fetch_all(pool)
        .await?;

        Ok(notes)
    }
}
