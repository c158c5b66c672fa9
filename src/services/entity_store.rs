use chrono::Utc;
use serde_json::Value;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteExecutor};

use crate::domain::{FilterCondition, FilterOperator, KanbanError};

/// Generic business records grouped by boards. Fields live in a JSON object;
/// `name` is the identifier and is addressable as a field too.
pub struct EntityStore;

impl EntityStore {
    pub async fn insert<'e, E>(
        executor: E,
        doctype: &str,
        name: &str,
        data: &Value,
    ) -> Result<(), KanbanError>
    where
        E: SqliteExecutor<'e>,
    {
        if !data.is_object() {
            return Err(KanbanError::Validation(
                "Entity data must be a JSON object".into(),
            ));
        }
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO entities (doctype, name, data, created_at, modified_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(doctype)
        .bind(name)
        .bind(data.to_string())
        .bind(&now)
        .bind(&now)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn get_data<'e, E>(executor: E, doctype: &str, name: &str) -> Result<Value, KanbanError>
    where
        E: SqliteExecutor<'e>,
    {
        let (raw,): (String,) =
            sqlx::query_as("SELECT data FROM entities WHERE doctype = ? AND name = ?")
                .bind(doctype)
                .bind(name)
                .fetch_optional(executor)
                .await?
                .ok_or_else(|| KanbanError::NotFound(format!("{} {} not found", doctype, name)))?;

        Ok(serde_json::from_str(&raw)?)
    }

    pub async fn get_field<'e, E>(
        executor: E,
        doctype: &str,
        name: &str,
        field: &str,
    ) -> Result<Option<String>, KanbanError>
    where
        E: SqliteExecutor<'e>,
    {
        let path = json_path(field)?;
        let row = sqlx::query(
            "SELECT CAST(json_extract(data, ?) AS TEXT) AS value FROM entities WHERE doctype = ? AND name = ?",
        )
        .bind(&path)
        .bind(doctype)
        .bind(name)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| KanbanError::NotFound(format!("{} {} not found", doctype, name)))?;

        Ok(row.get("value"))
    }

    pub async fn set_field<'e, E>(
        executor: E,
        doctype: &str,
        name: &str,
        field: &str,
        value: &str,
    ) -> Result<(), KanbanError>
    where
        E: SqliteExecutor<'e>,
    {
        let path = json_path(field)?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE entities SET data = json_set(data, ?, ?), modified_at = ? WHERE doctype = ? AND name = ?",
        )
        .bind(&path)
        .bind(value)
        .bind(&now)
        .bind(doctype)
        .bind(name)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(KanbanError::NotFound(format!("{} {} not found", doctype, name)));
        }

        tracing::debug!(doctype, name, field, value, "Entity field updated");
        Ok(())
    }

    /// Names of matching entities, newest first.
    pub async fn query_names<'e, E>(
        executor: E,
        doctype: &str,
        filters: &[FilterCondition],
    ) -> Result<Vec<String>, KanbanError>
    where
        E: SqliteExecutor<'e>,
    {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT name FROM entities WHERE doctype = ");
        builder.push_bind(doctype.to_string());

        for condition in filters {
            builder.push(" AND ");
            push_condition(&mut builder, condition)?;
        }

        builder.push(" ORDER BY created_at DESC, name DESC");

        let rows = builder.build().fetch_all(executor).await?;
        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    /// Every entity of `doctype` by ascending `queue_position`, then
    /// `appointment_date`. Entities without a value sort after those with one.
    pub async fn names_by_queue_position<'e, E>(
        executor: E,
        doctype: &str,
    ) -> Result<Vec<String>, KanbanError>
    where
        E: SqliteExecutor<'e>,
    {
        let rows = sqlx::query(
            "SELECT name FROM entities
             WHERE doctype = ?
             ORDER BY json_extract(data, '$.queue_position') IS NULL,
                      json_extract(data, '$.queue_position') ASC,
                      json_extract(data, '$.appointment_date') IS NULL,
                      json_extract(data, '$.appointment_date') ASC,
                      name ASC",
        )
        .bind(doctype)
        .fetch_all(executor)
        .await?;

        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    /// Declared options of a select-style field, one per line.
    pub async fn field_options<'e, E>(
        executor: E,
        doctype: &str,
        fieldname: &str,
    ) -> Result<Option<String>, KanbanError>
    where
        E: SqliteExecutor<'e>,
    {
        let row: Option<(Option<String>,)> = sqlx::query_as(
            "SELECT options FROM doctype_fields WHERE doctype = ? AND fieldname = ?",
        )
        .bind(doctype)
        .bind(fieldname)
        .fetch_optional(executor)
        .await?;

        Ok(row.and_then(|(options,)| options))
    }

    pub async fn define_field<'e, E>(
        executor: E,
        doctype: &str,
        fieldname: &str,
        fieldtype: &str,
        options: Option<&str>,
    ) -> Result<(), KanbanError>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query(
            "INSERT INTO doctype_fields (doctype, fieldname, fieldtype, options) VALUES (?, ?, ?, ?)
             ON CONFLICT(doctype, fieldname) DO UPDATE SET fieldtype = excluded.fieldtype, options = excluded.options",
        )
        .bind(doctype)
        .bind(fieldname)
        .bind(fieldtype)
        .bind(options)
        .execute(executor)
        .await?;

        Ok(())
    }
}

fn json_path(field: &str) -> Result<String, KanbanError> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(KanbanError::BadRequest(format!("Invalid field name: {}", field)));
    }
    Ok(format!("$.{}", field))
}

fn push_field(builder: &mut QueryBuilder<'_, Sqlite>, field: &str) -> Result<(), KanbanError> {
    if field == "name" {
        builder.push("name");
    } else {
        builder.push("json_extract(data, ");
        builder.push_bind(json_path(field)?);
        builder.push(")");
    }
    Ok(())
}

fn push_value(builder: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::String(s) => {
            builder.push_bind(s.clone());
        }
        Value::Bool(b) => {
            builder.push_bind(i64::from(*b));
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => {
                builder.push_bind(i);
            }
            None => {
                builder.push_bind(n.as_f64().unwrap_or_default());
            }
        },
        other => {
            builder.push_bind(other.to_string());
        }
    }
}

fn push_condition(
    builder: &mut QueryBuilder<'_, Sqlite>,
    condition: &FilterCondition,
) -> Result<(), KanbanError> {
    if condition.value.is_null() {
        push_field(builder, &condition.field)?;
        match condition.operator {
            FilterOperator::NotEq | FilterOperator::NotIn => builder.push(" IS NOT NULL"),
            _ => builder.push(" IS NULL"),
        };
        return Ok(());
    }

    match condition.operator {
        FilterOperator::Eq | FilterOperator::NotEq | FilterOperator::Like => {
            push_field(builder, &condition.field)?;
            builder.push(match condition.operator {
                FilterOperator::Eq => " = ",
                FilterOperator::NotEq => " != ",
                _ => " LIKE ",
            });
            push_value(builder, &condition.value);
        }
        FilterOperator::In | FilterOperator::NotIn => {
            let values = condition.value.as_array().cloned().unwrap_or_default();
            if values.is_empty() {
                builder.push(if condition.operator == FilterOperator::In {
                    "0"
                } else {
                    "1"
                });
                return Ok(());
            }
            push_field(builder, &condition.field)?;
            builder.push(if condition.operator == FilterOperator::In {
                " IN ("
            } else {
                " NOT IN ("
            });
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                push_value(builder, value);
            }
            builder.push(")");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_path_rejects_injection() {
        assert_eq!(json_path("status").unwrap(), "$.status");
        assert!(json_path("status') OR 1=1 --").is_err());
        assert!(json_path("").is_err());
    }

    #[test]
    fn builds_filtered_query() {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT name FROM entities WHERE 1");
        builder.push(" AND ");
        push_condition(&mut builder, &FilterCondition::eq("Task", "status", "Open")).unwrap();
        assert_eq!(
            builder.sql(),
            "SELECT name FROM entities WHERE 1 AND json_extract(data, ?) = ?"
        );
    }
}
