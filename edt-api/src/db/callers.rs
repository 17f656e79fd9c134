//! Caller persistence

use edt_common::db::models::Caller;
use edt_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

fn caller_from_row(row: &SqliteRow) -> Result<Caller> {
    Ok(Caller {
        id: row.try_get("id")?,
        phone_number: row.try_get("phone_number")?,
        name: row.try_get("name")?,
        language: row.try_get("language")?,
        created_at: time::from_db(&row.try_get::<String, _>("created_at")?)?,
        updated_at: time::from_db(&row.try_get::<String, _>("updated_at")?)?,
    })
}

pub async fn insert_caller(executor: impl SqliteExecutor<'_>, caller: &Caller) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO callers (id, phone_number, name, language, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&caller.id)
    .bind(&caller.phone_number)
    .bind(&caller.name)
    .bind(&caller.language)
    .bind(time::to_db(&caller.created_at))
    .bind(time::to_db(&caller.updated_at))
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn update_caller(executor: impl SqliteExecutor<'_>, caller: &Caller) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE callers
        SET phone_number = ?, name = ?, language = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&caller.phone_number)
    .bind(&caller.name)
    .bind(&caller.language)
    .bind(time::to_db(&caller.updated_at))
    .bind(&caller.id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn find_caller(executor: impl SqliteExecutor<'_>, id: &str) -> Result<Option<Caller>> {
    let row = sqlx::query(
        "SELECT id, phone_number, name, language, created_at, updated_at FROM callers WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(caller_from_row).transpose()
}

/// Caller holding `phone_number`, ignoring `exclude_id`
pub async fn find_caller_by_phone(
    executor: impl SqliteExecutor<'_>,
    phone_number: &str,
    exclude_id: Option<&str>,
) -> Result<Option<Caller>> {
    let row = sqlx::query(
        r#"
        SELECT id, phone_number, name, language, created_at, updated_at
        FROM callers
        WHERE phone_number = ? AND (? IS NULL OR id <> ?)
        "#,
    )
    .bind(phone_number)
    .bind(exclude_id)
    .bind(exclude_id)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(caller_from_row).transpose()
}

pub async fn list_callers(executor: impl SqliteExecutor<'_>) -> Result<Vec<Caller>> {
    let rows = sqlx::query(
        r#"
        SELECT id, phone_number, name, language, created_at, updated_at
        FROM callers
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(executor)
    .await?;

    rows.iter().map(caller_from_row).collect()
}

/// Returns false when no caller had this id
pub async fn delete_caller(executor: impl SqliteExecutor<'_>, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM callers WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
