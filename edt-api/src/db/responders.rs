//! Responder persistence

use edt_common::db::models::{Responder, ResponderStatus, ResponderType};
use edt_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

fn responder_from_row(row: &SqliteRow) -> Result<Responder> {
    Ok(Responder {
        id: row.try_get("id")?,
        responder_type: row.try_get::<String, _>("responder_type")?.parse()?,
        identifier: row.try_get("identifier")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        location_id: row.try_get("location_id")?,
        created_at: time::from_db(&row.try_get::<String, _>("created_at")?)?,
        updated_at: time::from_db(&row.try_get::<String, _>("updated_at")?)?,
    })
}

pub async fn insert_responder(
    executor: impl SqliteExecutor<'_>,
    responder: &Responder,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO responders
            (id, responder_type, identifier, status, location_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&responder.id)
    .bind(responder.responder_type.as_str())
    .bind(&responder.identifier)
    .bind(responder.status.as_str())
    .bind(&responder.location_id)
    .bind(time::to_db(&responder.created_at))
    .bind(time::to_db(&responder.updated_at))
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn update_responder(
    executor: impl SqliteExecutor<'_>,
    responder: &Responder,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE responders
        SET responder_type = ?, identifier = ?, status = ?, location_id = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(responder.responder_type.as_str())
    .bind(&responder.identifier)
    .bind(responder.status.as_str())
    .bind(&responder.location_id)
    .bind(time::to_db(&responder.updated_at))
    .bind(&responder.id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Unconditional status write; returns false when the responder is gone
pub async fn set_responder_status(
    executor: impl SqliteExecutor<'_>,
    id: &str,
    status: ResponderStatus,
) -> Result<bool> {
    let result = sqlx::query("UPDATE responders SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(time::to_db(&time::now()))
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Compare-and-swap status write
///
/// Returns false when the responder's status is no longer `expected`.
pub async fn set_responder_status_if(
    executor: impl SqliteExecutor<'_>,
    id: &str,
    expected: ResponderStatus,
    status: ResponderStatus,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE responders SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(status.as_str())
    .bind(time::to_db(&time::now()))
    .bind(id)
    .bind(expected.as_str())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn find_responder(
    executor: impl SqliteExecutor<'_>,
    id: &str,
) -> Result<Option<Responder>> {
    let row = sqlx::query(
        r#"
        SELECT id, responder_type, identifier, status, location_id, created_at, updated_at
        FROM responders
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(responder_from_row).transpose()
}

/// Responder holding `identifier`, ignoring `exclude_id`
pub async fn find_responder_by_identifier(
    executor: impl SqliteExecutor<'_>,
    identifier: &str,
    exclude_id: Option<&str>,
) -> Result<Option<Responder>> {
    let row = sqlx::query(
        r#"
        SELECT id, responder_type, identifier, status, location_id, created_at, updated_at
        FROM responders
        WHERE identifier = ? AND (? IS NULL OR id <> ?)
        "#,
    )
    .bind(identifier)
    .bind(exclude_id)
    .bind(exclude_id)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(responder_from_row).transpose()
}

pub async fn list_responders(executor: impl SqliteExecutor<'_>) -> Result<Vec<Responder>> {
    let rows = sqlx::query(
        r#"
        SELECT id, responder_type, identifier, status, location_id, created_at, updated_at
        FROM responders
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .fetch_all(executor)
    .await?;

    rows.iter().map(responder_from_row).collect()
}

pub async fn list_responders_by_type(
    executor: impl SqliteExecutor<'_>,
    responder_type: ResponderType,
) -> Result<Vec<Responder>> {
    let rows = sqlx::query(
        r#"
        SELECT id, responder_type, identifier, status, location_id, created_at, updated_at
        FROM responders
        WHERE responder_type = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(responder_type.as_str())
    .fetch_all(executor)
    .await?;

    rows.iter().map(responder_from_row).collect()
}

/// AVAILABLE responders, optionally narrowed by type and location
pub async fn list_available_responders(
    executor: impl SqliteExecutor<'_>,
    responder_type: Option<ResponderType>,
    location_id: Option<&str>,
) -> Result<Vec<Responder>> {
    let type_filter = responder_type.map(|t| t.as_str());

    let rows = sqlx::query(
        r#"
        SELECT id, responder_type, identifier, status, location_id, created_at, updated_at
        FROM responders
        WHERE status = 'AVAILABLE'
          AND (? IS NULL OR responder_type = ?)
          AND (? IS NULL OR location_id = ?)
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(type_filter)
    .bind(type_filter)
    .bind(location_id)
    .bind(location_id)
    .fetch_all(executor)
    .await?;

    rows.iter().map(responder_from_row).collect()
}

pub async fn list_responders_at_location(
    executor: impl SqliteExecutor<'_>,
    location_id: &str,
) -> Result<Vec<Responder>> {
    let rows = sqlx::query(
        r#"
        SELECT id, responder_type, identifier, status, location_id, created_at, updated_at
        FROM responders
        WHERE location_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(location_id)
    .fetch_all(executor)
    .await?;

    rows.iter().map(responder_from_row).collect()
}

pub async fn delete_responder(executor: impl SqliteExecutor<'_>, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM responders WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
