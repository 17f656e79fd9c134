//! Session persistence

use chrono::{DateTime, Utc};
use edt_common::db::models::{Session, SessionStatus};
use edt_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use super::parse_opt;

fn session_from_row(row: &SqliteRow) -> Result<Session> {
    Ok(Session {
        id: row.try_get("id")?,
        start_time: time::from_db(&row.try_get::<String, _>("start_time")?)?,
        end_time: time::from_db_opt(row.try_get("end_time")?)?,
        status: row.try_get::<String, _>("status")?.parse()?,
        phone_number: row.try_get("phone_number")?,
        caller_id: row.try_get("caller_id")?,
        emergency_type: parse_opt(row.try_get("emergency_type")?)?,
        location_id: row.try_get("location_id")?,
        description: row.try_get("description")?,
        priority_level: row.try_get("priority_level")?,
        response_notes: row.try_get("response_notes")?,
        created_at: time::from_db(&row.try_get::<String, _>("created_at")?)?,
        updated_at: time::from_db(&row.try_get::<String, _>("updated_at")?)?,
    })
}

pub async fn insert_session(executor: impl SqliteExecutor<'_>, session: &Session) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sessions
            (id, start_time, end_time, status, phone_number, caller_id, emergency_type,
             location_id, description, priority_level, response_notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(time::to_db(&session.start_time))
    .bind(session.end_time.as_ref().map(time::to_db))
    .bind(session.status.as_str())
    .bind(&session.phone_number)
    .bind(&session.caller_id)
    .bind(session.emergency_type.map(|t| t.as_str()))
    .bind(&session.location_id)
    .bind(&session.description)
    .bind(session.priority_level)
    .bind(&session.response_notes)
    .bind(time::to_db(&session.created_at))
    .bind(time::to_db(&session.updated_at))
    .execute(executor)
    .await?;

    Ok(())
}

/// Write the editable fields; status and times are changed separately
pub async fn update_session(executor: impl SqliteExecutor<'_>, session: &Session) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE sessions
        SET phone_number = ?, caller_id = ?, emergency_type = ?, location_id = ?,
            description = ?, priority_level = ?, response_notes = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&session.phone_number)
    .bind(&session.caller_id)
    .bind(session.emergency_type.map(|t| t.as_str()))
    .bind(&session.location_id)
    .bind(&session.description)
    .bind(session.priority_level)
    .bind(&session.response_notes)
    .bind(time::to_db(&session.updated_at))
    .bind(&session.id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Compare-and-swap status write
///
/// `end_time` of `None` leaves the stored end time as it was. Returns
/// false when the stored status is no longer `expected`.
pub async fn set_session_status_if(
    executor: impl SqliteExecutor<'_>,
    id: &str,
    expected: SessionStatus,
    status: SessionStatus,
    end_time: Option<DateTime<Utc>>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE sessions
        SET status = ?, end_time = COALESCE(?, end_time), updated_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(status.as_str())
    .bind(end_time.as_ref().map(time::to_db))
    .bind(time::to_db(&time::now()))
    .bind(id)
    .bind(expected.as_str())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn find_session(executor: impl SqliteExecutor<'_>, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, start_time, end_time, status, phone_number, caller_id, emergency_type,
               location_id, description, priority_level, response_notes, created_at, updated_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(session_from_row).transpose()
}

pub async fn list_sessions(executor: impl SqliteExecutor<'_>) -> Result<Vec<Session>> {
    let rows = sqlx::query(
        r#"
        SELECT id, start_time, end_time, status, phone_number, caller_id, emergency_type,
               location_id, description, priority_level, response_notes, created_at, updated_at
        FROM sessions
        ORDER BY start_time DESC
        "#,
    )
    .fetch_all(executor)
    .await?;

    rows.iter().map(session_from_row).collect()
}

pub async fn list_sessions_by_status(
    executor: impl SqliteExecutor<'_>,
    status: SessionStatus,
) -> Result<Vec<Session>> {
    let rows = sqlx::query(
        r#"
        SELECT id, start_time, end_time, status, phone_number, caller_id, emergency_type,
               location_id, description, priority_level, response_notes, created_at, updated_at
        FROM sessions
        WHERE status = ?
        ORDER BY start_time DESC
        "#,
    )
    .bind(status.as_str())
    .fetch_all(executor)
    .await?;

    rows.iter().map(session_from_row).collect()
}

pub async fn list_sessions_for_caller(
    executor: impl SqliteExecutor<'_>,
    caller_id: &str,
) -> Result<Vec<Session>> {
    let rows = sqlx::query(
        r#"
        SELECT id, start_time, end_time, status, phone_number, caller_id, emergency_type,
               location_id, description, priority_level, response_notes, created_at, updated_at
        FROM sessions
        WHERE caller_id = ?
        ORDER BY start_time DESC
        "#,
    )
    .bind(caller_id)
    .fetch_all(executor)
    .await?;

    rows.iter().map(session_from_row).collect()
}

pub async fn list_sessions_at_location(
    executor: impl SqliteExecutor<'_>,
    location_id: &str,
) -> Result<Vec<Session>> {
    let rows = sqlx::query(
        r#"
        SELECT id, start_time, end_time, status, phone_number, caller_id, emergency_type,
               location_id, description, priority_level, response_notes, created_at, updated_at
        FROM sessions
        WHERE location_id = ?
        ORDER BY start_time DESC
        "#,
    )
    .bind(location_id)
    .fetch_all(executor)
    .await?;

    rows.iter().map(session_from_row).collect()
}

pub async fn delete_session(executor: impl SqliteExecutor<'_>, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
