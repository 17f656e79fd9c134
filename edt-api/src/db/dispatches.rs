//! Dispatch persistence

use edt_common::db::models::Dispatch;
use edt_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

fn dispatch_from_row(row: &SqliteRow) -> Result<Dispatch> {
    Ok(Dispatch {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        responder_id: row.try_get("responder_id")?,
        dispatch_time: time::from_db(&row.try_get::<String, _>("dispatch_time")?)?,
        arrival_time: time::from_db_opt(row.try_get("arrival_time")?)?,
        status: row.try_get::<String, _>("status")?.parse()?,
        notes: row.try_get("notes")?,
        created_at: time::from_db(&row.try_get::<String, _>("created_at")?)?,
        updated_at: time::from_db(&row.try_get::<String, _>("updated_at")?)?,
    })
}

pub async fn insert_dispatch(executor: impl SqliteExecutor<'_>, dispatch: &Dispatch) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO dispatches
            (id, session_id, responder_id, dispatch_time, arrival_time, status, notes,
             created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&dispatch.id)
    .bind(&dispatch.session_id)
    .bind(&dispatch.responder_id)
    .bind(time::to_db(&dispatch.dispatch_time))
    .bind(dispatch.arrival_time.as_ref().map(time::to_db))
    .bind(dispatch.status.as_str())
    .bind(&dispatch.notes)
    .bind(time::to_db(&dispatch.created_at))
    .bind(time::to_db(&dispatch.updated_at))
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn update_dispatch(executor: impl SqliteExecutor<'_>, dispatch: &Dispatch) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE dispatches
        SET arrival_time = ?, status = ?, notes = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(dispatch.arrival_time.as_ref().map(time::to_db))
    .bind(dispatch.status.as_str())
    .bind(&dispatch.notes)
    .bind(time::to_db(&dispatch.updated_at))
    .bind(&dispatch.id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn find_dispatch(executor: impl SqliteExecutor<'_>, id: &str) -> Result<Option<Dispatch>> {
    let row = sqlx::query(
        r#"
        SELECT id, session_id, responder_id, dispatch_time, arrival_time, status, notes,
               created_at, updated_at
        FROM dispatches
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(dispatch_from_row).transpose()
}

pub async fn list_dispatches(executor: impl SqliteExecutor<'_>) -> Result<Vec<Dispatch>> {
    let rows = sqlx::query(
        r#"
        SELECT id, session_id, responder_id, dispatch_time, arrival_time, status, notes,
               created_at, updated_at
        FROM dispatches
        ORDER BY dispatch_time DESC
        "#,
    )
    .fetch_all(executor)
    .await?;

    rows.iter().map(dispatch_from_row).collect()
}

/// Dispatches still holding their responder
pub async fn list_open_dispatches(executor: impl SqliteExecutor<'_>) -> Result<Vec<Dispatch>> {
    let rows = sqlx::query(
        r#"
        SELECT id, session_id, responder_id, dispatch_time, arrival_time, status, notes,
               created_at, updated_at
        FROM dispatches
        WHERE status IN ('DISPATCHED', 'EN_ROUTE', 'ARRIVED')
        ORDER BY dispatch_time DESC
        "#,
    )
    .fetch_all(executor)
    .await?;

    rows.iter().map(dispatch_from_row).collect()
}

pub async fn list_dispatches_for_session(
    executor: impl SqliteExecutor<'_>,
    session_id: &str,
) -> Result<Vec<Dispatch>> {
    let rows = sqlx::query(
        r#"
        SELECT id, session_id, responder_id, dispatch_time, arrival_time, status, notes,
               created_at, updated_at
        FROM dispatches
        WHERE session_id = ?
        ORDER BY dispatch_time
        "#,
    )
    .bind(session_id)
    .fetch_all(executor)
    .await?;

    rows.iter().map(dispatch_from_row).collect()
}

pub async fn list_dispatches_for_responder(
    executor: impl SqliteExecutor<'_>,
    responder_id: &str,
) -> Result<Vec<Dispatch>> {
    let rows = sqlx::query(
        r#"
        SELECT id, session_id, responder_id, dispatch_time, arrival_time, status, notes,
               created_at, updated_at
        FROM dispatches
        WHERE responder_id = ?
        ORDER BY dispatch_time DESC
        "#,
    )
    .bind(responder_id)
    .fetch_all(executor)
    .await?;

    rows.iter().map(dispatch_from_row).collect()
}

pub async fn count_open_dispatches_for_session(
    executor: impl SqliteExecutor<'_>,
    session_id: &str,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM dispatches
        WHERE session_id = ? AND status IN ('DISPATCHED', 'EN_ROUTE', 'ARRIVED')
        "#,
    )
    .bind(session_id)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

pub async fn count_dispatches_for_responder(
    executor: impl SqliteExecutor<'_>,
    responder_id: &str,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dispatches WHERE responder_id = ?")
        .bind(responder_id)
        .fetch_one(executor)
        .await?;

    Ok(count)
}

pub async fn delete_dispatch(executor: impl SqliteExecutor<'_>, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM dispatches WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_dispatches_for_session(
    executor: impl SqliteExecutor<'_>,
    session_id: &str,
) -> Result<u64> {
    let result = sqlx::query("DELETE FROM dispatches WHERE session_id = ?")
        .bind(session_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}
