//! Session transcript persistence (append-only)

use edt_common::db::models::SessionTranscript;
use edt_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

fn transcript_from_row(row: &SqliteRow) -> Result<SessionTranscript> {
    Ok(SessionTranscript {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        content: row.try_get("content")?,
        speaker_type: row.try_get::<String, _>("speaker_type")?.parse()?,
        timestamp: time::from_db(&row.try_get::<String, _>("timestamp")?)?,
    })
}

pub async fn insert_transcript_entry(
    executor: impl SqliteExecutor<'_>,
    entry: &SessionTranscript,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO session_transcripts (id, session_id, content, speaker_type, timestamp)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.session_id)
    .bind(&entry.content)
    .bind(entry.speaker_type.as_str())
    .bind(time::to_db(&entry.timestamp))
    .execute(executor)
    .await?;

    Ok(())
}

/// Entries for a session in the order they were spoken
pub async fn list_transcript_for_session(
    executor: impl SqliteExecutor<'_>,
    session_id: &str,
) -> Result<Vec<SessionTranscript>> {
    let rows = sqlx::query(
        r#"
        SELECT id, session_id, content, speaker_type, timestamp
        FROM session_transcripts
        WHERE session_id = ?
        ORDER BY timestamp, rowid
        "#,
    )
    .bind(session_id)
    .fetch_all(executor)
    .await?;

    rows.iter().map(transcript_from_row).collect()
}

pub async fn delete_transcript_for_session(
    executor: impl SqliteExecutor<'_>,
    session_id: &str,
) -> Result<u64> {
    let result = sqlx::query("DELETE FROM session_transcripts WHERE session_id = ?")
        .bind(session_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}
