//! Database initialization
//!
//! Opens (creating if needed) the SQLite store and creates the dispatch
//! tracker schema. Every statement is idempotent, so startup can run it
//! against an existing database.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Lock wait before a write gives up with SQLITE_BUSY
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the database file and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// The pool holds exactly one connection that never expires: every
/// connection to `sqlite::memory:` is a separate database.
pub async fn init_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_callers_table(pool).await?;
    create_locations_table(pool).await?;
    create_responders_table(pool).await?;
    create_sessions_table(pool).await?;
    create_session_transcripts_table(pool).await?;
    create_dispatches_table(pool).await?;
    Ok(())
}

/// Create the callers table
///
/// SQLite treats NULLs as distinct, so the UNIQUE constraint only binds
/// callers that have a phone number.
pub async fn create_callers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS callers (
            id TEXT PRIMARY KEY,
            phone_number TEXT UNIQUE,
            name TEXT,
            language TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_locations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS locations (
            id TEXT PRIMARY KEY,
            address TEXT,
            landmark TEXT,
            gps_coordinates TEXT,
            city TEXT,
            district TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_locations_city ON locations(city)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_locations_district ON locations(district)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_responders_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS responders (
            id TEXT PRIMARY KEY,
            responder_type TEXT NOT NULL
                CHECK (responder_type IN ('AMBULANCE', 'POLICE', 'FIRE', 'OTHER')),
            identifier TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'AVAILABLE'
                CHECK (status IN ('AVAILABLE', 'DISPATCHED', 'ON_ROUTE', 'ON_SCENE',
                                  'RETURNING', 'OUT_OF_SERVICE')),
            location_id TEXT REFERENCES locations(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_responders_type_status ON responders(responder_type, status)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            start_time TEXT NOT NULL,
            end_time TEXT,
            status TEXT NOT NULL DEFAULT 'ACTIVE'
                CHECK (status IN ('ACTIVE', 'EMERGENCY_VERIFIED', 'DISPATCHED', 'COMPLETED',
                                  'DROPPED', 'TRANSFERRED', 'NON_EMERGENCY')),
            phone_number TEXT,
            caller_id TEXT REFERENCES callers(id) ON DELETE SET NULL,
            emergency_type TEXT
                CHECK (emergency_type IN ('MEDICAL', 'POLICE', 'FIRE', 'OTHER')),
            location_id TEXT REFERENCES locations(id) ON DELETE SET NULL,
            description TEXT,
            priority_level INTEGER CHECK (priority_level BETWEEN 1 AND 5),
            response_notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_status ON sessions(status)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_session_transcripts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS session_transcripts (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES sessions(id),
            content TEXT NOT NULL,
            speaker_type TEXT NOT NULL
                CHECK (speaker_type IN ('AGENT', 'CALLER', 'SYSTEM')),
            timestamp TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transcripts_session ON session_transcripts(session_id, timestamp)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_dispatches_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dispatches (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES sessions(id),
            responder_id TEXT NOT NULL REFERENCES responders(id),
            dispatch_time TEXT NOT NULL,
            arrival_time TEXT,
            status TEXT NOT NULL DEFAULT 'DISPATCHED'
                CHECK (status IN ('DISPATCHED', 'EN_ROUTE', 'ARRIVED', 'COMPLETED', 'CANCELLED')),
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_dispatches_session ON dispatches(session_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_dispatches_responder ON dispatches(responder_id, status)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
