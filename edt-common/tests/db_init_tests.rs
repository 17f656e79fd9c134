//! Database initialization tests
//!
//! - Database file is created automatically when missing
//! - Reopening an existing database keeps its data
//! - Store-level uniqueness backs the caller and responder guards

use edt_common::db::init::init_database;
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("edt.db");
    assert!(!db_path.exists());

    let pool = init_database(&db_path).await;
    assert!(pool.is_ok(), "Database initialization failed: {:?}", pool.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_reopen_keeps_rows() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("edt.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query(
        "INSERT INTO locations (id, city, created_at, updated_at) VALUES ('loc-1', 'Madurai', 'x', 'x')",
    )
    .execute(&pool)
    .await
    .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_responder_identifier_unique_in_store() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("edt.db")).await.unwrap();

    let insert = "INSERT INTO responders (id, responder_type, identifier, created_at, updated_at)
                  VALUES (?, 'AMBULANCE', 'AMB-1', 'x', 'x')";
    sqlx::query(insert).bind("r1").execute(&pool).await.unwrap();
    let err = sqlx::query(insert).bind("r2").execute(&pool).await.unwrap_err();

    let err = edt_common::Error::from(err);
    assert!(err.is_unique_violation());
}

#[tokio::test]
async fn test_multiple_callers_without_phone_allowed() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("edt.db")).await.unwrap();

    for id in ["c1", "c2"] {
        sqlx::query("INSERT INTO callers (id, created_at, updated_at) VALUES (?, 'x', 'x')")
            .bind(id)
            .execute(&pool)
            .await
            .expect("NULL phone numbers do not collide");
    }
}
