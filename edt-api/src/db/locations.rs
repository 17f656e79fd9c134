//! Location persistence

use edt_common::db::models::Location;
use edt_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

fn location_from_row(row: &SqliteRow) -> Result<Location> {
    Ok(Location {
        id: row.try_get("id")?,
        address: row.try_get("address")?,
        landmark: row.try_get("landmark")?,
        gps_coordinates: row.try_get("gps_coordinates")?,
        city: row.try_get("city")?,
        district: row.try_get("district")?,
        created_at: time::from_db(&row.try_get::<String, _>("created_at")?)?,
        updated_at: time::from_db(&row.try_get::<String, _>("updated_at")?)?,
    })
}

pub async fn insert_location(
    executor: impl SqliteExecutor<'_>,
    location: &Location,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO locations
            (id, address, landmark, gps_coordinates, city, district, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&location.id)
    .bind(&location.address)
    .bind(&location.landmark)
    .bind(&location.gps_coordinates)
    .bind(&location.city)
    .bind(&location.district)
    .bind(time::to_db(&location.created_at))
    .bind(time::to_db(&location.updated_at))
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn update_location(
    executor: impl SqliteExecutor<'_>,
    location: &Location,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE locations
        SET address = ?, landmark = ?, gps_coordinates = ?, city = ?, district = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&location.address)
    .bind(&location.landmark)
    .bind(&location.gps_coordinates)
    .bind(&location.city)
    .bind(&location.district)
    .bind(time::to_db(&location.updated_at))
    .bind(&location.id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn find_location(
    executor: impl SqliteExecutor<'_>,
    id: &str,
) -> Result<Option<Location>> {
    let row = sqlx::query(
        r#"
        SELECT id, address, landmark, gps_coordinates, city, district, created_at, updated_at
        FROM locations
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(location_from_row).transpose()
}

pub async fn list_locations(executor: impl SqliteExecutor<'_>) -> Result<Vec<Location>> {
    let rows = sqlx::query(
        r#"
        SELECT id, address, landmark, gps_coordinates, city, district, created_at, updated_at
        FROM locations
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(executor)
    .await?;

    rows.iter().map(location_from_row).collect()
}

pub async fn list_locations_by_city(
    executor: impl SqliteExecutor<'_>,
    city: &str,
) -> Result<Vec<Location>> {
    let rows = sqlx::query(
        r#"
        SELECT id, address, landmark, gps_coordinates, city, district, created_at, updated_at
        FROM locations
        WHERE city = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(city)
    .fetch_all(executor)
    .await?;

    rows.iter().map(location_from_row).collect()
}

pub async fn list_locations_by_district(
    executor: impl SqliteExecutor<'_>,
    district: &str,
) -> Result<Vec<Location>> {
    let rows = sqlx::query(
        r#"
        SELECT id, address, landmark, gps_coordinates, city, district, created_at, updated_at
        FROM locations
        WHERE district = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(district)
    .fetch_all(executor)
    .await?;

    rows.iter().map(location_from_row).collect()
}

/// Seeding lookup: first location in a district with a matching address
pub async fn find_location_by_address(
    executor: impl SqliteExecutor<'_>,
    address: &str,
    district: &str,
) -> Result<Option<Location>> {
    let row = sqlx::query(
        r#"
        SELECT id, address, landmark, gps_coordinates, city, district, created_at, updated_at
        FROM locations
        WHERE address = ? AND district = ?
        LIMIT 1
        "#,
    )
    .bind(address)
    .bind(district)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(location_from_row).transpose()
}

pub async fn delete_location(executor: impl SqliteExecutor<'_>, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM locations WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
