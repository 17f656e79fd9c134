//! Location operations

use edt_common::db::models::{Location, LocationDetail};
use edt_common::db::retry::with_lock_retry;
use edt_common::requests::{LocationChanges, NewLocation};
use edt_common::{ids, time, Error, Result};
use sqlx::SqlitePool;
use tracing::info;

use crate::db::{locations, responders, sessions};

pub async fn create_location(pool: &SqlitePool, request: NewLocation) -> Result<Location> {
    let now = time::now();
    let location = Location {
        id: ids::generate(),
        address: request.address,
        landmark: request.landmark,
        gps_coordinates: request.gps_coordinates,
        city: request.city,
        district: request.district,
        created_at: now,
        updated_at: now,
    };

    locations::insert_location(pool, &location).await?;

    info!(location_id = %location.id, "Created location");
    Ok(location)
}

async fn with_references(pool: &SqlitePool, location: Location) -> Result<LocationDetail> {
    let sessions = sessions::list_sessions_at_location(pool, &location.id).await?;
    let responders = responders::list_responders_at_location(pool, &location.id).await?;
    Ok(LocationDetail {
        location,
        sessions,
        responders,
    })
}

async fn with_references_all(
    pool: &SqlitePool,
    found: Vec<Location>,
) -> Result<Vec<LocationDetail>> {
    let mut details = Vec::with_capacity(found.len());
    for location in found {
        details.push(with_references(pool, location).await?);
    }
    Ok(details)
}

pub async fn list_locations(pool: &SqlitePool) -> Result<Vec<LocationDetail>> {
    let found = locations::list_locations(pool).await?;
    with_references_all(pool, found).await
}

pub async fn list_locations_by_city(pool: &SqlitePool, city: &str) -> Result<Vec<LocationDetail>> {
    let found = locations::list_locations_by_city(pool, city).await?;
    with_references_all(pool, found).await
}

pub async fn list_locations_by_district(
    pool: &SqlitePool,
    district: &str,
) -> Result<Vec<LocationDetail>> {
    let found = locations::list_locations_by_district(pool, district).await?;
    with_references_all(pool, found).await
}

pub async fn get_location(pool: &SqlitePool, id: &str) -> Result<LocationDetail> {
    let location = locations::find_location(pool, id)
        .await?
        .ok_or_else(|| Error::not_found("Location", id))?;
    with_references(pool, location).await
}

pub async fn update_location(
    pool: &SqlitePool,
    id: &str,
    changes: LocationChanges,
) -> Result<Location> {
    with_lock_retry("update location", || update_location_once(pool, id, changes.clone())).await
}

async fn update_location_once(
    pool: &SqlitePool,
    id: &str,
    changes: LocationChanges,
) -> Result<Location> {
    let mut tx = pool.begin().await?;

    let mut location = locations::find_location(&mut *tx, id)
        .await?
        .ok_or_else(|| Error::not_found("Location", id))?;

    if changes.address.is_some() {
        location.address = changes.address;
    }
    if changes.landmark.is_some() {
        location.landmark = changes.landmark;
    }
    if changes.gps_coordinates.is_some() {
        location.gps_coordinates = changes.gps_coordinates;
    }
    if changes.city.is_some() {
        location.city = changes.city;
    }
    if changes.district.is_some() {
        location.district = changes.district;
    }
    location.updated_at = time::now();

    locations::update_location(&mut *tx, &location).await?;
    tx.commit().await?;

    info!(location_id = %location.id, "Updated location");
    Ok(location)
}

/// Sessions and responders at the location keep existing, unlinked
pub async fn delete_location(pool: &SqlitePool, id: &str) -> Result<()> {
    if !locations::delete_location(pool, id).await? {
        return Err(Error::not_found("Location", id));
    }

    info!(location_id = %id, "Deleted location");
    Ok(())
}
