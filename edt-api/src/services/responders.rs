//! Responder operations

use edt_common::db::models::{
    DispatchWithSession, Responder, ResponderDetail, ResponderStatus, ResponderType,
    ResponderWithLocation,
};
use edt_common::db::retry::with_lock_retry;
use edt_common::requests::{AvailableResponderFilter, NewResponder, ResponderChanges};
use edt_common::transitions::responder_type_for;
use edt_common::{ids, time, Error, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use super::guards;
use crate::db::{dispatches, locations, responders, sessions};

async fn ensure_location_exists(conn: &mut SqliteConnection, location_id: &str) -> Result<()> {
    match locations::find_location(&mut *conn, location_id).await? {
        Some(_) => Ok(()),
        None => Err(Error::not_found("Location", location_id)),
    }
}

pub async fn create_responder(pool: &SqlitePool, request: NewResponder) -> Result<Responder> {
    with_lock_retry("create responder", || create_responder_once(pool, request.clone())).await
}

async fn create_responder_once(pool: &SqlitePool, request: NewResponder) -> Result<Responder> {
    let now = time::now();
    let responder = Responder {
        id: ids::generate(),
        responder_type: request.responder_type,
        identifier: request.identifier,
        status: request.status.unwrap_or(ResponderStatus::Available),
        location_id: request.location_id,
        created_at: now,
        updated_at: now,
    };

    let mut tx = pool.begin().await?;
    guards::ensure_identifier_unused(&mut tx, &responder.identifier, None).await?;
    if let Some(location_id) = responder.location_id.as_deref() {
        ensure_location_exists(&mut tx, location_id).await?;
    }
    responders::insert_responder(&mut *tx, &responder)
        .await
        .map_err(|e| guards::classify_duplicate(e, "identifier", Some(&responder.identifier)))?;
    tx.commit().await?;

    info!(
        responder_id = %responder.id,
        identifier = %responder.identifier,
        responder_type = %responder.responder_type,
        "Created responder"
    );
    Ok(responder)
}

async fn with_location(pool: &SqlitePool, responder: Responder) -> Result<ResponderWithLocation> {
    let location = match responder.location_id.as_deref() {
        Some(location_id) => locations::find_location(pool, location_id).await?,
        None => None,
    };
    Ok(ResponderWithLocation {
        responder,
        location,
    })
}

async fn with_location_all(
    pool: &SqlitePool,
    found: Vec<Responder>,
) -> Result<Vec<ResponderWithLocation>> {
    let mut out = Vec::with_capacity(found.len());
    for responder in found {
        out.push(with_location(pool, responder).await?);
    }
    Ok(out)
}

pub async fn list_responders(pool: &SqlitePool) -> Result<Vec<ResponderWithLocation>> {
    let found = responders::list_responders(pool).await?;
    with_location_all(pool, found).await
}

/// AVAILABLE responders suited to the filter
///
/// An emergency type with no matching responder type (OTHER) yields an
/// empty list rather than every available unit.
pub async fn list_available_responders(
    pool: &SqlitePool,
    filter: &AvailableResponderFilter,
) -> Result<Vec<ResponderWithLocation>> {
    let responder_type = match filter.emergency_type {
        Some(emergency) => match responder_type_for(emergency) {
            Some(responder_type) => Some(responder_type),
            None => return Ok(Vec::new()),
        },
        None => None,
    };

    let found =
        responders::list_available_responders(pool, responder_type, filter.location_id.as_deref())
            .await?;
    with_location_all(pool, found).await
}

pub async fn list_responders_by_type(
    pool: &SqlitePool,
    responder_type: ResponderType,
) -> Result<Vec<ResponderWithLocation>> {
    let found = responders::list_responders_by_type(pool, responder_type).await?;
    with_location_all(pool, found).await
}

pub async fn get_responder(pool: &SqlitePool, id: &str) -> Result<ResponderDetail> {
    let responder = responders::find_responder(pool, id)
        .await?
        .ok_or_else(|| Error::not_found("Responder", id))?;

    let location = match responder.location_id.as_deref() {
        Some(location_id) => locations::find_location(pool, location_id).await?,
        None => None,
    };

    let mut history = Vec::new();
    for dispatch in dispatches::list_dispatches_for_responder(pool, id).await? {
        let session = sessions::find_session(pool, &dispatch.session_id)
            .await?
            .ok_or_else(|| Error::not_found("Session", &dispatch.session_id))?;
        history.push(DispatchWithSession { dispatch, session });
    }

    Ok(ResponderDetail {
        responder,
        location,
        dispatches: history,
    })
}

pub async fn update_responder(
    pool: &SqlitePool,
    id: &str,
    changes: ResponderChanges,
) -> Result<Responder> {
    with_lock_retry("update responder", || update_responder_once(pool, id, changes.clone())).await
}

async fn update_responder_once(
    pool: &SqlitePool,
    id: &str,
    changes: ResponderChanges,
) -> Result<Responder> {
    let mut tx = pool.begin().await?;

    let mut responder = responders::find_responder(&mut *tx, id)
        .await?
        .ok_or_else(|| Error::not_found("Responder", id))?;

    if let Some(identifier) = changes.identifier {
        guards::ensure_identifier_unused(&mut tx, &identifier, Some(id)).await?;
        responder.identifier = identifier;
    }
    if let Some(responder_type) = changes.responder_type {
        responder.responder_type = responder_type;
    }
    if let Some(status) = changes.status {
        responder.status = status;
    }
    if let Some(location_id) = changes.location_id {
        ensure_location_exists(&mut tx, &location_id).await?;
        responder.location_id = Some(location_id);
    }
    responder.updated_at = time::now();

    responders::update_responder(&mut *tx, &responder)
        .await
        .map_err(|e| guards::classify_duplicate(e, "identifier", Some(&responder.identifier)))?;
    tx.commit().await?;

    info!(responder_id = %responder.id, "Updated responder");
    Ok(responder)
}

pub async fn update_responder_status(
    pool: &SqlitePool,
    id: &str,
    status: ResponderStatus,
) -> Result<Responder> {
    with_lock_retry("update responder status", || {
        update_responder_status_once(pool, id, status)
    })
    .await
}

async fn update_responder_status_once(
    pool: &SqlitePool,
    id: &str,
    status: ResponderStatus,
) -> Result<Responder> {
    let mut tx = pool.begin().await?;
    if !responders::set_responder_status(&mut *tx, id, status).await? {
        return Err(Error::not_found("Responder", id));
    }
    let responder = responders::find_responder(&mut *tx, id)
        .await?
        .ok_or_else(|| Error::not_found("Responder", id))?;
    tx.commit().await?;

    info!(responder_id = %id, status = %status, "Responder status set");
    Ok(responder)
}

/// Refused while any dispatch, open or closed, still references the responder
pub async fn delete_responder(pool: &SqlitePool, id: &str) -> Result<()> {
    with_lock_retry("delete responder", || delete_responder_once(pool, id)).await
}

async fn delete_responder_once(pool: &SqlitePool, id: &str) -> Result<()> {
    let mut tx = pool.begin().await?;

    if responders::find_responder(&mut *tx, id).await?.is_none() {
        return Err(Error::not_found("Responder", id));
    }

    let referencing = dispatches::count_dispatches_for_responder(&mut *tx, id).await?;
    if referencing > 0 {
        return Err(Error::InvalidState(format!(
            "Responder {} is referenced by {} dispatch(es)",
            id, referencing
        )));
    }

    responders::delete_responder(&mut *tx, id).await?;
    tx.commit().await?;

    info!(responder_id = %id, "Deleted responder");
    Ok(())
}
