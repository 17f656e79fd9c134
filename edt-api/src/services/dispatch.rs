//! Dispatch workflow
//!
//! A dispatch and its responder change together. CreateDispatch,
//! UpdateDispatch (when a status is given) and DeleteDispatch each write
//! both rows in one transaction, and the responder's status always comes
//! from [`responder_status_for`].

use edt_common::db::models::{
    Dispatch, DispatchDetail, DispatchStatus, Responder, ResponderStatus, Session, SessionStatus,
};
use edt_common::db::retry::with_lock_retry;
use edt_common::requests::{AutoDispatch, DispatchChanges, NewDispatch};
use edt_common::transitions::{
    ensure_responder_available, ensure_session_dispatchable, responder_status_for,
    responder_type_for, session_transition_allowed,
};
use edt_common::{ids, time, Error, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use crate::db::{dispatches, responders, sessions};

/// Assign an AVAILABLE responder to a session
///
/// Preconditions are checked in order and the first failure wins: the
/// session exists, it is ACTIVE or EMERGENCY_VERIFIED, the responder
/// exists, it is AVAILABLE. The responder is then claimed with a
/// conditional write, so a concurrent claim that landed after the read
/// fails this call with InvalidState.
pub async fn create_dispatch(pool: &SqlitePool, request: NewDispatch) -> Result<Dispatch> {
    with_lock_retry("create dispatch", || create_dispatch_once(pool, request.clone())).await
}

async fn create_dispatch_once(pool: &SqlitePool, request: NewDispatch) -> Result<Dispatch> {
    let mut tx = pool.begin().await?;

    let session = sessions::find_session(&mut *tx, &request.session_id)
        .await?
        .ok_or_else(|| Error::not_found("Session", &request.session_id))?;
    ensure_session_dispatchable(&session.id, session.status)?;

    let responder = responders::find_responder(&mut *tx, &request.responder_id)
        .await?
        .ok_or_else(|| Error::not_found("Responder", &request.responder_id))?;

    let dispatch = claim_and_insert(&mut tx, &session, &responder, request.notes).await?;

    tx.commit().await?;

    info!(
        dispatch_id = %dispatch.id,
        session_id = %dispatch.session_id,
        responder_id = %dispatch.responder_id,
        "Responder dispatched"
    );
    Ok(dispatch)
}

/// Claim an AVAILABLE responder and write the dispatch row
async fn claim_and_insert(
    conn: &mut SqliteConnection,
    session: &Session,
    responder: &Responder,
    notes: Option<String>,
) -> Result<Dispatch> {
    ensure_responder_available(&responder.id, responder.status)?;

    let claimed = responders::set_responder_status_if(
        &mut *conn,
        &responder.id,
        ResponderStatus::Available,
        responder_status_for(DispatchStatus::Dispatched),
    )
    .await?;
    if !claimed {
        warn!(
            responder_id = %responder.id,
            session_id = %session.id,
            "Responder claimed by a concurrent dispatch"
        );
        return Err(Error::InvalidState(format!(
            "Responder {} is no longer AVAILABLE",
            responder.id
        )));
    }

    let now = time::now();
    let dispatch = Dispatch {
        id: ids::generate(),
        session_id: session.id.clone(),
        responder_id: responder.id.clone(),
        dispatch_time: now,
        arrival_time: None,
        status: DispatchStatus::Dispatched,
        notes,
        created_at: now,
        updated_at: now,
    };
    dispatches::insert_dispatch(&mut *conn, &dispatch).await?;
    Ok(dispatch)
}

/// Apply field changes; a status change also moves the responder
pub async fn update_dispatch(
    pool: &SqlitePool,
    id: &str,
    changes: DispatchChanges,
) -> Result<Dispatch> {
    with_lock_retry("update dispatch", || {
        update_dispatch_once(pool, id, changes.clone())
    })
    .await
}

async fn update_dispatch_once(
    pool: &SqlitePool,
    id: &str,
    changes: DispatchChanges,
) -> Result<Dispatch> {
    let mut tx = pool.begin().await?;

    let mut dispatch = dispatches::find_dispatch(&mut *tx, id)
        .await?
        .ok_or_else(|| Error::not_found("Dispatch", id))?;

    if changes.arrival_time.is_some() {
        dispatch.arrival_time = changes.arrival_time;
    }
    if changes.notes.is_some() {
        dispatch.notes = changes.notes;
    }
    if let Some(status) = changes.status {
        dispatch.status = status;
    }
    dispatch.updated_at = time::now();

    dispatches::update_dispatch(&mut *tx, &dispatch).await?;

    if let Some(status) = changes.status {
        let responder_status = responder_status_for(status);
        if !responders::set_responder_status(&mut *tx, &dispatch.responder_id, responder_status)
            .await?
        {
            return Err(Error::not_found("Responder", &dispatch.responder_id));
        }
        info!(
            dispatch_id = %dispatch.id,
            responder_id = %dispatch.responder_id,
            dispatch_status = %status,
            responder_status = %responder_status,
            "Dispatch status changed"
        );
    }

    tx.commit().await?;
    Ok(dispatch)
}

/// Remove a dispatch and return its responder to AVAILABLE
///
/// The reset happens whatever the dispatch status was.
pub async fn delete_dispatch(pool: &SqlitePool, id: &str) -> Result<()> {
    with_lock_retry("delete dispatch", || delete_dispatch_once(pool, id)).await
}

async fn delete_dispatch_once(pool: &SqlitePool, id: &str) -> Result<()> {
    let mut tx = pool.begin().await?;

    let dispatch = dispatches::find_dispatch(&mut *tx, id)
        .await?
        .ok_or_else(|| Error::not_found("Dispatch", id))?;

    dispatches::delete_dispatch(&mut *tx, id).await?;
    responders::set_responder_status(&mut *tx, &dispatch.responder_id, ResponderStatus::Available)
        .await?;

    tx.commit().await?;

    info!(
        dispatch_id = %id,
        responder_id = %dispatch.responder_id,
        "Dispatch deleted, responder released"
    );
    Ok(())
}

/// Dispatch the newest suitable AVAILABLE responder to a session
///
/// The responder type comes from the session's emergency type and
/// candidates are taken newest first. Selection, claim and dispatch row
/// share one transaction. An EMERGENCY_VERIFIED session moves to
/// DISPATCHED in the same transaction; an ACTIVE session keeps its status.
pub async fn auto_dispatch(pool: &SqlitePool, request: AutoDispatch) -> Result<Dispatch> {
    with_lock_retry("auto dispatch", || auto_dispatch_once(pool, request.clone())).await
}

async fn auto_dispatch_once(pool: &SqlitePool, request: AutoDispatch) -> Result<Dispatch> {
    let mut tx = pool.begin().await?;

    let session = sessions::find_session(&mut *tx, &request.session_id)
        .await?
        .ok_or_else(|| Error::not_found("Session", &request.session_id))?;
    ensure_session_dispatchable(&session.id, session.status)?;

    let emergency = session.emergency_type.ok_or_else(|| {
        Error::InvalidState(format!("Session {} has no emergency type", session.id))
    })?;
    let responder_type = responder_type_for(emergency).ok_or_else(|| {
        Error::InvalidState(format!("No responder type handles {} emergencies", emergency))
    })?;

    let candidates = responders::list_available_responders(
        &mut *tx,
        Some(responder_type),
        request.location_id.as_deref(),
    )
    .await?;
    let responder = candidates.into_iter().next().ok_or_else(|| {
        Error::InvalidState(format!("No {} responder is AVAILABLE", responder_type))
    })?;

    info!(
        session_id = %session.id,
        responder_id = %responder.id,
        identifier = %responder.identifier,
        "Auto-selected responder"
    );

    let dispatch = claim_and_insert(&mut tx, &session, &responder, request.notes).await?;

    if session_transition_allowed(session.status, SessionStatus::Dispatched) {
        let moved = sessions::set_session_status_if(
            &mut *tx,
            &session.id,
            session.status,
            SessionStatus::Dispatched,
            None,
        )
        .await?;
        if !moved {
            return Err(Error::InvalidState(format!(
                "Session {} changed status during dispatch",
                session.id
            )));
        }
        info!(
            session_id = %session.id,
            from = %session.status,
            to = %SessionStatus::Dispatched,
            "Session status changed"
        );
    }

    tx.commit().await?;

    info!(
        dispatch_id = %dispatch.id,
        session_id = %dispatch.session_id,
        responder_id = %dispatch.responder_id,
        "Responder dispatched"
    );
    Ok(dispatch)
}

async fn with_relations(pool: &SqlitePool, dispatch: Dispatch) -> Result<DispatchDetail> {
    let session = sessions::find_session(pool, &dispatch.session_id)
        .await?
        .ok_or_else(|| Error::not_found("Session", &dispatch.session_id))?;
    let responder = responders::find_responder(pool, &dispatch.responder_id)
        .await?
        .ok_or_else(|| Error::not_found("Responder", &dispatch.responder_id))?;
    Ok(DispatchDetail {
        dispatch,
        session,
        responder,
    })
}

async fn with_relations_all(
    pool: &SqlitePool,
    found: Vec<Dispatch>,
) -> Result<Vec<DispatchDetail>> {
    let mut out = Vec::with_capacity(found.len());
    for dispatch in found {
        out.push(with_relations(pool, dispatch).await?);
    }
    Ok(out)
}

pub async fn list_dispatches(pool: &SqlitePool) -> Result<Vec<DispatchDetail>> {
    let found = dispatches::list_dispatches(pool).await?;
    with_relations_all(pool, found).await
}

pub async fn list_open_dispatches(pool: &SqlitePool) -> Result<Vec<DispatchDetail>> {
    let found = dispatches::list_open_dispatches(pool).await?;
    with_relations_all(pool, found).await
}

pub async fn get_dispatch(pool: &SqlitePool, id: &str) -> Result<DispatchDetail> {
    let dispatch = dispatches::find_dispatch(pool, id)
        .await?
        .ok_or_else(|| Error::not_found("Dispatch", id))?;
    with_relations(pool, dispatch).await
}
