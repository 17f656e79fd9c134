//! Session and transcript operations

use edt_common::db::models::{
    DispatchWithResponder, Session, SessionDetail, SessionStatus, SessionTranscript,
};
use edt_common::db::retry::with_lock_retry;
use edt_common::requests::{NewSession, NewTranscriptEntry, SessionChanges};
use edt_common::transitions::validate_session_transition;
use edt_common::{ids, time, Error, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::db::{callers, dispatches, locations, responders, sessions, transcripts};

async fn ensure_caller_exists(conn: &mut SqliteConnection, caller_id: &str) -> Result<()> {
    match callers::find_caller(&mut *conn, caller_id).await? {
        Some(_) => Ok(()),
        None => Err(Error::not_found("Caller", caller_id)),
    }
}

async fn ensure_location_exists(conn: &mut SqliteConnection, location_id: &str) -> Result<()> {
    match locations::find_location(&mut *conn, location_id).await? {
        Some(_) => Ok(()),
        None => Err(Error::not_found("Location", location_id)),
    }
}

/// Start a new call session in ACTIVE
///
/// A phone number without a caller id links the session to the caller
/// already registered under that number, if there is one.
pub async fn create_session(pool: &SqlitePool, request: NewSession) -> Result<Session> {
    with_lock_retry("create session", || create_session_once(pool, request.clone())).await
}

async fn create_session_once(pool: &SqlitePool, request: NewSession) -> Result<Session> {
    let mut tx = pool.begin().await?;

    let caller_id = match (request.caller_id, request.phone_number.as_deref()) {
        (Some(caller_id), _) => {
            ensure_caller_exists(&mut tx, &caller_id).await?;
            Some(caller_id)
        }
        (None, Some(phone_number)) => callers::find_caller_by_phone(&mut *tx, phone_number, None)
            .await?
            .map(|caller| caller.id),
        (None, None) => None,
    };
    if let Some(location_id) = request.location_id.as_deref() {
        ensure_location_exists(&mut tx, location_id).await?;
    }

    let now = time::now();
    let session = Session {
        id: ids::generate(),
        start_time: now,
        end_time: None,
        status: SessionStatus::Active,
        phone_number: request.phone_number,
        caller_id,
        emergency_type: request.emergency_type,
        location_id: request.location_id,
        description: request.description,
        priority_level: request.priority_level,
        response_notes: None,
        created_at: now,
        updated_at: now,
    };

    sessions::insert_session(&mut *tx, &session).await?;
    tx.commit().await?;

    info!(
        session_id = %session.id,
        caller_id = ?session.caller_id,
        emergency_type = ?session.emergency_type,
        "Created session"
    );
    Ok(session)
}

/// All sessions, newest first, each with its caller, location, transcript
/// and dispatches
pub async fn list_sessions(pool: &SqlitePool) -> Result<Vec<SessionDetail>> {
    let found = sessions::list_sessions(pool).await?;
    with_details_all(pool, found).await
}

pub async fn list_active_sessions(pool: &SqlitePool) -> Result<Vec<SessionDetail>> {
    let found = sessions::list_sessions_by_status(pool, SessionStatus::Active).await?;
    with_details_all(pool, found).await
}

pub async fn get_session(pool: &SqlitePool, id: &str) -> Result<SessionDetail> {
    let session = sessions::find_session(pool, id)
        .await?
        .ok_or_else(|| Error::not_found("Session", id))?;
    with_details(pool, session).await
}

async fn with_details(pool: &SqlitePool, session: Session) -> Result<SessionDetail> {
    let caller = match session.caller_id.as_deref() {
        Some(caller_id) => callers::find_caller(pool, caller_id).await?,
        None => None,
    };
    let location = match session.location_id.as_deref() {
        Some(location_id) => locations::find_location(pool, location_id).await?,
        None => None,
    };
    let transcript_entries = transcripts::list_transcript_for_session(pool, &session.id).await?;

    let mut assigned = Vec::new();
    for dispatch in dispatches::list_dispatches_for_session(pool, &session.id).await? {
        let responder = responders::find_responder(pool, &dispatch.responder_id)
            .await?
            .ok_or_else(|| Error::not_found("Responder", &dispatch.responder_id))?;
        assigned.push(DispatchWithResponder {
            dispatch,
            responder,
        });
    }

    Ok(SessionDetail {
        session,
        caller,
        location,
        transcript_entries,
        dispatches: assigned,
    })
}

async fn with_details_all(pool: &SqlitePool, found: Vec<Session>) -> Result<Vec<SessionDetail>> {
    let mut out = Vec::with_capacity(found.len());
    for session in found {
        out.push(with_details(pool, session).await?);
    }
    Ok(out)
}

pub async fn update_session(
    pool: &SqlitePool,
    id: &str,
    changes: SessionChanges,
) -> Result<Session> {
    with_lock_retry("update session", || update_session_once(pool, id, changes.clone())).await
}

async fn update_session_once(
    pool: &SqlitePool,
    id: &str,
    changes: SessionChanges,
) -> Result<Session> {
    let mut tx = pool.begin().await?;

    let mut session = sessions::find_session(&mut *tx, id)
        .await?
        .ok_or_else(|| Error::not_found("Session", id))?;

    if let Some(caller_id) = changes.caller_id {
        ensure_caller_exists(&mut tx, &caller_id).await?;
        session.caller_id = Some(caller_id);
    }
    if let Some(location_id) = changes.location_id {
        ensure_location_exists(&mut tx, &location_id).await?;
        session.location_id = Some(location_id);
    }
    if changes.phone_number.is_some() {
        session.phone_number = changes.phone_number;
    }
    if changes.emergency_type.is_some() {
        session.emergency_type = changes.emergency_type;
    }
    if changes.description.is_some() {
        session.description = changes.description;
    }
    if changes.priority_level.is_some() {
        session.priority_level = changes.priority_level;
    }
    if changes.response_notes.is_some() {
        session.response_notes = changes.response_notes;
    }
    session.updated_at = time::now();

    sessions::update_session(&mut *tx, &session).await?;
    tx.commit().await?;

    info!(session_id = %session.id, "Updated session");
    Ok(session)
}

/// Move a session along the operator workflow
///
/// The write is conditional on the status read at the start; if another
/// request moved the session first, this one fails and changes nothing.
pub async fn update_session_status(
    pool: &SqlitePool,
    id: &str,
    status: SessionStatus,
) -> Result<Session> {
    with_lock_retry("update session status", || {
        update_session_status_once(pool, id, status)
    })
    .await
}

async fn update_session_status_once(
    pool: &SqlitePool,
    id: &str,
    status: SessionStatus,
) -> Result<Session> {
    let mut tx = pool.begin().await?;

    let current = sessions::find_session(&mut *tx, id)
        .await?
        .ok_or_else(|| Error::not_found("Session", id))?;

    validate_session_transition(current.status, status)?;

    let end_time = status.is_closed().then(time::now);
    let swapped =
        sessions::set_session_status_if(&mut *tx, id, current.status, status, end_time).await?;
    if !swapped {
        return Err(Error::InvalidState(format!(
            "Session {} is no longer {}",
            id, current.status
        )));
    }

    let session = sessions::find_session(&mut *tx, id)
        .await?
        .ok_or_else(|| Error::not_found("Session", id))?;
    tx.commit().await?;

    info!(
        session_id = %id,
        from = %current.status,
        to = %status,
        "Session status changed"
    );
    Ok(session)
}

/// Delete a session together with its transcript and closed dispatches
pub async fn delete_session(pool: &SqlitePool, id: &str) -> Result<()> {
    with_lock_retry("delete session", || delete_session_once(pool, id)).await
}

async fn delete_session_once(pool: &SqlitePool, id: &str) -> Result<()> {
    let mut tx = pool.begin().await?;

    if sessions::find_session(&mut *tx, id).await?.is_none() {
        return Err(Error::not_found("Session", id));
    }

    let open = dispatches::count_open_dispatches_for_session(&mut *tx, id).await?;
    if open > 0 {
        return Err(Error::InvalidState(format!(
            "Session {} has {} open dispatch(es)",
            id, open
        )));
    }

    let removed_entries = transcripts::delete_transcript_for_session(&mut *tx, id).await?;
    let removed_dispatches = dispatches::delete_dispatches_for_session(&mut *tx, id).await?;
    sessions::delete_session(&mut *tx, id).await?;
    tx.commit().await?;

    debug!(
        session_id = %id,
        removed_entries,
        removed_dispatches,
        "Removed session dependents"
    );
    info!(session_id = %id, "Deleted session");
    Ok(())
}

pub async fn add_transcript_entry(
    pool: &SqlitePool,
    session_id: &str,
    request: NewTranscriptEntry,
) -> Result<SessionTranscript> {
    with_lock_retry("add transcript entry", || {
        add_transcript_entry_once(pool, session_id, request.clone())
    })
    .await
}

async fn add_transcript_entry_once(
    pool: &SqlitePool,
    session_id: &str,
    request: NewTranscriptEntry,
) -> Result<SessionTranscript> {
    let mut tx = pool.begin().await?;

    if sessions::find_session(&mut *tx, session_id).await?.is_none() {
        return Err(Error::not_found("Session", session_id));
    }

    let entry = SessionTranscript {
        id: ids::generate(),
        session_id: session_id.to_string(),
        content: request.content,
        speaker_type: request.speaker_type,
        timestamp: time::now(),
    };

    transcripts::insert_transcript_entry(&mut *tx, &entry).await?;
    tx.commit().await?;

    debug!(
        session_id = %session_id,
        speaker = %entry.speaker_type,
        "Transcript entry added"
    );
    Ok(entry)
}
