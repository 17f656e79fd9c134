//! Caller operations

use edt_common::db::models::{Caller, CallerDetail};
use edt_common::db::retry::with_lock_retry;
use edt_common::requests::{CallerChanges, NewCaller};
use edt_common::{ids, time, Error, Result};
use sqlx::SqlitePool;
use tracing::info;

use super::guards;
use crate::db::{callers, sessions};

pub async fn create_caller(pool: &SqlitePool, request: NewCaller) -> Result<Caller> {
    with_lock_retry("create caller", || create_caller_once(pool, request.clone())).await
}

async fn create_caller_once(pool: &SqlitePool, request: NewCaller) -> Result<Caller> {
    let now = time::now();
    let caller = Caller {
        id: ids::generate(),
        phone_number: request.phone_number,
        name: request.name,
        language: request.language,
        created_at: now,
        updated_at: now,
    };

    let mut tx = pool.begin().await?;
    guards::ensure_phone_unused(&mut tx, caller.phone_number.as_deref(), None).await?;
    callers::insert_caller(&mut *tx, &caller)
        .await
        .map_err(|e| guards::classify_duplicate(e, "phoneNumber", caller.phone_number.as_deref()))?;
    tx.commit().await?;

    info!(caller_id = %caller.id, "Created caller");
    Ok(caller)
}

async fn with_sessions(pool: &SqlitePool, caller: Caller) -> Result<CallerDetail> {
    let sessions = sessions::list_sessions_for_caller(pool, &caller.id).await?;
    Ok(CallerDetail { caller, sessions })
}

pub async fn list_callers(pool: &SqlitePool) -> Result<Vec<CallerDetail>> {
    let mut details = Vec::new();
    for caller in callers::list_callers(pool).await? {
        details.push(with_sessions(pool, caller).await?);
    }
    Ok(details)
}

pub async fn get_caller(pool: &SqlitePool, id: &str) -> Result<CallerDetail> {
    let caller = callers::find_caller(pool, id)
        .await?
        .ok_or_else(|| Error::not_found("Caller", id))?;
    with_sessions(pool, caller).await
}

pub async fn get_caller_by_phone(pool: &SqlitePool, phone_number: &str) -> Result<CallerDetail> {
    let caller = callers::find_caller_by_phone(pool, phone_number, None)
        .await?
        .ok_or_else(|| Error::not_found("Caller", phone_number))?;
    with_sessions(pool, caller).await
}

pub async fn update_caller(pool: &SqlitePool, id: &str, changes: CallerChanges) -> Result<Caller> {
    with_lock_retry("update caller", || update_caller_once(pool, id, changes.clone())).await
}

async fn update_caller_once(pool: &SqlitePool, id: &str, changes: CallerChanges) -> Result<Caller> {
    let mut tx = pool.begin().await?;

    let mut caller = callers::find_caller(&mut *tx, id)
        .await?
        .ok_or_else(|| Error::not_found("Caller", id))?;

    if let Some(phone_number) = changes.phone_number {
        guards::ensure_phone_unused(&mut tx, Some(&phone_number), Some(id)).await?;
        caller.phone_number = Some(phone_number);
    }
    if let Some(name) = changes.name {
        caller.name = Some(name);
    }
    if let Some(language) = changes.language {
        caller.language = Some(language);
    }
    caller.updated_at = time::now();

    callers::update_caller(&mut *tx, &caller)
        .await
        .map_err(|e| guards::classify_duplicate(e, "phoneNumber", caller.phone_number.as_deref()))?;
    tx.commit().await?;

    info!(caller_id = %caller.id, "Updated caller");
    Ok(caller)
}

/// Sessions that referenced the caller keep their phone number and lose the link
pub async fn delete_caller(pool: &SqlitePool, id: &str) -> Result<()> {
    if !callers::delete_caller(pool, id).await? {
        return Err(Error::not_found("Caller", id));
    }

    info!(caller_id = %id, "Deleted caller");
    Ok(())
}
