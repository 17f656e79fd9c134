//! Uniqueness guards
//!
//! The lookup runs on the caller's transaction so the check and the write
//! see the same snapshot. The UNIQUE constraints on `callers.phone_number`
//! and `responders.identifier` catch anything that slips between them;
//! [`classify_duplicate`] turns that violation into the same error the
//! lookup would have produced.

use edt_common::{Error, Result};
use sqlx::SqliteConnection;

use crate::db::{callers, responders};

/// Reject `phone_number` when another caller already holds it
pub async fn ensure_phone_unused(
    conn: &mut SqliteConnection,
    phone_number: Option<&str>,
    exclude_id: Option<&str>,
) -> Result<()> {
    let Some(phone_number) = phone_number else {
        return Ok(());
    };

    if callers::find_caller_by_phone(&mut *conn, phone_number, exclude_id)
        .await?
        .is_some()
    {
        return Err(Error::DuplicateValue {
            field: "phoneNumber",
            value: phone_number.to_string(),
        });
    }

    Ok(())
}

/// Reject `identifier` when another responder already holds it
pub async fn ensure_identifier_unused(
    conn: &mut SqliteConnection,
    identifier: &str,
    exclude_id: Option<&str>,
) -> Result<()> {
    if responders::find_responder_by_identifier(&mut *conn, identifier, exclude_id)
        .await?
        .is_some()
    {
        return Err(Error::DuplicateValue {
            field: "identifier",
            value: identifier.to_string(),
        });
    }

    Ok(())
}

/// Map a UNIQUE violation raised by a write to DuplicateValue
pub fn classify_duplicate(err: Error, field: &'static str, value: Option<&str>) -> Error {
    if err.is_unique_violation() {
        Error::DuplicateValue {
            field,
            value: value.unwrap_or_default().to_string(),
        }
    } else {
        err
    }
}
