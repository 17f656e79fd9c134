//! Entity store queries
//!
//! One module per table. Every query function takes any SQLite executor,
//! so the same call works against the pool or inside a transaction
//! (`&mut *tx`). Functions issue a single statement each; multi-statement
//! operations live in `crate::services` and own the transaction.

pub mod callers;
pub mod dispatches;
pub mod locations;
pub mod responders;
pub mod sessions;
pub mod transcripts;

use edt_common::{Error, Result};
use std::str::FromStr;

/// Parse an optional text-backed enum column
pub(crate) fn parse_opt<T>(value: Option<String>) -> Result<Option<T>>
where
    T: FromStr<Err = Error>,
{
    value.as_deref().map(str::parse).transpose()
}
