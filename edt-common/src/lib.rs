//! # EDT Common Library
//!
//! Shared code for the emergency dispatch tracker services:
//! - Entity models and status enums
//! - Request input types and shape validation
//! - Status transition rules for sessions, dispatches and responders
//! - Database initialization
//! - Configuration loading
//! - Error taxonomy

pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod requests;
pub mod time;
pub mod transitions;
pub mod validation;

pub use error::{Error, FieldError, Result};
