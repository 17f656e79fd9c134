//! Request shape validation
//!
//! Deserialization already rejects wrong types and out-of-domain enum
//! values; `Validate` covers the remaining range and presence checks.

use crate::{Error, FieldError, Result};

/// Shape checks run before a request reaches the workflow core
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Collects field errors so a request reports all of them at once
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn non_blank(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "must not be empty");
        }
    }

    pub fn non_blank_opt(&mut self, field: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.non_blank(field, value);
        }
    }

    pub fn in_range_opt(&mut self, field: &str, value: Option<i64>, min: i64, max: i64) {
        if let Some(value) = value {
            if value < min || value > max {
                self.push(field, format!("must be between {} and {}", min, max));
            }
        }
    }

    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self.errors))
        }
    }
}
