//! Identifier utilities
//!
//! Entity ids are opaque UUIDv4 strings assigned at creation.

use uuid::Uuid;

/// Generate a new entity id
pub fn generate() -> String {
    Uuid::new_v4().to_string()
}
