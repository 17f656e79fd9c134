//! Workflow operations
//!
//! Each public function is one operation of the dispatch tracker. Writes
//! that touch more than one row run inside a single transaction, and every
//! statement in that transaction goes through it.

pub mod callers;
pub mod dispatch;
pub mod guards;
pub mod locations;
pub mod responders;
pub mod sessions;
