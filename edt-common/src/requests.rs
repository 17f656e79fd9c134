//! Create/update request schemas
//!
//! Field names are camelCase on the wire. Unknown fields are ignored;
//! absent optional fields leave stored values untouched on update.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::db::models::{
    DispatchStatus, EmergencyType, ResponderStatus, ResponderType, SessionStatus, SpeakerType,
};
use crate::validation::{FieldErrors, Validate};
use crate::Result;

/// Lowest (most urgent) and highest session priority
pub const PRIORITY_RANGE: (i64, i64) = (1, 5);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCaller {
    pub phone_number: Option<String>,
    pub name: Option<String>,
    pub language: Option<String>,
}

impl Validate for NewCaller {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.non_blank_opt("phoneNumber", self.phone_number.as_deref());
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerChanges {
    pub phone_number: Option<String>,
    pub name: Option<String>,
    pub language: Option<String>,
}

impl Validate for CallerChanges {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.non_blank_opt("phoneNumber", self.phone_number.as_deref());
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    pub address: Option<String>,
    pub landmark: Option<String>,
    pub gps_coordinates: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
}

impl Validate for NewLocation {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationChanges {
    pub address: Option<String>,
    pub landmark: Option<String>,
    pub gps_coordinates: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
}

impl Validate for LocationChanges {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResponder {
    pub responder_type: ResponderType,
    pub identifier: String,
    pub status: Option<ResponderStatus>,
    pub location_id: Option<String>,
}

impl NewResponder {
    pub fn new(responder_type: ResponderType, identifier: impl Into<String>) -> Self {
        Self {
            responder_type,
            identifier: identifier.into(),
            status: None,
            location_id: None,
        }
    }
}

impl Validate for NewResponder {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.non_blank("identifier", &self.identifier);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponderChanges {
    pub responder_type: Option<ResponderType>,
    pub identifier: Option<String>,
    pub status: Option<ResponderStatus>,
    pub location_id: Option<String>,
}

impl Validate for ResponderChanges {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.non_blank_opt("identifier", self.identifier.as_deref());
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponderStatusChange {
    pub status: ResponderStatus,
}

impl Validate for ResponderStatusChange {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Query filters for available responders
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableResponderFilter {
    pub emergency_type: Option<EmergencyType>,
    pub location_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub phone_number: Option<String>,
    pub caller_id: Option<String>,
    pub emergency_type: Option<EmergencyType>,
    pub location_id: Option<String>,
    pub description: Option<String>,
    pub priority_level: Option<i64>,
}

impl Validate for NewSession {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.in_range_opt(
            "priorityLevel",
            self.priority_level,
            PRIORITY_RANGE.0,
            PRIORITY_RANGE.1,
        );
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionChanges {
    pub phone_number: Option<String>,
    pub caller_id: Option<String>,
    pub emergency_type: Option<EmergencyType>,
    pub location_id: Option<String>,
    pub description: Option<String>,
    pub priority_level: Option<i64>,
    pub response_notes: Option<String>,
}

impl Validate for SessionChanges {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.in_range_opt(
            "priorityLevel",
            self.priority_level,
            PRIORITY_RANGE.0,
            PRIORITY_RANGE.1,
        );
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusChange {
    pub status: SessionStatus,
}

impl Validate for SessionStatusChange {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTranscriptEntry {
    pub content: String,
    pub speaker_type: SpeakerType,
}

impl Validate for NewTranscriptEntry {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDispatch {
    pub session_id: String,
    pub responder_id: String,
    pub notes: Option<String>,
}

impl NewDispatch {
    pub fn new(session_id: impl Into<String>, responder_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            responder_id: responder_id.into(),
            notes: None,
        }
    }
}

impl Validate for NewDispatch {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.non_blank("sessionId", &self.session_id);
        errors.non_blank("responderId", &self.responder_id);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchChanges {
    pub arrival_time: Option<DateTime<Utc>>,
    pub status: Option<DispatchStatus>,
    pub notes: Option<String>,
}

impl DispatchChanges {
    pub fn status(status: DispatchStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl Validate for DispatchChanges {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Dispatch the first available responder matching the session's emergency
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoDispatch {
    pub session_id: String,
    pub location_id: Option<String>,
    pub notes: Option<String>,
}

impl Validate for AutoDispatch {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.non_blank("sessionId", &self.session_id);
        errors.into_result()
    }
}
