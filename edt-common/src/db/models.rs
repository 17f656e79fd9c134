//! Database models
//!
//! Entity records as stored, the status enums that drive the dispatch
//! workflow, and the read models returned with related entities included.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Declares a text-backed enum with its exact wire/store spelling.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::Internal(format!(
                        "Unknown {} value: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

text_enum!(
    /// Kind of field unit
    ResponderType {
        Ambulance => "AMBULANCE",
        Police => "POLICE",
        Fire => "FIRE",
        Other => "OTHER",
    }
);

text_enum!(
    /// Responder availability lifecycle
    ResponderStatus {
        Available => "AVAILABLE",
        Dispatched => "DISPATCHED",
        OnRoute => "ON_ROUTE",
        OnScene => "ON_SCENE",
        Returning => "RETURNING",
        OutOfService => "OUT_OF_SERVICE",
    }
);

text_enum!(
    /// Operator workflow state of an emergency call
    SessionStatus {
        Active => "ACTIVE",
        EmergencyVerified => "EMERGENCY_VERIFIED",
        Dispatched => "DISPATCHED",
        Completed => "COMPLETED",
        Dropped => "DROPPED",
        Transferred => "TRANSFERRED",
        NonEmergency => "NON_EMERGENCY",
    }
);

text_enum!(
    /// Emergency category reported for a session
    EmergencyType {
        Medical => "MEDICAL",
        Police => "POLICE",
        Fire => "FIRE",
        Other => "OTHER",
    }
);

text_enum!(
    /// Who spoke a transcript line
    SpeakerType {
        Agent => "AGENT",
        Caller => "CALLER",
        System => "SYSTEM",
    }
);

text_enum!(
    /// Lifecycle of one responder assignment
    DispatchStatus {
        Dispatched => "DISPATCHED",
        EnRoute => "EN_ROUTE",
        Arrived => "ARRIVED",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub id: String,
    pub phone_number: Option<String>,
    pub name: Option<String>,
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub address: Option<String>,
    pub landmark: Option<String>,
    pub gps_coordinates: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Responder {
    pub id: String,
    pub responder_type: ResponderType,
    pub identifier: String,
    pub status: ResponderStatus,
    pub location_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub phone_number: Option<String>,
    pub caller_id: Option<String>,
    pub emergency_type: Option<EmergencyType>,
    pub location_id: Option<String>,
    pub description: Option<String>,
    pub priority_level: Option<i64>,
    pub response_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTranscript {
    pub id: String,
    pub session_id: String,
    pub content: String,
    pub speaker_type: SpeakerType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispatch {
    pub id: String,
    pub session_id: String,
    pub responder_id: String,
    pub dispatch_time: DateTime<Utc>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub status: DispatchStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ----------------------------------------------------------------------
// Read models
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerDetail {
    #[serde(flatten)]
    pub caller: Caller,
    pub sessions: Vec<Session>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDetail {
    #[serde(flatten)]
    pub location: Location,
    pub sessions: Vec<Session>,
    pub responders: Vec<Responder>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponderWithLocation {
    #[serde(flatten)]
    pub responder: Responder,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponderDetail {
    #[serde(flatten)]
    pub responder: Responder,
    pub location: Option<Location>,
    pub dispatches: Vec<DispatchWithSession>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchWithSession {
    #[serde(flatten)]
    pub dispatch: Dispatch,
    pub session: Session,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchWithResponder {
    #[serde(flatten)]
    pub dispatch: Dispatch,
    pub responder: Responder,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchDetail {
    #[serde(flatten)]
    pub dispatch: Dispatch,
    pub session: Session,
    pub responder: Responder,
}

/// Session with caller, location, transcript and dispatches included
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: Session,
    pub caller: Option<Caller>,
    pub location: Option<Location>,
    pub transcript_entries: Vec<SessionTranscript>,
    pub dispatches: Vec<DispatchWithResponder>,
}
