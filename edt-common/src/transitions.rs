//! Status transition rules
//!
//! Pure functions only. The workflow services call these before touching
//! the store; nothing here performs I/O.
//!
//! Dispatch status drives responder status:
//!
//! | Dispatch   | Responder  |
//! |------------|------------|
//! | DISPATCHED | DISPATCHED |
//! | EN_ROUTE   | ON_ROUTE   |
//! | ARRIVED    | ON_SCENE   |
//! | COMPLETED  | AVAILABLE  |
//! | CANCELLED  | AVAILABLE  |

use crate::db::models::{
    DispatchStatus, EmergencyType, ResponderStatus, ResponderType, SessionStatus,
};
use crate::{Error, Result};

/// Responder status implied by setting a dispatch to `status`
pub fn responder_status_for(status: DispatchStatus) -> ResponderStatus {
    match status {
        DispatchStatus::Dispatched => ResponderStatus::Dispatched,
        DispatchStatus::EnRoute => ResponderStatus::OnRoute,
        DispatchStatus::Arrived => ResponderStatus::OnScene,
        DispatchStatus::Completed | DispatchStatus::Cancelled => ResponderStatus::Available,
    }
}

impl DispatchStatus {
    /// Open dispatches hold their responder
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            DispatchStatus::Dispatched | DispatchStatus::EnRoute | DispatchStatus::Arrived
        )
    }
}

impl SessionStatus {
    /// Closed sessions carry an end time
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed
                | SessionStatus::Dropped
                | SessionStatus::Transferred
                | SessionStatus::NonEmergency
        )
    }

    /// Sessions accepting new dispatches
    pub fn accepts_dispatch(&self) -> bool {
        matches!(self, SessionStatus::Active | SessionStatus::EmergencyVerified)
    }
}

/// Whether the operator workflow allows moving a session from `from` to `to`
///
/// TRANSFERRED is enterable from anywhere and has no way out.
pub fn session_transition_allowed(from: SessionStatus, to: SessionStatus) -> bool {
    use SessionStatus::*;

    if from == Transferred {
        return false;
    }

    match to {
        EmergencyVerified => from == Active,
        Dispatched => from == EmergencyVerified,
        Completed => from == Dispatched,
        Dropped | NonEmergency => from != Completed,
        Transferred => true,
        Active => false,
    }
}

/// Reject an illegal session transition
pub fn validate_session_transition(from: SessionStatus, to: SessionStatus) -> Result<()> {
    if session_transition_allowed(from, to) {
        Ok(())
    } else {
        Err(Error::InvalidState(format!(
            "Session cannot move from {} to {}",
            from, to
        )))
    }
}

/// Precondition for CreateDispatch on the session side
pub fn ensure_session_dispatchable(session_id: &str, status: SessionStatus) -> Result<()> {
    if status.accepts_dispatch() {
        Ok(())
    } else {
        Err(Error::InvalidState(format!(
            "Session {} is {}; dispatch requires ACTIVE or EMERGENCY_VERIFIED",
            session_id, status
        )))
    }
}

/// Precondition for CreateDispatch on the responder side
pub fn ensure_responder_available(responder_id: &str, status: ResponderStatus) -> Result<()> {
    if status == ResponderStatus::Available {
        Ok(())
    } else {
        Err(Error::InvalidState(format!(
            "Responder {} is {}; dispatch requires AVAILABLE",
            responder_id, status
        )))
    }
}

/// Responder type suited to an emergency, if any
pub fn responder_type_for(emergency: EmergencyType) -> Option<ResponderType> {
    match emergency {
        EmergencyType::Medical => Some(ResponderType::Ambulance),
        EmergencyType::Police => Some(ResponderType::Police),
        EmergencyType::Fire => Some(ResponderType::Fire),
        EmergencyType::Other => None,
    }
}
