//! # Lifecycle Rules
//!
//! State transitions shared by sessions and café orders, plus the time
//! checks that guard them.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create_session ───────────────────────┐                               │
//! │   reserve_session / create_cafe_order   │                               │
//! │          │                              ▼                               │
//! │          ▼           Start                        Finish                │
//! │    ┌───────────┐ ───────────► ┌───────────┐ ───────────► ┌──────────┐  │
//! │    │ available │              │  running  │              │ finished │  │
//! │    └───────────┘              └───────────┘              └──────────┘  │
//! │          │                                                              │
//! │          ▼                                                              │
//! │       Delete (only from available)                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::types::RecordState;

/// A lifecycle action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Start,
    Finish,
}

impl Transition {
    fn verb(&self) -> &'static str {
        match self {
            Transition::Start => "start",
            Transition::Finish => "finish",
        }
    }
}

impl RecordState {
    /// Next state after `transition`, or `None` when it is not allowed.
    pub fn after(self, transition: Transition) -> Option<RecordState> {
        match (self, transition) {
            (RecordState::Available, Transition::Start) => Some(RecordState::Running),
            (RecordState::Running, Transition::Finish) => Some(RecordState::Finished),
            _ => None,
        }
    }
}

/// Checks a transition and returns the resulting state.
pub fn check_transition(
    entity: &str,
    id: &str,
    state: RecordState,
    transition: Transition,
) -> CoreResult<RecordState> {
    state
        .after(transition)
        .ok_or_else(|| CoreError::invalid_transition(entity, id, state, transition.verb()))
}

/// Only available records may be deleted.
pub fn check_deletable(entity: &str, id: &str, state: RecordState) -> CoreResult<()> {
    if state == RecordState::Available {
        Ok(())
    } else {
        Err(CoreError::NotDeletable {
            entity: entity.to_string(),
            id: id.to_string(),
            state: state.to_string(),
        })
    }
}

/// Lines can change until the record is finished.
pub fn check_lines_editable(entity: &str, id: &str, state: RecordState) -> CoreResult<()> {
    if state == RecordState::Finished {
        return Err(CoreError::invalid_transition(entity, id, state, "change lines"));
    }
    Ok(())
}

/// Ending time must be strictly after starting time.
pub fn check_finish_time(starting: DateTime<Utc>, ending: DateTime<Utc>) -> CoreResult<()> {
    if ending <= starting {
        return Err(CoreError::InvalidTimeRange {
            starting: starting.to_rfc3339(),
            ending: ending.to_rfc3339(),
        });
    }
    Ok(())
}

/// A reservation must start in the future.
pub fn check_reservation_time(starting: DateTime<Utc>, now: DateTime<Utc>) -> CoreResult<()> {
    if starting <= now {
        return Err(CoreError::InvalidTimeRange {
            starting: now.to_rfc3339(),
            ending: starting.to_rfc3339(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_transitions() {
        assert_eq!(
            check_transition("Session", "s1", RecordState::Available, Transition::Start).unwrap(),
            RecordState::Running
        );
        assert_eq!(
            check_transition("Session", "s1", RecordState::Running, Transition::Finish).unwrap(),
            RecordState::Finished
        );

        let err =
            check_transition("Session", "s1", RecordState::Available, Transition::Finish).unwrap_err();
        assert_eq!(err.to_string(), "Session s1 is available, cannot finish");
        assert!(check_transition("Cafe order", "o1", RecordState::Running, Transition::Start).is_err());
        assert!(check_transition("Cafe order", "o1", RecordState::Finished, Transition::Finish).is_err());
    }

    #[test]
    fn test_delete_only_when_available() {
        assert!(check_deletable("Session", "s1", RecordState::Available).is_ok());
        assert!(matches!(
            check_deletable("Session", "s1", RecordState::Running),
            Err(CoreError::NotDeletable { .. })
        ));
        assert!(check_deletable("Session", "s1", RecordState::Finished).is_err());
    }

    #[test]
    fn test_lines_editable() {
        assert!(check_lines_editable("Session", "s1", RecordState::Running).is_ok());
        assert!(check_lines_editable("Session", "s1", RecordState::Finished).is_err());
    }

    #[test]
    fn test_finish_time_must_be_after_start() {
        let start = Utc::now();
        assert!(check_finish_time(start, start + Duration::seconds(1)).is_ok());
        assert!(matches!(
            check_finish_time(start, start),
            Err(CoreError::InvalidTimeRange { .. })
        ));
        assert!(check_finish_time(start, start - Duration::minutes(5)).is_err());
    }

    #[test]
    fn test_reservation_time() {
        let now = Utc::now();
        assert!(check_reservation_time(now + Duration::hours(1), now).is_ok());
        assert!(check_reservation_time(now, now).is_err());
    }
}
