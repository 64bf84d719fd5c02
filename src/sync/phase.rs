// src/sync/phase.rs

//! Lifecycle state tracked for each synchronisation phase.

use chrono::{DateTime, Utc};

use super::error::SyncError;
use super::event::SyncEvent;

/// Current state of one phase (setup, import or export).
///
/// Equality follows the payload of each variant; `Failed` errors are
/// compared by description (see [`SyncError`]).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PhaseState {
    #[default]
    NotStarted,
    InProgress {
        started: DateTime<Utc>,
    },
    Succeeded {
        started: DateTime<Utc>,
        ended: DateTime<Utc>,
    },
    Failed {
        started: DateTime<Utc>,
        ended: DateTime<Utc>,
        error: Option<SyncError>,
    },
}

impl PhaseState {
    /// State implied by the latest event for a phase.
    ///
    /// Prior state is never consulted: the newest event is authoritative. An
    /// event without a start time (with or without an end time) resets the
    /// phase to `NotStarted`.
    pub fn apply(event: &SyncEvent) -> PhaseState {
        match (event.start_time, event.end_time) {
            (Some(started), None) => PhaseState::InProgress { started },
            (Some(started), Some(ended)) if event.succeeded => PhaseState::Succeeded { started, ended },
            (Some(started), Some(ended)) => PhaseState::Failed {
                started,
                ended,
                error: event.error.clone(),
            },
            (None, _) => PhaseState::NotStarted,
        }
    }

    pub fn is_not_started(&self) -> bool {
        matches!(self, PhaseState::NotStarted)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, PhaseState::InProgress { .. })
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, PhaseState::Succeeded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PhaseState::Failed { .. })
    }

    /// Error of a failed phase, regardless of network conditions.
    pub fn error(&self) -> Option<&SyncError> {
        match self {
            PhaseState::Failed { error, .. } => error.as_ref(),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PhaseState::NotStarted => "not_started",
            PhaseState::InProgress { .. } => "in_progress",
            PhaseState::Succeeded { .. } => "succeeded",
            PhaseState::Failed { .. } => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::event::Phase;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn event(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>, succeeded: bool, error: Option<&str>) -> SyncEvent {
        SyncEvent {
            phase: Phase::Import,
            start_time: start,
            end_time: end,
            succeeded,
            error: error.map(SyncError::msg),
        }
    }

    #[test]
    fn test_start_without_end_is_in_progress() {
        // A missing end time wins over the success flag.
        let state = PhaseState::apply(&event(Some(t0()), None, false, Some("ignored")));
        assert_eq!(state, PhaseState::InProgress { started: t0() });
    }

    #[test]
    fn test_completed_events() {
        let end = t0() + Duration::seconds(1);
        assert_eq!(
            PhaseState::apply(&event(Some(t0()), Some(end), true, None)),
            PhaseState::Succeeded { started: t0(), ended: end }
        );

        let failed = PhaseState::apply(&event(Some(t0()), Some(end), false, Some("X")));
        assert!(failed.is_failed());
        assert_eq!(failed.error().map(SyncError::description).as_deref(), Some("X"));
    }

    #[test]
    fn test_missing_start_resets() {
        assert_eq!(PhaseState::apply(&event(None, None, true, None)), PhaseState::NotStarted);
        assert_eq!(
            PhaseState::apply(&event(None, Some(t0()), false, Some("X"))),
            PhaseState::NotStarted
        );
    }

    #[test]
    fn test_last_event_decides() {
        let end = t0() + Duration::seconds(2);
        let history = [
            event(Some(t0()), None, false, None),
            event(Some(t0()), Some(end), false, Some("X")),
            event(Some(end), None, false, None),
        ];
        let mut state = PhaseState::default();
        for e in &history {
            state = PhaseState::apply(e);
        }
        assert_eq!(state, PhaseState::apply(history.last().unwrap()));
    }

    #[test]
    fn test_failed_equality_uses_error_description() {
        let end = t0() + Duration::seconds(2);
        let a = PhaseState::apply(&event(Some(t0()), Some(end), false, Some("X")));
        let b = PhaseState::apply(&event(Some(t0()), Some(end), false, Some("X")));
        let c = PhaseState::apply(&event(Some(t0()), Some(end), false, Some("Y")));
        let d = PhaseState::apply(&event(Some(t0()), Some(end), false, None));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_ne!(
            PhaseState::InProgress { started: t0() },
            PhaseState::InProgress { started: end }
        );
        assert_eq!(PhaseState::NotStarted, PhaseState::default());
    }
}
