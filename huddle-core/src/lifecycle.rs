//! Meeting lifecycle coordinator.
//!
//! Maps observed vendor call state onto the persisted meeting status. This is
//! a reactive controller, not a server-authoritative state machine: the
//! in-call client reports what it saw (as a tagged `CallEvent`) and the
//! decision functions here say which status write, if any, follows. Status
//! stays client-asserted; the only suppression is the same-status no-op.
//!
//! Mapping:
//! - joined while `upcoming`            -> mark `active` (stamps started_at)
//! - left                                -> mark `completed` (stamps ended_at)
//! - last participant leaves an `active`
//!   call                                -> end the call, then mark `completed`
//! - join is refused for completed/ended or cancelled meetings
//! - cancel is allowed only from `upcoming`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::MeetingStatus;

/// Call state as observed from the vendor SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallingState {
    NotJoined,
    Joining,
    Joined,
    Left,
}

/// One observation reported by an in-call participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallEvent {
    StateChanged { state: CallingState },
    ParticipantLeft { remaining: u32 },
}

/// Status write implied by an event, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    MarkActive,
    MarkCompleted,
    /// Leave the vendor call, then mark completed. Emitted when this
    /// participant is the last one remaining.
    EndCall,
}

impl LifecycleAction {
    pub fn target_status(&self) -> MeetingStatus {
        match self {
            LifecycleAction::MarkActive => MeetingStatus::Active,
            LifecycleAction::MarkCompleted | LifecycleAction::EndCall => MeetingStatus::Completed,
        }
    }
}

/// Why a join attempt was refused. Carries the redirect target shown to the
/// user alongside the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinRejection {
    AlreadyEnded,
    Cancelled,
}

impl JoinRejection {
    pub fn message(&self) -> &'static str {
        match self {
            JoinRejection::AlreadyEnded => "This meeting has already ended.",
            JoinRejection::Cancelled => "This meeting has been cancelled.",
        }
    }

    pub fn redirect(&self) -> &'static str {
        "/meetings"
    }
}

/// Guard evaluated before a participant may join.
pub fn check_join(
    status: MeetingStatus,
    ended_at: Option<DateTime<Utc>>,
) -> Result<(), JoinRejection> {
    if status == MeetingStatus::Completed || ended_at.is_some() {
        return Err(JoinRejection::AlreadyEnded);
    }
    if status == MeetingStatus::Cancelled {
        return Err(JoinRejection::Cancelled);
    }
    Ok(())
}

/// Decide which status write an observed event implies for a meeting
/// currently in `status`. `None` means no write.
pub fn decide(status: MeetingStatus, event: CallEvent) -> Option<LifecycleAction> {
    match event {
        CallEvent::StateChanged {
            state: CallingState::Joined,
        } if status == MeetingStatus::Upcoming => Some(LifecycleAction::MarkActive),
        CallEvent::StateChanged {
            state: CallingState::Left,
        } if status != MeetingStatus::Completed => Some(LifecycleAction::MarkCompleted),
        CallEvent::ParticipantLeft { remaining }
            if remaining <= 1 && status == MeetingStatus::Active =>
        {
            Some(LifecycleAction::EndCall)
        }
        _ => None,
    }
}

/// Cancelling skips `active` entirely and is only offered for meetings that
/// have not started.
pub fn can_cancel(status: MeetingStatus) -> bool {
    status == MeetingStatus::Upcoming
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined() -> CallEvent {
        CallEvent::StateChanged {
            state: CallingState::Joined,
        }
    }

    fn left() -> CallEvent {
        CallEvent::StateChanged {
            state: CallingState::Left,
        }
    }

    #[test]
    fn joining_an_upcoming_meeting_marks_it_active() {
        assert_eq!(
            decide(MeetingStatus::Upcoming, joined()),
            Some(LifecycleAction::MarkActive)
        );
    }

    #[test]
    fn joining_an_already_active_meeting_is_a_no_op() {
        assert_eq!(decide(MeetingStatus::Active, joined()), None);
    }

    #[test]
    fn leaving_completes_the_meeting() {
        assert_eq!(
            decide(MeetingStatus::Active, left()),
            Some(LifecycleAction::MarkCompleted)
        );
        assert_eq!(
            decide(MeetingStatus::Upcoming, left()),
            Some(LifecycleAction::MarkCompleted)
        );
    }

    #[test]
    fn leaving_a_completed_meeting_writes_nothing() {
        assert_eq!(decide(MeetingStatus::Completed, left()), None);
    }

    #[test]
    fn last_participant_leaving_ends_an_active_call() {
        let event = CallEvent::ParticipantLeft { remaining: 1 };
        assert_eq!(
            decide(MeetingStatus::Active, event),
            Some(LifecycleAction::EndCall)
        );
        assert_eq!(
            LifecycleAction::EndCall.target_status(),
            MeetingStatus::Completed
        );
    }

    #[test]
    fn participant_leaving_with_others_remaining_is_ignored() {
        let event = CallEvent::ParticipantLeft { remaining: 3 };
        assert_eq!(decide(MeetingStatus::Active, event), None);
    }

    #[test]
    fn participant_left_outside_an_active_call_is_ignored() {
        let event = CallEvent::ParticipantLeft { remaining: 0 };
        assert_eq!(decide(MeetingStatus::Upcoming, event), None);
        assert_eq!(decide(MeetingStatus::Completed, event), None);
    }

    #[test]
    fn join_guard_rejects_completed_or_ended_meetings() {
        assert_eq!(
            check_join(MeetingStatus::Completed, None),
            Err(JoinRejection::AlreadyEnded)
        );
        // ended_at set but status lagging behind still counts as ended
        assert_eq!(
            check_join(MeetingStatus::Active, Some(chrono::Utc::now())),
            Err(JoinRejection::AlreadyEnded)
        );
    }

    #[test]
    fn join_guard_rejects_cancelled_meetings_with_redirect() {
        let rejection = check_join(MeetingStatus::Cancelled, None).unwrap_err();
        assert_eq!(rejection, JoinRejection::Cancelled);
        assert_eq!(rejection.redirect(), "/meetings");
        assert_eq!(rejection.message(), "This meeting has been cancelled.");
    }

    #[test]
    fn join_guard_allows_upcoming_and_active() {
        assert!(check_join(MeetingStatus::Upcoming, None).is_ok());
        assert!(check_join(MeetingStatus::Active, None).is_ok());
    }

    #[test]
    fn cancel_only_from_upcoming() {
        assert!(can_cancel(MeetingStatus::Upcoming));
        assert!(!can_cancel(MeetingStatus::Active));
        assert!(!can_cancel(MeetingStatus::Completed));
        assert!(!can_cancel(MeetingStatus::Cancelled));
        assert!(!can_cancel(MeetingStatus::Processing));
    }

    #[test]
    fn call_events_round_trip_as_tagged_json() {
        let event = CallEvent::ParticipantLeft { remaining: 2 };
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "participant_left", "remaining": 2})
        );

        let parsed: CallEvent = serde_json::from_value(serde_json::json!({
            "type": "state_changed", "state": "joined"
        }))
        .unwrap();
        assert_eq!(parsed, joined());
    }
}
