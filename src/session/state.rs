//! Capture phases and the pose-driven transition rules.

use crate::pose::PoseStatus;
use serde::Serialize;

/// Phase of a capture session. One authoritative value owned by the session
/// and read through its accessor every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    Initializing,
    WaitingForGolfer,
    GolferDetected,
    ReadyToCapture,
    Recording,
    Captured,
    Error,
}

impl CaptureState {
    pub fn label(self) -> &'static str {
        match self {
            CaptureState::Initializing => "initializing",
            CaptureState::WaitingForGolfer => "waiting_for_golfer",
            CaptureState::GolferDetected => "golfer_detected",
            CaptureState::ReadyToCapture => "ready_to_capture",
            CaptureState::Recording => "recording",
            CaptureState::Captured => "captured",
            CaptureState::Error => "error",
        }
    }

    /// Once armed, losing pose tracking must not cancel an in-progress
    /// swing; pose re-evaluation is suspended from here on.
    pub fn is_armed(self) -> bool {
        matches!(
            self,
            CaptureState::ReadyToCapture | CaptureState::Recording | CaptureState::Captured
        )
    }

    /// Presentation hint for a state border, not part of the contract.
    pub fn accent(self) -> &'static str {
        match self {
            CaptureState::WaitingForGolfer => "yellow",
            CaptureState::GolferDetected => "blue",
            CaptureState::ReadyToCapture | CaptureState::Captured => "green",
            CaptureState::Recording | CaptureState::Error => "red",
            CaptureState::Initializing => "neutral",
        }
    }
}

/// Decide the pose-driven transition for one tick, if any.
///
/// Only meaningful before the session is armed; the caller suspends pose
/// evaluation afterwards.
pub(super) fn pose_transition(state: CaptureState, status: PoseStatus) -> Option<CaptureState> {
    if state.is_armed() || matches!(state, CaptureState::Initializing | CaptureState::Error) {
        return None;
    }
    if !status.in_frame {
        return (state != CaptureState::WaitingForGolfer).then_some(CaptureState::WaitingForGolfer);
    }
    if status.in_address_position {
        return Some(CaptureState::ReadyToCapture);
    }
    (state == CaptureState::WaitingForGolfer).then_some(CaptureState::GolferDetected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(in_frame: bool, address: bool) -> PoseStatus {
        PoseStatus {
            in_frame,
            in_address_position: address,
            confidence: if in_frame { 0.9 } else { 0.0 },
        }
    }

    #[test]
    fn golfer_entering_frame_advances() {
        assert_eq!(
            pose_transition(CaptureState::WaitingForGolfer, status(true, false)),
            Some(CaptureState::GolferDetected)
        );
    }

    #[test]
    fn address_position_arms_from_either_pre_state() {
        for state in [CaptureState::WaitingForGolfer, CaptureState::GolferDetected] {
            assert_eq!(
                pose_transition(state, status(true, true)),
                Some(CaptureState::ReadyToCapture)
            );
        }
    }

    #[test]
    fn leaving_frame_resets_to_waiting() {
        assert_eq!(
            pose_transition(CaptureState::GolferDetected, status(false, false)),
            Some(CaptureState::WaitingForGolfer)
        );
        assert_eq!(
            pose_transition(CaptureState::WaitingForGolfer, status(false, false)),
            None
        );
    }

    #[test]
    fn armed_states_ignore_pose() {
        for state in [
            CaptureState::ReadyToCapture,
            CaptureState::Recording,
            CaptureState::Captured,
        ] {
            assert_eq!(pose_transition(state, status(false, false)), None);
            assert_eq!(pose_transition(state, status(true, true)), None);
        }
    }

    #[test]
    fn staying_in_frame_without_address_holds_detected() {
        assert_eq!(
            pose_transition(CaptureState::GolferDetected, status(true, false)),
            None
        );
    }
}
