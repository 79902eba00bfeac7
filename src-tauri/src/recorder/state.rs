//! Recording state management
//!
//! Defines the session state machine and the snapshot reported to the shell.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Current state of the recording system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordingState {
    /// No session
    Idle,
    /// Waiting on the OS permission prompt
    AwaitingPermission,
    /// Waiting on the screen-capture dialog
    AwaitingToken,
    /// Encoder running
    Recording,
}

impl Default for RecordingState {
    fn default() -> Self {
        Self::Idle
    }
}

impl RecordingState {
    /// Whether moving to `next` is an edge of the session state machine
    pub fn can_transition_to(self, next: RecordingState) -> bool {
        use RecordingState::*;
        matches!(
            (self, next),
            (Idle, AwaitingPermission)
                | (Idle, AwaitingToken)
                | (AwaitingPermission, AwaitingToken)
                | (AwaitingPermission, Idle)
                | (AwaitingToken, Recording)
                | (AwaitingToken, Idle)
                | (Recording, Idle)
        )
    }
}

/// Snapshot of the active session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Session identifier, also used in logs
    pub id: Uuid,

    pub state: RecordingState,

    /// When `start` was accepted
    pub started_at: DateTime<Utc>,

    /// Where the encoder writes
    pub output_path: PathBuf,
}
