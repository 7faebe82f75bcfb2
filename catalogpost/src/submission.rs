use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle of a single submission, owned by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubmissionState {
    #[default]
    Idle,
    Uploading,
    Persisting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionEvent {
    Submit,
    UploadSucceeded,
    UploadFailed,
    WriteSucceeded,
    WriteFailed,
    /// Outcome dispatched, or the operator edited the draft again
    Settle,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid submission transition: {event:?} in state {state}")]
pub struct TransitionError {
    pub state: SubmissionState,
    pub event: SubmissionEvent,
}

impl SubmissionState {
    pub fn apply(self, event: SubmissionEvent) -> Result<SubmissionState, TransitionError> {
        use SubmissionEvent::*;
        use SubmissionState::*;

        match (self, event) {
            (Idle | Failed, Submit) => Ok(Uploading),
            (Uploading, UploadSucceeded) => Ok(Persisting),
            (Uploading, UploadFailed) => Ok(Failed),
            (Persisting, WriteSucceeded) => Ok(Succeeded),
            (Persisting, WriteFailed) => Ok(Failed),
            (Succeeded | Failed | Idle, Settle) => Ok(Idle),
            (state, event) => Err(TransitionError { state, event }),
        }
    }

    /// A remote call is outstanding
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubmissionState::Uploading | SubmissionState::Persisting)
    }

    pub fn can_start(&self) -> bool {
        matches!(self, SubmissionState::Idle | SubmissionState::Failed)
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Uploading => "uploading",
            SubmissionState::Persisting => "persisting",
            SubmissionState::Succeeded => "succeeded",
            SubmissionState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}
