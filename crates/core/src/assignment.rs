//! Assignment status state machine.
//!
//! `not_started` -> `in_progress` -> `finished`. There are no backward
//! transitions and `finished` is terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Progression status of one recipient on one quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    NotStarted,
    InProgress,
    Finished,
}

impl AssignmentStatus {
    /// The value stored in `quest_to_email.status`.
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::NotStarted => "not_started",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Finished => "finished",
        }
    }

    /// Whether `self -> next` is an allowed transition.
    ///
    /// `in_progress -> in_progress` is allowed (advancing a step).
    pub fn can_transition_to(self, next: AssignmentStatus) -> bool {
        matches!(
            (self, next),
            (AssignmentStatus::NotStarted, AssignmentStatus::InProgress)
                | (AssignmentStatus::InProgress, AssignmentStatus::InProgress)
                | (AssignmentStatus::InProgress, AssignmentStatus::Finished)
        )
    }

    /// Reject starting a quest that is already started or finished.
    pub fn ensure_can_start(self) -> Result<(), CoreError> {
        match self {
            AssignmentStatus::NotStarted => Ok(()),
            AssignmentStatus::InProgress => Err(CoreError::InvalidTransition(
                "quest_already_started: quest is already in progress".into(),
            )),
            AssignmentStatus::Finished => Err(CoreError::InvalidTransition(
                "quest_already_finished: quest is already finished".into(),
            )),
        }
    }

    /// Reject answering a quest that is not started or already finished.
    pub fn ensure_can_answer(self) -> Result<(), CoreError> {
        match self {
            AssignmentStatus::InProgress => Ok(()),
            AssignmentStatus::NotStarted => Err(CoreError::InvalidTransition(
                "quest_not_started: start the quest before answering".into(),
            )),
            AssignmentStatus::Finished => Err(CoreError::InvalidTransition(
                "quest_already_finished: quest is already finished".into(),
            )),
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(AssignmentStatus::NotStarted),
            "in_progress" => Ok(AssignmentStatus::InProgress),
            "finished" => Ok(AssignmentStatus::Finished),
            other => Err(CoreError::Internal(format!(
                "unknown assignment status '{other}'"
            ))),
        }
    }
}
