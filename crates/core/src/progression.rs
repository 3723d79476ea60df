//! Progression transitions driven over a [`QuestLine`].
//!
//! These functions only mutate the in-memory line and report which
//! assignment write (if any) the caller must persist.

use crate::assignment::AssignmentStatus;
use crate::error::CoreError;
use crate::quest_line::{LineStep, QuestLine};
use crate::types::StepPosition;

/// An assignment write produced by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub position: StepPosition,
    pub status: AssignmentStatus,
}

/// Outcome of submitting an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Wrong answer. Nothing is persisted.
    Incorrect,
    /// Correct answer on a non-final step; the line moved to `position`.
    Advanced { position: StepPosition },
    /// Correct answer on the final step.
    Finished { position: StepPosition },
}

impl AnswerOutcome {
    /// The assignment write this outcome requires.
    pub fn transition(self) -> Option<Transition> {
        match self {
            AnswerOutcome::Incorrect => None,
            AnswerOutcome::Advanced { position } => Some(Transition {
                position,
                status: AssignmentStatus::InProgress,
            }),
            AnswerOutcome::Finished { position } => Some(Transition {
                position,
                status: AssignmentStatus::Finished,
            }),
        }
    }
}

/// Start a not-yet-started line at its first step.
pub fn start<S: LineStep>(line: &mut QuestLine<S>) -> Result<Transition, CoreError> {
    line.status().ensure_can_start()?;
    if line.position() != 0 {
        return Err(CoreError::Internal(format!(
            "unstarted assignment at position {}",
            line.position()
        )));
    }
    line.set_status(AssignmentStatus::InProgress);
    Ok(Transition {
        position: line.position(),
        status: AssignmentStatus::InProgress,
    })
}

/// Evaluate `submitted` against the current step and move the line forward
/// on a match. The final step's match finishes the line and attaches
/// `final_message`.
pub fn submit_answer<S: LineStep>(
    line: &mut QuestLine<S>,
    submitted: &str,
    final_message: Option<&str>,
) -> Result<AnswerOutcome, CoreError> {
    line.status().ensure_can_answer()?;

    if !line.evaluate_answer(submitted) {
        return Ok(AnswerOutcome::Incorrect);
    }

    if line.is_last_step() {
        line.finish(final_message.map(str::to_owned));
        return Ok(AnswerOutcome::Finished {
            position: line.position(),
        });
    }

    line.advance()?;
    Ok(AnswerOutcome::Advanced {
        position: line.position(),
    })
}
