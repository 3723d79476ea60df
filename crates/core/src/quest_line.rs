//! QuestLine: a request-scoped, resumable cursor over a quest's steps.
//!
//! A [`QuestLine`] is rebuilt on every request from the stored steps and the
//! recipient's assignment row. It owns the steps ordered by `sort`, a cursor
//! addressing the current step, the assignment status and, once an answer has
//! been evaluated, the correctness flag and the quest's final message.

use serde::Serialize;

use crate::answer::answer_matches;
use crate::assignment::AssignmentStatus;
use crate::error::CoreError;
use crate::types::{DbId, StepPosition};

/// The recipient-safe part of a step: everything except the accepted answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepPrompt {
    pub id: DbId,
    pub sort: i32,
    pub description: Option<String>,
    pub question_type: String,
    pub question_content: Option<String>,
    pub answer_type: String,
}

/// A step that can be traversed by a [`QuestLine`].
pub trait LineStep {
    /// Ordering key within the quest.
    fn sort(&self) -> i32;

    /// Accepted answers, in authoring order.
    fn accepted_answers(&self) -> &[String];

    /// Project the step into what a recipient may see.
    fn prompt(&self) -> StepPrompt;
}

/// Positional cursor over a quest's ordered steps.
#[derive(Debug, Clone)]
pub struct QuestLine<S> {
    steps: Vec<S>,
    cursor: usize,
    status: AssignmentStatus,
    correct: Option<bool>,
    final_message: Option<String>,
}

impl<S: LineStep> QuestLine<S> {
    /// Build a line positioned at `position` (absent means the first step).
    ///
    /// Fails with `Validation` when the quest has no steps or the position
    /// does not address a step.
    pub fn new(
        mut steps: Vec<S>,
        position: Option<StepPosition>,
        status: AssignmentStatus,
    ) -> Result<Self, CoreError> {
        if steps.is_empty() {
            return Err(CoreError::Validation(
                "quest_has_no_steps: quest does not contain any steps".into(),
            ));
        }
        steps.sort_by_key(|s| s.sort());

        let position = position.unwrap_or(0);
        let cursor = usize::try_from(position)
            .ok()
            .filter(|&c| c < steps.len())
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "step position {position} is out of range for {} steps",
                    steps.len()
                ))
            })?;

        Ok(Self {
            steps,
            cursor,
            status,
            correct: None,
            final_message: None,
        })
    }

    /// The step under the cursor.
    pub fn current_step(&self) -> &S {
        &self.steps[self.cursor]
    }

    /// Cursor position as stored in the assignment row.
    pub fn position(&self) -> StepPosition {
        // Cursor starts from a `StepPosition` and only moves within the steps.
        self.cursor as StepPosition
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn status(&self) -> AssignmentStatus {
        self.status
    }

    pub fn set_status(&mut self, status: AssignmentStatus) {
        self.status = status;
    }

    /// Result of the most recent [`evaluate_answer`](Self::evaluate_answer).
    pub fn correct(&self) -> Option<bool> {
        self.correct
    }

    pub fn final_message(&self) -> Option<&str> {
        self.final_message.as_deref()
    }

    /// True iff the cursor addresses the final step.
    pub fn is_last_step(&self) -> bool {
        self.cursor + 1 == self.steps.len()
    }

    /// Move the cursor to the next step.
    pub fn advance(&mut self) -> Result<(), CoreError> {
        if self.is_last_step() {
            return Err(CoreError::InvalidTransition(
                "cannot advance past the last step".into(),
            ));
        }
        self.cursor += 1;
        Ok(())
    }

    /// Compare a submission with the current step's accepted answers and
    /// record the outcome on the line.
    pub fn evaluate_answer(&mut self, submitted: &str) -> bool {
        let matched = answer_matches(submitted, self.current_step().accepted_answers());
        self.correct = Some(matched);
        matched
    }

    /// Mark the line finished and attach the quest's final message.
    pub fn finish(&mut self, final_message: Option<String>) {
        self.status = AssignmentStatus::Finished;
        self.final_message = final_message;
    }

    /// Render the line for a recipient.
    ///
    /// A finished line has no current step.
    pub fn view(&self) -> QuestLineView {
        let current_step = match self.status {
            AssignmentStatus::Finished => None,
            _ => Some(self.current_step().prompt()),
        };
        QuestLineView {
            status: self.status,
            position: self.position(),
            total_steps: self.steps.len(),
            is_last_step: self.is_last_step(),
            current_step,
            correct: self.correct,
            final_message: self.final_message.clone(),
        }
    }
}

/// Serializable rendering of a [`QuestLine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestLineView {
    pub status: AssignmentStatus,
    pub position: StepPosition,
    pub total_steps: usize,
    pub is_last_step: bool,
    pub current_step: Option<StepPrompt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_message: Option<String>,
}
