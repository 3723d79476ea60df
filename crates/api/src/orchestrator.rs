//! Assignment orchestration: the use cases that drive a recipient through a
//! quest and that hand quests out to recipients.
//!
//! Every progression write is a compare-and-swap on the assignment's
//! `version`, so two concurrent submissions for the same recipient cannot
//! both advance the same step. The loser gets `Conflict` and nothing is
//! written. The assignment is always read before the steps: replacing a
//! quest's steps bumps every assignment's `version`, so a write evaluated
//! against steps that changed after the assignment was read is rejected.

use std::sync::Arc;

use questy_core::error::CoreError;
use questy_core::progression::{self, AnswerOutcome, Transition};
use questy_core::quest::{normalize_email, validate_email, validate_recipient_name};
use questy_core::quest_line::{QuestLine, QuestLineView};
use questy_core::types::DbId;
use questy_db::models::assignment::{Assignment, CreateAssignment};
use questy_db::models::step::Step;
use questy_db::repositories::{AssignmentRepo, QuestRepo};
use questy_db::DbPool;
use questy_events::bus::event_types;
use questy_events::{EventBus, Invitation, InvitationQueue, QuestEvent};
use serde_json::json;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Request-scoped facade over the stores, the event bus and the invitation
/// queue.
pub struct AssignmentOrchestrator {
    pool: DbPool,
    events: Arc<EventBus>,
    invitations: Option<InvitationQueue>,
}

impl AssignmentOrchestrator {
    pub fn new(pool: DbPool, events: Arc<EventBus>, invitations: Option<InvitationQueue>) -> Self {
        Self {
            pool,
            events,
            invitations,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.pool.clone(),
            Arc::clone(&state.event_bus),
            state.invitations.clone(),
        )
    }

    /// Assign an owned quest to a recipient and queue their invitation.
    ///
    /// The quest must have at least one step. Delivery is best-effort: a
    /// dropped invitation never undoes the assignment.
    pub async fn send_quest(
        &self,
        owner: &AuthUser,
        quest_id: DbId,
        email: &str,
        name: &str,
    ) -> Result<Assignment, CoreError> {
        let email = normalize_email(email);
        validate_email(&email).map_err(CoreError::Validation)?;
        validate_recipient_name(name).map_err(CoreError::Validation)?;
        let name = name.trim().to_string();

        let quest = QuestRepo::find_owned(&self.pool, quest_id, owner.user_id).await?;
        if quest.steps.is_empty() {
            return Err(CoreError::Validation(
                "quest_has_no_steps: can't send a quest without steps".into(),
            ));
        }

        let assignment = AssignmentRepo::create(
            &self.pool,
            &CreateAssignment {
                quest_id,
                email: email.clone(),
                name: name.clone(),
            },
        )
        .await?;

        tracing::info!(quest_id = %quest_id, email = %email, "Quest sent");
        self.events.publish(
            QuestEvent::new(event_types::QUEST_SENT, quest_id)
                .with_actor(owner.user_id)
                .with_recipient(email.clone())
                .with_payload(json!({ "name": name })),
        );

        if let Some(queue) = &self.invitations {
            queue.enqueue(Invitation {
                quest_id,
                quest_name: quest.quest.name.clone(),
                recipient_email: email,
                recipient_name: name,
                sender_name: owner.name.clone(),
            });
        }

        Ok(assignment)
    }

    /// Start a not-yet-started quest at its first step.
    pub async fn start_quest(&self, quest_id: DbId, email: &str) -> Result<QuestLineView, CoreError> {
        let assignment = AssignmentRepo::find(&self.pool, quest_id, email).await?;
        let quest = QuestRepo::find_assigned(&self.pool, quest_id, email).await?;
        if quest.steps.is_empty() {
            return Err(CoreError::Validation(
                "quest_has_no_steps: quest does not contain any steps".into(),
            ));
        }

        let mut line = QuestLine::new(quest.steps, None, assignment.status()?)?;
        let transition = progression::start(&mut line)?;
        self.persist(&assignment, transition).await?;

        tracing::info!(quest_id = %quest_id, email = %email, "Quest started");
        self.events.publish(
            QuestEvent::new(event_types::QUEST_STARTED, quest_id).with_recipient(email),
        );
        Ok(line.view())
    }

    /// Check `answer` against the recipient's current step.
    ///
    /// A wrong answer writes nothing and renders with `correct = false`.
    pub async fn check_answer(
        &self,
        quest_id: DbId,
        email: &str,
        answer: &str,
    ) -> Result<QuestLineView, CoreError> {
        let assignment = AssignmentRepo::find(&self.pool, quest_id, email).await?;
        let quest = QuestRepo::find_assigned(&self.pool, quest_id, email).await?;
        let status = assignment.status()?;
        status.ensure_can_answer()?;

        let mut line = Self::line_at(quest.steps, &assignment)?;
        let outcome =
            progression::submit_answer(&mut line, answer, quest.quest.final_message.as_deref())?;

        if let Some(transition) = outcome.transition() {
            self.persist(&assignment, transition).await?;
        }

        match outcome {
            AnswerOutcome::Incorrect => {
                tracing::debug!(quest_id = %quest_id, email = %email, "Incorrect answer");
            }
            AnswerOutcome::Advanced { position } => {
                self.events.publish(
                    QuestEvent::new(event_types::QUEST_STEP_COMPLETED, quest_id)
                        .with_recipient(email)
                        .with_payload(json!({ "position": position })),
                );
            }
            AnswerOutcome::Finished { position } => {
                tracing::info!(quest_id = %quest_id, email = %email, "Quest finished");
                self.events.publish(
                    QuestEvent::new(event_types::QUEST_FINISHED, quest_id)
                        .with_recipient(email)
                        .with_payload(json!({ "position": position })),
                );
            }
        }

        Ok(line.view())
    }

    /// Render the recipient's current progress without changing it.
    pub async fn get_status(&self, quest_id: DbId, email: &str) -> Result<QuestLineView, CoreError> {
        let assignment = AssignmentRepo::find(&self.pool, quest_id, email).await?;
        let quest = QuestRepo::find_assigned(&self.pool, quest_id, email).await?;
        let line = Self::line_at(quest.steps, &assignment)?;
        Ok(line.view())
    }

    fn line_at(steps: Vec<Step>, assignment: &Assignment) -> Result<QuestLine<Step>, CoreError> {
        QuestLine::new(steps, Some(assignment.current_step), assignment.status()?)
    }

    async fn persist(&self, assignment: &Assignment, transition: Transition) -> Result<(), CoreError> {
        let written = AssignmentRepo::transition(
            &self.pool,
            assignment.quest_id,
            &assignment.email,
            assignment.version,
            transition.position,
            transition.status,
        )
        .await?;

        if written.is_none() {
            tracing::warn!(
                quest_id = %assignment.quest_id,
                email = %assignment.email,
                "Assignment changed concurrently, rejecting stale write"
            );
            return Err(CoreError::Conflict(
                "assignment was modified concurrently; reload and retry".into(),
            ));
        }
        Ok(())
    }
}
