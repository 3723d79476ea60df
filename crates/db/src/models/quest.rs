//! Quest entity model and DTOs.

use questy_core::error::CoreError;
use questy_core::quest::{validate_name, validate_steps, validate_theme};
use questy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::step::{CreateStep, Step};

/// A row from the `quests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Quest {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub owner: DbId,
    pub theme: Option<String>,
    pub final_message: Option<String>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A quest together with its steps ordered by `sort`.
#[derive(Debug, Clone, Serialize)]
pub struct QuestWithSteps {
    #[serde(flatten)]
    pub quest: Quest,
    pub steps: Vec<Step>,
}

/// A quest assigned to a recipient, joined with that recipient's progress.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AvailableQuest {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub theme: Option<String>,
    pub owner: DbId,
    pub created_at: Timestamp,
    pub status: String,
    pub current_step: i32,
    pub step_count: i64,
}

/// DTO for creating a quest with its steps.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuest {
    pub name: String,
    pub description: Option<String>,
    pub theme: Option<String>,
    pub final_message: Option<String>,
    #[serde(default)]
    pub steps: Vec<CreateStep>,
}

/// DTO for a full-replace quest update.
///
/// `steps` replaces the stored step list entirely; an empty or omitted list
/// removes every step.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQuest {
    pub name: String,
    pub description: Option<String>,
    pub theme: Option<String>,
    pub final_message: Option<String>,
    #[serde(default)]
    pub steps: Vec<CreateStep>,
}

fn validate_quest(name: &str, theme: Option<&str>, steps: &[CreateStep]) -> Result<(), CoreError> {
    validate_name(name)
        .and_then(|()| validate_theme(theme))
        .and_then(|()| validate_steps(steps))
        .map_err(CoreError::Validation)
}

impl CreateQuest {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_quest(&self.name, self.theme.as_deref(), &self.steps)
    }
}

impl UpdateQuest {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_quest(&self.name, self.theme.as_deref(), &self.steps)
    }
}
