//! Step entity model and DTOs.

use questy_core::quest::{StepDraft, ANSWER_TEXT};
use questy_core::quest_line::{LineStep, StepPrompt};
use questy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `steps` table.
///
/// `answer_content` is a JSON array of accepted answers.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Step {
    pub id: DbId,
    pub quest_id: DbId,
    pub sort: i32,
    pub description: Option<String>,
    pub question_type: String,
    pub question_content: Option<String>,
    pub answer_type: String,
    pub answer_content: Json<Vec<String>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LineStep for Step {
    fn sort(&self) -> i32 {
        self.sort
    }

    fn accepted_answers(&self) -> &[String] {
        &self.answer_content.0
    }

    fn prompt(&self) -> StepPrompt {
        StepPrompt {
            id: self.id,
            sort: self.sort,
            description: self.description.clone(),
            question_type: self.question_type.clone(),
            question_content: self.question_content.clone(),
            answer_type: self.answer_type.clone(),
        }
    }
}

fn default_answer_type() -> String {
    ANSWER_TEXT.to_string()
}

/// DTO for one step of a quest create or full-replace update.
///
/// Any client-supplied step id is ignored; ids are regenerated on every write.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStep {
    pub sort: i32,
    pub description: Option<String>,
    pub question_type: String,
    pub question_content: Option<String>,
    #[serde(default = "default_answer_type")]
    pub answer_type: String,
    #[serde(default)]
    pub answer_content: Vec<String>,
}

impl StepDraft for CreateStep {
    fn sort(&self) -> i32 {
        self.sort
    }

    fn question_type(&self) -> &str {
        &self.question_type
    }

    fn question_content(&self) -> Option<&str> {
        self.question_content.as_deref()
    }

    fn answer_type(&self) -> &str {
        &self.answer_type
    }

    fn accepted_answers(&self) -> &[String] {
        &self.answer_content
    }
}
