//! Assignment (quest-to-recipient progression) model and DTOs.

use questy_core::assignment::AssignmentStatus;
use questy_core::error::CoreError;
use questy_core::types::{DbId, StepPosition, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `quest_to_email` table.
///
/// `version` increments on every write and backs compare-and-swap updates.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assignment {
    pub quest_id: DbId,
    pub email: String,
    pub name: String,
    pub status: String,
    pub current_step: StepPosition,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Assignment {
    /// Parse the stored status.
    pub fn status(&self) -> Result<AssignmentStatus, CoreError> {
        self.status.parse()
    }
}

/// DTO for creating an assignment. `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct CreateAssignment {
    pub quest_id: DbId,
    pub email: String,
    pub name: String,
}
