//! Repository for the `quest_to_email` table (assignments).

use questy_core::assignment::AssignmentStatus;
use questy_core::error::CoreError;
use questy_core::types::{DbId, StepPosition};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::{classify, is_unique_violation, StoreResult};
use crate::models::assignment::{Assignment, CreateAssignment};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "quest_id, email, name, status, current_step, version, created_at, updated_at";

/// Unique constraint on `(quest_id, email)`.
pub const UNIQUE_ASSIGNMENT: &str = "uq_quest_to_email_quest_id_email";

/// Provides assignment operations keyed by `(quest_id, email)`.
pub struct AssignmentRepo;

impl AssignmentRepo {
    /// Insert a `not_started` assignment at position 0.
    ///
    /// Fails with `AlreadyAssigned` when the recipient already has this quest.
    pub async fn create(pool: &PgPool, input: &CreateAssignment) -> StoreResult<Assignment> {
        let query = format!(
            "INSERT INTO quest_to_email (quest_id, email, name) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(input.quest_id)
            .bind(&input.email)
            .bind(&input.name)
            .fetch_one(pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e, UNIQUE_ASSIGNMENT) {
                    CoreError::AlreadyAssigned {
                        quest_id: input.quest_id.to_string(),
                        email: input.email.clone(),
                    }
                } else {
                    classify(e)
                }
            })
    }

    /// Load the assignment for `(quest_id, email)`.
    pub async fn find(pool: &PgPool, quest_id: DbId, email: &str) -> StoreResult<Assignment> {
        let query =
            format!("SELECT {COLUMNS} FROM quest_to_email WHERE quest_id = $1 AND email = $2");
        sqlx::query_as::<_, Assignment>(&query)
            .bind(quest_id)
            .bind(email)
            .fetch_optional(pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| CoreError::not_found("Assignment", quest_id))
    }

    /// Unconditionally set position and status (last write wins).
    pub async fn update(
        pool: &PgPool,
        quest_id: DbId,
        email: &str,
        position: StepPosition,
        status: AssignmentStatus,
    ) -> StoreResult<Assignment> {
        let query = format!(
            "UPDATE quest_to_email SET \
                current_step = $3, status = $4, version = version + 1, updated_at = NOW() \
             WHERE quest_id = $1 AND email = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(quest_id)
            .bind(email)
            .bind(position)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| CoreError::not_found("Assignment", quest_id))
    }

    /// Compare-and-swap write: applies only while the row is still at
    /// `expected_version`.
    ///
    /// Returns `None` when another writer got there first.
    pub async fn transition(
        pool: &PgPool,
        quest_id: DbId,
        email: &str,
        expected_version: i64,
        position: StepPosition,
        status: AssignmentStatus,
    ) -> StoreResult<Option<Assignment>> {
        let query = format!(
            "UPDATE quest_to_email SET \
                current_step = $4, status = $5, version = version + 1, updated_at = NOW() \
             WHERE quest_id = $1 AND email = $2 AND version = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(quest_id)
            .bind(email)
            .bind(expected_version)
            .bind(position)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
            .map_err(classify)
    }

    /// Invalidate every assignment of a quest after its steps were replaced.
    ///
    /// Positions past the new last step are pulled back to it, and every
    /// row's `version` is bumped so a progression write computed against the
    /// old steps loses its compare-and-swap. Runs inside the step-replacement
    /// transaction. Returns the number of positions that moved.
    pub async fn rebase_positions(
        tx: &mut Transaction<'_, Postgres>,
        quest_id: DbId,
        step_count: i32,
    ) -> Result<u64, sqlx::Error> {
        let moved: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quest_to_email \
             WHERE quest_id = $1 AND current_step > GREATEST($2 - 1, 0)",
        )
        .bind(quest_id)
        .bind(step_count)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            "UPDATE quest_to_email SET \
                current_step = LEAST(current_step, GREATEST($2 - 1, 0)), \
                version = version + 1, updated_at = NOW() \
             WHERE quest_id = $1",
        )
        .bind(quest_id)
        .bind(step_count)
        .execute(&mut **tx)
        .await?;

        Ok(moved.max(0) as u64)
    }
}
