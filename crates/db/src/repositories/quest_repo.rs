//! Repository for the `quests` table and its step aggregate.

use questy_core::error::CoreError;
use questy_core::types::DbId;
use sqlx::PgPool;

use crate::error::{classify, StoreResult};
use crate::models::quest::{AvailableQuest, CreateQuest, Quest, QuestWithSteps, UpdateQuest};
use crate::repositories::{AssignmentRepo, StepRepo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, name, description, owner, theme, final_message, deleted_at, created_at, updated_at";

/// Filter on `quest_to_email.status` for the available-quests listing.
/// `$2` is a nullable boolean: NULL lists everything.
const FINISHED_FILTER: &str = "($2::BOOLEAN IS NULL OR (a.status = 'finished') = $2::BOOLEAN)";

/// Provides aggregate operations for quests. Every write keeps the quest row
/// and its steps consistent inside one transaction.
pub struct QuestRepo;

impl QuestRepo {
    /// Insert a quest and its steps in a single transaction.
    pub async fn create(
        pool: &PgPool,
        owner: DbId,
        input: &CreateQuest,
    ) -> StoreResult<QuestWithSteps> {
        let mut tx = pool.begin().await.map_err(classify)?;

        let query = format!(
            "INSERT INTO quests (name, description, owner, theme, final_message) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let quest = sqlx::query_as::<_, Quest>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(owner)
            .bind(&input.theme)
            .bind(&input.final_message)
            .fetch_one(&mut *tx)
            .await
            .map_err(classify)?;

        let steps = if input.steps.is_empty() {
            Vec::new()
        } else {
            StepRepo::insert_all(&mut tx, quest.id, &input.steps)
                .await
                .map_err(classify)?
        };

        tx.commit().await.map_err(classify)?;
        Ok(QuestWithSteps { quest, steps })
    }

    /// Load a quest with its steps, scoped to `owner`.
    ///
    /// A quest owned by someone else is reported as `NotFound`.
    pub async fn find_owned(pool: &PgPool, id: DbId, owner: DbId) -> StoreResult<QuestWithSteps> {
        let query = format!(
            "SELECT {COLUMNS} FROM quests \
             WHERE id = $1 AND owner = $2 AND deleted_at IS NULL"
        );
        let quest = sqlx::query_as::<_, Quest>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| CoreError::not_found("Quest", id))?;

        Self::with_steps(pool, quest).await
    }

    /// Load a quest with its steps, scoped to a recipient holding an
    /// assignment for it.
    pub async fn find_assigned(pool: &PgPool, id: DbId, email: &str) -> StoreResult<QuestWithSteps> {
        let query = format!(
            "SELECT {COLUMNS} FROM quests q \
             WHERE q.id = $1 AND q.deleted_at IS NULL \
               AND EXISTS (SELECT 1 FROM quest_to_email a WHERE a.quest_id = q.id AND a.email = $2)"
        );
        let quest = sqlx::query_as::<_, Quest>(&query)
            .bind(id)
            .bind(email)
            .fetch_optional(pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| CoreError::not_found("Quest", id))?;

        Self::with_steps(pool, quest).await
    }

    async fn with_steps(pool: &PgPool, quest: Quest) -> StoreResult<QuestWithSteps> {
        let steps = StepRepo::list_by_quest(pool, quest.id)
            .await
            .map_err(classify)?;
        Ok(QuestWithSteps { quest, steps })
    }

    /// Update a quest's fields and fully replace its steps.
    ///
    /// Existing steps are always deleted and `input.steps` re-inserted with
    /// fresh ids. In the same transaction every assignment of the quest gets a
    /// new `version`, and positions past the new last step are pulled back
    /// to it.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        owner: DbId,
        input: &UpdateQuest,
    ) -> StoreResult<QuestWithSteps> {
        let step_count = i32::try_from(input.steps.len())
            .map_err(|_| CoreError::Validation("too many steps".into()))?;

        let mut tx = pool.begin().await.map_err(classify)?;

        let query = format!(
            "UPDATE quests SET \
                name = $3, description = $4, theme = $5, final_message = $6, updated_at = NOW() \
             WHERE id = $1 AND owner = $2 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        let quest = sqlx::query_as::<_, Quest>(&query)
            .bind(id)
            .bind(owner)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.theme)
            .bind(&input.final_message)
            .fetch_optional(&mut *tx)
            .await
            .map_err(classify)?
            .ok_or_else(|| CoreError::not_found("Quest", id))?;

        let steps = StepRepo::replace_all(&mut tx, id, &input.steps)
            .await
            .map_err(classify)?;

        let clamped = AssignmentRepo::rebase_positions(&mut tx, id, step_count)
            .await
            .map_err(classify)?;
        if clamped > 0 {
            tracing::info!(quest_id = %id, clamped, "Clamped assignment positions after step replacement");
        }

        tx.commit().await.map_err(classify)?;
        Ok(QuestWithSteps { quest, steps })
    }

    /// Delete a quest owned by `owner`. Steps and assignments cascade.
    ///
    /// Fails with `NotDeleted` unless exactly one row was removed.
    pub async fn delete(pool: &PgPool, id: DbId, owner: DbId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM quests WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(pool)
            .await
            .map_err(classify)?;

        if result.rows_affected() != 1 {
            return Err(CoreError::NotDeleted {
                entity: "Quest",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Page through the quests authored by `owner`, oldest first.
    ///
    /// Returns the page and the total count.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner: DbId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<Quest>, i64)> {
        let query = format!(
            "SELECT {COLUMNS} FROM quests \
             WHERE owner = $1 AND deleted_at IS NULL \
             ORDER BY created_at ASC, id ASC \
             LIMIT $2 OFFSET $3"
        );
        let quests = sqlx::query_as::<_, Quest>(&query)
            .bind(owner)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(classify)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quests WHERE owner = $1 AND deleted_at IS NULL",
        )
        .bind(owner)
        .fetch_one(pool)
        .await
        .map_err(classify)?;

        Ok((quests, total))
    }

    /// Page through the quests assigned to `email`, joined with the
    /// recipient's progress and each quest's step count.
    ///
    /// `finished` restricts the listing to finished (`Some(true)`) or
    /// unfinished (`Some(false)`) assignments.
    pub async fn list_available(
        pool: &PgPool,
        email: &str,
        limit: i64,
        offset: i64,
        finished: Option<bool>,
    ) -> StoreResult<(Vec<AvailableQuest>, i64)> {
        let query = format!(
            "SELECT q.id, q.name, q.description, q.theme, q.owner, q.created_at, \
                    a.status, a.current_step, \
                    (SELECT COUNT(*) FROM steps s WHERE s.quest_id = q.id) AS step_count \
             FROM quest_to_email a \
             JOIN quests q ON q.id = a.quest_id \
             WHERE a.email = $1 AND q.deleted_at IS NULL AND {FINISHED_FILTER} \
             ORDER BY a.created_at ASC, q.id ASC \
             LIMIT $3 OFFSET $4"
        );
        let quests = sqlx::query_as::<_, AvailableQuest>(&query)
            .bind(email)
            .bind(finished)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(classify)?;

        let count_query = format!(
            "SELECT COUNT(*) FROM quest_to_email a \
             JOIN quests q ON q.id = a.quest_id \
             WHERE a.email = $1 AND q.deleted_at IS NULL AND {FINISHED_FILTER}"
        );
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(email)
            .bind(finished)
            .fetch_one(pool)
            .await
            .map_err(classify)?;

        Ok((quests, total))
    }
}
