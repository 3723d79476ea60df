//! Repository for the `steps` table.

use questy_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgExecutor, Postgres, Transaction};

use crate::models::step::{CreateStep, Step};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, quest_id, sort, description, question_type, \
    question_content, answer_type, answer_content, created_at, updated_at";

/// Provides step-list operations. Steps are only ever written as a whole
/// list, inside the owning quest's transaction.
pub struct StepRepo;

impl StepRepo {
    /// List a quest's steps ordered by `sort`.
    pub async fn list_by_quest<'e, E>(executor: E, quest_id: DbId) -> Result<Vec<Step>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM steps WHERE quest_id = $1 ORDER BY sort");
        sqlx::query_as::<_, Step>(&query)
            .bind(quest_id)
            .fetch_all(executor)
            .await
    }

    /// Insert `steps` for a quest, returning the created rows ordered by `sort`.
    pub async fn insert_all(
        tx: &mut Transaction<'_, Postgres>,
        quest_id: DbId,
        steps: &[CreateStep],
    ) -> Result<Vec<Step>, sqlx::Error> {
        let query = format!(
            "INSERT INTO steps \
                (quest_id, sort, description, question_type, question_content, answer_type, answer_content) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );

        let mut created = Vec::with_capacity(steps.len());
        for step in steps {
            let row = sqlx::query_as::<_, Step>(&query)
                .bind(quest_id)
                .bind(step.sort)
                .bind(&step.description)
                .bind(&step.question_type)
                .bind(&step.question_content)
                .bind(&step.answer_type)
                .bind(Json(&step.answer_content))
                .fetch_one(&mut **tx)
                .await?;
            created.push(row);
        }
        created.sort_by_key(|s| s.sort);
        Ok(created)
    }

    /// Replace every step of a quest with `steps`.
    ///
    /// Deletes the existing rows, then inserts the new list with fresh ids.
    /// An empty list leaves the quest without steps.
    pub async fn replace_all(
        tx: &mut Transaction<'_, Postgres>,
        quest_id: DbId,
        steps: &[CreateStep],
    ) -> Result<Vec<Step>, sqlx::Error> {
        sqlx::query("DELETE FROM steps WHERE quest_id = $1")
            .bind(quest_id)
            .execute(&mut **tx)
            .await?;

        if steps.is_empty() {
            return Ok(Vec::new());
        }
        Self::insert_all(tx, quest_id, steps).await
    }
}
