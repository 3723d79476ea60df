//! Integration tests for the quest aggregate store.
//!
//! Exercises `QuestRepo` and `StepRepo` against a real database:
//! - Create with steps in one transaction
//! - Owner-scoped reads and writes
//! - Full-replace step updates
//! - Delete cardinality guard
//! - Pagination of authored and assigned quests

use assert_matches::assert_matches;
use questy_core::assignment::AssignmentStatus;
use questy_core::error::CoreError;
use questy_db::models::assignment::CreateAssignment;
use questy_db::models::quest::{CreateQuest, UpdateQuest};
use questy_db::models::step::CreateStep;
use questy_db::repositories::{AssignmentRepo, QuestRepo, StepRepo};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn text_step(sort: i32, question: &str, answer: &str) -> CreateStep {
    CreateStep {
        sort,
        description: None,
        question_type: "text".to_string(),
        question_content: Some(question.to_string()),
        answer_type: "text".to_string(),
        answer_content: vec![answer.to_string()],
    }
}

fn new_quest(name: &str, steps: Vec<CreateStep>) -> CreateQuest {
    CreateQuest {
        name: name.to_string(),
        description: Some("a quest".to_string()),
        theme: Some("birthday".to_string()),
        final_message: Some("Well done!".to_string()),
        steps,
    }
}

fn update_of(name: &str, steps: Vec<CreateStep>) -> UpdateQuest {
    UpdateQuest {
        name: name.to_string(),
        description: None,
        theme: None,
        final_message: Some("Updated ending".to_string()),
        steps,
    }
}

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_persists_quest_and_ordered_steps(pool: PgPool) {
    let owner = Uuid::new_v4();
    let input = new_quest(
        "Treasure hunt",
        vec![text_step(1, "Second?", "42"), text_step(0, "First?", "Paris")],
    );
    let created = QuestRepo::create(&pool, owner, &input).await.unwrap();

    assert_eq!(created.quest.name, "Treasure hunt");
    assert_eq!(created.quest.owner, owner);
    assert_eq!(created.steps.len(), 2);
    assert_eq!(created.steps[0].sort, 0);
    assert_eq!(created.steps[0].answer_content.0, vec!["Paris".to_string()]);
    assert!(created.steps.iter().all(|s| s.quest_id == created.quest.id));

    let fetched = QuestRepo::find_owned(&pool, created.quest.id, owner).await.unwrap();
    assert_eq!(fetched.quest.id, created.quest.id);
    assert_eq!(fetched.steps.len(), 2);
    assert_eq!(fetched.steps[1].sort, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_without_steps(pool: PgPool) {
    let owner = Uuid::new_v4();
    let created = QuestRepo::create(&pool, owner, &new_quest("Empty", vec![]))
        .await
        .unwrap();
    assert!(created.steps.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_sort_rolls_back_whole_create(pool: PgPool) {
    let owner = Uuid::new_v4();
    let input = new_quest(
        "Broken",
        vec![text_step(0, "A?", "a"), text_step(0, "B?", "b")],
    );
    let result = QuestRepo::create(&pool, owner, &input).await;
    assert_matches!(result, Err(CoreError::Validation(_)));

    let (quests, total) = QuestRepo::list_by_owner(&pool, owner, 50, 0).await.unwrap();
    assert!(quests.is_empty());
    assert_eq!(total, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_foreign_owner_sees_not_found(pool: PgPool) {
    let owner = Uuid::new_v4();
    let created = QuestRepo::create(&pool, owner, &new_quest("Mine", vec![]))
        .await
        .unwrap();

    let stranger = Uuid::new_v4();
    assert_matches!(
        QuestRepo::find_owned(&pool, created.quest.id, stranger).await,
        Err(CoreError::NotFound { .. })
    );
    assert_matches!(
        QuestRepo::update(&pool, created.quest.id, stranger, &update_of("Stolen", vec![])).await,
        Err(CoreError::NotFound { .. })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_assigned_requires_assignment(pool: PgPool) {
    let owner = Uuid::new_v4();
    let created = QuestRepo::create(
        &pool,
        owner,
        &new_quest("Shared", vec![text_step(0, "Q?", "a")]),
    )
    .await
    .unwrap();

    assert_matches!(
        QuestRepo::find_assigned(&pool, created.quest.id, "r@example.com").await,
        Err(CoreError::NotFound { .. })
    );

    AssignmentRepo::create(
        &pool,
        &CreateAssignment {
            quest_id: created.quest.id,
            email: "r@example.com".to_string(),
            name: "Robin".to_string(),
        },
    )
    .await
    .unwrap();

    let fetched = QuestRepo::find_assigned(&pool, created.quest.id, "r@example.com")
        .await
        .unwrap();
    assert_eq!(fetched.steps.len(), 1);
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_replaces_all_steps_with_fresh_ids(pool: PgPool) {
    let owner = Uuid::new_v4();
    let created = QuestRepo::create(
        &pool,
        owner,
        &new_quest(
            "Three steps",
            vec![
                text_step(0, "A?", "a"),
                text_step(1, "B?", "b"),
                text_step(2, "C?", "c"),
            ],
        ),
    )
    .await
    .unwrap();
    let old_ids: Vec<Uuid> = created.steps.iter().map(|s| s.id).collect();

    let updated = QuestRepo::update(
        &pool,
        created.quest.id,
        owner,
        &update_of("One step", vec![text_step(0, "Only?", "x")]),
    )
    .await
    .unwrap();

    assert_eq!(updated.quest.name, "One step");
    assert_eq!(updated.quest.final_message.as_deref(), Some("Updated ending"));
    assert_eq!(updated.steps.len(), 1);
    assert!(!old_ids.contains(&updated.steps[0].id));

    let stored = StepRepo::list_by_quest(&pool, created.quest.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].answer_content.0, vec!["x".to_string()]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_with_empty_steps_removes_them(pool: PgPool) {
    let owner = Uuid::new_v4();
    let created = QuestRepo::create(
        &pool,
        owner,
        &new_quest("Two", vec![text_step(0, "A?", "a"), text_step(1, "B?", "b")]),
    )
    .await
    .unwrap();

    let updated = QuestRepo::update(&pool, created.quest.id, owner, &update_of("None", vec![]))
        .await
        .unwrap();
    assert!(updated.steps.is_empty());
    assert!(StepRepo::list_by_quest(&pool, created.quest.id)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_clamps_outstanding_positions(pool: PgPool) {
    let owner = Uuid::new_v4();
    let created = QuestRepo::create(
        &pool,
        owner,
        &new_quest(
            "Shrinking",
            vec![
                text_step(0, "A?", "a"),
                text_step(1, "B?", "b"),
                text_step(2, "C?", "c"),
            ],
        ),
    )
    .await
    .unwrap();
    let quest_id = created.quest.id;
    AssignmentRepo::create(
        &pool,
        &CreateAssignment {
            quest_id,
            email: "r@example.com".to_string(),
            name: "Robin".to_string(),
        },
    )
    .await
    .unwrap();
    AssignmentRepo::update(
        &pool,
        quest_id,
        "r@example.com",
        2,
        AssignmentStatus::InProgress,
    )
    .await
    .unwrap();

    QuestRepo::update(
        &pool,
        quest_id,
        owner,
        &update_of("Shrunk", vec![text_step(0, "A?", "a"), text_step(1, "B?", "b")]),
    )
    .await
    .unwrap();

    let assignment = AssignmentRepo::find(&pool, quest_id, "r@example.com")
        .await
        .unwrap();
    assert_eq!(assignment.current_step, 1);
    assert_eq!(assignment.status, "in_progress");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_invalidates_progress_computed_on_old_steps(pool: PgPool) {
    let owner = Uuid::new_v4();
    let created = QuestRepo::create(
        &pool,
        owner,
        &new_quest(
            "Cities",
            vec![text_step(0, "Capital?", "Paris"), text_step(1, "Number?", "42")],
        ),
    )
    .await
    .unwrap();
    let quest_id = created.quest.id;
    AssignmentRepo::create(
        &pool,
        &CreateAssignment {
            quest_id,
            email: "r@example.com".to_string(),
            name: "Robin".to_string(),
        },
    )
    .await
    .unwrap();
    let before = AssignmentRepo::update(
        &pool,
        quest_id,
        "r@example.com",
        0,
        AssignmentStatus::InProgress,
    )
    .await
    .unwrap();

    // Same step count, so no position has to move.
    QuestRepo::update(
        &pool,
        quest_id,
        owner,
        &update_of(
            "Cities",
            vec![text_step(0, "Capital of Italy?", "Rome"), text_step(1, "Number?", "42")],
        ),
    )
    .await
    .unwrap();

    let after = AssignmentRepo::find(&pool, quest_id, "r@example.com")
        .await
        .unwrap();
    assert!(after.version > before.version);
    assert_eq!(after.current_step, 0);

    let stale = AssignmentRepo::transition(
        &pool,
        quest_id,
        "r@example.com",
        before.version,
        1,
        AssignmentStatus::InProgress,
    )
    .await
    .unwrap();
    assert!(stale.is_none());
    let reloaded = AssignmentRepo::find(&pool, quest_id, "r@example.com")
        .await
        .unwrap();
    assert_eq!(reloaded.current_step, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_clamps_finished_positions_but_keeps_status(pool: PgPool) {
    let owner = Uuid::new_v4();
    let created = QuestRepo::create(
        &pool,
        owner,
        &new_quest(
            "Done",
            vec![
                text_step(0, "A?", "a"),
                text_step(1, "B?", "b"),
                text_step(2, "C?", "c"),
            ],
        ),
    )
    .await
    .unwrap();
    let quest_id = created.quest.id;
    for email in ["done@example.com", "fresh@example.com"] {
        AssignmentRepo::create(
            &pool,
            &CreateAssignment {
                quest_id,
                email: email.to_string(),
                name: "Robin".to_string(),
            },
        )
        .await
        .unwrap();
    }
    AssignmentRepo::update(&pool, quest_id, "done@example.com", 2, AssignmentStatus::Finished)
        .await
        .unwrap();

    QuestRepo::update(&pool, quest_id, owner, &update_of("Done", vec![text_step(0, "A?", "a")]))
        .await
        .unwrap();

    let done = AssignmentRepo::find(&pool, quest_id, "done@example.com")
        .await
        .unwrap();
    assert_eq!(done.current_step, 0);
    assert_eq!(done.status, "finished");

    let fresh = AssignmentRepo::find(&pool, quest_id, "fresh@example.com")
        .await
        .unwrap();
    assert_eq!(fresh.current_step, 0);
    assert_eq!(fresh.status, "not_started");
    assert_eq!(fresh.version, 1);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_cascades_and_guards_cardinality(pool: PgPool) {
    let owner = Uuid::new_v4();
    let created = QuestRepo::create(
        &pool,
        owner,
        &new_quest("Doomed", vec![text_step(0, "A?", "a")]),
    )
    .await
    .unwrap();
    let quest_id = created.quest.id;

    assert_matches!(
        QuestRepo::delete(&pool, quest_id, Uuid::new_v4()).await,
        Err(CoreError::NotDeleted { .. })
    );

    QuestRepo::delete(&pool, quest_id, owner).await.unwrap();
    assert!(StepRepo::list_by_quest(&pool, quest_id).await.unwrap().is_empty());

    assert_matches!(
        QuestRepo::delete(&pool, quest_id, owner).await,
        Err(CoreError::NotDeleted { .. })
    );
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_by_owner_paginates_oldest_first(pool: PgPool) {
    let owner = Uuid::new_v4();
    for i in 0..3 {
        QuestRepo::create(&pool, owner, &new_quest(&format!("Quest {i}"), vec![]))
            .await
            .unwrap();
    }
    QuestRepo::create(&pool, Uuid::new_v4(), &new_quest("Other", vec![]))
        .await
        .unwrap();

    let (page, total) = QuestRepo::list_by_owner(&pool, owner, 2, 0).await.unwrap();
    assert_eq!(total, 3);
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].name, "Quest 0");

    let (page, _) = QuestRepo::list_by_owner(&pool, owner, 2, 2).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "Quest 2");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_available_joins_progress_and_filters_finished(pool: PgPool) {
    let owner = Uuid::new_v4();
    let email = "r@example.com";
    let mut ids = Vec::new();
    for name in ["Open", "Done"] {
        let quest = QuestRepo::create(
            &pool,
            owner,
            &new_quest(name, vec![text_step(0, "A?", "a"), text_step(1, "B?", "b")]),
        )
        .await
        .unwrap();
        AssignmentRepo::create(
            &pool,
            &CreateAssignment {
                quest_id: quest.quest.id,
                email: email.to_string(),
                name: "Robin".to_string(),
            },
        )
        .await
        .unwrap();
        ids.push(quest.quest.id);
    }
    AssignmentRepo::update(
        &pool,
        ids[1],
        email,
        1,
        AssignmentStatus::Finished,
    )
    .await
    .unwrap();

    let (all, total) = QuestRepo::list_available(&pool, email, 50, 0, None).await.unwrap();
    assert_eq!(total, 2);
    assert!(all.iter().all(|q| q.step_count == 2));

    let (finished, total) = QuestRepo::list_available(&pool, email, 50, 0, Some(true))
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(finished[0].id, ids[1]);
    assert_eq!(finished[0].status, "finished");

    let (open, total) = QuestRepo::list_available(&pool, email, 50, 0, Some(false))
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(open[0].name, "Open");
    assert_eq!(open[0].current_step, 0);

    let (none, total) = QuestRepo::list_available(&pool, "nobody@example.com", 50, 0, None)
        .await
        .unwrap();
    assert!(none.is_empty());
    assert_eq!(total, 0);
}
