//! Handlers for the owner-facing `/quests` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use questy_db::models::assignment::Assignment;
use questy_db::models::quest::{AvailableQuest, CreateQuest, Quest, QuestWithSteps, UpdateQuest};
use questy_db::repositories::QuestRepo;
use questy_events::bus::event_types;
use questy_events::QuestEvent;
use serde::Deserialize;
use serde_json::json;

use super::parse_id;
use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::auth::AuthUser;
use crate::orchestrator::AssignmentOrchestrator;
use crate::query::{AvailableParams, PaginationParams};
use crate::response::{DataResponse, PageMeta, PagedResponse};
use crate::state::AppState;

/// Body of `POST /quests/{id}/send`.
#[derive(Debug, Deserialize)]
pub struct SendQuestRequest {
    pub email: String,
    pub name: String,
}

/// POST /api/v1/quests
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateQuest>,
) -> AppResult<(StatusCode, Json<DataResponse<QuestWithSteps>>)> {
    input.validate()?;
    let quest = QuestRepo::create(&state.pool, user.user_id, &input).await?;

    tracing::info!(quest_id = %quest.quest.id, owner = %user.user_id, steps = quest.steps.len(), "Quest created");
    state.event_bus.publish(
        QuestEvent::new(event_types::QUEST_CREATED, quest.quest.id)
            .with_actor(user.user_id)
            .with_payload(json!({ "steps": quest.steps.len() })),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: quest })))
}

/// GET /api/v1/quests/{id}
pub async fn get_by_id(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<QuestWithSteps>>> {
    let id = parse_id(&id)?;
    let quest = QuestRepo::find_owned(&state.pool, id, user.user_id).await?;
    Ok(Json(DataResponse { data: quest }))
}

/// PUT /api/v1/quests/{id}
///
/// Replaces the quest's fields and its whole step list.
pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateQuest>,
) -> AppResult<Json<DataResponse<QuestWithSteps>>> {
    let id = parse_id(&id)?;
    input.validate()?;
    let quest = QuestRepo::update(&state.pool, id, user.user_id, &input).await?;

    state.event_bus.publish(
        QuestEvent::new(event_types::QUEST_UPDATED, id)
            .with_actor(user.user_id)
            .with_payload(json!({ "steps": quest.steps.len() })),
    );
    Ok(Json(DataResponse { data: quest }))
}

/// DELETE /api/v1/quests/{id}
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id)?;
    QuestRepo::delete(&state.pool, id, user.user_id).await?;

    tracing::info!(quest_id = %id, owner = %user.user_id, "Quest deleted");
    state
        .event_bus
        .publish(QuestEvent::new(event_types::QUEST_DELETED, id).with_actor(user.user_id));
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/quests/created
pub async fn list_created(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<PagedResponse<Quest>>> {
    let (limit, offset) = params.resolve();
    let (quests, total) = QuestRepo::list_by_owner(&state.pool, user.user_id, limit, offset).await?;
    Ok(Json(PagedResponse {
        data: quests,
        meta: PageMeta {
            total,
            limit,
            offset,
        },
    }))
}

/// GET /api/v1/quests/available
pub async fn list_available(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<AvailableParams>,
) -> AppResult<Json<PagedResponse<AvailableQuest>>> {
    let (limit, offset) = params.page().resolve();
    let (quests, total) =
        QuestRepo::list_available(&state.pool, &user.email, limit, offset, params.finished).await?;
    Ok(Json(PagedResponse {
        data: quests,
        meta: PageMeta {
            total,
            limit,
            offset,
        },
    }))
}

/// POST /api/v1/quests/{id}/send
pub async fn send(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<SendQuestRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Assignment>>)> {
    let id = parse_id(&id)?;
    let assignment = AssignmentOrchestrator::from_state(&state)
        .send_quest(&user, id, &input.email, &input.name)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: assignment })))
}
