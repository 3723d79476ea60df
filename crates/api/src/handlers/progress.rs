//! Handlers for recipient progression through an assigned quest.

use axum::extract::{Path, State};
use axum::Json;
use questy_core::quest_line::QuestLineView;
use serde::Deserialize;

use super::parse_id;
use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::auth::AuthUser;
use crate::orchestrator::AssignmentOrchestrator;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /quests/{id}/next`.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

/// POST /api/v1/quests/{id}/start
pub async fn start(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<QuestLineView>>> {
    let id = parse_id(&id)?;
    let view = AssignmentOrchestrator::from_state(&state)
        .start_quest(id, &user.email)
        .await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/quests/{id}/next
pub async fn next(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<AnswerRequest>,
) -> AppResult<Json<DataResponse<QuestLineView>>> {
    let id = parse_id(&id)?;
    let view = AssignmentOrchestrator::from_state(&state)
        .check_answer(id, &user.email, &input.answer)
        .await?;
    Ok(Json(DataResponse { data: view }))
}

/// GET /api/v1/quests/{id}/status
pub async fn status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<QuestLineView>>> {
    let id = parse_id(&id)?;
    let view = AssignmentOrchestrator::from_state(&state)
        .get_status(id, &user.email)
        .await?;
    Ok(Json(DataResponse { data: view }))
}
