pub mod health;
pub mod quests;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /quests                       create (POST)
/// /quests/created               quests authored by the caller
/// /quests/available             quests assigned to the caller's email
/// /quests/{id}                  get, full-replace update, delete
/// /quests/{id}/send             assign to a recipient (POST)
/// /quests/{id}/start            start progression (POST)
/// /quests/{id}/next             submit an answer (POST)
/// /quests/{id}/status           current progression
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/quests", quests::router())
}
