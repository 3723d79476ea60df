use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{progress, quests};
use crate::state::AppState;

/// Routes mounted at `/quests`. Every route requires a bearer token.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(quests::create))
        .route("/created", get(quests::list_created))
        .route("/available", get(quests::list_available))
        .route(
            "/{id}",
            get(quests::get_by_id)
                .put(quests::update)
                .delete(quests::delete),
        )
        .route("/{id}/send", post(quests::send))
        .route("/{id}/start", post(progress::start))
        .route("/{id}/next", post(progress::next))
        .route("/{id}/status", get(progress::status))
}
