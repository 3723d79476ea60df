#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Quest {quest_id} is already assigned to {email}")]
    AlreadyAssigned { quest_id: String, email: String },

    #[error("{entity} with id {id} was not deleted")]
    NotDeleted { entity: &'static str, id: String },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotFound`] keyed by any displayable id.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// The error returned for identifiers that are not valid UUIDs.
    pub fn invalid_id() -> Self {
        CoreError::Validation("invalid_id: id is invalid".into())
    }
}
