pub mod progress;
pub mod quests;

use questy_core::error::CoreError;
use questy_core::types::DbId;

use crate::error::AppError;

/// Parse a path id, rejecting malformed values as a validation error.
pub(crate) fn parse_id(raw: &str) -> Result<DbId, AppError> {
    raw.parse::<DbId>()
        .map_err(|_| AppError::Core(CoreError::invalid_id()))
}
