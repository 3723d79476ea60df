//! Shared query parameter types for API handlers.

use questy_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Clamped `(limit, offset)`.
    pub fn resolve(&self) -> (i64, i64) {
        (
            clamp_limit(self.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
            clamp_offset(self.offset),
        )
    }
}

/// Query parameters for `GET /quests/available`.
#[derive(Debug, Default, Deserialize)]
pub struct AvailableParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Restrict to finished (`true`) or unfinished (`false`) assignments.
    pub finished: Option<bool>,
}

impl AvailableParams {
    pub fn page(&self) -> PaginationParams {
        PaginationParams {
            limit: self.limit,
            offset: self.offset,
        }
    }
}
