//! Shared response envelope types for API handlers.
//!
//! Single resources use `{ "data": ... }`; listings add a `meta` block with
//! pagination totals.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Pagination metadata for list responses.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageMeta {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// `{ "data": [T], "meta": { total, limit, offset } }` envelope.
#[derive(Debug, Serialize)]
pub struct PagedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}
