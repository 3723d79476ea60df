//! Request extractors whose rejections render through [`AppError`].

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` that rejects unreadable bodies as `BAD_REQUEST` with the
/// usual `{"error","code"}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
