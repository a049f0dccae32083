//! Extractors whose rejections use the error envelope
//!
//! Axum's own `Json`, `Path` and `Query` reject with plain-text bodies. These
//! wrappers convert the rejection into [`AppError::Validation`] so a malformed
//! body answers `400 VALIDATION_ERROR` like every other input error.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
