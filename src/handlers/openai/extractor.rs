//! Request gateway extractor
//!
//! Validates and decodes the body of a chat completions request before the
//! handler runs, in this order:
//!
//! 1. `Content-Type` must start with `application/json` (no body is read otherwise)
//! 2. The body is read up to `server.max_request_bytes`; the read stops as soon
//!    as the limit is crossed
//! 3. The bytes must decode as JSON into the target type
//!
//! Every failure is a 400 with a short plain-text body.

use axum::{
    extract::{FromRequest, Request},
    http::header,
};
use serde::de::DeserializeOwned;
use std::error::Error as _;

use crate::error::AppError;
use crate::handlers::AppState;
use crate::metrics::Rejection;

/// Media type prefix accepted by the gateway
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Size-bounded JSON extractor for the completions endpoint
///
/// Unlike `axum::Json`, this accepts any content type with an
/// `application/json` prefix (including parameters such as `charset`) and
/// reports every rejection as `400 Bad Request`.
pub struct CompletionJson<T>(pub T);

impl<T> FromRequest<AppState> for CompletionJson<T>
where
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let metrics = state.metrics();

        if !has_json_content_type(&req) {
            metrics.rejection(Rejection::ContentType);
            return Err(AppError::UnsupportedContentType);
        }

        let limit = state.config().server.max_request_bytes;
        let body = axum::body::to_bytes(req.into_body(), limit)
            .await
            .map_err(|e| {
                if is_length_limit_error(&e) {
                    metrics.rejection(Rejection::BodyTooLarge);
                    AppError::BodyTooLarge { limit }
                } else {
                    metrics.rejection(Rejection::BodyRead);
                    AppError::BodyRead(e.to_string())
                }
            })?;

        let value = serde_json::from_slice(&body).map_err(|e| {
            metrics.rejection(Rejection::InvalidJson);
            AppError::InvalidJson(e.to_string())
        })?;

        Ok(CompletionJson(value))
    }
}

fn has_json_content_type(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with(JSON_CONTENT_TYPE))
}

/// Whether a body read failed because the size limit was crossed
fn is_length_limit_error(err: &axum::Error) -> bool {
    let mut source = err.source();
    while let Some(inner) = source {
        if inner.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        source = inner.source();
    }
    false
}
