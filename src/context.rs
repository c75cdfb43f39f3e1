// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request metadata passed explicitly to core operations.
//!
//! Use the `RequestContext` extractor in handlers:
//!
//! ```rust,ignore
//! async fn my_handler(ctx: RequestContext) -> Result<Json<T>, ApiError> {
//!     recorder.record(&txn, input.with_correlation_id(&ctx.correlation_id), &ctx.cancel)?;
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{ApiError, ErrorCode};

/// Request/response header carrying the correlation id.
///
/// Filled in by the request-id layer when the client does not send one.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Header carrying the upstream-authenticated actor id.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: String,
    /// `None` for system-initiated or anonymous requests.
    pub actor_id: Option<Uuid>,
    pub cancel: CancellationToken,
}

impl RequestContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            actor_id: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Context for background work not tied to a request.
    pub fn system() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn with_actor(mut self, actor_id: Uuid) -> Self {
        self.actor_id = Some(actor_id);
        self
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut ctx = Self::new(correlation_id);

        if let Some(value) = parts.headers.get(ACTOR_ID_HEADER) {
            let actor = value
                .to_str()
                .ok()
                .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
                .ok_or_else(|| {
                    ApiError::from_code(
                        ErrorCode::BadRequest,
                        "x-actor-id must be a UUID",
                        &ctx.correlation_id,
                    )
                })?;
            if !actor.is_nil() {
                ctx = ctx.with_actor(actor);
            }
        }

        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<RequestContext, ApiError> {
        let (mut parts, _) = request.into_parts();
        RequestContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_correlation_and_actor_headers() {
        let actor = Uuid::new_v4();
        let request = Request::builder()
            .header(CORRELATION_ID_HEADER, "req-42")
            .header(ACTOR_ID_HEADER, actor.to_string())
            .body(())
            .unwrap();

        let ctx = extract(request).await.unwrap();
        assert_eq!(ctx.correlation_id, "req-42");
        assert_eq!(ctx.actor_id, Some(actor));
        assert!(!ctx.cancel.is_cancelled());
    }

    #[tokio::test]
    async fn generates_correlation_id_when_missing() {
        let ctx = extract(Request::builder().body(()).unwrap()).await.unwrap();
        assert!(Uuid::parse_str(&ctx.correlation_id).is_ok());
        assert_eq!(ctx.actor_id, None);
    }

    #[tokio::test]
    async fn nil_actor_means_system() {
        let request = Request::builder()
            .header(ACTOR_ID_HEADER, Uuid::nil().to_string())
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.unwrap().actor_id, None);
    }

    #[tokio::test]
    async fn malformed_actor_is_bad_request() {
        let request = Request::builder()
            .header(CORRELATION_ID_HEADER, "req-7")
            .header(ACTOR_ID_HEADER, "not-a-uuid")
            .body(())
            .unwrap();

        let err = extract(request).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadRequest);
        assert_eq!(err.envelope.meta.correlation_id, "req-7");
    }
}
