// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP boundary for classified errors.
//!
//! Client errors carry the business-readable message and hint. Server errors
//! carry a generic message only; the full cause chain is logged internally
//! under the correlation id.

use std::error::Error;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::classify::{error_chain, find_classification};
use super::code::ErrorCode;
use crate::context::CORRELATION_ID_HEADER;

/// `{ error: {...}, meta: {...} }` response body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
    pub meta: ErrorMeta,
}

/// Public description of the failure.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Request metadata echoed back to the client.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMeta {
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub envelope: ErrorEnvelope,
}

impl ApiError {
    /// Classify `err` and build the client-safe response.
    pub fn from_error(err: &(dyn Error + 'static), correlation_id: &str) -> Self {
        let classification = find_classification(err);
        let code = classification
            .map(|c| c.code)
            .unwrap_or(ErrorCode::InternalError);

        let (message, hint) = match classification {
            Some(c) if code.is_client_error() => {
                tracing::debug!(
                    correlation_id,
                    code = %code,
                    error = %error_chain(err),
                    "request rejected"
                );
                (c.message.to_string(), c.hint.map(str::to_string))
            }
            _ => {
                tracing::error!(
                    correlation_id,
                    code = %code,
                    error = %error_chain(err),
                    "request failed"
                );
                (code.generic_message().to_string(), None)
            }
        };

        Self::build(code, message, hint, correlation_id)
    }

    /// Build an error directly from a code, for rejections raised at the
    /// boundary itself.
    pub fn from_code(code: ErrorCode, message: impl Into<String>, correlation_id: &str) -> Self {
        let message = message.into();
        let message = if code.is_client_error() {
            message
        } else {
            tracing::error!(correlation_id, code = %code, error = %message, "request failed");
            code.generic_message().to_string()
        };
        Self::build(code, message, None, correlation_id)
    }

    fn build(code: ErrorCode, message: String, hint: Option<String>, correlation_id: &str) -> Self {
        Self {
            status: code.http_status(),
            envelope: ErrorEnvelope {
                error: ErrorBody {
                    code,
                    message,
                    hint,
                },
                meta: ErrorMeta {
                    correlation_id: correlation_id.to_string(),
                },
            },
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.envelope.error.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let header = HeaderValue::from_str(&self.envelope.meta.correlation_id).ok();
        let mut response = (self.status, Json(self.envelope)).into_response();
        if let Some(value) = header {
            response.headers_mut().insert(CORRELATION_ID_HEADER, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApplicationError, DomainError, ResilienceError};
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn client_error_exposes_message_and_hint() {
        let err = DomainError::validation("email is invalid").with_hint("expected name@domain");
        let response = ApiError::from_error(&err, "corr-1").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.headers()[CORRELATION_ID_HEADER], "corr-1");

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "email is invalid");
        assert_eq!(body["error"]["hint"], "expected name@domain");
        assert_eq!(body["meta"]["correlationId"], "corr-1");
    }

    #[tokio::test]
    async fn server_error_hides_detail() {
        let cause = std::io::Error::other("password=hunter2 leaked in driver message");
        let err = ApplicationError::internal("failed to insert row into users").with_cause(cause);
        let response = ApiError::from_error(&err, "corr-2").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "An internal error occurred");
        assert!(body["error"].get("hint").is_none());
        let raw = body.to_string();
        assert!(!raw.contains("hunter2"));
        assert!(!raw.contains("users"));
    }

    #[tokio::test]
    async fn resilience_error_is_generic_503() {
        let err = ResilienceError::circuit_open("breaker for ledger-db open").with_hint("internal");
        let api = ApiError::from_error(&err, "corr-3");
        assert_eq!(api.code(), ErrorCode::CircuitOpen);
        let response = api.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(
            body["error"]["message"],
            "The service is temporarily unavailable"
        );
        assert!(body["error"].get("hint").is_none());
    }

    #[tokio::test]
    async fn unclassified_error_is_internal() {
        let err = std::io::Error::other("socket closed");
        let response = ApiError::from_error(&err, "corr-4").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    }

    #[test]
    fn from_code_keeps_client_message_only() {
        let bad = ApiError::from_code(ErrorCode::BadRequest, "x-actor-id is not a UUID", "c");
        assert_eq!(bad.envelope.error.message, "x-actor-id is not a UUID");
        let internal = ApiError::from_code(ErrorCode::InternalError, "secret detail", "c");
        assert_eq!(internal.envelope.error.message, "An internal error occurred");
    }

    #[tokio::test]
    async fn from_code_server_message_never_reaches_body() {
        let api = ApiError::from_code(ErrorCode::InternalError, "db exploded", "c1");
        let response = api.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "An internal error occurred");
        assert_eq!(body["meta"]["correlationId"], "c1");
        assert!(!body.to_string().contains("db exploded"));
    }
}
