// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stable public error codes.
//!
//! Codes are the version-stable contract with clients; messages are not.
//! Every code maps to exactly one HTTP status, and the client/server split is
//! derived from that status so the two predicates can never overlap.

use std::fmt;
use std::str::FromStr;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Closed registry of public error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    EmailExists,
    Unauthorized,
    Forbidden,
    Conflict,
    BadRequest,
    RateLimitExceeded,
    InternalError,
    Timeout,
    ServiceUnavailable,

    // Resilience sub-range
    CircuitOpen,
    BulkheadFull,
    TimeoutExceeded,
    MaxRetriesExceeded,
}

/// Every code in the registry, in declaration order.
const ALL_CODES: [ErrorCode; 15] = [
    ErrorCode::NotFound,
    ErrorCode::ValidationError,
    ErrorCode::EmailExists,
    ErrorCode::Unauthorized,
    ErrorCode::Forbidden,
    ErrorCode::Conflict,
    ErrorCode::BadRequest,
    ErrorCode::RateLimitExceeded,
    ErrorCode::InternalError,
    ErrorCode::Timeout,
    ErrorCode::ServiceUnavailable,
    ErrorCode::CircuitOpen,
    ErrorCode::BulkheadFull,
    ErrorCode::TimeoutExceeded,
    ErrorCode::MaxRetriesExceeded,
];

impl ErrorCode {
    /// All registered codes.
    pub fn all() -> &'static [ErrorCode] {
        &ALL_CODES
    }

    /// Wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::EmailExists => "EMAIL_EXISTS",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::CircuitOpen => "CIRCUIT_OPEN",
            ErrorCode::BulkheadFull => "BULKHEAD_FULL",
            ErrorCode::TimeoutExceeded => "TIMEOUT_EXCEEDED",
            ErrorCode::MaxRetriesExceeded => "MAX_RETRIES_EXCEEDED",
        }
    }

    /// HTTP status for this code.
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::EmailExists | ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Timeout | ErrorCode::TimeoutExceeded => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::ServiceUnavailable
            | ErrorCode::CircuitOpen
            | ErrorCode::BulkheadFull
            | ErrorCode::MaxRetriesExceeded => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Whether the failure is attributable to the caller (4xx).
    pub fn is_client_error(&self) -> bool {
        self.http_status().is_client_error()
    }

    /// Whether the failure is attributable to the service (5xx).
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Whether the code belongs to the resilience sub-range.
    pub fn is_resilience(&self) -> bool {
        matches!(
            self,
            ErrorCode::CircuitOpen
                | ErrorCode::BulkheadFull
                | ErrorCode::TimeoutExceeded
                | ErrorCode::MaxRetriesExceeded
        )
    }

    /// Message shown to clients when the underlying detail must stay internal.
    pub fn generic_message(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "The requested resource was not found",
            ErrorCode::ValidationError => "The request failed validation",
            ErrorCode::EmailExists => "The email address is already registered",
            ErrorCode::Unauthorized => "Authentication is required",
            ErrorCode::Forbidden => "You do not have permission to perform this action",
            ErrorCode::Conflict => "The request conflicts with the current state",
            ErrorCode::BadRequest => "The request is malformed",
            ErrorCode::RateLimitExceeded => "Too many requests, slow down",
            ErrorCode::InternalError => "An internal error occurred",
            ErrorCode::Timeout | ErrorCode::TimeoutExceeded => "The request timed out",
            ErrorCode::ServiceUnavailable
            | ErrorCode::CircuitOpen
            | ErrorCode::BulkheadFull
            | ErrorCode::MaxRetriesExceeded => "The service is temporarily unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw code string that is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown error code: {0}")]
pub struct UnknownErrorCode(pub String);

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_CODES
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownErrorCode(s.to_string()))
    }
}

/// HTTP status for a raw code string; unknown codes map to 500.
pub fn status_for_raw_code(raw: &str) -> StatusCode {
    raw.parse::<ErrorCode>()
        .map(|code| code.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
