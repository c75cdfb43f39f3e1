// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The three error families and the generic coded error.
//!
//! Each family carries `{code, message, hint?, cause?}`. Equality between
//! failures is by [`ErrorCode`], never by identity, so a code survives any
//! amount of wrapping.

use super::code::ErrorCode;

/// Boxed cause attached to a classified error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fields shared by every family.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ErrorDetail {
    code: ErrorCode,
    message: String,
    hint: Option<String>,
    #[source]
    cause: Option<BoxError>,
}

impl ErrorDetail {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            hint: None,
            cause: None,
        }
    }
}

macro_rules! error_family {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, thiserror::Error)]
        #[error(transparent)]
        pub struct $name(ErrorDetail);

        impl $name {
            /// Create an error with the given code and message.
            pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
                Self(ErrorDetail::new(code, message))
            }

            /// Attach a machine-actionable hint for the client.
            pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
                self.0.hint = Some(hint.into());
                self
            }

            /// Attach the underlying cause.
            pub fn with_cause(
                mut self,
                cause: impl Into<BoxError>,
            ) -> Self {
                self.0.cause = Some(cause.into());
                self
            }

            /// Stable public code.
            pub fn code(&self) -> ErrorCode {
                self.0.code
            }

            /// Human-readable message.
            pub fn message(&self) -> &str {
                &self.0.message
            }

            /// Optional hint for the client.
            pub fn hint(&self) -> Option<&str> {
                self.0.hint.as_deref()
            }
        }
    };
}

error_family!(
    /// Business-rule violation (invalid email, user not found, ...).
    DomainError
);

error_family!(
    /// Use-case orchestration failure (persistence failure, unauthorized, ...).
    ApplicationError
);

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn email_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EmailExists, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }
}

impl ApplicationError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    /// Wrap a domain failure, keeping its code and hint.
    pub fn from_domain(message: impl Into<String>, err: DomainError) -> Self {
        let code = err.code();
        let hint = err.hint().map(str::to_string);
        let mut wrapped = Self::new(code, message).with_cause(err);
        wrapped.0.hint = hint;
        wrapped
    }
}

/// Failure raised by the infrastructure protecting downstream calls.
///
/// The raw code comes from the protecting policy and is only forwarded to
/// the public boundary when it belongs to the resilience sub-range; anything
/// else is reported as [`ErrorCode::ServiceUnavailable`].
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ResilienceError {
    raw_code: String,
    message: String,
    hint: Option<String>,
    #[source]
    cause: Option<BoxError>,
}

impl ResilienceError {
    pub fn new(raw_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            raw_code: raw_code.into(),
            message: message.into(),
            hint: None,
            cause: None,
        }
    }

    pub fn circuit_open(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CircuitOpen.as_str(), message)
    }

    pub fn bulkhead_full(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BulkheadFull.as_str(), message)
    }

    pub fn timeout_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TimeoutExceeded.as_str(), message)
    }

    pub fn max_retries_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MaxRetriesExceeded.as_str(), message)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Code as reported by the policy, possibly unregistered.
    pub fn raw_code(&self) -> &str {
        &self.raw_code
    }

    /// Public code: the raw code if it is a resilience code, otherwise
    /// `SERVICE_UNAVAILABLE`.
    pub fn code(&self) -> ErrorCode {
        match self.raw_code.parse::<ErrorCode>() {
            Ok(code) if code.is_resilience() => code,
            _ => ErrorCode::ServiceUnavailable,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }
}

/// Error from an adapter that only knows a raw code string.
///
/// Unregistered codes classify as `INTERNAL_ERROR`.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CodedError {
    raw_code: String,
    message: String,
    #[source]
    cause: Option<BoxError>,
}

impl CodedError {
    pub fn new(raw_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            raw_code: raw_code.into(),
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn raw_code(&self) -> &str {
        &self.raw_code
    }

    pub fn code(&self) -> ErrorCode {
        self.raw_code.parse().unwrap_or(ErrorCode::InternalError)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Any failure from one of the three families.
#[derive(Debug, thiserror::Error)]
pub enum ClassifiedError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Application(#[from] ApplicationError),
    #[error(transparent)]
    Resilience(#[from] ResilienceError),
}

impl ClassifiedError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ClassifiedError::Domain(e) => e.code(),
            ClassifiedError::Application(e) => e.code(),
            ClassifiedError::Resilience(e) => e.code(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ClassifiedError::Domain(e) => e.message(),
            ClassifiedError::Application(e) => e.message(),
            ClassifiedError::Resilience(e) => e.message(),
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            ClassifiedError::Domain(e) => e.hint(),
            ClassifiedError::Application(e) => e.hint(),
            ClassifiedError::Resilience(e) => e.hint(),
        }
    }
}
