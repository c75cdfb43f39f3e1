// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Error Taxonomy
//!
//! Every failure the core produces belongs to one of three families:
//!
//! - [`DomainError`]: business-rule violations (client-caused)
//! - [`ApplicationError`]: use-case orchestration and persistence failures
//! - [`ResilienceError`]: circuit breaker, bulkhead, timeout or retry
//!   exhaustion protecting a downstream call
//!
//! [`classify`] recovers the public [`ErrorCode`] through any amount of
//! contextual wrapping, and [`ApiError`] turns it into the HTTP envelope.

pub mod classify;
pub mod code;
pub mod kinds;
pub mod response;

pub use classify::{
    classify, classify_optional, error_chain, find_classification, is_client_error,
    is_server_error, to_http_status, Classification,
};
pub use code::{status_for_raw_code, ErrorCode, UnknownErrorCode};
pub use kinds::{
    ApplicationError, BoxError, ClassifiedError, CodedError, DomainError, ResilienceError,
};
pub use response::{ApiError, ErrorBody, ErrorEnvelope, ErrorMeta};
