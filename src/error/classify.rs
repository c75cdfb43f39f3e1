// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Classification of arbitrary errors into the public vocabulary.
//!
//! The cause chain (`Error::source`) is walked innermost-first and the first
//! recognised variant wins. Contextual wrappers that carry no code are
//! transparent to classification. Anything unrecognised degrades to
//! `INTERNAL_ERROR`; this module never fails.

use std::error::Error;

use axum::http::StatusCode;

use super::code::ErrorCode;
use super::kinds::{ApplicationError, ClassifiedError, CodedError, DomainError, ResilienceError};

/// Recognised error found in a chain.
#[derive(Debug, Clone, Copy)]
pub struct Classification<'a> {
    pub code: ErrorCode,
    pub message: &'a str,
    pub hint: Option<&'a str>,
}

fn recognise<'a>(err: &'a (dyn Error + 'static)) -> Option<Classification<'a>> {
    if let Some(e) = err.downcast_ref::<DomainError>() {
        return Some(Classification {
            code: e.code(),
            message: e.message(),
            hint: e.hint(),
        });
    }
    if let Some(e) = err.downcast_ref::<ApplicationError>() {
        return Some(Classification {
            code: e.code(),
            message: e.message(),
            hint: e.hint(),
        });
    }
    if let Some(e) = err.downcast_ref::<ResilienceError>() {
        return Some(Classification {
            code: e.code(),
            message: e.message(),
            hint: e.hint(),
        });
    }
    if let Some(e) = err.downcast_ref::<ClassifiedError>() {
        return Some(Classification {
            code: e.code(),
            message: e.message(),
            hint: e.hint(),
        });
    }
    if let Some(e) = err.downcast_ref::<CodedError>() {
        return Some(Classification {
            code: e.code(),
            message: e.message(),
            hint: None,
        });
    }
    None
}

/// Find the innermost recognised error in the chain.
pub fn find_classification<'a>(err: &'a (dyn Error + 'static)) -> Option<Classification<'a>> {
    let chain: Vec<&'a (dyn Error + 'static)> =
        std::iter::successors(Some(err), |&e| e.source()).collect();
    chain.into_iter().rev().find_map(recognise)
}

/// Public code for an error.
pub fn classify(err: &(dyn Error + 'static)) -> ErrorCode {
    find_classification(err)
        .map(|c| c.code)
        .unwrap_or(ErrorCode::InternalError)
}

/// Public code for an optional error; absence is not success at this boundary.
pub fn classify_optional(err: Option<&(dyn Error + 'static)>) -> ErrorCode {
    err.map(classify).unwrap_or(ErrorCode::InternalError)
}

/// HTTP status for an error.
pub fn to_http_status(err: &(dyn Error + 'static)) -> StatusCode {
    classify(err).http_status()
}

/// Whether the error is the client's fault.
pub fn is_client_error(err: &(dyn Error + 'static)) -> bool {
    classify(err).is_client_error()
}

/// Whether the error is the service's fault.
pub fn is_server_error(err: &(dyn Error + 'static)) -> bool {
    classify(err).is_server_error()
}

/// Render the full chain, outermost first, for internal logs.
pub fn error_chain(err: &(dyn Error + 'static)) -> String {
    std::iter::successors(Some(err), |&e| e.source())
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}
