// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Audit trail
//!
//! Append-only record of business actions, written in the same transaction
//! as the action itself.
//!
//! - [`Redactor`]: PII-safe deep copy of event payloads
//! - [`AuditEvent`]: validated, immutable record
//! - [`AuditRecorder`]: redact, validate, persist and list
//! - [`PageConfig`]: page-number pagination with a configured default and cap

pub mod event;
pub mod ids;
pub mod page;
pub mod recorder;
pub mod redact;

pub use event::{AuditEvent, AuditEventInput, AuditEventView};
pub use ids::{Clock, IdGenerator, SystemClock, UuidV4Generator};
pub use page::{InvalidPageConfig, Page, PageConfig, PageParams, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use recorder::{AuditPage, AuditRecorder};
pub use redact::{
    EmailMode, InvalidEmailMode, RedactionPolicy, Redactor, DEFAULT_SENSITIVE_FIELDS,
    REDACTED_MARKER,
};
