// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit Core - error taxonomy, transactional audit trail and resilient
//! database connection management.
//!
//! ## Modules
//!
//! - `error` - Public error vocabulary, classification and HTTP mapping
//! - `audit` - PII redaction and the transactional audit recorder
//! - `db` - Lazily created shared database resource with health checks
//! - `storage` - redb tables and the audit database resource
//! - `api` - HTTP API handlers (Axum)
//! - `context` - Per-request correlation id, actor and cancellation

pub mod api;
pub mod audit;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod logging;
pub mod state;
pub mod storage;
