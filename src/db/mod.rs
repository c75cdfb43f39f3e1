// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Database connection management
//!
//! - [`ConnectionManager`]: lazy, concurrency-safe creation of one shared
//!   resource with non-destructive liveness checks
//! - [`Resource`] / [`ResourceFactory`]: what the manager needs from the
//!   underlying store

pub mod manager;
pub mod resource;

pub use manager::{ConnectionError, ConnectionManager, ConnectionState, DEFAULT_CREATE_TIMEOUT};
pub use resource::{Resource, ResourceFactory};
