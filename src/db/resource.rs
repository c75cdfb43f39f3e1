// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Capabilities the connection manager needs from a shared resource.

use async_trait::async_trait;

use crate::error::BoxError;

/// A long-lived shared resource such as a database or connection pool.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// The resource's own liveness check.
    async fn ping(&self) -> Result<(), BoxError>;

    /// Release the resource at shutdown.
    async fn close(&self);
}

/// Creates the resource on first use.
#[async_trait]
pub trait ResourceFactory<R: Resource>: Send + Sync {
    async fn create(&self) -> Result<R, BoxError>;
}
