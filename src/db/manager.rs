// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Lazily created shared resource with non-destructive health checks.
//!
//! ## Lifecycle
//!
//! `Uninitialized → Live → (Unreachable ⇄ Live)`, terminal `Closed`.
//!
//! A failed liveness check never tears down or replaces the resource: query
//! executors and transaction managers hold long-lived references to it.
//! Recovery is driven by later [`ConnectionManager::ping`] calls; there is no
//! background retry loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use super::resource::{Resource, ResourceFactory};
use crate::error::{ApplicationError, BoxError, ClassifiedError, ResilienceError};

/// Default bound on the one-time resource creation (3 seconds).
pub const DEFAULT_CREATE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("failed to create database resource: {0}")]
    Create(#[source] BoxError),

    #[error("database resource creation timed out after {0:?}")]
    CreateTimeout(Duration),

    #[error("database resource creation cancelled")]
    Cancelled,

    #[error("database resource unreachable: {0}")]
    Unreachable(#[source] BoxError),

    #[error("connection manager is closed")]
    Closed,
}

impl From<ConnectionError> for ClassifiedError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Create(_) | ConnectionError::Unreachable(_) => {
                ResilienceError::new("SERVICE_UNAVAILABLE", "database unavailable")
                    .with_cause(err)
                    .into()
            }
            ConnectionError::CreateTimeout(_) => {
                ResilienceError::timeout_exceeded("database connection timed out")
                    .with_cause(err)
                    .into()
            }
            ConnectionError::Cancelled => ApplicationError::timeout("database connection cancelled")
                .with_cause(err)
                .into(),
            ConnectionError::Closed => ApplicationError::internal("database connection closed")
                .with_cause(err)
                .into(),
        }
    }
}

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Live,
    Unreachable,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Uninitialized => "uninitialized",
            ConnectionState::Live => "live",
            ConnectionState::Unreachable => "unreachable",
            ConnectionState::Closed => "closed",
        }
    }
}

struct Slot<R> {
    resource: Option<Arc<R>>,
    closed: bool,
}

/// Owner of a single shared resource.
///
/// Many readers (`ping` fast path, `get_resource`) proceed concurrently; the
/// writer (first creation, `close`) excludes everyone else.
pub struct ConnectionManager<R: Resource> {
    factory: Arc<dyn ResourceFactory<R>>,
    create_timeout: Duration,
    slot: RwLock<Slot<R>>,
    reachable: AtomicBool,
}

impl<R: Resource> ConnectionManager<R> {
    pub fn new(factory: Arc<dyn ResourceFactory<R>>, create_timeout: Duration) -> Self {
        Self {
            factory,
            create_timeout,
            slot: RwLock::new(Slot {
                resource: None,
                closed: false,
            }),
            reachable: AtomicBool::new(false),
        }
    }

    /// Check liveness, creating the resource on first use.
    pub async fn ping(&self, cancel: &CancellationToken) -> Result<(), ConnectionError> {
        // Fast path: resource already exists
        {
            let slot = self.slot.read().await;
            if slot.closed {
                return Err(ConnectionError::Closed);
            }
            if let Some(resource) = slot.resource.clone() {
                drop(slot);
                return self.check(&resource).await;
            }
        }

        // Slow path: re-check under the write lock so concurrent first
        // callers create the resource exactly once
        let mut slot = self.slot.write().await;
        if slot.closed {
            return Err(ConnectionError::Closed);
        }
        if slot.resource.is_some() {
            return Ok(());
        }

        let created = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ConnectionError::Cancelled),
            result = tokio::time::timeout(self.create_timeout, self.factory.create()) => result,
        };

        match created {
            Ok(Ok(resource)) => {
                slot.resource = Some(Arc::new(resource));
                self.reachable.store(true, Ordering::Release);
                tracing::info!("database resource created");
                Ok(())
            }
            Ok(Err(err)) => Err(ConnectionError::Create(err)),
            Err(_) => Err(ConnectionError::CreateTimeout(self.create_timeout)),
        }
    }

    async fn check(&self, resource: &R) -> Result<(), ConnectionError> {
        match resource.ping().await {
            Ok(()) => {
                if !self.reachable.swap(true, Ordering::AcqRel) {
                    tracing::info!("database resource reachable");
                }
                Ok(())
            }
            Err(err) => {
                if self.reachable.swap(false, Ordering::AcqRel) {
                    tracing::warn!(error = %err, "database resource unreachable");
                }
                Err(ConnectionError::Unreachable(err))
            }
        }
    }

    /// Current resource, if created. Call [`Self::ping`] at least once first.
    pub async fn get_resource(&self) -> Option<Arc<R>> {
        self.slot.read().await.resource.clone()
    }

    /// The resource, creating it first if needed.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<Arc<R>, ConnectionError> {
        if let Some(resource) = self.get_resource().await {
            return Ok(resource);
        }
        self.ping(cancel).await?;
        self.get_resource().await.ok_or(ConnectionError::Closed)
    }

    /// Close the resource and clear the reference. Idempotent.
    pub async fn close(&self) {
        let mut slot = self.slot.write().await;
        slot.closed = true;
        self.reachable.store(false, Ordering::Release);
        if let Some(resource) = slot.resource.take() {
            resource.close().await;
            tracing::info!("database resource closed");
        }
    }

    pub async fn state(&self) -> ConnectionState {
        let slot = self.slot.read().await;
        if slot.closed {
            ConnectionState::Closed
        } else if slot.resource.is_none() {
            ConnectionState::Uninitialized
        } else if self.reachable.load(Ordering::Acquire) {
            ConnectionState::Live
        } else {
            ConnectionState::Unreachable
        }
    }
}
