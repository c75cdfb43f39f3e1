// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The shared audit database resource (redb, pure Rust, ACID).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use redb::{Database, ReadTransaction, ReadableDatabase, WriteTransaction};

use super::audit_table::{AUDIT_ENTITY_INDEX, AUDIT_EVENTS, AUDIT_TIME_INDEX};
use super::{StoreError, StoreResult};
use crate::db::{Resource, ResourceFactory};
use crate::error::BoxError;

/// URL scheme accepted in front of the database path.
const URL_SCHEME: &str = "redb://";

/// Embedded database holding the audit ledger and any business tables that
/// must commit atomically with it.
pub struct AuditDatabase {
    db: Database,
    path: PathBuf,
}

impl AuditDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(AUDIT_EVENTS)?;
            write_txn.open_table(AUDIT_ENTITY_INDEX)?;
            write_txn.open_table(AUDIT_TIME_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn begin_write(&self) -> StoreResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    pub fn begin_read(&self) -> StoreResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    /// Run `work` inside one write transaction.
    ///
    /// Commits when `work` returns `Ok`; aborts when it returns `Err`, so
    /// nothing written through the handle becomes visible.
    pub fn in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&WriteTransaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        let txn = self.begin_write()?;
        match work(&txn) {
            Ok(value) => {
                txn.commit().map_err(StoreError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = txn.abort() {
                    tracing::warn!(error = %abort_err, "failed to abort write transaction");
                }
                Err(err)
            }
        }
    }

    /// Cheap liveness probe: open a read transaction on the ledger table.
    pub fn check_liveness(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        read_txn.open_table(AUDIT_EVENTS)?;
        Ok(())
    }
}

#[async_trait]
impl Resource for AuditDatabase {
    async fn ping(&self) -> Result<(), BoxError> {
        self.check_liveness().map_err(Into::into)
    }

    async fn close(&self) {
        // The file handle is released when the last shared reference drops.
        tracing::info!(path = %self.path.display(), "audit database released");
    }
}

/// Opens [`AuditDatabase`] on the blocking pool.
#[derive(Debug, Clone)]
pub struct RedbFactory {
    path: PathBuf,
}

impl RedbFactory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Accepts `redb://<path>` or a bare path.
    pub fn from_url(database_url: &str) -> Self {
        let path = database_url
            .strip_prefix(URL_SCHEME)
            .unwrap_or(database_url);
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResourceFactory<AuditDatabase> for RedbFactory {
    async fn create(&self) -> Result<AuditDatabase, BoxError> {
        let path = self.path.clone();
        let db = tokio::task::spawn_blocking(move || AuditDatabase::open(&path)).await??;
        tracing::info!(path = %self.path.display(), "audit database opened");
        Ok(db)
    }
}
