// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage
//!
//! Persistence adapters backed by redb:
//!
//! - [`AuditDatabase`]: the shared database resource, its factory and the
//!   commit-or-abort transaction helper
//! - [`AuditTx`]: the transactional handle the audit recorder writes through

pub mod audit_table;
pub mod database;

pub use audit_table::AuditTx;
pub use database::{AuditDatabase, RedbFactory};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("audit event {0} already exists")]
    Duplicate(String),

    #[error("write attempted through a read-only transaction")]
    ReadOnly,

    #[error("corrupt audit data: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for crate::error::ApplicationError {
    fn from(err: StoreError) -> Self {
        crate::error::ApplicationError::internal("storage failure").with_cause(err)
    }
}
