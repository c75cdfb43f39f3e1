// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit recorder: validate, redact and persist audit events through the
//! caller's transaction.
//!
//! The recorder never opens a transaction of its own. Callers pass the same
//! handle they use for the business write, so both commit or roll back
//! together.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::event::{AuditEvent, AuditEventInput};
use super::ids::{Clock, IdGenerator, SystemClock, UuidV4Generator};
use super::page::{Page, PageConfig, PageParams};
use super::redact::Redactor;
use crate::error::ApplicationError;
use crate::storage::AuditTx;

/// One page of audit events plus the total count for the query.
#[derive(Debug, Clone)]
pub struct AuditPage {
    pub events: Vec<AuditEvent>,
    pub total: u64,
    pub page: Page,
}

impl AuditPage {
    pub fn has_more(&self) -> bool {
        self.page.offset.saturating_add(self.events.len() as u64) < self.total
    }
}

pub struct AuditRecorder {
    redactor: Redactor,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    pages: PageConfig,
}

impl AuditRecorder {
    pub fn new(redactor: Redactor, pages: PageConfig) -> Self {
        Self {
            redactor,
            ids: Arc::new(UuidV4Generator),
            clock: Arc::new(SystemClock),
            pages,
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    pub fn page_config(&self) -> PageConfig {
        self.pages
    }

    /// Record one event through `tx`.
    ///
    /// Appends exactly one row on success. Nothing is retried here; a
    /// failure leaves the decision to abort to the caller's transaction.
    pub fn record<T>(
        &self,
        tx: &T,
        input: AuditEventInput,
        cancel: &CancellationToken,
    ) -> Result<AuditEvent, ApplicationError>
    where
        T: AuditTx + ?Sized,
    {
        let redacted = self.redactor.redact(input.payload.as_ref());
        let payload = match redacted {
            Some(value) => serde_json::to_vec(&value).map_err(|e| {
                ApplicationError::internal("failed to serialize audit payload").with_cause(e)
            })?,
            None => Vec::new(),
        };

        let event = AuditEvent::new(
            self.ids.next_id(),
            input.event_type,
            input.actor_id,
            input.entity_type,
            input.entity_id,
            payload,
            self.clock.now(),
            input.correlation_id,
        )
        .map_err(|e| ApplicationError::from_domain("invalid audit event", e))?;

        if cancel.is_cancelled() {
            return Err(ApplicationError::timeout("audit recording cancelled"));
        }

        tx.insert_audit_event(&event).map_err(|e| {
            ApplicationError::internal("failed to persist audit event").with_cause(e)
        })?;

        tracing::debug!(
            audit_id = %event.id(),
            event_type = event.event_type(),
            entity_type = event.entity_type(),
            entity_id = %event.entity_id(),
            correlation_id = event.correlation_id(),
            "audit event recorded"
        );

        Ok(event)
    }

    /// Events for one entity, newest first.
    pub fn list_by_entity<T>(
        &self,
        tx: &T,
        entity_type: &str,
        entity_id: Uuid,
        params: PageParams,
        cancel: &CancellationToken,
    ) -> Result<AuditPage, ApplicationError>
    where
        T: AuditTx + ?Sized,
    {
        let page = self.pages.normalize(params);
        if cancel.is_cancelled() {
            return Err(ApplicationError::timeout("audit query cancelled"));
        }

        let total = tx
            .count_audit_events_by_entity(entity_type, entity_id)
            .map_err(|e| ApplicationError::internal("failed to count audit events").with_cause(e))?;
        let events = tx
            .list_audit_events_by_entity(entity_type, entity_id, page.offset, page.size)
            .map_err(|e| ApplicationError::internal("failed to list audit events").with_cause(e))?;

        Ok(AuditPage {
            events,
            total,
            page,
        })
    }

    /// Events recorded at or after `since`, oldest first.
    pub fn list_recent<T>(
        &self,
        tx: &T,
        since: DateTime<Utc>,
        params: PageParams,
        cancel: &CancellationToken,
    ) -> Result<Vec<AuditEvent>, ApplicationError>
    where
        T: AuditTx + ?Sized,
    {
        let page = self.pages.normalize(params);
        if cancel.is_cancelled() {
            return Err(ApplicationError::timeout("audit query cancelled"));
        }

        tx.list_audit_events_since(since, page.offset, page.size)
            .map_err(|e| ApplicationError::internal("failed to scan audit events").with_cause(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{EmailMode, RedactionPolicy, REDACTED_MARKER};
    use crate::error::{classify, ErrorCode};
    use crate::storage::{AuditDatabase, StoreError};
    use chrono::{Duration, TimeZone};
    use redb::{ReadableTable, TableDefinition, WriteTransaction};
    use serde_json::json;
    use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

    const ACCOUNTS: TableDefinition<&str, u64> = TableDefinition::new("accounts");

    struct SequentialIds(AtomicU64);

    impl IdGenerator for SequentialIds {
        fn next_id(&self) -> Uuid {
            Uuid::from_u128(u128::from(self.0.fetch_add(1, Ordering::SeqCst)))
        }
    }

    /// Advances one second per call.
    struct SteppingClock(AtomicI64);

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let secs = self.0.fetch_add(1, Ordering::SeqCst);
            Utc.timestamp_opt(1_700_000_000 + secs, 0)
                .single()
                .unwrap_or_default()
        }
    }

    fn open_account(txn: &WriteTransaction, name: &str, balance: u64) -> Result<(), StoreError> {
        txn.open_table(ACCOUNTS)?.insert(name, balance)?;
        Ok(())
    }

    fn temp_db() -> (AuditDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = AuditDatabase::open(&dir.path().join("audit.redb")).unwrap();
        (db, dir)
    }

    fn recorder(mode: EmailMode) -> AuditRecorder {
        AuditRecorder::new(Redactor::new(RedactionPolicy::new(mode)), PageConfig::default())
            .with_id_generator(Arc::new(SequentialIds(AtomicU64::new(1))))
            .with_clock(Arc::new(SteppingClock(AtomicI64::new(0))))
    }

    fn signup(entity_id: Uuid) -> AuditEventInput {
        AuditEventInput::new("user.created", "user", entity_id)
            .with_payload(json!({ "email": "a@b.com", "name": "Ada" }))
            .with_correlation_id("req-1")
    }

    fn stored_payload(db: &AuditDatabase, entity_id: Uuid) -> serde_json::Value {
        let read = db.begin_read().unwrap();
        let events = read
            .list_audit_events_by_entity("user", entity_id, 0, 10)
            .unwrap();
        assert_eq!(events.len(), 1);
        events[0].payload_json().unwrap()
    }

    #[test]
    fn partial_mode_persists_masked_email() {
        let (db, _dir) = temp_db();
        let recorder = recorder(EmailMode::Partial);
        let entity_id = Uuid::new_v4();

        db.in_transaction(|txn| recorder.record(txn, signup(entity_id), &CancellationToken::new()))
            .unwrap();

        let payload = stored_payload(&db, entity_id);
        let email = payload["email"].as_str().unwrap();
        assert_ne!(email, "a@b.com");
        assert!(email.ends_with("@b.com"));
        assert_eq!(payload["name"], "Ada");
    }

    #[test]
    fn full_mode_persists_marker() {
        let (db, _dir) = temp_db();
        let recorder = recorder(EmailMode::Full);
        let entity_id = Uuid::new_v4();

        db.in_transaction(|txn| recorder.record(txn, signup(entity_id), &CancellationToken::new()))
            .unwrap();

        assert_eq!(stored_payload(&db, entity_id)["email"], REDACTED_MARKER);
    }

    #[test]
    fn record_returns_event_with_generated_fields() {
        let (db, _dir) = temp_db();
        let recorder = recorder(EmailMode::Partial);
        let actor = Uuid::new_v4();
        let entity_id = Uuid::new_v4();

        let event = db
            .in_transaction(|txn| {
                recorder.record(
                    txn,
                    signup(entity_id).with_actor(actor),
                    &CancellationToken::new(),
                )
            })
            .unwrap();

        assert_eq!(event.id(), Uuid::from_u128(1));
        assert_eq!(event.actor_id(), Some(actor));
        assert_eq!(event.correlation_id(), "req-1");
        assert_eq!(event.timestamp().timestamp(), 1_700_000_000);
    }

    #[test]
    fn validation_reports_first_violation_in_order() {
        let (db, _dir) = temp_db();
        let recorder = recorder(EmailMode::Partial);
        let input = AuditEventInput::new("  ", "", Uuid::new_v4()).with_payload(json!({}));

        let txn = db.begin_write().unwrap();
        let err = recorder
            .record(&txn, input, &CancellationToken::new())
            .unwrap_err();
        assert_eq!(classify(&err), ErrorCode::ValidationError);
        assert_eq!(err.message(), "invalid audit event");
        assert_eq!(err.hint(), Some("field: event_type"));
    }

    #[test]
    fn missing_payload_is_rejected() {
        let (db, _dir) = temp_db();
        let recorder = recorder(EmailMode::Partial);
        let input = AuditEventInput::new("user.deleted", "user", Uuid::new_v4());

        let txn = db.begin_write().unwrap();
        let err = recorder
            .record(&txn, input, &CancellationToken::new())
            .unwrap_err();
        assert_eq!(err.hint(), Some("field: payload"));
    }

    #[test]
    fn persistence_failure_is_internal_with_cause() {
        let (db, _dir) = temp_db();
        let recorder = recorder(EmailMode::Partial);
        let read = db.begin_read().unwrap();

        let err = recorder
            .record(&read, signup(Uuid::new_v4()), &CancellationToken::new())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InternalError);
        let cause = std::error::Error::source(&err).unwrap();
        assert!(cause.downcast_ref::<StoreError>().is_some());
    }

    #[test]
    fn cancelled_record_writes_nothing() {
        let (db, _dir) = temp_db();
        let recorder = recorder(EmailMode::Partial);
        let entity_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = db
            .in_transaction(|txn| recorder.record(txn, signup(entity_id), &cancel))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Timeout);

        let read = db.begin_read().unwrap();
        assert_eq!(read.count_audit_events_by_entity("user", entity_id).unwrap(), 0);
    }

    #[test]
    fn business_write_and_audit_row_commit_or_roll_back_together() {
        let (db, _dir) = temp_db();
        let recorder = recorder(EmailMode::Partial);
        let cancel = CancellationToken::new();
        let good = Uuid::new_v4();
        let bad = Uuid::new_v4();

        let committed: Result<(), ApplicationError> = db.in_transaction(|txn| {
            open_account(txn, "good", 1)?;
            recorder.record(txn, signup(good), &cancel)?;
            Ok(())
        });
        committed.unwrap();

        // Business write succeeds, audit validation fails afterwards
        let rolled_back: Result<(), ApplicationError> = db.in_transaction(|txn| {
            open_account(txn, "bad", 2)?;
            recorder.record(txn, AuditEventInput::new("", "user", bad), &cancel)?;
            Ok(())
        });
        assert!(rolled_back.is_err());

        let read = db.begin_read().unwrap();
        let accounts = read.open_table(ACCOUNTS).unwrap();
        assert!(accounts.get("good").unwrap().is_some());
        assert!(accounts.get("bad").unwrap().is_none());
        assert_eq!(read.count_audit_events_by_entity("user", good).unwrap(), 1);
        assert_eq!(read.count_audit_events_by_entity("user", bad).unwrap(), 0);
    }

    #[test]
    fn list_by_entity_paginates_newest_first() {
        let (db, _dir) = temp_db();
        let recorder = recorder(EmailMode::Partial);
        let cancel = CancellationToken::new();
        let entity_id = Uuid::new_v4();

        db.in_transaction(|txn| {
            for i in 0..5 {
                let input = AuditEventInput::new(format!("step.{i}"), "order", entity_id)
                    .with_payload(json!({ "step": i }));
                recorder.record(txn, input, &cancel)?;
            }
            Ok::<_, ApplicationError>(())
        })
        .unwrap();

        let read = db.begin_read().unwrap();
        let first = recorder
            .list_by_entity(&read, "order", entity_id, PageParams::new(1, 2), &cancel)
            .unwrap();
        assert_eq!(first.total, 5);
        assert!(first.has_more());
        let types: Vec<_> = first.events.iter().map(|e| e.event_type()).collect();
        assert_eq!(types, ["step.4", "step.3"]);

        let last = recorder
            .list_by_entity(&read, "order", entity_id, PageParams::new(3, 2), &cancel)
            .unwrap();
        assert_eq!(last.events.len(), 1);
        assert_eq!(last.events[0].event_type(), "step.0");
        assert!(!last.has_more());
    }

    #[test]
    fn non_positive_page_behaves_like_first_page() {
        let (db, _dir) = temp_db();
        let recorder = recorder(EmailMode::Partial);
        let cancel = CancellationToken::new();
        let entity_id = Uuid::new_v4();

        db.in_transaction(|txn| {
            for _ in 0..3 {
                recorder.record(txn, signup(entity_id), &cancel)?;
            }
            Ok::<_, ApplicationError>(())
        })
        .unwrap();

        let read = db.begin_read().unwrap();
        let list = |page| {
            recorder
                .list_by_entity(&read, "user", entity_id, PageParams::new(page, 2), &cancel)
                .unwrap()
                .events
        };
        assert_eq!(list(0), list(1));
        assert_eq!(list(-4), list(1));
    }

    #[test]
    fn list_recent_scans_chronologically() {
        let (db, _dir) = temp_db();
        let recorder = recorder(EmailMode::Partial);
        let cancel = CancellationToken::new();

        db.in_transaction(|txn| {
            for i in 0..4 {
                let input = AuditEventInput::new(format!("tick.{i}"), "clock", Uuid::new_v4())
                    .with_payload(json!({ "i": i }));
                recorder.record(txn, input, &cancel)?;
            }
            Ok::<_, ApplicationError>(())
        })
        .unwrap();

        let since = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap() + Duration::seconds(2);
        let read = db.begin_read().unwrap();
        let events = recorder
            .list_recent(&read, since, PageParams::default(), &cancel)
            .unwrap();
        let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(types, ["tick.2", "tick.3"]);
    }

    #[test]
    fn cancelled_query_times_out() {
        let (db, _dir) = temp_db();
        let recorder = recorder(EmailMode::Partial);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let read = db.begin_read().unwrap();
        let err = recorder
            .list_by_entity(&read, "user", Uuid::new_v4(), PageParams::default(), &cancel)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Timeout);
    }
}
