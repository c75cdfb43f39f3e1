// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Append-only audit ledger tables.
//!
//! ## Table Layout
//!
//! - `audit_events`: event id → serialized [`AuditRow`] (JSON bytes)
//! - `audit_entity_index`: `entity_type | 0x00 | entity_id | !timestamp | id` → event id
//! - `audit_time_index`: `timestamp | id` → event id
//!
//! Timestamps are encoded as order-preserving big-endian microseconds, so a
//! forward scan of the entity index yields newest first and a forward scan of
//! the time index yields oldest first.

use chrono::{DateTime, Utc};
use redb::{ReadTransaction, ReadableTable, TableDefinition, WriteTransaction};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{StoreError, StoreResult};
use crate::audit::AuditEvent;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: event id → serialized [`AuditRow`].
pub(crate) const AUDIT_EVENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("audit_events");

/// Index for per-entity listing, newest first.
pub(crate) const AUDIT_ENTITY_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("audit_entity_index");

/// Index for chronological scans, oldest first.
pub(crate) const AUDIT_TIME_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("audit_time_index");

// =============================================================================
// Stored Row
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct AuditRow {
    id: Uuid,
    event_type: String,
    actor_id: Option<Uuid>,
    entity_type: String,
    entity_id: Uuid,
    /// Redacted JSON text.
    payload: String,
    timestamp: DateTime<Utc>,
    correlation_id: String,
}

impl AuditRow {
    fn from_event(event: &AuditEvent) -> StoreResult<Self> {
        let payload = std::str::from_utf8(event.payload())
            .map_err(|e| StoreError::Corrupt(format!("audit payload is not UTF-8: {e}")))?
            .to_string();
        Ok(Self {
            id: event.id(),
            event_type: event.event_type().to_string(),
            actor_id: event.actor_id(),
            entity_type: event.entity_type().to_string(),
            entity_id: event.entity_id(),
            payload,
            timestamp: event.timestamp(),
            correlation_id: event.correlation_id().to_string(),
        })
    }

    fn into_event(self) -> AuditEvent {
        AuditEvent::restore(
            self.id,
            self.event_type,
            self.actor_id,
            self.entity_type,
            self.entity_id,
            self.payload.into_bytes(),
            self.timestamp,
            self.correlation_id,
        )
    }
}

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Order-preserving encoding of a signed microsecond timestamp.
fn encode_timestamp(timestamp: DateTime<Utc>) -> u64 {
    (timestamp.timestamp_micros() as u64) ^ (1 << 63)
}

fn entity_prefix(entity_type: &str, entity_id: Uuid) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(entity_type.len() + 1 + 16);
    prefix.extend_from_slice(entity_type.as_bytes());
    prefix.push(0);
    prefix.extend_from_slice(entity_id.as_bytes());
    prefix
}

/// Upper bound for a prefix range scan (prefix with 0xFF bytes appended
/// past any suffix length used by the indexes).
fn prefix_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = Vec::with_capacity(prefix.len() + 32);
    end.extend_from_slice(prefix);
    end.extend_from_slice(&[0xFF; 32]);
    end
}

fn entity_index_key(event: &AuditEvent) -> Vec<u8> {
    let mut key = entity_prefix(event.entity_type(), event.entity_id());
    // Inverted for newest-first ordering on forward scans
    key.extend_from_slice(&(!encode_timestamp(event.timestamp())).to_be_bytes());
    key.extend_from_slice(event.id().as_bytes());
    key
}

fn time_index_key(timestamp: DateTime<Utc>, id: Uuid) -> Vec<u8> {
    let mut key = Vec::with_capacity(24);
    key.extend_from_slice(&encode_timestamp(timestamp).to_be_bytes());
    key.extend_from_slice(id.as_bytes());
    key
}

// =============================================================================
// Transactional Handle
// =============================================================================

/// Query capability of a transaction over the audit tables.
///
/// Everything issued through one handle commits or rolls back together; the
/// recorder never opens a transaction of its own.
pub trait AuditTx {
    /// Append one event. Fails if the id already exists.
    fn insert_audit_event(&self, event: &AuditEvent) -> StoreResult<()>;

    /// Number of events recorded for an entity.
    fn count_audit_events_by_entity(&self, entity_type: &str, entity_id: Uuid) -> StoreResult<u64>;

    /// Events for an entity, newest first.
    fn list_audit_events_by_entity(
        &self,
        entity_type: &str,
        entity_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<AuditEvent>>;

    /// Events at or after `since`, oldest first.
    fn list_audit_events_since(
        &self,
        since: DateTime<Utc>,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<AuditEvent>>;
}

fn count_by_entity<I>(index: &I, entity_type: &str, entity_id: Uuid) -> StoreResult<u64>
where
    I: ReadableTable<&'static [u8], &'static str>,
{
    let prefix = entity_prefix(entity_type, entity_id);
    let end = prefix_end(&prefix);
    let mut count = 0u64;
    for entry in index.range(prefix.as_slice()..end.as_slice())? {
        entry?;
        count += 1;
    }
    Ok(count)
}

fn scan_index<I, E>(
    index: &I,
    events: &E,
    start: &[u8],
    end: &[u8],
    offset: u64,
    limit: u64,
) -> StoreResult<Vec<AuditEvent>>
where
    I: ReadableTable<&'static [u8], &'static str>,
    E: ReadableTable<&'static str, &'static [u8]>,
{
    let capacity = usize::try_from(limit.min(1024)).unwrap_or(0);
    let mut results = Vec::with_capacity(capacity);
    let skip = usize::try_from(offset).unwrap_or(usize::MAX);
    let take = usize::try_from(limit).unwrap_or(usize::MAX);

    for entry in index.range(start..end)?.skip(skip).take(take) {
        let (_, id) = entry?;
        let id = id.value().to_string();
        let row = events
            .get(id.as_str())?
            .ok_or_else(|| StoreError::Corrupt(format!("index references missing event {id}")))?;
        let row: AuditRow = serde_json::from_slice(row.value())?;
        results.push(row.into_event());
    }

    Ok(results)
}

fn list_by_entity<I, E>(
    index: &I,
    events: &E,
    entity_type: &str,
    entity_id: Uuid,
    offset: u64,
    limit: u64,
) -> StoreResult<Vec<AuditEvent>>
where
    I: ReadableTable<&'static [u8], &'static str>,
    E: ReadableTable<&'static str, &'static [u8]>,
{
    let prefix = entity_prefix(entity_type, entity_id);
    let end = prefix_end(&prefix);
    scan_index(index, events, &prefix, &end, offset, limit)
}

fn list_since<I, E>(
    index: &I,
    events: &E,
    since: DateTime<Utc>,
    offset: u64,
    limit: u64,
) -> StoreResult<Vec<AuditEvent>>
where
    I: ReadableTable<&'static [u8], &'static str>,
    E: ReadableTable<&'static str, &'static [u8]>,
{
    let start = encode_timestamp(since).to_be_bytes();
    let end = [0xFF; 32];
    scan_index(index, events, &start, &end, offset, limit)
}

impl AuditTx for WriteTransaction {
    fn insert_audit_event(&self, event: &AuditEvent) -> StoreResult<()> {
        let row = AuditRow::from_event(event)?;
        let json = serde_json::to_vec(&row)?;
        let id = event.id().to_string();

        let mut events = self.open_table(AUDIT_EVENTS)?;
        if events.get(id.as_str())?.is_some() {
            return Err(StoreError::Duplicate(id));
        }
        events.insert(id.as_str(), json.as_slice())?;

        let mut entity_index = self.open_table(AUDIT_ENTITY_INDEX)?;
        entity_index.insert(entity_index_key(event).as_slice(), id.as_str())?;

        let mut time_index = self.open_table(AUDIT_TIME_INDEX)?;
        time_index.insert(
            time_index_key(event.timestamp(), event.id()).as_slice(),
            id.as_str(),
        )?;
        Ok(())
    }

    fn count_audit_events_by_entity(&self, entity_type: &str, entity_id: Uuid) -> StoreResult<u64> {
        let index = self.open_table(AUDIT_ENTITY_INDEX)?;
        count_by_entity(&index, entity_type, entity_id)
    }

    fn list_audit_events_by_entity(
        &self,
        entity_type: &str,
        entity_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<AuditEvent>> {
        let index = self.open_table(AUDIT_ENTITY_INDEX)?;
        let events = self.open_table(AUDIT_EVENTS)?;
        list_by_entity(&index, &events, entity_type, entity_id, offset, limit)
    }

    fn list_audit_events_since(
        &self,
        since: DateTime<Utc>,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<AuditEvent>> {
        let index = self.open_table(AUDIT_TIME_INDEX)?;
        let events = self.open_table(AUDIT_EVENTS)?;
        list_since(&index, &events, since, offset, limit)
    }
}

impl AuditTx for ReadTransaction {
    fn insert_audit_event(&self, _event: &AuditEvent) -> StoreResult<()> {
        Err(StoreError::ReadOnly)
    }

    fn count_audit_events_by_entity(&self, entity_type: &str, entity_id: Uuid) -> StoreResult<u64> {
        let index = self.open_table(AUDIT_ENTITY_INDEX)?;
        count_by_entity(&index, entity_type, entity_id)
    }

    fn list_audit_events_by_entity(
        &self,
        entity_type: &str,
        entity_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<AuditEvent>> {
        let index = self.open_table(AUDIT_ENTITY_INDEX)?;
        let events = self.open_table(AUDIT_EVENTS)?;
        list_by_entity(&index, &events, entity_type, entity_id, offset, limit)
    }

    fn list_audit_events_since(
        &self,
        since: DateTime<Utc>,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<AuditEvent>> {
        let index = self.open_table(AUDIT_TIME_INDEX)?;
        let events = self.open_table(AUDIT_EVENTS)?;
        list_since(&index, &events, since, offset, limit)
    }
}

// =============================================================================
// Tests
// =============================================================================
