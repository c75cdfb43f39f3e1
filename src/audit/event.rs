// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit event model.
//!
//! An [`AuditEvent`] is only obtainable through [`AuditEvent::new`], which
//! validates it, or by loading a row that was validated when written. It has
//! no setters.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::DomainError;

/// What a business operation hands to the recorder.
#[derive(Debug, Clone, Default)]
pub struct AuditEventInput {
    /// `entity.action`, e.g. `user.created`.
    pub event_type: String,
    /// `None` for system-initiated actions.
    pub actor_id: Option<Uuid>,
    pub entity_type: String,
    pub entity_id: Uuid,
    /// Raw, unredacted payload.
    pub payload: Option<Value>,
    pub correlation_id: String,
}

impl AuditEventInput {
    pub fn new(
        event_type: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: Uuid,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            entity_type: entity_type.into(),
            entity_id,
            ..Self::default()
        }
    }

    pub fn with_actor(mut self, actor_id: Uuid) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }
}

/// Immutable, validated audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    id: Uuid,
    event_type: String,
    actor_id: Option<Uuid>,
    entity_type: String,
    entity_id: Uuid,
    payload: Vec<u8>,
    timestamp: DateTime<Utc>,
    correlation_id: String,
}

impl AuditEvent {
    /// Build and validate an event.
    ///
    /// Checks run in a fixed order and the first violation is returned:
    /// id, event type, entity type, entity id, payload, timestamp.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        event_type: String,
        actor_id: Option<Uuid>,
        entity_type: String,
        entity_id: Uuid,
        payload: Vec<u8>,
        timestamp: DateTime<Utc>,
        correlation_id: String,
    ) -> Result<Self, DomainError> {
        let event = Self::restore(
            id,
            event_type,
            actor_id,
            entity_type,
            entity_id,
            payload,
            timestamp,
            correlation_id,
        );
        event.validate()?;
        Ok(event)
    }

    /// Rebuild an event from storage without re-validating.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: Uuid,
        event_type: String,
        actor_id: Option<Uuid>,
        entity_type: String,
        entity_id: Uuid,
        payload: Vec<u8>,
        timestamp: DateTime<Utc>,
        correlation_id: String,
    ) -> Self {
        Self {
            id,
            event_type,
            actor_id: actor_id.filter(|actor| !actor.is_nil()),
            entity_type,
            entity_id,
            payload,
            timestamp,
            correlation_id,
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.id.is_nil() {
            return Err(invalid("audit event id is required", "id"));
        }
        if self.event_type.trim().is_empty() {
            return Err(invalid("event type is required", "event_type"));
        }
        if self.entity_type.trim().is_empty() {
            return Err(invalid("entity type is required", "entity_type"));
        }
        if self.entity_id.is_nil() {
            return Err(invalid("entity id is required", "entity_id"));
        }
        if self.payload.is_empty() || self.payload.as_slice() == b"null" {
            return Err(invalid("payload is required", "payload"));
        }
        if self.timestamp == DateTime::<Utc>::default() {
            return Err(invalid("timestamp is required", "timestamp"));
        }
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// `None` means system-initiated.
    pub fn actor_id(&self) -> Option<Uuid> {
        self.actor_id
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn entity_id(&self) -> Uuid {
        self.entity_id
    }

    /// Redacted JSON payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload parsed back into JSON.
    pub fn payload_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

fn invalid(message: &str, field: &str) -> DomainError {
    DomainError::validation(message).with_hint(format!("field: {field}"))
}

/// JSON view of an audit event for API responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditEventView {
    pub id: Uuid,
    pub event_type: String,
    pub actor_id: Option<Uuid>,
    pub entity_type: String,
    pub entity_id: Uuid,
    #[schema(value_type = Object)]
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: String,
}

impl TryFrom<&AuditEvent> for AuditEventView {
    type Error = serde_json::Error;

    fn try_from(event: &AuditEvent) -> Result<Self, Self::Error> {
        Ok(Self {
            id: event.id,
            event_type: event.event_type.clone(),
            actor_id: event.actor_id,
            entity_type: event.entity_type.clone(),
            entity_id: event.entity_id,
            payload: event.payload_json()?,
            timestamp: event.timestamp,
            correlation_id: event.correlation_id.clone(),
        })
    }
}
