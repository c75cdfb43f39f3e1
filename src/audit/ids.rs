// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identifier and clock capabilities injected into the recorder.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of fresh audit event identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Random (v4) UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Source of the current UTC instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
