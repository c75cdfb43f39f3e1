// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::audit::AuditRecorder;
use crate::db::ConnectionManager;
use crate::storage::AuditDatabase;

#[derive(Clone)]
pub struct AppState {
    pub connections: Arc<ConnectionManager<AuditDatabase>>,
    pub recorder: Arc<AuditRecorder>,
}

impl AppState {
    pub fn new(connections: Arc<ConnectionManager<AuditDatabase>>, recorder: AuditRecorder) -> Self {
        Self {
            connections,
            recorder: Arc::new(recorder),
        }
    }
}
