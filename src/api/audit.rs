// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit trail queries.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::audit::{AuditEventView, PageParams};
use crate::context::RequestContext;
use crate::error::{ApiError, ApplicationError, ClassifiedError, ErrorCode};
use crate::state::AppState;

/// Response for audit trail queries.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogResponse {
    /// Events for the entity, newest first.
    pub events: Vec<AuditEventView>,
    /// Total count across all pages.
    pub total: u64,
    /// 1-indexed page number actually served.
    pub page: u64,
    /// Page size actually served (after clamping).
    pub page_size: u64,
    /// Whether there are more results.
    pub has_more: bool,
}

/// List the audit trail of one entity.
#[utoipa::path(
    get,
    path = "/v1/audit/{entity_type}/{entity_id}",
    tag = "Audit",
    params(
        ("entity_type" = String, Path, description = "Entity type, e.g. `user`"),
        ("entity_id" = Uuid, Path, description = "Entity identifier"),
        PageParams
    ),
    responses(
        (status = 200, description = "Audit events", body = AuditLogResponse),
        (status = 400, description = "Invalid entity id or pagination", body = crate::error::ErrorEnvelope),
        (status = 503, description = "Audit database unavailable", body = crate::error::ErrorEnvelope)
    )
)]
pub async fn list_entity_events(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, String)>,
    query: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<AuditLogResponse>, ApiError> {
    let correlation_id = ctx.correlation_id.as_str();

    let Query(params) = query.map_err(|rejection| {
        ApiError::from_code(ErrorCode::BadRequest, rejection.body_text(), correlation_id)
    })?;
    let entity_id = Uuid::parse_str(&entity_id).map_err(|_| {
        ApiError::from_code(ErrorCode::BadRequest, "entity_id must be a UUID", correlation_id)
    })?;

    let db = state
        .connections
        .acquire(&ctx.cancel)
        .await
        .map_err(|err| ApiError::from_error(&ClassifiedError::from(err), correlation_id))?;

    let read = db
        .begin_read()
        .map_err(|err| ApiError::from_error(&ApplicationError::from(err), correlation_id))?;
    let page = state
        .recorder
        .list_by_entity(&read, &entity_type, entity_id, params, &ctx.cancel)
        .map_err(|err| ApiError::from_error(&err, correlation_id))?;

    let has_more = page.has_more();
    let events = page
        .events
        .iter()
        .map(AuditEventView::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| {
            let err = ApplicationError::internal("stored audit payload is not JSON").with_cause(err);
            ApiError::from_error(&err, correlation_id)
        })?;

    Ok(Json(AuditLogResponse {
        events,
        total: page.total,
        page: page.page.number,
        page_size: page.page.size,
        has_more,
    }))
}
