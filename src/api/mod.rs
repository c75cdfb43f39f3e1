// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{http::HeaderName, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    audit::AuditEventView,
    context::CORRELATION_ID_HEADER,
    error::{ErrorBody, ErrorCode, ErrorEnvelope, ErrorMeta},
    state::AppState,
};

pub mod audit;
pub mod health;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/audit/{entity_type}/{entity_id}",
            get(audit::list_entity_events),
        )
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    let correlation_header = HeaderName::from_static(CORRELATION_ID_HEADER);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    correlation_header.clone(),
                    MakeRequestUuid,
                ))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(correlation_header)),
        )
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        health::readiness,
        audit::list_entity_events
    ),
    components(
        schemas(
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks,
            audit::AuditLogResponse,
            AuditEventView,
            ErrorEnvelope,
            ErrorBody,
            ErrorMeta,
            ErrorCode
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Audit", description = "Audit trail queries")
    )
)]
struct ApiDoc;
