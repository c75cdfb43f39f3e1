// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;
use std::sync::Arc;

use audit_core::{
    api::router,
    audit::{AuditRecorder, RedactionPolicy, Redactor},
    config::AppConfig,
    db::ConnectionManager,
    logging,
    state::AppState,
    storage::{AuditDatabase, RedbFactory},
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(config.log_format);

    let factory = RedbFactory::from_url(&config.database_url);
    tracing::info!(path = %factory.path().display(), "using audit database");
    let connections = Arc::new(ConnectionManager::<AuditDatabase>::new(
        Arc::new(factory),
        config.connect_timeout,
    ));

    // Readiness probes retry later; an unavailable database is not fatal here
    if let Err(err) = connections.ping(&CancellationToken::new()).await {
        tracing::warn!(error = %err, "audit database not reachable at startup");
    }

    let recorder = AuditRecorder::new(
        Redactor::new(RedactionPolicy::new(config.email_mode)),
        config.page_config,
    );
    let app = router(AppState::new(Arc::clone(&connections), recorder));

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(%addr, email_mode = %config.email_mode, "audit service listening (docs at /docs)");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    connections.close().await;

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
