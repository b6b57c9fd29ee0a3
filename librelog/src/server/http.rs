//! HTTP server for librelog.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use tokio::signal;

use super::auth::require_token;
use super::config::LogServerConfig;
use super::handlers::{
    AppState, handle_create_logset, handle_create_token, handle_delete_logset, handle_export,
    handle_get_logset, handle_healthy, handle_list_logsets, handle_list_tokens, handle_metrics,
    handle_query_logs, handle_ready, handle_revoke_token, handle_update_logset,
};
use super::ingest::{handle_ingest, handle_ingest_stream};
use super::metrics::Metrics;
use super::middleware::{trace_requests, track_metrics};
use crate::LogDb;

/// Builds the full router.
///
/// Everything under `/api/v1` requires a token; `/metrics` and the health
/// endpoints do not.
pub fn build_router(log: Arc<LogDb>, metrics: Arc<Metrics>, config: &LogServerConfig) -> Router {
    let state = AppState {
        log,
        metrics,
        max_message_bytes: config.max_message_bytes,
    };

    let api = Router::new()
        .route(
            "/api/v1/ingest",
            get(handle_ingest_stream).post(handle_ingest),
        )
        .route(
            "/api/v1/logsets",
            get(handle_list_logsets).post(handle_create_logset),
        )
        .route(
            "/api/v1/logsets/{id}",
            get(handle_get_logset)
                .put(handle_update_logset)
                .delete(handle_delete_logset),
        )
        .route("/api/v1/logsets/{id}/logs", get(handle_query_logs))
        .route("/api/v1/logsets/{id}/export", get(handle_export))
        .route(
            "/api/v1/tokens",
            get(handle_list_tokens).post(handle_create_token),
        )
        .route(
            "/api/v1/tokens/{hash}",
            axum::routing::delete(handle_revoke_token),
        )
        .route_layer(from_fn_with_state(state.clone(), require_token));

    let open = Router::new()
        .route("/metrics", get(handle_metrics))
        .route("/-/healthy", get(handle_healthy))
        .route("/-/ready", get(handle_ready));

    api.merge(open)
        .layer(DefaultBodyLimit::max(config.max_message_bytes))
        .layer(from_fn(trace_requests))
        .layer(from_fn_with_state(state.clone(), track_metrics))
        .with_state(state)
}

/// HTTP server for the log service.
pub struct LogServer {
    log: Arc<LogDb>,
    config: LogServerConfig,
}

impl LogServer {
    pub fn new(log: Arc<LogDb>, config: LogServerConfig) -> Self {
        Self { log, config }
    }

    /// Serves until SIGINT or SIGTERM, then closes the store.
    pub async fn run(self) -> std::io::Result<()> {
        let metrics = Arc::new(Metrics::new());
        let app = build_router(self.log.clone(), metrics, &self.config);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        tracing::info!("Starting librelog HTTP server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Err(e) = self.log.close().await {
            tracing::error!("Failed to close log store: {}", e);
        }
        tracing::info!("Server shut down gracefully");
        Ok(())
    }
}

/// Listen for SIGTERM and SIGINT.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
