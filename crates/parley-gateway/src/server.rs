// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook HTTP server built on axum.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    routing::{get, post},
};
use parley_agent::IngestionCoordinator;
use parley_config::model::GatewayConfig;
use parley_core::ParleyError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::lanes::ChatLanes;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub coordinator: Arc<IngestionCoordinator>,
    /// Expected path token. `None` rejects every webhook call.
    pub webhook_token: Option<Arc<str>>,
    pub lanes: Arc<ChatLanes>,
    /// Turns in flight; waited on at shutdown.
    pub tasks: TaskTracker,
    /// Parent of every turn's cancellation token.
    pub shutdown: CancellationToken,
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(
        coordinator: Arc<IngestionCoordinator>,
        webhook_token: Option<&str>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            coordinator,
            webhook_token: webhook_token.map(Arc::from),
            lanes: Arc::new(ChatLanes::new()),
            tasks: TaskTracker::new(),
            shutdown,
            start_time: Instant::now(),
        }
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("webhook_token", &self.webhook_token.as_ref().map(|_| "[redacted]"))
            .field("lanes", &self.lanes.len())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

/// Routes:
/// - `POST {webhook_path}/{token}`
/// - `GET /health`
pub fn build_router(webhook_path: &str, state: GatewayState) -> Router {
    let webhook_route = format!("{}/{{token}}", webhook_path.trim_end_matches('/'));
    Router::new()
        .route(&webhook_route, post(handlers::post_webhook))
        .route("/health", get(handlers::get_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until `state.shutdown` fires, then waits for in-flight turns.
pub async fn start_server(config: &GatewayConfig, state: GatewayState) -> Result<(), ParleyError> {
    let app = build_router(&config.webhook_path, state.clone());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ParleyError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    info!(%addr, webhook_path = %config.webhook_path, "gateway listening");

    let shutdown = state.shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| ParleyError::Internal(format!("gateway server error: {e}")))?;

    state.tasks.close();
    info!(in_flight = state.tasks.len(), "waiting for in-flight turns");
    state.tasks.wait().await;
    Ok(())
}
