// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.

use std::collections::BTreeMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parley_core::{HealthStatus, TurnOutcome};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" when every component is healthy, "degraded" otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub components: BTreeMap<String, HealthStatus>,
}

/// POST {webhook_path}/{token}
///
/// Authenticates by path token, parses the update and hands the turn to a
/// background task in the chat's lane. The response never waits for the
/// turn.
pub async fn post_webhook(
    State(state): State<GatewayState>,
    Path(token): Path<String>,
    body: Bytes,
) -> StatusCode {
    let authorized = state
        .webhook_token
        .as_deref()
        .is_some_and(|expected| expected == token);
    if !authorized {
        warn!("webhook call with wrong token rejected");
        return StatusCode::FORBIDDEN;
    }

    let update = match parley_telegram::parse_update(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "malformed webhook payload");
            return StatusCode::BAD_REQUEST;
        }
    };
    let update_id = update.update_id;
    let Some(msg) = update.into_inbound() else {
        debug!(update_id, "update without message ignored");
        return StatusCode::OK;
    };

    let chat_id = msg.chat_id;
    let cancel = state.shutdown.child_token();
    let coordinator = state.coordinator.clone();
    let lanes = state.lanes.clone();
    state.tasks.spawn(async move {
        let lane = lanes.enter(chat_id).await;
        let report = coordinator.handle_with_cancel(msg, cancel).await;
        drop(lane);
        lanes.release(chat_id);

        let failures: Vec<String> = report
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.stage, f.error))
            .collect();
        match report.outcome {
            TurnOutcome::StoredReplyFailed => warn!(
                chat_id,
                update_id,
                outcome = %report.outcome,
                ?failures,
                "turn finished without reply"
            ),
            outcome => info!(chat_id, update_id, %outcome, ?failures, "turn finished"),
        }
    });

    StatusCode::OK
}

/// GET /health
///
/// 200 when every component reports healthy, 503 otherwise.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let coordinator = &state.coordinator;
    let (store, generator, dispatcher) = (
        coordinator.store(),
        coordinator.generator(),
        coordinator.dispatcher(),
    );
    let checks = [
        (store.name(), store.health_check().await),
        (generator.name(), generator.health_check().await),
        (dispatcher.name(), dispatcher.health_check().await),
    ];

    let components: BTreeMap<String, HealthStatus> = checks
        .into_iter()
        .map(|(name, result)| {
            let status = result.unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
            (name.to_string(), status)
        })
        .collect();

    let healthy = components.values().all(|s| *s == HealthStatus::Healthy);
    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.start_time.elapsed().as_secs(),
        components,
    };
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(body)).into_response()
}
