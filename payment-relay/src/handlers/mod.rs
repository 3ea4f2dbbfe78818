//! HTTP handlers for payment-relay.

pub mod redirect;
pub mod webhook;

use crate::services::get_metrics;
use crate::AppState;
use axum::{
    extract::{Request, State},
    handler::Handler,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use webhook::WEBHOOK_PATH;

/// Health check endpoint for Docker/K8s liveness probes.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "payment-relay",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// The relay holds no connections, so it is ready as soon as it listens.
pub async fn readiness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ready" })))
}

/// Prometheus metrics endpoint.
pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

/// Everything the router does not match exactly. The webhook path is matched
/// ignoring ASCII case; every other path renders the redirect page.
pub async fn fallback(State(state): State<AppState>, request: Request) -> Response {
    if request.uri().path().eq_ignore_ascii_case(WEBHOOK_PATH) {
        return if request.method() == Method::POST {
            webhook::receive.call(request, state).await
        } else {
            webhook::probe.call(request, state).await
        };
    }

    redirect::redirect.call(request, state).await
}
