//! MercadoPago webhook handler.
//!
//! Every well-formed notification is acknowledged with 200, including shapes
//! the relay does not understand: MercadoPago retries anything else. Only a
//! body that is not JSON at all gets a 400.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use service_core::{error::AppError, middleware::RequestId};

use crate::{
    config::WebhookProbe,
    handlers::redirect,
    models::{webhook::ack_topic, LivenessAck, WebhookAck, WebhookEvent, WebhookInfo},
    services::metrics,
    AppState,
};

pub const WEBHOOK_PATH: &str = "/webhook";

/// Receive a notification.
pub async fn receive(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let body = body.map_err(body_error)?;

    if body.is_empty() {
        tracing::info!("Webhook without body, treating as reachability check");
        return Ok((
            StatusCode::OK,
            Json(LivenessAck {
                received: true,
                message: "Webhook endpoint active".to_string(),
                timestamp: timestamp(),
            }),
        )
            .into_response());
    }

    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(
            error = %e,
            body = %String::from_utf8_lossy(&body),
            "Webhook body is not valid JSON"
        );
        AppError::InvalidJson(e)
    })?;

    tracing::debug!(payload = %payload, "Webhook payload");

    let event = WebhookEvent::classify(&payload);
    log_event(&event);

    if let WebhookEvent::MerchantOrder { resource } = &event {
        match (&state.enricher, event.merchant_order_id()) {
            (Some(enricher), Some(order_id)) => {
                // Detached: the acknowledgment below never waits on this.
                let _ = enricher.spawn(
                    order_id.to_string(),
                    request_id.map(|Extension(id)| id.0),
                );
            }
            (None, _) => {
                tracing::info!(
                    resource = resource.as_deref().unwrap_or("-"),
                    "Set ACCESS_TOKEN to fetch merchant order details automatically"
                );
            }
            (Some(_), None) => {
                tracing::warn!(
                    resource = resource.as_deref().unwrap_or("-"),
                    "Merchant order notification without a usable order id"
                );
            }
        }
    }

    let processed = event.is_processed();
    metrics::record_webhook(event.kind(), processed);

    let ack = WebhookAck {
        received: true,
        processed,
        timestamp: timestamp(),
        topic: ack_topic(&payload),
    };

    Ok((
        StatusCode::OK,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(ack),
    )
        .into_response())
}

/// Any method other than POST on the webhook path.
pub async fn probe(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, AppError> {
    match state.config.webhook.probe {
        WebhookProbe::Info => Ok((
            StatusCode::OK,
            Json(WebhookInfo {
                message: "Webhook endpoint active".to_string(),
                method: "This endpoint only accepts POST".to_string(),
                url: WEBHOOK_PATH.to_string(),
            }),
        )
            .into_response()),
        WebhookProbe::Redirect => Ok(redirect::redirect(State(state), method, uri)
            .await
            .into_response()),
        WebhookProbe::Reject => {
            tracing::debug!(method = %method, "Rejecting non-POST webhook call");
            Err(AppError::MethodNotAllowed(method.to_string()))
        }
    }
}

/// Oversized bodies keep their 413; any other read failure is a 500.
fn body_error(rejection: BytesRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!(error = %rejection.body_text(), "Webhook body exceeds the size limit");
        AppError::PayloadTooLarge(rejection.body_text())
    } else {
        tracing::error!(error = %rejection.body_text(), "Failed to read webhook body");
        AppError::InternalError(anyhow::anyhow!(
            "Failed to read webhook body: {}",
            rejection.body_text()
        ))
    }
}

fn log_event(event: &WebhookEvent) {
    match event {
        WebhookEvent::Payment { id, action } => tracing::info!(
            payment_id = %display_or_dash(id),
            action = action.as_deref().unwrap_or("-"),
            "Payment notification processed"
        ),
        WebhookEvent::MerchantOrder { resource } => tracing::info!(
            merchant_order_id = event.merchant_order_id().unwrap_or("-"),
            resource = resource.as_deref().unwrap_or("-"),
            "Merchant order notification processed"
        ),
        WebhookEvent::Preference { id } => tracing::info!(
            preference_id = %display_or_dash(id),
            "Preference notification processed"
        ),
        WebhookEvent::Unknown {
            kind,
            topic,
            action,
            resource,
        } => tracing::info!(
            kind = kind.as_deref().unwrap_or("-"),
            topic = topic.as_deref().unwrap_or("-"),
            action = action.as_deref().unwrap_or("-"),
            resource = resource.as_deref().unwrap_or("-"),
            "Unrecognised notification format"
        ),
    }
}

fn display_or_dash<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
