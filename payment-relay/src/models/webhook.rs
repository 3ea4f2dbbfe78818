//! MercadoPago notification shapes and the acknowledgment bodies sent back.
//!
//! MercadoPago posts three kinds of notification to the same endpoint:
//!
//! - `{ "type": "payment", "action": "payment.updated", "data": { "id": ... } }`
//! - `{ "topic": "merchant_order", "resource": "https://.../merchant_orders/123" }`
//! - `{ "type": "preference", "data": { "id": ... } }`
//!
//! Anything else is acknowledged but reported as unprocessed, since a non-2xx
//! answer makes the provider redeliver indefinitely.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier as sent by the provider: sometimes a JSON number, sometimes a
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ProviderId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::Number(n) => write!(f, "{}", n),
            ProviderId::Text(s) => f.write_str(s),
        }
    }
}

/// A classified notification.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    Payment {
        id: Option<ProviderId>,
        action: Option<String>,
    },
    MerchantOrder {
        resource: Option<String>,
    },
    Preference {
        id: Option<ProviderId>,
    },
    Unknown {
        kind: Option<String>,
        topic: Option<String>,
        action: Option<String>,
        resource: Option<String>,
    },
}

impl WebhookEvent {
    /// Classify a parsed body. `type` is checked for `payment` first, then
    /// `topic` for `merchant_order`, then `type` for `preference`.
    pub fn classify(payload: &Value) -> Self {
        let kind = string_field(payload, "type");
        let topic = string_field(payload, "topic");

        if kind.as_deref() == Some("payment") {
            return WebhookEvent::Payment {
                id: data_id(payload),
                action: string_field(payload, "action"),
            };
        }

        if topic.as_deref() == Some("merchant_order") {
            return WebhookEvent::MerchantOrder {
                resource: string_field(payload, "resource"),
            };
        }

        if kind.as_deref() == Some("preference") {
            return WebhookEvent::Preference {
                id: data_id(payload),
            };
        }

        WebhookEvent::Unknown {
            kind,
            topic,
            action: string_field(payload, "action"),
            resource: string_field(payload, "resource"),
        }
    }

    /// Bounded label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WebhookEvent::Payment { .. } => "payment",
            WebhookEvent::MerchantOrder { .. } => "merchant_order",
            WebhookEvent::Preference { .. } => "preference",
            WebhookEvent::Unknown { .. } => "unknown",
        }
    }

    pub fn is_processed(&self) -> bool {
        !matches!(self, WebhookEvent::Unknown { .. })
    }

    /// Merchant-order id: the last `/`-separated segment of `resource`.
    /// `None` for other events, a missing resource, or an empty segment.
    pub fn merchant_order_id(&self) -> Option<&str> {
        match self {
            WebhookEvent::MerchantOrder {
                resource: Some(resource),
            } => resource.rsplit('/').next().filter(|id| !id.is_empty()),
            _ => None,
        }
    }
}

/// Topic echoed back in the acknowledgment: `topic`, else `type`, else
/// `"unknown"`.
pub fn ack_topic(payload: &Value) -> String {
    string_field(payload, "topic")
        .or_else(|| string_field(payload, "type"))
        .unwrap_or_else(|| "unknown".to_string())
}

fn string_field(payload: &Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn data_id(payload: &Value) -> Option<ProviderId> {
    payload
        .get("data")
        .and_then(|data| data.get("id"))
        .cloned()
        .and_then(|id| serde_json::from_value(id).ok())
}

/// Body returned for a processed (or deliberately ignored) notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    pub processed: bool,
    pub timestamp: String,
    pub topic: String,
}

/// Body returned for an empty POST, which MercadoPago uses as a reachability
/// check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessAck {
    pub received: bool,
    pub message: String,
    pub timestamp: String,
}

/// Body returned for non-POST calls when the endpoint describes itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookInfo {
    pub message: String,
    pub method: String,
    pub url: String,
}
