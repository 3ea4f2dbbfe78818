//! MercadoPago REST client.
//!
//! Only the merchant-order lookup is implemented; it is used to enrich
//! `merchant_order` webhook notifications with payment details.

use crate::config::MercadoPagoConfig;
use crate::models::MerchantOrder;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use service_core::observability::TracedClientExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("MercadoPago returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Timed out after {0:?} waiting for MercadoPago")]
    Timeout(Duration),

    #[error("Connection error: {0}")]
    Transport(String),

    #[error("Failed to parse merchant order: {0}")]
    Decode(String),
}

impl LookupError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            LookupError::Configuration(_) => "configuration",
            LookupError::Status { .. } => "status",
            LookupError::Timeout(_) => "timeout",
            LookupError::Transport(_) => "transport",
            LookupError::Decode(_) => "decode",
        }
    }
}

#[async_trait]
pub trait MerchantOrderLookup: Send + Sync {
    /// Fetch one merchant order. `request_id` is forwarded for correlation.
    async fn fetch_merchant_order(
        &self,
        order_id: &str,
        request_id: Option<&str>,
    ) -> Result<MerchantOrder, LookupError>;
}

#[derive(Clone)]
pub struct MercadoPagoClient {
    client: Client,
    api_base_url: String,
    access_token: Secret<String>,
    timeout: Duration,
    percent_encode: bool,
}

impl MercadoPagoClient {
    /// Fails when no access token is configured.
    pub fn new(config: &MercadoPagoConfig, percent_encode: bool) -> Result<Self, LookupError> {
        let access_token = config.credential().cloned().ok_or_else(|| {
            LookupError::Configuration("MercadoPago access token is not configured".to_string())
        })?;

        // The client-level timeout covers connect, headers and body; when it
        // fires the request future is dropped, which closes the connection.
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LookupError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            access_token,
            timeout: config.timeout(),
            percent_encode,
        })
    }

    pub fn merchant_order_url(&self, order_id: &str) -> String {
        if self.percent_encode {
            format!(
                "{}/merchant_orders/{}",
                self.api_base_url,
                urlencoding::encode(order_id)
            )
        } else {
            format!("{}/merchant_orders/{}", self.api_base_url, order_id)
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> LookupError {
        if e.is_timeout() {
            LookupError::Timeout(self.timeout)
        } else {
            LookupError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl MerchantOrderLookup for MercadoPagoClient {
    async fn fetch_merchant_order(
        &self,
        order_id: &str,
        request_id: Option<&str>,
    ) -> Result<MerchantOrder, LookupError> {
        let url = self.merchant_order_url(order_id);

        tracing::debug!(order_id = %order_id, "Fetching MercadoPago merchant order");

        let response = self
            .client
            .traced_get(&url)
            .bearer_auth(self.access_token.expose_secret())
            .header("Content-Type", "application/json")
            .send_with_request_id(request_id)
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if status != StatusCode::OK {
            tracing::debug!(status = %status, body = %body, "MercadoPago merchant order lookup rejected");
            return Err(LookupError::Status { status, body });
        }

        serde_json::from_str(&body).map_err(|e| LookupError::Decode(e.to_string()))
    }
}

/// In-memory lookup for tests and local runs without credentials.
pub struct MockMerchantOrderLookup {
    response: Option<MerchantOrder>,
    delay: Duration,
    calls: AtomicU64,
    requested_ids: Mutex<Vec<String>>,
}

impl MockMerchantOrderLookup {
    /// Answers every lookup with `order`, or a 404 when `None`.
    pub fn new(order: Option<MerchantOrder>) -> Self {
        Self {
            response: order,
            delay: Duration::ZERO,
            calls: AtomicU64::new(0),
            requested_ids: Mutex::new(Vec::new()),
        }
    }

    /// Holds every lookup for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested_ids(&self) -> Vec<String> {
        self.requested_ids
            .lock()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MerchantOrderLookup for MockMerchantOrderLookup {
    async fn fetch_merchant_order(
        &self,
        order_id: &str,
        _request_id: Option<&str>,
    ) -> Result<MerchantOrder, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut ids) = self.requested_ids.lock() {
            ids.push(order_id.to_string());
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        tracing::info!(order_id = %order_id, "[MOCK] Merchant order lookup");

        self.response.clone().ok_or_else(|| LookupError::Status {
            status: StatusCode::NOT_FOUND,
            body: format!("merchant order {} not found", order_id),
        })
    }
}
