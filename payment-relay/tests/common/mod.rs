#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use payment_relay::config::{RelayConfig, WebhookProbe};
use payment_relay::services::MerchantOrderLookup;
use payment_relay::{build_router, AppState, Application};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::util::ServiceExt;

pub fn test_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.common.port = 0;
    config.common.log_level = "error".to_string();
    config
}

pub fn router() -> Router {
    router_with(test_config(), None)
}

pub fn router_with_probe(probe: WebhookProbe) -> Router {
    let mut config = test_config();
    config.webhook.probe = probe;
    router_with(config, None)
}

pub fn router_with(config: RelayConfig, lookup: Option<Arc<dyn MerchantOrderLookup>>) -> Router {
    build_router(AppState::with_lookup(config, lookup))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("Response body is not JSON")
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }
}

pub async fn send(router: Router, request: Request<Body>) -> TestResponse {
    let response = router.oneshot(request).await.expect("Request failed");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    TestResponse {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8"),
    }
}

pub async fn get(router: Router, uri: &str) -> TestResponse {
    send(
        router,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn post_webhook(router: Router, body: &str) -> TestResponse {
    send(
        router,
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// A relay bound to a random local port.
pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    pub async fn spawn(state: AppState) -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let app = Application::build_with_state(addr, state)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, port }
    }
}
