mod common;

use axum::{body::Body, http::Request};
use common::{get, post_webhook, router, router_with, router_with_probe, send, test_config};
use payment_relay::config::WebhookProbe;
use payment_relay::models::MerchantOrder;
use payment_relay::services::{MerchantOrderLookup, MockMerchantOrderLookup};
use secrecy::Secret;
use std::sync::Arc;
use std::time::Duration;

fn config_with_token() -> payment_relay::config::RelayConfig {
    let mut config = test_config();
    config.mercadopago.access_token = Some(Secret::new("TEST-token".to_string()));
    config
}

async fn wait_for_calls(mock: &MockMerchantOrderLookup, expected: u64) {
    for _ in 0..100 {
        if mock.call_count() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!(
        "expected {} lookups, saw {}",
        expected,
        mock.call_count()
    );
}

#[tokio::test]
async fn payment_notification_is_processed() {
    let response = post_webhook(
        router(),
        r#"{"type":"payment","action":"payment.created","data":{"id":"123456"}}"#,
    )
    .await;

    assert_eq!(response.status, 200);
    let body = response.json();
    assert_eq!(body["received"], true);
    assert_eq!(body["processed"], true);
    assert_eq!(body["topic"], "payment");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn numeric_payment_id_is_accepted() {
    let response = post_webhook(router(), r#"{"type":"payment","data":{"id":987654321}}"#).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json()["processed"], true);
}

#[tokio::test]
async fn merchant_order_topic_wins_over_type() {
    let response = post_webhook(
        router(),
        r#"{"topic":"merchant_order","type":"other","resource":"https://api.mercadolibre.com/merchant_orders/555"}"#,
    )
    .await;

    let body = response.json();
    assert_eq!(body["processed"], true);
    assert_eq!(body["topic"], "merchant_order");
}

#[tokio::test]
async fn preference_notification_is_processed() {
    let response = post_webhook(router(), r#"{"type":"preference","data":{"id":"pref-1"}}"#).await;

    let body = response.json();
    assert_eq!(body["processed"], true);
    assert_eq!(body["topic"], "preference");
}

#[tokio::test]
async fn unknown_shape_is_acknowledged_but_not_processed() {
    let response = post_webhook(router(), r#"{"hello":"world"}"#).await;

    assert_eq!(response.status, 200);
    let body = response.json();
    assert_eq!(body["received"], true);
    assert_eq!(body["processed"], false);
    assert_eq!(body["topic"], "unknown");
}

#[tokio::test]
async fn non_object_json_is_acknowledged_as_unknown() {
    let response = post_webhook(router(), "[1,2,3]").await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json()["processed"], false);
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let response = post_webhook(router(), "{bad").await;

    assert_eq!(response.status, 400);
    let body = response.json();
    assert_eq!(body["error"], "Invalid JSON");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn empty_body_is_a_reachability_check() {
    let response = post_webhook(router(), "").await;

    assert_eq!(response.status, 200);
    let body = response.json();
    assert_eq!(body["received"], true);
    assert_eq!(body["message"], "Webhook endpoint active");
}

#[tokio::test]
async fn acknowledgment_allows_any_origin() {
    let response = post_webhook(router(), r#"{"type":"payment","data":{"id":"1"}}"#).await;

    assert_eq!(response.headers["access-control-allow-origin"], "*");
    assert_eq!(response.content_type(), "application/json");
}

#[tokio::test]
async fn get_describes_the_endpoint_by_default() {
    let response = get(router(), "/webhook").await;

    assert_eq!(response.status, 200);
    let body = response.json();
    assert_eq!(body["message"], "Webhook endpoint active");
    assert_eq!(body["method"], "This endpoint only accepts POST");
    assert_eq!(body["url"], "/webhook");
}

#[tokio::test]
async fn get_can_render_the_redirect_page() {
    let response = get(
        router_with_probe(WebhookProbe::Redirect),
        "/webhook?status=approved&payment_id=3",
    )
    .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type(), "text/html; charset=utf-8");
    assert!(response
        .body
        .contains("futrono://payment/success?payment_id=3&status=approved"));
}

#[tokio::test]
async fn non_post_can_be_rejected() {
    let response = send(
        router_with_probe(WebhookProbe::Reject),
        Request::builder()
            .method("PUT")
            .uri("/webhook")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status, 405);
    assert_eq!(response.json()["error"], "Method not allowed");
}

#[tokio::test]
async fn merchant_order_is_enriched_without_delaying_the_ack() {
    let mock = Arc::new(
        MockMerchantOrderLookup::new(Some(MerchantOrder::default()))
            .with_delay(Duration::from_secs(2)),
    );
    let lookup: Arc<dyn MerchantOrderLookup> = mock.clone();
    let app = router_with(config_with_token(), Some(lookup));

    let response = tokio::time::timeout(
        Duration::from_millis(500),
        post_webhook(
            app,
            r#"{"topic":"merchant_order","resource":"https://api.mercadolibre.com/merchant_orders/12345"}"#,
        ),
    )
    .await
    .expect("acknowledgment waited on the lookup");

    assert_eq!(response.status, 200);
    assert_eq!(response.json()["processed"], true);

    wait_for_calls(&mock, 1).await;
    assert_eq!(mock.requested_ids(), vec!["12345".to_string()]);
}

#[tokio::test]
async fn failed_lookup_does_not_change_the_ack() {
    let mock = Arc::new(MockMerchantOrderLookup::new(None));
    let lookup: Arc<dyn MerchantOrderLookup> = mock.clone();
    let app = router_with(config_with_token(), Some(lookup));

    let response = post_webhook(
        app,
        r#"{"topic":"merchant_order","resource":"/merchant_orders/404"}"#,
    )
    .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json()["processed"], true);
    wait_for_calls(&mock, 1).await;
}

#[tokio::test]
async fn resource_without_id_skips_the_lookup() {
    let mock = Arc::new(MockMerchantOrderLookup::new(Some(MerchantOrder::default())));
    let lookup: Arc<dyn MerchantOrderLookup> = mock.clone();
    let app = router_with(config_with_token(), Some(lookup));

    let response = post_webhook(
        app,
        r#"{"topic":"merchant_order","resource":"https://api.mercadolibre.com/merchant_orders/"}"#,
    )
    .await;

    assert_eq!(response.status, 200);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn no_lookup_without_access_token() {
    let response = post_webhook(
        router(),
        r#"{"topic":"merchant_order","resource":"/merchant_orders/1"}"#,
    )
    .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json()["processed"], true);
}

#[tokio::test]
async fn webhook_path_ignores_case() {
    let response = send(
        router(),
        Request::builder()
            .method("POST")
            .uri("/WEBHOOK")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"type":"payment","data":{"id":"1"}}"#))
            .unwrap(),
    )
    .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type(), "application/json");
    let body = response.json();
    assert_eq!(body["processed"], true);
    assert_eq!(body["topic"], "payment");
    assert_eq!(response.headers["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn mixed_case_webhook_probe_follows_the_configured_mode() {
    let response = get(router(), "/Webhook").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.json()["url"], "/webhook");

    let response = send(
        router_with_probe(WebhookProbe::Reject),
        Request::builder()
            .method("GET")
            .uri("/WebHook")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status, 405);
}

#[tokio::test]
async fn longer_paths_are_not_the_webhook() {
    let response = post_webhook_to(router(), "/webhook/extra", r#"{"type":"payment"}"#).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type(), "text/html; charset=utf-8");
}

#[tokio::test]
async fn oversized_body_is_413() {
    let body = "x".repeat(3 * 1024 * 1024);

    let response = post_webhook(router(), &body).await;

    assert_eq!(response.status, 413);
    assert_eq!(response.json()["error"], "Payload too large");
}

async fn post_webhook_to(router: axum::Router, uri: &str, body: &str) -> common::TestResponse {
    send(
        router,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}
