//! Checkout redirect handler.
//!
//! MercadoPago sends the buyer's browser back to one of the preference's
//! `back_urls` with the payment result in the query string. Browsers cannot
//! be redirected to a custom scheme reliably with a 3xx, so the relay answers
//! with a small page that navigates to the app's deep link from script and
//! offers a button if that navigation is blocked.

use askama::Template;
use axum::{
    extract::State,
    http::{Method, Uri},
};

use crate::{
    models::RedirectQuery,
    services::{classify_outcome, metrics},
    AppState,
};

/// Delay before the page swaps in the manual "open app" button.
pub const FALLBACK_DELAY_MS: u32 = 2000;

#[derive(Template)]
#[template(path = "redirect.html")]
pub struct RedirectTemplate {
    pub deep_link: String,
    pub fallback_delay_ms: u32,
}

impl RedirectTemplate {
    pub fn new(deep_link: String) -> Self {
        Self {
            deep_link,
            fallback_delay_ms: FALLBACK_DELAY_MS,
        }
    }
}

/// Render the redirect page for any path the router does not claim.
pub async fn redirect(State(state): State<AppState>, method: Method, uri: Uri) -> RedirectTemplate {
    let path = uri.path().to_lowercase();
    let query = RedirectQuery::from_query_string(uri.query());

    tracing::info!(
        method = %method,
        path = %path,
        payment_id = query.payment_identifier().unwrap_or("-"),
        status = query.status().unwrap_or("-"),
        "Payment redirect received"
    );

    let outcome = classify_outcome(&path, query.status());
    let deep_link = state
        .deep_links
        .build(outcome, query.payment_identifier(), query.status());

    metrics::record_redirect(outcome.as_str());
    tracing::info!(outcome = %outcome, deep_link = %deep_link, "Redirecting to app");

    RedirectTemplate::new(deep_link)
}
