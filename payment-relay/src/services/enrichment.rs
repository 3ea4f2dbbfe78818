//! Detached merchant-order enrichment.
//!
//! The webhook handler must answer MercadoPago immediately, so lookups run on
//! their own task. The caller never awaits the task; its outcome only reaches
//! the logs and metrics. Fan-out is not bounded: one task per notification.

use crate::models::MerchantOrderSummary;
use crate::services::mercadopago::MerchantOrderLookup;
use crate::services::metrics;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

#[derive(Clone)]
pub struct OrderEnricher {
    lookup: Arc<dyn MerchantOrderLookup>,
    in_flight: Arc<AtomicUsize>,
}

impl OrderEnricher {
    pub fn new(lookup: Arc<dyn MerchantOrderLookup>) -> Self {
        Self {
            lookup,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Lookups started and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Start a lookup for `order_id` on a new task and return immediately.
    ///
    /// The handle is returned for tests; request handlers drop it.
    pub fn spawn(&self, order_id: String, request_id: Option<String>) -> JoinHandle<()> {
        let lookup = Arc::clone(&self.lookup);
        let guard = InFlightGuard::enter(Arc::clone(&self.in_flight));

        let span = tracing::info_span!(
            "merchant_order_enrichment",
            order_id = %order_id,
            request_id = request_id.as_deref().unwrap_or("-"),
        );

        tokio::spawn(
            async move {
                let _guard = guard;

                tracing::info!("Fetching merchant order details");
                match lookup
                    .fetch_merchant_order(&order_id, request_id.as_deref())
                    .await
                {
                    Ok(order) => {
                        metrics::record_lookup("ok");
                        log_summary(&MerchantOrderSummary::from(&order));
                    }
                    Err(e) => {
                        metrics::record_lookup(e.kind());
                        tracing::warn!(error = %e, "Merchant order details unavailable (optional enrichment)");
                    }
                }
            }
            .instrument(span),
        )
    }
}

fn log_summary(summary: &MerchantOrderSummary) {
    tracing::info!(
        merchant_order_id = summary.id.as_deref().unwrap_or("-"),
        order_status = %summary.status,
        total_amount = ?summary.total_amount,
        currency = summary.currency.as_deref().unwrap_or("-"),
        payment_count = summary.payments.len(),
        has_approved_payment = summary.has_approved_payment,
        has_pending_payment = summary.has_pending_payment,
        has_rejected_payment = summary.has_rejected_payment,
        "Merchant order details"
    );

    for (index, payment) in summary.payments.iter().enumerate() {
        tracing::info!(
            position = index + 1,
            payment_id = payment.id.as_deref().unwrap_or("-"),
            status = payment.status.as_deref().unwrap_or("-"),
            status_detail = payment.status_detail.as_deref().unwrap_or("-"),
            transaction_amount = ?payment.transaction_amount,
            "Merchant order payment"
        );
    }
}

/// Keeps the in-flight counter and gauge accurate even if the task panics.
struct InFlightGuard {
    counter: Arc<AtomicUsize>,
}

impl InFlightGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_lookups_in_flight(now);
        Self { counter }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let now = self.counter.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_lookups_in_flight(now);
    }
}
