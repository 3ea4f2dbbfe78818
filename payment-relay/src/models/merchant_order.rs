use super::ProviderId;
use serde::{Deserialize, Serialize};

/// MercadoPago merchant order, as returned by `GET /merchant_orders/{id}`.
/// Only the fields the relay reports on are modelled.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MerchantOrder {
    #[serde(default)]
    pub id: Option<ProviderId>,
    #[serde(default)]
    pub order_status: Option<String>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub currency_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub payments: Vec<MerchantOrderPayment>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MerchantOrderPayment {
    #[serde(default)]
    pub id: Option<ProviderId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub transaction_amount: Option<f64>,
    #[serde(default)]
    pub currency_id: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<MerchantOrderPayment>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<MerchantOrderPayment>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Condensed view of a merchant order used for logging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MerchantOrderSummary {
    pub id: Option<String>,
    pub status: String,
    pub total_amount: Option<f64>,
    pub currency: Option<String>,
    pub payments: Vec<PaymentSummary>,
    pub has_approved_payment: bool,
    pub has_pending_payment: bool,
    pub has_rejected_payment: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentSummary {
    pub id: Option<String>,
    pub status: Option<String>,
    pub status_detail: Option<String>,
    pub transaction_amount: Option<f64>,
}

impl From<&MerchantOrder> for MerchantOrderSummary {
    fn from(order: &MerchantOrder) -> Self {
        let has_status = |wanted: &[&str]| {
            order
                .payments
                .iter()
                .any(|p| p.status.as_deref().is_some_and(|s| wanted.contains(&s)))
        };

        Self {
            id: order.id.as_ref().map(ToString::to_string),
            status: order
                .order_status
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            total_amount: order.total_amount,
            currency: order.currency_id.clone(),
            payments: order
                .payments
                .iter()
                .map(|p| PaymentSummary {
                    id: p.id.as_ref().map(ToString::to_string),
                    status: p.status.clone(),
                    status_detail: p.status_detail.clone(),
                    transaction_amount: p.transaction_amount,
                })
                .collect(),
            has_approved_payment: has_status(&["approved"]),
            has_pending_payment: has_status(&["pending", "in_process"]),
            has_rejected_payment: has_status(&["rejected"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_provider_payload() {
        let order: MerchantOrder = serde_json::from_value(json!({
            "id": 35507449982u64,
            "status": "closed",
            "order_status": "paid",
            "total_amount": 1500.5,
            "currency_id": "ARS",
            "external_reference": "cart-7",
            "payments": [
                {
                    "id": 1317431234,
                    "status": "approved",
                    "status_detail": "accredited",
                    "transaction_amount": 1500.5,
                    "currency_id": "ARS"
                }
            ]
        }))
        .unwrap();

        assert_eq!(order.id, Some(ProviderId::Number(35507449982)));
        assert_eq!(order.order_status.as_deref(), Some("paid"));
        assert_eq!(order.payments.len(), 1);
        assert_eq!(order.payments[0].status_detail.as_deref(), Some("accredited"));
    }

    #[test]
    fn tolerates_missing_and_null_fields() {
        let order: MerchantOrder = serde_json::from_value(json!({ "payments": null })).unwrap();
        assert!(order.id.is_none());
        assert!(order.payments.is_empty());

        let summary = MerchantOrderSummary::from(&order);
        assert_eq!(summary.status, "unknown");
        assert!(!summary.has_approved_payment);
        assert!(!summary.has_pending_payment);
        assert!(!summary.has_rejected_payment);
    }

    #[test]
    fn summary_flags_payment_states() {
        let order: MerchantOrder = serde_json::from_value(json!({
            "id": "mo-1",
            "order_status": "payment_in_process",
            "payments": [
                { "id": 1, "status": "rejected", "status_detail": "cc_rejected_other_reason" },
                { "id": 2, "status": "in_process", "status_detail": "pending_contingency" }
            ]
        }))
        .unwrap();

        let summary = MerchantOrderSummary::from(&order);
        assert_eq!(summary.id.as_deref(), Some("mo-1"));
        assert_eq!(summary.status, "payment_in_process");
        assert!(!summary.has_approved_payment);
        assert!(summary.has_pending_payment);
        assert!(summary.has_rejected_payment);
        assert_eq!(summary.payments[1].id.as_deref(), Some("2"));
    }
}
