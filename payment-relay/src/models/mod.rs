pub mod merchant_order;
pub mod redirect;
pub mod webhook;

pub use merchant_order::{MerchantOrder, MerchantOrderPayment, MerchantOrderSummary, PaymentSummary};
pub use redirect::{RedirectOutcome, RedirectQuery};
pub use webhook::{LivenessAck, ProviderId, WebhookAck, WebhookEvent, WebhookInfo};
