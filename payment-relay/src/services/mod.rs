pub mod deep_link;
pub mod enrichment;
pub mod mercadopago;
pub mod metrics;
pub mod status;

pub use deep_link::DeepLinkBuilder;
pub use enrichment::OrderEnricher;
pub use mercadopago::{LookupError, MercadoPagoClient, MerchantOrderLookup, MockMerchantOrderLookup};
pub use metrics::{get_metrics, init_metrics};
pub use status::classify_outcome;
