pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use config::RelayConfig;
use service_core::error::AppError;
use services::{DeepLinkBuilder, MercadoPagoClient, MerchantOrderLookup, OrderEnricher};
use std::sync::Arc;

pub use startup::{build_router, Application};

/// Per-process state shared by every handler. Built once from the immutable
/// configuration; nothing in it changes while serving.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub deep_links: DeepLinkBuilder,
    /// Present only when an access token is configured.
    pub enricher: Option<OrderEnricher>,
}

impl AppState {
    /// Wires the MercadoPago client when `ACCESS_TOKEN` is configured.
    pub fn new(config: RelayConfig) -> Result<Self, AppError> {
        let lookup: Option<Arc<dyn MerchantOrderLookup>> = if config.enrichment_enabled() {
            let client = MercadoPagoClient::new(&config.mercadopago, config.percent_encode)
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
            Some(Arc::new(client))
        } else {
            None
        };

        Ok(Self::with_lookup(config, lookup))
    }

    /// Builds state around an explicit lookup implementation.
    pub fn with_lookup(config: RelayConfig, lookup: Option<Arc<dyn MerchantOrderLookup>>) -> Self {
        let deep_links = DeepLinkBuilder::new(config.deep_link.scheme.clone(), config.percent_encode);

        Self {
            config: Arc::new(config),
            deep_links,
            enricher: lookup.map(OrderEnricher::new),
        }
    }
}
