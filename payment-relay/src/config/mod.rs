use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MERCADOPAGO_API_URL: &str = "https://api.mercadopago.com";
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DEEP_LINK_SCHEME: &str = "futrono";

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mercadopago: MercadoPagoConfig,
    pub deep_link: DeepLinkConfig,
    pub webhook: WebhookConfig,
    /// Percent-encode caller-supplied values before splicing them into the
    /// deep link query and the merchant-order lookup path.
    #[serde(default)]
    pub percent_encode: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MercadoPagoConfig {
    /// Bearer credential. Merchant-order enrichment is disabled when unset.
    pub access_token: Option<Secret<String>>,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

impl MercadoPagoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The access token, if one is configured and non-blank.
    pub fn credential(&self) -> Option<&Secret<String>> {
        self.access_token
            .as_ref()
            .filter(|token| !token.expose_secret().trim().is_empty())
    }
}

impl Default for MercadoPagoConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            api_base_url: DEFAULT_MERCADOPAGO_API_URL.to_string(),
            timeout_secs: DEFAULT_LOOKUP_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeepLinkConfig {
    pub scheme: String,
}

impl Default for DeepLinkConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_DEEP_LINK_SCHEME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookConfig {
    pub probe: WebhookProbe,
}

/// What `/webhook` does for any method other than POST.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookProbe {
    /// Answer 200 with a short JSON description of the endpoint.
    #[default]
    Info,
    /// Treat the request like any other path and render the redirect page.
    Redirect,
    /// Answer 405.
    Reject,
}

impl FromStr for WebhookProbe {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "redirect" => Ok(Self::Redirect),
            "reject" => Ok(Self::Reject),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "WEBHOOK_PROBE must be one of info, redirect, reject (got '{}')",
                other
            ))),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            mercadopago: MercadoPagoConfig::default(),
            deep_link: DeepLinkConfig::default(),
            webhook: WebhookConfig::default(),
            percent_encode: false,
        }
    }
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Builds the relay settings from `lookup`, which maps a variable name to
    /// its value. Malformed values are configuration errors.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let timeout_secs = match get("MERCADOPAGO_TIMEOUT_SECS") {
            Some(raw) => parse_timeout_secs(&raw)?,
            None => DEFAULT_LOOKUP_TIMEOUT_SECS,
        };

        let probe = match get("WEBHOOK_PROBE") {
            Some(raw) => raw.parse()?,
            None => WebhookProbe::default(),
        };

        let percent_encode = match get("PERCENT_ENCODE_VALUES") {
            Some(raw) => parse_flag("PERCENT_ENCODE_VALUES", &raw)?,
            None => false,
        };

        Ok(RelayConfig {
            common,
            mercadopago: MercadoPagoConfig {
                access_token: get("ACCESS_TOKEN").map(Secret::new),
                api_base_url: get("MERCADOPAGO_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_MERCADOPAGO_API_URL.to_string()),
                timeout_secs,
            },
            deep_link: DeepLinkConfig {
                scheme: get("DEEP_LINK_SCHEME")
                    .unwrap_or_else(|| DEFAULT_DEEP_LINK_SCHEME.to_string()),
            },
            webhook: WebhookConfig { probe },
            percent_encode,
        })
    }

    pub fn enrichment_enabled(&self) -> bool {
        self.mercadopago.credential().is_some()
    }
}

fn parse_timeout_secs(raw: &str) -> Result<u64, AppError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(AppError::ConfigError(anyhow::anyhow!(
            "MERCADOPAGO_TIMEOUT_SECS must be at least 1 second"
        ))),
        Ok(secs) => Ok(secs),
        Err(e) => Err(AppError::ConfigError(anyhow::anyhow!(
            "MERCADOPAGO_TIMEOUT_SECS must be a whole number of seconds: {}",
            e
        ))),
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} must be true or false (got '{}')",
            key,
            other
        ))),
    }
}
