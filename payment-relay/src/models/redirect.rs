use serde::Serialize;
use std::fmt;

/// Canonical result of a checkout, as understood by the mobile app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectOutcome {
    Success,
    Pending,
    Failure,
}

impl RedirectOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectOutcome::Success => "success",
            RedirectOutcome::Pending => "pending",
            RedirectOutcome::Failure => "failure",
        }
    }
}

impl fmt::Display for RedirectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query parameters MercadoPago appends to its `back_urls`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectQuery {
    pub payment_id: Option<String>,
    pub preference_id: Option<String>,
    pub status: Option<String>,
}

impl RedirectQuery {
    /// Parses a raw query string. Empty values count as absent and a repeated
    /// key keeps its last value.
    pub fn from_query_string(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(raw) {
            Ok(pairs) => pairs,
            Err(e) => {
                tracing::warn!(error = %e, query = %raw, "Unparseable redirect query string");
                return Self::default();
            }
        };

        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "payment_id" => &mut query.payment_id,
                "preference_id" => &mut query.preference_id,
                "status" => &mut query.status,
                _ => continue,
            };
            *slot = Some(value);
        }

        query.payment_id = query.payment_id.filter(|v| !v.is_empty());
        query.preference_id = query.preference_id.filter(|v| !v.is_empty());
        query.status = query.status.filter(|v| !v.is_empty());
        query
    }

    /// `payment_id`, falling back to `preference_id`.
    pub fn payment_identifier(&self) -> Option<&str> {
        self.payment_id
            .as_deref()
            .or(self.preference_id.as_deref())
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}
