use crate::models::RedirectOutcome;
use std::borrow::Cow;

/// Builds `scheme://payment/<outcome>` links for the mobile app.
#[derive(Debug, Clone)]
pub struct DeepLinkBuilder {
    scheme: String,
    percent_encode: bool,
}

impl DeepLinkBuilder {
    pub fn new(scheme: impl Into<String>, percent_encode: bool) -> Self {
        Self {
            scheme: scheme.into(),
            percent_encode,
        }
    }

    /// `payment_id` precedes `status`; absent values are omitted entirely.
    ///
    /// Values are spliced in verbatim unless percent-encoding is enabled, so
    /// the default output is byte-for-byte what earlier app releases parse.
    pub fn build(
        &self,
        outcome: RedirectOutcome,
        payment_id: Option<&str>,
        status: Option<&str>,
    ) -> String {
        let mut link = format!("{}://payment/{}", self.scheme, outcome);

        let params = [("payment_id", payment_id), ("status", status)];
        let mut separator = '?';
        for (key, value) in params {
            let Some(value) = value.filter(|v| !v.is_empty()) else {
                continue;
            };
            link.push(separator);
            link.push_str(key);
            link.push('=');
            link.push_str(&self.encode(value));
            separator = '&';
        }

        link
    }

    fn encode<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if self.percent_encode {
            urlencoding::encode(value)
        } else {
            Cow::Borrowed(value)
        }
    }
}
