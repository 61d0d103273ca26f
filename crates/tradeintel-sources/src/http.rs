use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use crate::error::SourceError;

const USER_AGENT: &str = concat!("tradeintel/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for every adapter. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SourceError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// GET `url` and return the body, failing on non-2xx or after `timeout`.
    pub async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<String, SourceError> {
        debug!(url, timeout_secs = timeout.as_secs(), "Upstream GET");

        tokio::time::timeout(timeout, async {
            let response = self
                .client
                .get(url)
                .query(query)
                .send()
                .await
                .map_err(|e| SourceError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(SourceError::Status(status.as_u16()));
            }

            response
                .text()
                .await
                .map_err(|e| SourceError::Transport(e.to_string()))
        })
        .await
        .map_err(|_| SourceError::Timeout(timeout))?
    }

    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<Value, SourceError> {
        let body = self.get_text(url, query, timeout).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Read a decimal from a JSON number or a numeric string (thousands
/// separators allowed).
pub(crate) fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let raw = n.to_string();
            Decimal::from_str(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .ok()
        }
        Value::String(s) => Decimal::from_str(&s.trim().replace(',', "")).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn decimal_from_number_and_string() {
        assert_eq!(decimal_from_json(&json!(57.45)), Some(dec!(57.45)));
        assert_eq!(decimal_from_json(&json!("15,000,000")), Some(dec!(15000000)));
        assert_eq!(decimal_from_json(&json!(1e-5)), Some(dec!(0.00001)));
        assert_eq!(decimal_from_json(&json!(null)), None);
        assert_eq!(decimal_from_json(&json!("n/a")), None);
    }

    #[test]
    fn client_builds() {
        assert!(HttpFetcher::new().is_ok());
    }
}
