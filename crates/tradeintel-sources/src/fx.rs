use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use tradeintel_models::{key_patterns, FxRates, KeyClass, Mode, SourceEndpoint};

use crate::adapter::SourceAdapter;
use crate::error::SourceError;
use crate::http::{decimal_from_json, HttpFetcher};

/// Decimal places kept for derived cross rates.
const CROSS_RATE_SCALE: u32 = 6;

/// Currency-rate request. Codes are upper-cased, symbols sorted and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FxQuery {
    pub base: String,
    pub symbols: Vec<String>,
}

impl FxQuery {
    pub fn new(base: &str, symbols: &[String]) -> Self {
        let mut symbols: Vec<String> = symbols
            .iter()
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        symbols.sort();
        symbols.dedup();
        Self {
            base: base.trim().to_ascii_uppercase(),
            symbols,
        }
    }

    pub fn all(base: &str) -> Self {
        Self::new(base, &[])
    }
}

/// Currency-conversion API adapter (`{base_url}/{base}` returning `{"rates": {...}}`).
pub struct FxAdapter {
    endpoint: SourceEndpoint,
    http: HttpFetcher,
    mode: Mode,
    /// Units per one USD.
    usd_rates: BTreeMap<String, Decimal>,
}

impl FxAdapter {
    pub fn new(
        endpoint: SourceEndpoint,
        http: HttpFetcher,
        mode: Mode,
        usd_rates: BTreeMap<String, Decimal>,
    ) -> Self {
        Self {
            endpoint,
            http,
            mode,
            usd_rates,
        }
    }

    /// Rebase the USD table onto `base`. Unknown bases yield no rates.
    fn cross_rates(&self, base: &str) -> BTreeMap<String, Decimal> {
        if base == "USD" {
            return self.usd_rates.clone();
        }
        let Some(base_per_usd) = self.usd_rates.get(base).copied().filter(|r| !r.is_zero())
        else {
            return BTreeMap::new();
        };

        let mut rates: BTreeMap<String, Decimal> = self
            .usd_rates
            .iter()
            .filter(|(code, _)| code.as_str() != base)
            .map(|(code, per_usd)| {
                (code.clone(), (*per_usd / base_per_usd).round_dp(CROSS_RATE_SCALE))
            })
            .collect();
        rates.insert(
            "USD".to_string(),
            (Decimal::ONE / base_per_usd).round_dp(CROSS_RATE_SCALE),
        );
        rates
    }
}

fn parse_rates(body: &Value, query: &FxQuery) -> Result<FxRates, SourceError> {
    let table = body
        .get("rates")
        .and_then(Value::as_object)
        .ok_or_else(|| SourceError::Malformed("missing \"rates\" object".to_string()))?;

    let rates = table
        .iter()
        .filter_map(|(code, v)| decimal_from_json(v).map(|rate| (code.to_ascii_uppercase(), rate)))
        .collect();

    let mut parsed = FxRates {
        base: body
            .get("base")
            .and_then(Value::as_str)
            .unwrap_or(&query.base)
            .to_ascii_uppercase(),
        rates,
        date: body.get("date").and_then(Value::as_str).map(str::to_string),
    };
    parsed.retain_symbols(&query.symbols);
    Ok(parsed)
}

#[async_trait]
impl SourceAdapter for FxAdapter {
    type Params = FxQuery;
    type Value = FxRates;

    fn name(&self) -> &str {
        "fx"
    }

    fn key_class(&self) -> KeyClass {
        KeyClass::Fx
    }

    fn cache_key(&self, params: &FxQuery) -> String {
        key_patterns::fx(&params.base, &params.symbols)
    }

    fn fallback(&self, params: &FxQuery) -> FxRates {
        let mut rates = FxRates {
            base: params.base.clone(),
            rates: self.cross_rates(&params.base),
            date: None,
        };
        rates.retain_symbols(&params.symbols);
        rates
    }

    fn live_enabled(&self) -> bool {
        self.mode.live_sources
    }

    async fn fetch_live(&self, params: &FxQuery) -> Result<FxRates, SourceError> {
        let url = format!(
            "{}/{}",
            self.endpoint.base_url.trim_end_matches('/'),
            params.base
        );
        let body = self.http.get_json(&url, &[], self.endpoint.timeout()).await?;
        parse_rates(&body, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use tradeintel_models::{Catalogue, IntelConfig, Origin};

    fn adapter(mode: Mode) -> FxAdapter {
        FxAdapter::new(
            IntelConfig::default().sources.fx,
            HttpFetcher::new().unwrap(),
            mode,
            Catalogue::default().fallback_fx,
        )
    }

    #[test]
    fn query_normalizes_symbols() {
        let query = FxQuery::new("usd", &["ghs".into(), "ETB".into(), "GHS".into(), " ".into()]);
        assert_eq!(query.base, "USD");
        assert_eq!(query.symbols, vec!["ETB", "GHS"]);
    }

    #[test]
    fn fallback_usd_filters_symbols() {
        let fx = adapter(Mode::simulated());
        let rates = fx.fallback(&FxQuery::new("USD", &["ETB".into(), "KES".into()]));
        assert_eq!(rates.rates.len(), 2);
        assert_eq!(rates.rates["ETB"], dec!(57.45));
        assert_eq!(rates.rates["KES"], dec!(143.25));
    }

    #[test]
    fn fallback_cross_rates_for_other_base() {
        let fx = adapter(Mode::simulated());
        let rates = fx.fallback(&FxQuery::all("EUR"));
        assert_eq!(rates.base, "EUR");
        // 57.45 / 0.92
        assert_eq!(rates.rates["ETB"], dec!(62.445652));
        assert_eq!(rates.rates["USD"], dec!(1.086957));
        assert!(!rates.rates.contains_key("EUR"));
    }

    #[test]
    fn fallback_unknown_base_is_empty() {
        let fx = adapter(Mode::simulated());
        assert!(fx.fallback(&FxQuery::all("XYZ")).rates.is_empty());
    }

    #[test]
    fn parse_live_payload() {
        let body = json!({
            "base": "USD",
            "date": "2025-08-30",
            "rates": {"ETB": 57.9, "GHS": 15.1, "EUR": 0.91}
        });
        let rates = parse_rates(&body, &FxQuery::new("USD", &["ETB".into()])).unwrap();
        assert_eq!(rates.date.as_deref(), Some("2025-08-30"));
        assert_eq!(rates.rates.len(), 1);
        assert_eq!(rates.rates["ETB"], dec!(57.9));
    }

    #[test]
    fn parse_rejects_missing_rates() {
        let err = parse_rates(&json!({"result": "error"}), &FxQuery::all("USD")).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[tokio::test]
    async fn simulated_fetch_serves_fallback() {
        let fx = adapter(Mode::simulated());
        let result = fx.fetch(&FxQuery::all("USD")).await;
        assert_eq!(result.origin, Origin::Fallback);
        assert!(result.error.is_none());
        assert_eq!(result.value.rates["NGN"], dec!(775.50));
    }

    #[test]
    fn cache_key_uses_pattern() {
        let fx = adapter(Mode::simulated());
        assert_eq!(fx.cache_key(&FxQuery::new("usd", &["GHS".into()])), "fx:USD:GHS");
    }
}
