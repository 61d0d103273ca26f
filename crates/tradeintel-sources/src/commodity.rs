use async_trait::async_trait;
use serde_json::Value;
use tradeintel_models::{
    key_patterns, CommodityPrice, CommodityProfile, KeyClass, Mode, SourceEndpoint,
};

use crate::adapter::SourceAdapter;
use crate::error::SourceError;
use crate::http::{decimal_from_json, HttpFetcher};

const PRICE_SCALE: u32 = 2;

/// Economic-indicator API adapter.
///
/// Requests the most recent non-empty world aggregate for the commodity's
/// indicator series and converts it into the catalogue unit. Commodities
/// without an indicator always serve their catalogue reference price.
pub struct CommodityAdapter {
    endpoint: SourceEndpoint,
    http: HttpFetcher,
    mode: Mode,
}

impl CommodityAdapter {
    pub fn new(endpoint: SourceEndpoint, http: HttpFetcher, mode: Mode) -> Self {
        Self {
            endpoint,
            http,
            mode,
        }
    }
}

/// Parse `[meta, [{"date": ..., "value": ...}, ...]]`, taking the first non-null value.
fn parse_indicator(body: &Value, profile: &CommodityProfile) -> Result<CommodityPrice, SourceError> {
    let observations = body
        .as_array()
        .and_then(|parts| parts.get(1))
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Malformed("expected [meta, observations]".to_string()))?;

    let (value, period) = observations
        .iter()
        .find_map(|obs| {
            let value = obs.get("value").and_then(decimal_from_json)?;
            let period = obs.get("date").and_then(Value::as_str).map(str::to_string);
            Some((value, period))
        })
        .ok_or_else(|| SourceError::Malformed("no non-null observations".to_string()))?;

    Ok(CommodityPrice {
        commodity: profile.name.clone(),
        price: (value * profile.indicator_scale).round_dp(PRICE_SCALE),
        unit: profile.unit.clone(),
        period,
    })
}

#[async_trait]
impl SourceAdapter for CommodityAdapter {
    type Params = CommodityProfile;
    type Value = CommodityPrice;

    fn name(&self) -> &str {
        "commodity"
    }

    fn key_class(&self) -> KeyClass {
        KeyClass::Commodity
    }

    fn cache_key(&self, params: &CommodityProfile) -> String {
        key_patterns::commodity(&params.name)
    }

    fn fallback(&self, params: &CommodityProfile) -> CommodityPrice {
        CommodityPrice {
            commodity: params.name.clone(),
            price: params.fallback_price,
            unit: params.unit.clone(),
            period: None,
        }
    }

    fn live_enabled(&self) -> bool {
        self.mode.live_sources
    }

    fn has_upstream(&self, params: &CommodityProfile) -> bool {
        params.indicator.is_some()
    }

    async fn fetch_live(&self, params: &CommodityProfile) -> Result<CommodityPrice, SourceError> {
        let indicator = params
            .indicator
            .as_deref()
            .ok_or_else(|| SourceError::Malformed(format!("{} has no indicator", params.name)))?;
        let url = format!(
            "{}/country/WLD/indicator/{indicator}",
            self.endpoint.base_url.trim_end_matches('/')
        );
        let query = [
            ("format", "json".to_string()),
            ("mrnev", "1".to_string()),
            ("per_page", "10".to_string()),
        ];
        let body = self
            .http
            .get_json(&url, &query, self.endpoint.timeout())
            .await?;
        parse_indicator(&body, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use tradeintel_models::{Catalogue, IntelConfig, Origin};

    fn coffee() -> CommodityProfile {
        Catalogue::default().commodity("coffee").unwrap().clone()
    }

    #[test]
    fn parse_takes_first_non_null_and_scales() {
        let body = json!([
            {"page": 1, "pages": 1, "total": 2},
            [
                {"date": "2025M07", "value": null},
                {"date": "2025M06", "value": 350.0}
            ]
        ]);
        let price = parse_indicator(&body, &coffee()).unwrap();
        // 350 cents/lb * 0.0220462
        assert_eq!(price.price, dec!(7.72));
        assert_eq!(price.period.as_deref(), Some("2025M06"));
        assert_eq!(price.unit, "USD/kg");
    }

    #[test]
    fn parse_rejects_error_payload() {
        let body = json!([{"message": [{"id": "120", "value": "Invalid value"}]}]);
        assert!(matches!(
            parse_indicator(&body, &coffee()),
            Err(SourceError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn commodity_without_indicator_never_goes_live() {
        let adapter = CommodityAdapter::new(
            // Unroutable endpoint: any request would fail
            SourceEndpoint::new("http://127.0.0.1:9", 1),
            HttpFetcher::new().unwrap(),
            Mode::live(),
        );
        let vanilla = Catalogue::default().commodity("vanilla").unwrap().clone();
        let result = adapter.fetch(&vanilla).await;
        assert_eq!(result.origin, Origin::Fallback);
        assert!(result.error.is_none());
        assert_eq!(result.value.price, dec!(320.00));
    }

    #[test]
    fn fallback_uses_catalogue_price() {
        let adapter = CommodityAdapter::new(
            IntelConfig::default().sources.world_bank,
            HttpFetcher::new().unwrap(),
            Mode::simulated(),
        );
        let price = adapter.fallback(&coffee());
        assert_eq!(price.price, dec!(7.80));
        assert_eq!(adapter.cache_key(&coffee()), "commodity:coffee");
    }
}
