use async_trait::async_trait;
use serde_json::Value;
use tradeintel_models::{key_patterns, KeyClass, Mode, SourceEndpoint, TradeRecord};

use crate::adapter::SourceAdapter;
use crate::error::SourceError;
use crate::http::{decimal_from_json, HttpFetcher};

const COLUMNS: [&str; 6] = [
    "CTY_CODE",
    "CTY_NAME",
    "GEN_VAL_MO",
    "CON_VAL_MO",
    "I_COMMODITY",
    "I_COMMODITY_LDESC",
];

/// Monthly import statistics for one HS code from one country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeQuery {
    pub hs_code: String,
    /// Trade-statistics country code.
    pub country_code: String,
    pub year: i32,
    pub month: u32,
}

impl TradeQuery {
    /// `YYYY-MM`, the API's `time` parameter.
    pub fn period(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Government trade-statistics API adapter (imports by HS code).
pub struct CensusAdapter {
    endpoint: SourceEndpoint,
    http: HttpFetcher,
    mode: Mode,
    sample: Vec<TradeRecord>,
}

impl CensusAdapter {
    pub fn new(
        endpoint: SourceEndpoint,
        http: HttpFetcher,
        mode: Mode,
        sample: Vec<TradeRecord>,
    ) -> Self {
        Self {
            endpoint,
            http,
            mode,
            sample,
        }
    }
}

/// Parse the API's array-of-arrays table; the first row holds column names.
fn parse_table(body: &Value) -> Result<Vec<TradeRecord>, SourceError> {
    let rows = body
        .as_array()
        .ok_or_else(|| SourceError::Malformed("expected an array of rows".to_string()))?;
    let Some((header, data)) = rows.split_first() else {
        return Ok(Vec::new());
    };

    let header: Vec<&str> = header
        .as_array()
        .ok_or_else(|| SourceError::Malformed("header row is not an array".to_string()))?
        .iter()
        .map(|v| v.as_str().unwrap_or_default())
        .collect();
    let mut index = [0usize; COLUMNS.len()];
    for (slot, column) in index.iter_mut().zip(COLUMNS) {
        *slot = header
            .iter()
            .position(|h| *h == column)
            .ok_or_else(|| SourceError::Malformed(format!("missing column {column}")))?;
    }

    data.iter()
        .map(|row| {
            let cells = row
                .as_array()
                .ok_or_else(|| SourceError::Malformed("row is not an array".to_string()))?;
            let text = |i: usize| {
                cells
                    .get(index[i])
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            let amount = |i: usize| {
                cells
                    .get(index[i])
                    .and_then(decimal_from_json)
                    .ok_or_else(|| SourceError::Malformed(format!("bad {} value", COLUMNS[i])))
            };
            Ok(TradeRecord {
                country_code: text(0),
                country_name: text(1),
                general_value: amount(2)?,
                consumption_value: amount(3)?,
                hs_code: text(4),
                description: text(5),
            })
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for CensusAdapter {
    type Params = TradeQuery;
    type Value = Vec<TradeRecord>;

    fn name(&self) -> &str {
        "census"
    }

    fn key_class(&self) -> KeyClass {
        KeyClass::Trade
    }

    fn cache_key(&self, params: &TradeQuery) -> String {
        key_patterns::trade(&params.hs_code, &params.country_code, &params.period())
    }

    fn fallback(&self, params: &TradeQuery) -> Vec<TradeRecord> {
        self.sample
            .iter()
            .filter(|r| r.country_code == params.country_code)
            .filter(|r| {
                r.hs_code.starts_with(&params.hs_code) || params.hs_code.starts_with(&r.hs_code)
            })
            .cloned()
            .collect()
    }

    fn live_enabled(&self) -> bool {
        self.mode.live_sources
    }

    async fn fetch_live(&self, params: &TradeQuery) -> Result<Vec<TradeRecord>, SourceError> {
        let query = [
            ("get", COLUMNS.join(",")),
            ("time", params.period()),
            ("CTY_CODE", params.country_code.clone()),
            ("I_COMMODITY", params.hs_code.clone()),
            ("COMM_LVL", format!("HS{}", params.hs_code.len())),
        ];
        let body = self
            .http
            .get_text(&self.endpoint.base_url, &query, self.endpoint.timeout())
            .await?;

        // The API answers 204 with an empty body when nothing matched.
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_table(&serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use tradeintel_models::{Catalogue, IntelConfig};

    fn query(country_code: &str) -> TradeQuery {
        TradeQuery {
            hs_code: "0901".to_string(),
            country_code: country_code.to_string(),
            year: 2024,
            month: 6,
        }
    }

    #[test]
    fn parse_table_by_header_position() {
        let body = json!([
            ["CTY_NAME", "CTY_CODE", "GEN_VAL_MO", "CON_VAL_MO", "I_COMMODITY", "I_COMMODITY_LDESC", "time"],
            ["GHANA", "7490", "15000000", "14,500,000", "0901", "COFFEE", "2024-06"]
        ]);
        let rows = parse_table(&body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country_code, "7490");
        assert_eq!(rows[0].country_name, "GHANA");
        assert_eq!(rows[0].general_value, dec!(15000000));
        assert_eq!(rows[0].consumption_value, dec!(14500000));
    }

    #[test]
    fn parse_table_missing_column() {
        let body = json!([["CTY_CODE"], ["7490"]]);
        assert!(matches!(parse_table(&body), Err(SourceError::Malformed(_))));
    }

    #[test]
    fn parse_empty_table() {
        assert!(parse_table(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn fallback_filters_sample_by_country() {
        let adapter = CensusAdapter::new(
            IntelConfig::default().sources.census,
            HttpFetcher::new().unwrap(),
            Mode::simulated(),
            Catalogue::default().sample_trade,
        );
        let rows = adapter.fallback(&query("5300"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country_name, "ETHIOPIA");
        assert!(adapter.fallback(&query("0000")).is_empty());
    }

    #[test]
    fn period_and_cache_key() {
        let q = query("7490");
        assert_eq!(q.period(), "2024-06");
        let adapter = CensusAdapter::new(
            IntelConfig::default().sources.census,
            HttpFetcher::new().unwrap(),
            Mode::simulated(),
            Vec::new(),
        );
        assert_eq!(adapter.cache_key(&q), "trade:0901:7490:2024-06");
    }
}
