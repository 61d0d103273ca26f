use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tradeintel_models::Origin;
use tradeintel_sources::FxQuery;

use super::to_payload;
use crate::aggregator::Aggregator;
use crate::error::AggregateError;
use crate::validate::ValidatedArgs;

#[derive(Debug, Serialize)]
struct ExchangeRates {
    base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    rates: BTreeMap<String, Decimal>,
    /// Requested symbols with no rate.
    missing: Vec<String>,
    origin: Origin,
}

pub(crate) fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

pub(crate) async fn run(agg: &Aggregator, args: &ValidatedArgs) -> Result<Value, AggregateError> {
    let symbols = args.strings("symbols").unwrap_or_default();
    let query = FxQuery::new(args.str("base").unwrap_or("USD"), symbols);

    if !is_currency_code(&query.base) {
        return Err(AggregateError::invalid("base", "expected a three-letter currency code"));
    }
    if let Some(bad) = query.symbols.iter().find(|s| !is_currency_code(s)) {
        return Err(AggregateError::invalid(
            "symbols",
            format!("'{bad}' is not a three-letter currency code"),
        ));
    }

    let result = agg.through_cache(agg.sources().fx.as_ref(), &query).await?;
    let mut rates = result.value;
    rates.retain_symbols(&query.symbols);

    let missing = query
        .symbols
        .iter()
        .filter(|s| rates.rate(s).is_none())
        .cloned()
        .collect();

    to_payload(&ExchangeRates {
        base: rates.base,
        date: rates.date,
        rates: rates.rates,
        missing,
        origin: result.origin,
    })
}
