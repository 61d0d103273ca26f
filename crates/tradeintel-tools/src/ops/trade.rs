use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tradeintel_models::{Origin, TradeRecord};
use tradeintel_sources::TradeQuery;

use super::{checked_sum, to_payload};
use crate::aggregator::Aggregator;
use crate::error::AggregateError;
use crate::validate::ValidatedArgs;

#[derive(Debug, Serialize)]
struct CountryRef {
    name: String,
    census_code: String,
}

#[derive(Debug, Serialize)]
struct TopCommodity {
    hs_code: String,
    description: String,
    general_value: Decimal,
}

#[derive(Debug, Serialize)]
struct TradeData {
    country: CountryRef,
    product_code: String,
    period: String,
    record_count: usize,
    /// Absent when the sum leaves `Decimal` range.
    total_general_value: Option<Decimal>,
    total_consumption_value: Option<Decimal>,
    top_commodity: Option<TopCommodity>,
    records: Vec<TradeRecord>,
    origin: Origin,
}

/// HS codes are queried at chapter, heading or subheading level.
pub(crate) fn valid_hs_code(code: &str) -> bool {
    matches!(code.len(), 2 | 4 | 6) && code.chars().all(|c| c.is_ascii_digit())
}

fn resolve_country(agg: &Aggregator, query: &str) -> Result<CountryRef, AggregateError> {
    if let Some(profile) = agg.catalogue().country(query) {
        return Ok(CountryRef {
            name: profile.name.clone(),
            census_code: profile.census_code.clone(),
        });
    }
    let query = query.trim();
    if query.len() == 4 && query.chars().all(|c| c.is_ascii_digit()) {
        return Ok(CountryRef {
            name: query.to_string(),
            census_code: query.to_string(),
        });
    }
    Err(AggregateError::invalid(
        "country",
        format!("unknown country '{query}'"),
    ))
}

pub(crate) async fn run(agg: &Aggregator, args: &ValidatedArgs) -> Result<Value, AggregateError> {
    let country = resolve_country(agg, args.str("country").unwrap_or_default())?;

    let product_code = args.str("product_code").unwrap_or_default().trim().to_string();
    if !valid_hs_code(&product_code) {
        return Err(AggregateError::invalid(
            "product_code",
            "expected an HS code of 2, 4 or 6 digits",
        ));
    }

    let year = args
        .integer("year")
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| AggregateError::invalid("year", "is required"))?;
    let month = args
        .integer("month")
        .and_then(|m| u32::try_from(m).ok())
        .unwrap_or(12);

    let query = TradeQuery {
        hs_code: product_code.clone(),
        country_code: country.census_code.clone(),
        year,
        month,
    };
    let result = agg.through_cache(agg.sources().trade.as_ref(), &query).await?;
    let records = result.value;

    let total_general_value =
        checked_sum("total_general_value", records.iter().map(|r| r.general_value));
    let total_consumption_value =
        checked_sum("total_consumption_value", records.iter().map(|r| r.consumption_value));
    let top_commodity = records
        .iter()
        .max_by_key(|r| r.general_value)
        .map(|r| TopCommodity {
            hs_code: r.hs_code.clone(),
            description: r.description.clone(),
            general_value: r.general_value,
        });

    to_payload(&TradeData {
        country,
        product_code,
        period: query.period(),
        record_count: records.len(),
        total_general_value,
        total_consumption_value,
        top_commodity,
        records,
        origin: result.origin,
    })
}
