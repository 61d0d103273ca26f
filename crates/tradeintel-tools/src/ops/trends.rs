use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tradeintel_models::Origin;

use super::commodities::{fetch_prices, profiles};
use super::{checked_mean, note_degraded, to_payload};
use crate::aggregator::Aggregator;
use crate::error::AggregateError;
use crate::validate::ValidatedArgs;

const DEFAULT_PRODUCTS: [&str; 3] = ["coffee", "cocoa", "cashews"];

/// Periods per year for each timeframe.
pub(crate) fn periods_per_year(timeframe: &str) -> Option<u32> {
    match timeframe {
        "weekly" => Some(52),
        "monthly" => Some(12),
        "quarterly" => Some(4),
        "yearly" => Some(1),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
struct ProductOutlook {
    product: String,
    annual_growth_pct: Decimal,
    period_growth_pct: Decimal,
    price_trend: String,
    opportunity: String,
    current_price: Decimal,
    unit: String,
    origin: Origin,
}

#[derive(Debug, Serialize)]
struct TrendReport {
    timeframe: String,
    products: Vec<ProductOutlook>,
    average_annual_growth_pct: Option<Decimal>,
    fastest_growing: Option<String>,
    /// Requested products with no trend data.
    unavailable: Vec<String>,
    strategic_recommendations: Vec<String>,
    degraded_sources: Vec<String>,
}

pub(crate) async fn run(agg: &Aggregator, args: &ValidatedArgs) -> Result<Value, AggregateError> {
    let timeframe = args.str("timeframe").unwrap_or("monthly").to_string();
    let periods = periods_per_year(&timeframe)
        .ok_or_else(|| AggregateError::invalid("timeframe", "unsupported timeframe"))?;

    let defaults: Vec<String> = DEFAULT_PRODUCTS.iter().map(|s| s.to_string()).collect();
    let requested = args.strings("products").unwrap_or(&defaults[..]);
    let mut selected = profiles(agg, "products", Some(requested))?;
    let mut seen = HashSet::new();
    selected.retain(|&p| seen.insert(p.name.as_str()));
    let prices = fetch_prices(agg, &selected).await?;

    let catalogue = agg.catalogue();
    let mut outlooks = Vec::new();
    let mut unavailable = Vec::new();
    let mut degraded = Vec::new();
    for price in prices {
        note_degraded(&mut degraded, format!("commodity:{}", price.value.commodity), &price);
        let Some(trend) = catalogue.trend(&price.value.commodity) else {
            unavailable.push(price.value.commodity);
            continue;
        };
        outlooks.push(ProductOutlook {
            product: trend.product.clone(),
            annual_growth_pct: trend.annual_growth_pct,
            period_growth_pct: (trend.annual_growth_pct / Decimal::from(periods)).round_dp(2),
            price_trend: trend.price_trend.clone(),
            opportunity: trend.opportunity.clone(),
            current_price: price.value.price,
            unit: price.value.unit,
            origin: price.origin,
        });
    }

    let growth: Vec<Decimal> = outlooks.iter().map(|o| o.annual_growth_pct).collect();
    let average_annual_growth_pct = checked_mean("average_annual_growth_pct", &growth);
    let fastest_growing = outlooks
        .iter()
        .max_by_key(|o| o.annual_growth_pct)
        .map(|o| o.product.clone());

    to_payload(&TrendReport {
        timeframe,
        products: outlooks,
        average_annual_growth_pct,
        fastest_growing,
        unavailable,
        strategic_recommendations: catalogue.notes.strategic_recommendations.clone(),
        degraded_sources: degraded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframes() {
        assert_eq!(periods_per_year("weekly"), Some(52));
        assert_eq!(periods_per_year("yearly"), Some(1));
        assert_eq!(periods_per_year("daily"), None);
    }
}
