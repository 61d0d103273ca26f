use std::collections::HashSet;

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tradeintel_models::{CommodityPrice, CommodityProfile, SourceResult};

use super::{note_degraded, to_payload, Tagged};
use crate::aggregator::Aggregator;
use crate::error::AggregateError;
use crate::validate::ValidatedArgs;

#[derive(Debug, Serialize)]
struct CommodityPrices {
    prices: Vec<Tagged<CommodityPrice>>,
    degraded_sources: Vec<String>,
}

/// Resolve names against the catalogue; `None` selects every commodity.
pub(crate) fn profiles<'a>(
    agg: &'a Aggregator,
    field: &str,
    names: Option<&[String]>,
) -> Result<Vec<&'a CommodityProfile>, AggregateError> {
    let catalogue = agg.catalogue();
    match names {
        None => Ok(catalogue.commodities.iter().collect()),
        Some(names) => names
            .iter()
            .map(|name| {
                catalogue
                    .commodity(name)
                    .ok_or_else(|| AggregateError::invalid(field, format!("unknown commodity '{name}'")))
            })
            .collect(),
    }
}

/// Fetch every profile's price concurrently, preserving input order.
pub(crate) async fn fetch_prices(
    agg: &Aggregator,
    profiles: &[&CommodityProfile],
) -> Result<Vec<SourceResult<CommodityPrice>>, AggregateError> {
    let adapter = agg.sources().commodity.as_ref();
    join_all(profiles.iter().map(|p| agg.through_cache(adapter, *p)))
        .await
        .into_iter()
        .collect()
}

pub(crate) async fn run(agg: &Aggregator, args: &ValidatedArgs) -> Result<Value, AggregateError> {
    let mut selected = profiles(agg, "commodities", args.strings("commodities"))?;
    let mut seen = HashSet::new();
    selected.retain(|&p| seen.insert(p.name.as_str()));

    let mut degraded = Vec::new();
    let mut prices = Vec::with_capacity(selected.len());
    for result in fetch_prices(agg, &selected).await? {
        note_degraded(&mut degraded, format!("commodity:{}", result.value.commodity), &result);
        prices.push(Tagged::from(result));
    }

    to_payload(&CommodityPrices {
        prices,
        degraded_sources: degraded,
    })
}
