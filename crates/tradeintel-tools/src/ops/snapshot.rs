use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tradeintel_models::{CommodityPrice, FxRates, WeatherReading};
use tradeintel_sources::FxQuery;

use super::commodities::fetch_prices;
use super::weather::country_code;
use super::{note_degraded, to_payload, Tagged};
use crate::aggregator::Aggregator;
use crate::error::AggregateError;
use crate::validate::ValidatedArgs;

#[derive(Debug, Serialize)]
struct Snapshot {
    generated_at: DateTime<Utc>,
    exchange_rates: Tagged<FxRates>,
    commodity_prices: Vec<Tagged<CommodityPrice>>,
    weather: Vec<Tagged<WeatherReading>>,
    degraded_sources: Vec<String>,
}

/// Rates, every commodity price and weather per country, all fetched concurrently.
pub(crate) async fn run(agg: &Aggregator, args: &ValidatedArgs) -> Result<Value, AggregateError> {
    let countries: Vec<String> = match args.strings("countries") {
        Some(codes) => codes
            .iter()
            .map(|c| {
                country_code(c).ok_or_else(|| {
                    AggregateError::invalid("countries", format!("'{c}' is not a country code"))
                })
            })
            .collect::<Result<_, _>>()?,
        None => agg.catalogue().country_codes(),
    };
    let profiles: Vec<_> = agg.catalogue().commodities.iter().collect();
    let fx_query = FxQuery::all("USD");
    let weather_adapter = agg.sources().weather.as_ref();

    let (fx, prices, weather) = tokio::join!(
        agg.through_cache(agg.sources().fx.as_ref(), &fx_query),
        fetch_prices(agg, &profiles),
        join_all(countries.iter().map(|c| agg.through_cache(weather_adapter, c))),
    );

    let mut degraded = Vec::new();
    let fx = fx?;
    note_degraded(&mut degraded, "fx:USD".to_string(), &fx);

    let mut commodity_prices = Vec::new();
    for price in prices? {
        note_degraded(&mut degraded, format!("commodity:{}", price.value.commodity), &price);
        commodity_prices.push(Tagged::from(price));
    }

    let mut readings = Vec::with_capacity(weather.len());
    for reading in weather {
        let reading = reading?;
        note_degraded(&mut degraded, format!("weather:{}", reading.value.country_code), &reading);
        readings.push(Tagged::from(reading));
    }

    to_payload(&Snapshot {
        generated_at: Utc::now(),
        exchange_rates: Tagged::from(fx),
        commodity_prices,
        weather: readings,
        degraded_sources: degraded,
    })
}
