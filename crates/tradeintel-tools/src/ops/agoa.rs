//! AGOA lookups are pure catalogue reads with no source behind them.

use serde_json::{json, Value};

use crate::aggregator::Aggregator;
use crate::error::AggregateError;
use crate::validate::ValidatedArgs;

pub(crate) fn countries(agg: &Aggregator, args: &ValidatedArgs) -> Result<Value, AggregateError> {
    let table = &agg.catalogue().agoa;
    let year = args.str("year").map(str::trim).unwrap_or(table.year.as_str());

    // Only one year is tabulated; other years have no known eligible countries.
    let countries: &[String] = if year == table.year {
        &table.countries
    } else {
        &[]
    };

    Ok(json!({
        "year": year,
        "total_countries": countries.len(),
        "countries": countries,
    }))
}

pub(crate) fn eligibility(agg: &Aggregator, args: &ValidatedArgs) -> Result<Value, AggregateError> {
    let table = &agg.catalogue().agoa;
    let country = args.str("country").unwrap_or_default().trim();
    let product_code = args.str("product_code").unwrap_or_default().trim();

    let country_eligible = table.country_eligible(country);
    let product_eligible = table.product_eligible(product_code);

    Ok(json!({
        "country": country,
        "product_code": product_code,
        "year": table.year,
        "country_eligible": country_eligible,
        "product_eligible": product_eligible,
        "overall_eligible": country_eligible && product_eligible,
    }))
}
