//! Supplier-lane margin scan.
//!
//! Lanes, volumes, logistics ratios and qualitative labels come from the
//! catalogue. Prices come from sources: the source price is the lane's local
//! FOB converted at the current exchange rate, the market price is the
//! commodity's current US reference price. Every margin, revenue and
//! commission figure is derived from those two.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tradeintel_models::{ArbitrageLane, Catalogue, CommodityPrice, FxRates, Origin, SourceResult};
use tradeintel_sources::FxQuery;

use super::commodities::fetch_prices;
use super::{note_degraded, to_payload};
use crate::aggregator::Aggregator;
use crate::error::AggregateError;
use crate::validate::ValidatedArgs;

const DEFAULT_TOP_N: usize = 10;
const MARGIN_SCALE: u32 = 4;
const MONEY_SCALE: u32 = 2;

/// `(market - source) / market`, or `None` without a positive market price
/// or when the result does not fit a `Decimal`.
pub fn gross_margin(source_price: Decimal, market_price: Decimal) -> Option<Decimal> {
    if market_price <= Decimal::ZERO {
        return None;
    }
    market_price
        .checked_sub(source_price)?
        .checked_div(market_price)
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PriceOrigins {
    pub fx: Origin,
    pub commodity: Origin,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Opportunity {
    pub product: String,
    pub supplier_country: String,
    pub commodity: String,
    pub currency: String,
    pub fob_local: Decimal,
    pub exchange_rate: Decimal,
    /// USD per unit.
    pub fob_price: Decimal,
    pub us_market_price: Decimal,
    pub unit: String,
    pub gross_margin: Decimal,
    pub gross_margin_pct: Decimal,
    pub net_margin: Decimal,
    pub monthly_volume: Decimal,
    pub revenue_potential: Decimal,
    pub commission_potential: Decimal,
    pub agoa_eligible: bool,
    pub risk_level: String,
    pub action_required: String,
    pub certification_premiums: Vec<String>,
    pub buyer_targets: Vec<String>,
    pub price_origins: PriceOrigins,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Skipped {
    pub product: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ScanRequest {
    /// Fraction, not percent.
    pub min_margin: Decimal,
    pub categories: Option<Vec<String>>,
    pub countries: Option<Vec<String>>,
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ScanOutcome {
    pub opportunities: Vec<Opportunity>,
    pub skipped: Vec<Skipped>,
    pub degraded_sources: Vec<String>,
}

/// Match a focus country by lane supplier name, or by any code the
/// catalogue knows for that country.
fn country_matches(catalogue: &Catalogue, lane: &ArbitrageLane, query: &str) -> bool {
    if lane.supplier_country.eq_ignore_ascii_case(query.trim()) {
        return true;
    }
    catalogue
        .country(query)
        .is_some_and(|c| c.name == lane.supplier_country)
}

fn selected_lanes<'a>(catalogue: &'a Catalogue, request: &ScanRequest) -> Vec<&'a ArbitrageLane> {
    catalogue
        .lanes
        .iter()
        .filter(|lane| {
            request
                .categories
                .as_ref()
                .map_or(true, |cats| cats.iter().any(|c| *c == lane.commodity))
        })
        .filter(|lane| {
            request
                .countries
                .as_ref()
                .map_or(true, |countries| {
                    countries.iter().any(|q| country_matches(catalogue, lane, q))
                })
        })
        .collect()
}

fn evaluate_lane(
    catalogue: &Catalogue,
    lane: &ArbitrageLane,
    fx: &SourceResult<FxRates>,
    price: &SourceResult<CommodityPrice>,
) -> Result<Opportunity, String> {
    let rate = fx
        .value
        .rate(&lane.currency)
        .filter(|r| *r > Decimal::ZERO)
        .ok_or_else(|| format!("no exchange rate for {}", lane.currency))?;
    let overflow = |figure: &str| format!("{figure} out of range for {}", lane.product);
    let source_price = lane
        .fob_local
        .checked_div(rate)
        .ok_or_else(|| overflow("source price"))?;
    let market_price = price.value.price;
    if market_price <= Decimal::ZERO {
        return Err(format!("no market price for {}", lane.commodity));
    }
    let gross = gross_margin(source_price, market_price)
        .ok_or_else(|| overflow("gross margin"))?
        .round_dp(MARGIN_SCALE);
    let gross_pct = gross
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| overflow("gross margin"))?;
    let net = gross
        .checked_sub(lane.logistics_cost_ratio)
        .ok_or_else(|| overflow("net margin"))?;
    let revenue = lane
        .monthly_volume
        .checked_mul(market_price)
        .ok_or_else(|| overflow("revenue"))?;
    let commission = revenue
        .checked_mul(catalogue.commission_rate)
        .ok_or_else(|| overflow("commission"))?;

    let hs_code = catalogue
        .commodity(&lane.commodity)
        .map(|c| c.hs_code.as_str())
        .unwrap_or_default();

    Ok(Opportunity {
        product: lane.product.clone(),
        supplier_country: lane.supplier_country.clone(),
        commodity: lane.commodity.clone(),
        currency: lane.currency.clone(),
        fob_local: lane.fob_local,
        exchange_rate: rate,
        fob_price: source_price.round_dp(MONEY_SCALE),
        us_market_price: market_price,
        unit: price.value.unit.clone(),
        gross_margin: gross,
        gross_margin_pct: gross_pct.round_dp(MONEY_SCALE),
        net_margin: net.round_dp(MARGIN_SCALE),
        monthly_volume: lane.monthly_volume,
        revenue_potential: revenue.round_dp(MONEY_SCALE),
        commission_potential: commission.round_dp(MONEY_SCALE),
        agoa_eligible: catalogue.agoa.country_eligible(&lane.supplier_country)
            && catalogue.agoa.product_eligible(hs_code),
        risk_level: lane.risk_level.clone(),
        action_required: lane.action_required.clone(),
        certification_premiums: lane.certification_premiums.clone(),
        buyer_targets: lane.buyer_targets.clone(),
        price_origins: PriceOrigins {
            fx: fx.origin,
            commodity: price.origin,
        },
    })
}

/// Price every selected lane, keep those at or above the minimum margin and
/// rank them by gross margin, highest first.
pub(crate) async fn scan(agg: &Aggregator, request: &ScanRequest) -> Result<ScanOutcome, AggregateError> {
    let catalogue = agg.catalogue();
    let lanes = selected_lanes(catalogue, request);

    let mut outcome = ScanOutcome::default();
    let mut seen = HashSet::new();
    let mut profiles = Vec::new();
    for lane in &lanes {
        match catalogue.commodity(&lane.commodity) {
            Some(profile) if seen.insert(profile.name.as_str()) => profiles.push(profile),
            Some(_) => {}
            None => outcome.skipped.push(Skipped {
                product: lane.product.clone(),
                reason: format!("unknown commodity {}", lane.commodity),
            }),
        }
    }

    let fx_query = FxQuery::all("USD");
    let (fx, prices) = tokio::join!(
        agg.through_cache(agg.sources().fx.as_ref(), &fx_query),
        fetch_prices(agg, &profiles),
    );
    let fx = fx?;
    note_degraded(&mut outcome.degraded_sources, "fx:USD".to_string(), &fx);

    let mut by_commodity: HashMap<String, SourceResult<CommodityPrice>> = HashMap::new();
    for price in prices? {
        note_degraded(
            &mut outcome.degraded_sources,
            format!("commodity:{}", price.value.commodity),
            &price,
        );
        by_commodity.insert(price.value.commodity.clone(), price);
    }

    for lane in lanes {
        let Some(price) = by_commodity.get(&lane.commodity) else {
            continue;
        };
        match evaluate_lane(catalogue, lane, &fx, price) {
            Ok(opportunity) if opportunity.gross_margin >= request.min_margin => {
                outcome.opportunities.push(opportunity)
            }
            Ok(_) => {}
            Err(reason) => outcome.skipped.push(Skipped {
                product: lane.product.clone(),
                reason,
            }),
        }
    }

    outcome.opportunities.sort_by(|a, b| {
        b.gross_margin
            .cmp(&a.gross_margin)
            .then_with(|| a.product.cmp(&b.product))
    });
    if let Some(top_n) = request.top_n {
        outcome.opportunities.truncate(top_n);
    }
    Ok(outcome)
}

#[derive(Debug, Serialize)]
struct ScanParameters {
    minimum_margin_pct: Decimal,
    product_categories: Vec<String>,
    focus_countries: Vec<String>,
    top_n: usize,
    scan_timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct MarketConditions {
    favorable_factors: Vec<String>,
    risk_factors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ArbitrageReport {
    scan_parameters: ScanParameters,
    opportunity_count: usize,
    opportunities: Vec<Opportunity>,
    skipped: Vec<Skipped>,
    market_conditions: MarketConditions,
    recommended_actions: Vec<String>,
    degraded_sources: Vec<String>,
}

pub(crate) async fn run(agg: &Aggregator, args: &ValidatedArgs) -> Result<Value, AggregateError> {
    let catalogue = agg.catalogue();
    let min_margin_pct = args
        .number("min_margin")
        .ok_or_else(|| AggregateError::invalid("min_margin", "is required"))?;
    let top_n = args
        .integer("top_n")
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(DEFAULT_TOP_N);

    let request = ScanRequest {
        min_margin: min_margin_pct / Decimal::ONE_HUNDRED,
        categories: args.strings("product_categories").map(<[String]>::to_vec),
        countries: args.strings("focus_countries").map(<[String]>::to_vec),
        top_n: Some(top_n),
    };
    let outcome = scan(agg, &request).await?;

    to_payload(&ArbitrageReport {
        scan_parameters: ScanParameters {
            minimum_margin_pct: min_margin_pct,
            product_categories: request
                .categories
                .unwrap_or_else(|| catalogue.product_categories()),
            focus_countries: request
                .countries
                .unwrap_or_else(|| catalogue.supplier_countries()),
            top_n,
            scan_timestamp: Utc::now(),
        },
        opportunity_count: outcome.opportunities.len(),
        opportunities: outcome.opportunities,
        skipped: outcome.skipped,
        market_conditions: MarketConditions {
            favorable_factors: catalogue.notes.favorable_factors.clone(),
            risk_factors: catalogue.notes.risk_factors.clone(),
        },
        recommended_actions: catalogue.notes.recommended_actions.clone(),
        degraded_sources: outcome.degraded_sources,
    })
}
