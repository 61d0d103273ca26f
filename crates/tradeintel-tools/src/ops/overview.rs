use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use super::arbitrage::{scan, ScanRequest};
use super::{checked_mean, checked_sum, to_payload};
use crate::aggregator::Aggregator;
use crate::error::AggregateError;
use crate::validate::ValidatedArgs;

#[derive(Debug, Serialize)]
struct BestOpportunity {
    product: String,
    supplier_country: String,
    gross_margin_pct: Decimal,
    commission_potential: Decimal,
}

#[derive(Debug, Serialize)]
struct MarketOverview {
    opportunity_count: usize,
    total_revenue_potential: Option<Decimal>,
    total_commission_potential: Option<Decimal>,
    average_gross_margin_pct: Option<Decimal>,
    best_opportunity: Option<BestOpportunity>,
    favorable_factors: Vec<String>,
    risk_factors: Vec<String>,
    strategic_recommendations: Vec<String>,
    degraded_sources: Vec<String>,
}

/// Unfiltered arbitrage scan folded into headline figures.
pub(crate) async fn run(agg: &Aggregator, _args: &ValidatedArgs) -> Result<Value, AggregateError> {
    let outcome = scan(agg, &ScanRequest::default()).await?;
    let opportunities = &outcome.opportunities;

    let total_revenue_potential = checked_sum(
        "total_revenue_potential",
        opportunities.iter().map(|o| o.revenue_potential),
    );
    let total_commission_potential = checked_sum(
        "total_commission_potential",
        opportunities.iter().map(|o| o.commission_potential),
    );
    let margins: Vec<Decimal> = opportunities.iter().map(|o| o.gross_margin_pct).collect();
    let average_gross_margin_pct = checked_mean("average_gross_margin_pct", &margins);
    let best_opportunity = opportunities.first().map(|o| BestOpportunity {
        product: o.product.clone(),
        supplier_country: o.supplier_country.clone(),
        gross_margin_pct: o.gross_margin_pct,
        commission_potential: o.commission_potential,
    });

    let notes = &agg.catalogue().notes;
    to_payload(&MarketOverview {
        opportunity_count: opportunities.len(),
        total_revenue_potential,
        total_commission_potential,
        average_gross_margin_pct,
        best_opportunity,
        favorable_factors: notes.favorable_factors.clone(),
        risk_factors: notes.risk_factors.clone(),
        strategic_recommendations: notes.strategic_recommendations.clone(),
        degraded_sources: outcome.degraded_sources,
    })
}
