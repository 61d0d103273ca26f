//! One module per tool. Each takes validated arguments and returns the
//! tool's JSON payload.

pub(crate) mod agoa;
pub mod arbitrage;
pub(crate) mod commodities;
pub(crate) mod fx;
pub(crate) mod news;
pub(crate) mod overview;
pub(crate) mod snapshot;
pub(crate) mod trade;
pub(crate) mod trends;
pub(crate) mod weather;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use tradeintel_models::{Origin, SourceResult};

use crate::error::AggregateError;

/// A source value flattened next to its origin tag, so live and fallback
/// payloads share one shape.
#[derive(Debug, Serialize)]
pub(crate) struct Tagged<T> {
    #[serde(flatten)]
    pub value: T,
    pub origin: Origin,
}

impl<T> From<SourceResult<T>> for Tagged<T> {
    fn from(result: SourceResult<T>) -> Self {
        Self {
            value: result.value,
            origin: result.origin,
        }
    }
}

pub(crate) fn to_payload<T: Serialize>(payload: &T) -> Result<Value, AggregateError> {
    Ok(serde_json::to_value(payload)?)
}

/// Push `label` when the result was not served live.
pub(crate) fn note_degraded<T>(degraded: &mut Vec<String>, label: String, result: &SourceResult<T>) {
    if !result.is_live() {
        degraded.push(label);
    }
}

/// Sum of `values`, or `None` (with a warning) once it leaves `Decimal` range.
pub(crate) fn checked_sum(
    figure: &str,
    values: impl IntoIterator<Item = Decimal>,
) -> Option<Decimal> {
    let total = values
        .into_iter()
        .try_fold(Decimal::ZERO, Decimal::checked_add);
    if total.is_none() {
        warn!(figure, "Total out of range, omitting it");
    }
    total
}

/// Mean rounded to two places. Zero for no values.
pub(crate) fn checked_mean(figure: &str, values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return Some(Decimal::ZERO);
    }
    let total = checked_sum(figure, values.iter().copied())?;
    Some((total / Decimal::from(values.len())).round_dp(2))
}
