use serde_json::Value;

use super::{to_payload, Tagged};
use crate::aggregator::Aggregator;
use crate::error::AggregateError;
use crate::validate::ValidatedArgs;

pub(crate) fn country_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    (code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic())).then_some(code)
}

pub(crate) async fn run(agg: &Aggregator, args: &ValidatedArgs) -> Result<Value, AggregateError> {
    let code = country_code(args.str("country_code").unwrap_or_default()).ok_or_else(|| {
        AggregateError::invalid("country_code", "expected a two-letter ISO country code")
    })?;

    let result = agg.through_cache(agg.sources().weather.as_ref(), &code).await?;
    to_payload(&Tagged::from(result))
}
