use serde::Serialize;
use serde_json::Value;
use tradeintel_models::{NewsItem, Origin};

use super::to_payload;
use crate::aggregator::Aggregator;
use crate::error::AggregateError;
use crate::validate::ValidatedArgs;

const DEFAULT_KEYWORDS: [&str; 3] = ["africa", "trade", "agriculture"];
const DEFAULT_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
struct TradeNews {
    keywords: Vec<String>,
    articles: Vec<NewsItem>,
    total_matched: usize,
    /// True when nothing matched and the standing headlines were served.
    default_headlines: bool,
    origin: Origin,
}

pub(crate) async fn run(agg: &Aggregator, args: &ValidatedArgs) -> Result<Value, AggregateError> {
    let keywords: Vec<String> = match args.strings("keywords") {
        Some(k) if !k.is_empty() => k.iter().map(|s| s.trim().to_lowercase()).collect(),
        _ => DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
    };
    let limit = args
        .integer("limit")
        .and_then(|l| usize::try_from(l).ok())
        .unwrap_or(DEFAULT_LIMIT);

    let result = agg.through_cache(agg.sources().news.as_ref(), &()).await?;
    let matched: Vec<NewsItem> = result
        .value
        .into_iter()
        .filter(|item| keywords.iter().any(|k| item.mentions(k)))
        .collect();
    let total_matched = matched.len();

    let (articles, default_headlines) = if matched.is_empty() {
        (agg.catalogue().default_news.clone(), true)
    } else {
        (matched, false)
    };

    to_payload(&TradeNews {
        keywords,
        articles: articles.into_iter().take(limit).collect(),
        total_matched,
        default_headlines,
        origin: result.origin,
    })
}
