use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use tradeintel_models::{key_patterns, KeyClass, Mode, NewsItem, SourceEndpoint};

use crate::adapter::SourceAdapter;
use crate::error::SourceError;
use crate::http::HttpFetcher;

/// Maximum summary length in characters.
const SUMMARY_CHARS: usize = 200;

/// Syndicated RSS feed adapter.
pub struct NewsAdapter {
    endpoint: SourceEndpoint,
    http: HttpFetcher,
    mode: Mode,
    default_items: Vec<NewsItem>,
}

impl NewsAdapter {
    pub fn new(
        endpoint: SourceEndpoint,
        http: HttpFetcher,
        mode: Mode,
        default_items: Vec<NewsItem>,
    ) -> Self {
        Self {
            endpoint,
            http,
            mode,
            default_items,
        }
    }
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Malformed(format!("selector {css}: {e}")))
}

/// Text of an element. HTML parsing turns CDATA into a `[CDATA[...]]`
/// comment in ordinary elements and leaves it as literal text in `<title>`;
/// both forms are unwrapped.
fn element_text(element: ElementRef) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Comment(comment) => {
                let raw: &str = comment;
                if let Some(inner) = raw.strip_prefix("[CDATA[") {
                    out.push_str(inner.strip_suffix("]]").unwrap_or(inner));
                }
            }
            _ => {}
        }
    }
    let trimmed = out.trim();
    match trimmed.strip_prefix("<![CDATA[") {
        Some(inner) => inner.strip_suffix("]]>").unwrap_or(inner).trim().to_string(),
        None => trimmed.to_string(),
    }
}

/// `<link>` is a void element in HTML, so the URL lands in the following text node.
fn link_text(item: ElementRef, link: &Selector) -> Option<String> {
    let element = item.select(link).next()?;
    let inline = element_text(element);
    if !inline.is_empty() {
        return Some(inline);
    }
    element
        .next_sibling()
        .and_then(|sibling| sibling.value().as_text().map(|t| t.trim().to_string()))
        .filter(|t| !t.is_empty())
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn parse_feed(body: &str) -> Result<Vec<NewsItem>, SourceError> {
    let document = Html::parse_document(body);
    let item_sel = selector("item")?;
    let title_sel = selector("title")?;
    let description_sel = selector("description")?;
    let link_sel = selector("link")?;
    let guid_sel = selector("guid")?;

    let items: Vec<NewsItem> = document
        .select(&item_sel)
        .filter_map(|item| {
            let title = item.select(&title_sel).next().map(element_text)?;
            if title.is_empty() {
                return None;
            }
            let summary = item
                .select(&description_sel)
                .next()
                .map(element_text)
                .unwrap_or_default();
            let link = link_text(item, &link_sel)
                .or_else(|| item.select(&guid_sel).next().map(element_text))
                .unwrap_or_else(|| "#".to_string());
            Some(NewsItem {
                title,
                summary: truncate_chars(&summary, SUMMARY_CHARS),
                link,
            })
        })
        .collect();

    if items.is_empty() {
        return Err(SourceError::Malformed("feed contained no items".to_string()));
    }
    Ok(items)
}

#[async_trait]
impl SourceAdapter for NewsAdapter {
    type Params = ();
    type Value = Vec<NewsItem>;

    fn name(&self) -> &str {
        "news"
    }

    fn key_class(&self) -> KeyClass {
        KeyClass::News
    }

    fn cache_key(&self, _params: &()) -> String {
        key_patterns::news()
    }

    fn fallback(&self, _params: &()) -> Vec<NewsItem> {
        self.default_items.clone()
    }

    fn live_enabled(&self) -> bool {
        self.mode.live_sources
    }

    async fn fetch_live(&self, _params: &()) -> Result<Vec<NewsItem>, SourceError> {
        let body = self
            .http
            .get_text(&self.endpoint.base_url, &[], self.endpoint.timeout())
            .await?;
        parse_feed(&body)
    }
}
