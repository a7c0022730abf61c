use crate::types::{AggregatorError, NewsItem, Result};
use crate::utils::text::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".topic_row").expect("valid row selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".topictitle a, a.topictitle").expect("valid title selector"));
static DESC_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".topicdesc").expect("valid description selector"));
static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("valid anchor selector"));

/// "N분 전", "N시간 전", "N일 전"
static TIME_AGO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(분|시간|일)\s?전").expect("valid time-ago pattern"));

/// Turns a listing page into `NewsItem`s.
pub struct ListingParser {
    origin: String,
}

impl ListingParser {
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)?;
        if parsed.host_str().is_none() {
            return Err(AggregatorError::Parse(format!("base URL has no host: {}", base_url)));
        }

        Ok(Self {
            origin: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn parse_listing(&self, html: &str) -> Vec<NewsItem> {
        debug!("Parsing listing page ({} bytes)", html.len());

        let document = Html::parse_document(html);
        let mut seen_links = HashSet::new();
        let mut items = Vec::new();
        let mut skipped = 0usize;

        for row in document.select(&ROW_SELECTOR) {
            match self.parse_row(row) {
                Some(item) => {
                    if seen_links.insert(item.link.clone()) {
                        items.push(item);
                    } else {
                        debug!("Skipping duplicate listing row: {}", item.link);
                    }
                }
                None => skipped += 1,
            }
        }

        info!("Parsed {} listing rows ({} skipped)", items.len(), skipped);
        items
    }

    fn parse_row(&self, row: ElementRef<'_>) -> Option<NewsItem> {
        let anchor = row.select(&TITLE_SELECTOR).next()?;

        let title = collapse_whitespace(&anchor.text().collect::<String>());
        if title.is_empty() {
            return None;
        }

        let link = anchor
            .value()
            .attr("href")
            .and_then(|href| self.resolve_link(href))?;

        let description = row.select(&DESC_SELECTOR).next();
        let desc_text = description
            .map(|desc| collapse_whitespace(&desc.text().collect::<Vec<_>>().join(" ")))
            .unwrap_or_default();

        let time_ago = extract_time_ago(&desc_text);
        let source = description.and_then(|desc| extract_source(desc, &desc_text));

        Some(NewsItem {
            id: link.clone(),
            title,
            link,
            source,
            time_ago: Some(time_ago),
            summary: None,
        })
    }

    /// Absolute http(s) links pass through and links with any other scheme
    /// are dropped. Relative links are joined onto the origin with leading
    /// slashes trimmed so the result never has `//` after the host.
    pub fn resolve_link(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        match Url::parse(href) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => return Some(href.to_string()),
            Ok(url) => {
                debug!("Skipping {} link: {}", url.scheme(), href);
                return None;
            }
            Err(_) => {}
        }

        if let Some(rest) = href.strip_prefix("//") {
            return Some(format!("https://{}", rest));
        }

        Some(format!("{}/{}", self.origin, href.trim_start_matches('/')))
    }
}

/// First recency label in `text`, or an empty string.
pub fn extract_time_ago(text: &str) -> String {
    TIME_AGO
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn extract_source(description: ElementRef<'_>, desc_text: &str) -> Option<String> {
    if let Some(anchor) = description.select(&ANCHOR_SELECTOR).next() {
        let text = collapse_whitespace(&anchor.text().collect::<String>());
        if !text.is_empty() {
            return Some(text);
        }
    }

    let leading = desc_text.split(['·', '|']).next()?.trim();
    if leading.is_empty() || TIME_AGO.is_match(leading) {
        None
    } else {
        Some(leading.to_string())
    }
}
