use crate::cache::TtlPageCache;
use crate::fetcher::Fetcher;
use crate::parser::ListingParser;
use crate::traits::{HtmlFetcher, NewsSource, PageCache};
use crate::types::{FetchConfig, NewsItem, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

/// Scrapes the GeekNews (news.hada.io) front page listing.
pub struct HadaNewsSource {
    fetcher: Arc<dyn HtmlFetcher>,
    cache: Arc<dyn PageCache>,
    parser: ListingParser,
}

impl HadaNewsSource {
    pub fn new(
        fetcher: Arc<dyn HtmlFetcher>,
        cache: Arc<dyn PageCache>,
        base_url: &str,
    ) -> Result<Self> {
        Ok(Self {
            fetcher,
            cache,
            parser: ListingParser::new(base_url)?,
        })
    }

    /// Real HTTP transport plus a TTL cache, both taken from `config`.
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        let fetcher = Arc::new(Fetcher::new(config)?);
        let cache = Arc::new(TtlPageCache::new(config.cache_ttl_seconds));
        Self::new(fetcher, cache, &config.base_url)
    }

    pub fn listing_url(&self, page: u32) -> String {
        format!("{}/?page={}", self.parser.origin(), page.max(1))
    }

    async fn try_fetch_page(&self, page: u32) -> Result<Vec<NewsItem>> {
        let url = self.listing_url(page);

        let html = match self.cache.get(&url).await {
            Some(html) => html,
            None => {
                let html = self.fetcher.fetch_html(&url).await?;
                self.cache.put(&url, html.clone()).await;
                html
            }
        };

        Ok(self.parser.parse_listing(&html))
    }
}

#[async_trait]
impl NewsSource for HadaNewsSource {
    fn source_name(&self) -> String {
        "GeekNews".to_string()
    }

    async fn fetch_page(&self, page: u32) -> Vec<NewsItem> {
        match self.try_fetch_page(page).await {
            Ok(items) => {
                info!("Pulled {} items from {} page {}", items.len(), self.source_name(), page);
                items
            }
            Err(e) => {
                error!("Error crawling {} page {}: {}", self.parser.origin(), page, e);
                Vec::new()
            }
        }
    }
}
