use crate::traits::{NewsSource, NewsStore};
use crate::types::{
    AggregatorError, ComposerConfig, FeedEntry, FeedItem, FeedPage, Result, SourceFilter,
    StoredPost,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

pub const TITLE_MIN_CHARS: usize = 2;
pub const TITLE_MAX_CHARS: usize = 100;
pub const CONTENT_MIN_CHARS: usize = 10;

/// `max(1, ceil(count / page_size))`
pub fn total_pages(count: i64, page_size: u32) -> u32 {
    let page_size = i64::from(page_size.max(1));
    let pages = (count.max(0) + page_size - 1) / page_size;
    pages.clamp(1, i64::from(u32::MAX)) as u32
}

/// Checks a user submission, returning the trimmed title and content.
/// Only the first failing rule is reported.
pub fn validate_post(title: Option<&str>, content: Option<&str>) -> Result<(String, String)> {
    let title = title.unwrap_or_default().trim();
    let content = content.unwrap_or_default().trim();

    let title_len = title.chars().count();
    if title_len < TITLE_MIN_CHARS {
        return Err(AggregatorError::Validation(format!(
            "Title must be at least {} characters",
            TITLE_MIN_CHARS
        )));
    }
    if title_len > TITLE_MAX_CHARS {
        return Err(AggregatorError::Validation(format!(
            "Title must be at most {} characters",
            TITLE_MAX_CHARS
        )));
    }
    if content.chars().count() < CONTENT_MIN_CHARS {
        return Err(AggregatorError::Validation(format!(
            "Content must be at least {} characters",
            CONTENT_MIN_CHARS
        )));
    }

    Ok((title.to_string(), content.to_string()))
}

/// Builds pages of the combined feed out of stored posts and scraped items.
pub struct FeedComposer {
    store: Arc<dyn NewsStore>,
    source: Arc<dyn NewsSource>,
    config: ComposerConfig,
}

impl FeedComposer {
    pub fn new(
        store: Arc<dyn NewsStore>,
        source: Arc<dyn NewsSource>,
        config: ComposerConfig,
    ) -> Self {
        Self { store, source, config }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub async fn compose(&self, page: u32, filter: SourceFilter) -> Result<FeedPage> {
        let page = page.max(1);

        let feed = match filter {
            SourceFilter::Crawl => self.compose_crawl(page).await,
            SourceFilter::Db | SourceFilter::All => self.compose_stored(page, filter).await?,
        };

        info!(
            "Composed feed page {} ({}): {} items, {} pages",
            feed.current_page,
            feed.source,
            feed.news.len(),
            feed.total_pages
        );
        Ok(feed)
    }

    async fn compose_crawl(&self, page: u32) -> FeedPage {
        let scraped = self.source.fetch_page(page).await;
        let mut seen = HashSet::new();

        let news = scraped
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .map(|item| FeedItem::from(FeedEntry::Scraped(item)))
            .collect();

        FeedPage {
            news,
            total_pages: self.config.crawl_total_pages,
            current_page: page,
            total_count: None,
            source: SourceFilter::Crawl,
        }
    }

    async fn compose_stored(&self, page: u32, filter: SourceFilter) -> Result<FeedPage> {
        let page_size = self.config.page_size.max(1);
        let limit = i64::from(page_size);
        let offset = i64::from(page - 1) * limit;

        let (count, posts) = futures::try_join!(
            self.store.count_posts(),
            self.store.list_posts(offset, limit)
        )?;
        debug!("Stored posts: {} total, {} on page {}", count, posts.len(), page);

        let mut entries: Vec<FeedEntry> = posts.into_iter().map(FeedEntry::Stored).collect();

        let threshold = (page_size / 2) as usize;
        if filter != SourceFilter::Db && entries.len() < threshold {
            self.supplement(&mut entries, page_size as usize).await;
        }

        Ok(FeedPage {
            news: entries.into_iter().map(FeedItem::from).collect(),
            total_pages: total_pages(count, page_size),
            current_page: page,
            total_count: Some(count),
            source: filter,
        })
    }

    /// Pads a thin page with scraped items from the first listing page,
    /// skipping links that are already on the page.
    async fn supplement(&self, entries: &mut Vec<FeedEntry>, page_size: usize) {
        let room = page_size.saturating_sub(entries.len());
        if room == 0 {
            return;
        }

        let mut seen: HashSet<String> = entries
            .iter()
            .filter_map(|entry| entry.external_link().map(str::to_string))
            .collect();

        let before = entries.len();
        let scraped = self.source.fetch_page(1).await;
        entries.extend(
            scraped
                .into_iter()
                .filter(|item| seen.insert(item.link.clone()))
                .take(room)
                .map(FeedEntry::Scraped),
        );

        debug!("Supplemented page with {} scraped items", entries.len() - before);
    }

    /// Stores a validated user submission.
    pub async fn submit_post(
        &self,
        author_id: &str,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<StoredPost> {
        let (title, content) = validate_post(title, content)?;
        let post = self.store.create_user_post(author_id, &title, &content).await?;
        info!("User {} created post {}", author_id, post.id);
        Ok(post)
    }
}
