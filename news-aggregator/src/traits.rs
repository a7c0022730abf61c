use crate::types::{Author, ClickRecord, Comment, NewComment, NewsItem, Result, StoredPost};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A listing site that can be read one page at a time.
#[async_trait]
pub trait NewsSource: Send + Sync {
    fn source_name(&self) -> String;

    /// Best effort: fetch or parse failures are logged and yield an empty list.
    async fn fetch_page(&self, page: u32) -> Vec<NewsItem>;
}

/// Raw HTML transport, separated out so the adapter can be driven without a network.
#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String>;
}

/// Short-lived response cache. No single-flight: concurrent misses may all fetch.
#[async_trait]
pub trait PageCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: &str, body: String);
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Relational store behind posts and comments.
#[async_trait]
pub trait NewsStore: Send + Sync {
    async fn count_posts(&self) -> Result<i64>;

    /// Newest first, with comment counts and author display data.
    async fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<StoredPost>>;

    async fn get_post(&self, id: i64) -> Result<Option<StoredPost>>;

    async fn find_post_by_url(&self, url: &str) -> Result<Option<StoredPost>>;

    /// Idempotent: returns the existing row for `url` or materialises one.
    async fn find_or_create_by_url(&self, url: &str, title: &str) -> Result<StoredPost>;

    async fn create_user_post(
        &self,
        author_id: &str,
        title: &str,
        content: &str,
    ) -> Result<StoredPost>;

    /// Mirror the display data of an authenticated user.
    async fn upsert_author(&self, user_id: &str, author: &Author) -> Result<()>;

    /// Newest first.
    async fn list_comments(&self, news_id: i64) -> Result<Vec<Comment>>;

    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;
}

/// Append-only click log feeding the hot topics ranking.
#[async_trait]
pub trait ClickLedger: Send + Sync {
    async fn record_click(&self, record: ClickRecord) -> Result<()>;

    /// `(keyword, count)` pairs since `since`, most clicked first.
    async fn top_keywords(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<(String, i64)>>;
}
