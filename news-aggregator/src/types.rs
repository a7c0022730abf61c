pub use interfaces::defs::{
    Author, ClickRecord, Comment, CommentNode, FeedEntry, FeedItem, FeedItemId, FeedItemKind,
    FeedPage, HotTopic, NewComment, NewsItem, SourceFilter, StoredPost, ThreadEntry,
};

/// Origin of the scraped listing.
pub const DEFAULT_SOURCE_BASE_URL: &str = "https://news.hada.io";

/// Some listing sites reject requests that do not look like a browser.
pub const BROWSER_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
);

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    pub user_agent: String,
    /// `None` leaves the transport default in place.
    pub timeout_seconds: Option<u64>,
    pub max_redirects: usize,
    pub cache_ttl_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SOURCE_BASE_URL.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout_seconds: None,
            max_redirects: 5,
            cache_ttl_seconds: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComposerConfig {
    pub page_size: u32,
    /// Reported as `totalPages` in crawl mode, where the real bound is unknown.
    pub crawl_total_pages: u32,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            crawl_total_pages: 10,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("Listing parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("News post not found: {id}")]
    PostNotFound { id: i64 },

    #[error("Parent comment not found: {id}")]
    ParentNotFound { id: String },

    #[error("{0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
