use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A row scraped from the external listing page. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// Canonical absolute URL, also used as the dedup key.
    pub id: String,
    pub title: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_ago: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Display data of a user, as exposed next to posts and comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A feed row owned by the relational store: either a user submission or a
/// record materialised the first time someone commented on a scraped link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPost {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub source: Option<String>,
    /// External link, or a synthetic unique token for user posts.
    pub url: String,
    pub is_user_post: bool,
    pub created_at: DateTime<Utc>,
    pub author_id: Option<String>,
    pub author: Option<Author>,
    pub comment_count: i64,
}

impl StoredPost {
    /// Internal route of a stored post's detail page.
    pub fn detail_path(&self) -> String {
        format!("/news/{}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedItemId {
    Stored(i64),
    External(String),
}

impl fmt::Display for FeedItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedItemId::Stored(id) => write!(f, "{}", id),
            FeedItemId::External(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedItemKind {
    Scraped,
    Stored,
}

/// The display shape returned to clients for both scraped and stored items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: FeedItemId,
    pub kind: FeedItemKind,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub is_user_post: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_ago: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub comment_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
}

impl FeedItem {
    /// Click telemetry only applies to links that leave the site.
    pub fn tracks_clicks(&self) -> bool {
        !self.is_user_post
    }
}

/// Either half of the feed before it is projected for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEntry {
    Scraped(NewsItem),
    Stored(StoredPost),
}

impl FeedEntry {
    /// Link used to detect the same article arriving from both sources.
    pub fn external_link(&self) -> Option<&str> {
        match self {
            FeedEntry::Scraped(item) => Some(&item.link),
            FeedEntry::Stored(post) if !post.is_user_post => Some(&post.url),
            FeedEntry::Stored(_) => None,
        }
    }
}

impl From<FeedEntry> for FeedItem {
    fn from(entry: FeedEntry) -> Self {
        match entry {
            FeedEntry::Scraped(item) => FeedItem {
                id: FeedItemId::External(item.id),
                kind: FeedItemKind::Scraped,
                title: item.title,
                url: item.link,
                source: item.source,
                is_user_post: false,
                time_ago: item.time_ago,
                created_at: None,
                summary: item.summary,
                comment_count: 0,
                author: None,
            },
            FeedEntry::Stored(post) => {
                let url = if post.is_user_post {
                    post.detail_path()
                } else {
                    post.url
                };
                FeedItem {
                    id: FeedItemId::Stored(post.id),
                    kind: FeedItemKind::Stored,
                    title: post.title,
                    url,
                    source: post.source,
                    is_user_post: post.is_user_post,
                    time_ago: None,
                    created_at: Some(post.created_at),
                    summary: post.summary,
                    comment_count: post.comment_count,
                    author: if post.is_user_post { post.author } else { None },
                }
            }
        }
    }
}

/// Which half of the feed a page request draws from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFilter {
    #[default]
    All,
    Db,
    Crawl,
}

impl FromStr for SourceFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SourceFilter::All),
            "db" => Ok(SourceFilter::Db),
            "crawl" => Ok(SourceFilter::Crawl),
            other => Err(format!("unknown source filter: {}", other)),
        }
    }
}

impl fmt::Display for SourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceFilter::All => "all",
            SourceFilter::Db => "db",
            SourceFilter::Crawl => "crawl",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub news: Vec<FeedItem>,
    pub total_pages: u32,
    pub current_page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
    pub source: SourceFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub news_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Weak reference to another comment on the same post.
    pub parent_id: Option<String>,
    pub author: Author,
}

/// A comment with its nested replies, in the order they were received.
///
/// Not `Serialize`: serde would recurse once per reply level. Send
/// [`ThreadEntry`] rows instead.
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn new(comment: Comment) -> Self {
        Self {
            comment,
            replies: Vec::new(),
        }
    }
}

impl fmt::Debug for CommentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentNode")
            .field("comment", &self.comment)
            .field("replies", &self.replies.len())
            .finish()
    }
}

impl Drop for CommentNode {
    // Unlink the subtree so no level drops its replies recursively.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

/// One row of a comment thread in depth-first order.
///
/// `parent` indexes the row this one is nested under, `depth` counts the
/// levels above it. Roots have `depth == 0` and no parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadEntry {
    #[serde(flatten)]
    pub comment: Comment,
    pub depth: usize,
    pub parent: Option<usize>,
    pub reply_count: usize,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub news_id: i64,
    pub author_id: String,
    pub content: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickRecord {
    pub keyword: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotTopic {
    pub rank: u32,
    pub keyword: String,
    pub count: i64,
}
