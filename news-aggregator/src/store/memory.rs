use super::{MATERIALISED_SOURCE, MATERIALISED_SUMMARY, SUMMARY_MAX_CHARS, USER_POST_SOURCE};
use crate::traits::{ClickLedger, NewsStore};
use crate::types::{AggregatorError, Author, ClickRecord, Comment, NewComment, Result, StoredPost};
use crate::utils::{ids, text};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    next_post_id: i64,
    posts: Vec<StoredPost>,
    comments: Vec<Comment>,
    comment_authors: HashMap<String, String>,
    authors: HashMap<String, Author>,
    clicks: Vec<ClickRecord>,
}

impl Tables {
    fn comment_count(&self, news_id: i64) -> i64 {
        self.comments.iter().filter(|c| c.news_id == news_id).count() as i64
    }

    fn hydrate(&self, post: &StoredPost) -> StoredPost {
        let mut post = post.clone();
        post.comment_count = self.comment_count(post.id);
        post.author = post
            .author_id
            .as_ref()
            .map(|id| self.authors.get(id).cloned().unwrap_or_default());
        post
    }

    fn insert_post(&mut self, mut post: StoredPost) -> StoredPost {
        self.next_post_id += 1;
        post.id = self.next_post_id;
        self.posts.push(post);
        let stored = &self.posts[self.posts.len() - 1];
        self.hydrate(stored)
    }
}

/// Store kept in process memory. Used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryNewsStore {
    tables: RwLock<Tables>,
}

impl MemoryNewsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a non-user post with a fixed timestamp.
    pub async fn insert_external_post(
        &self,
        title: &str,
        url: &str,
        created_at: DateTime<Utc>,
    ) -> StoredPost {
        let mut tables = self.tables.write().await;
        tables.insert_post(StoredPost {
            id: 0,
            title: title.to_string(),
            summary: None,
            content: None,
            source: Some(MATERIALISED_SOURCE.to_string()),
            url: url.to_string(),
            is_user_post: false,
            created_at,
            author_id: None,
            author: None,
            comment_count: 0,
        })
    }

    pub async fn author(&self, user_id: &str) -> Option<Author> {
        self.tables.read().await.authors.get(user_id).cloned()
    }

    pub async fn click_count(&self) -> usize {
        self.tables.read().await.clicks.len()
    }
}

#[async_trait]
impl NewsStore for MemoryNewsStore {
    async fn count_posts(&self) -> Result<i64> {
        Ok(self.tables.read().await.posts.len() as i64)
    }

    async fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<StoredPost>> {
        let tables = self.tables.read().await;
        let mut posts: Vec<&StoredPost> = tables.posts.iter().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        Ok(posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|post| tables.hydrate(post))
            .collect())
    }

    async fn get_post(&self, id: i64) -> Result<Option<StoredPost>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).map(|p| tables.hydrate(p)))
    }

    async fn find_post_by_url(&self, url: &str) -> Result<Option<StoredPost>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.url == url).map(|p| tables.hydrate(p)))
    }

    async fn find_or_create_by_url(&self, url: &str, title: &str) -> Result<StoredPost> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.posts.iter().find(|p| p.url == url) {
            return Ok(tables.hydrate(existing));
        }

        Ok(tables.insert_post(StoredPost {
            id: 0,
            title: title.to_string(),
            summary: Some(MATERIALISED_SUMMARY.to_string()),
            content: None,
            source: Some(MATERIALISED_SOURCE.to_string()),
            url: url.to_string(),
            is_user_post: false,
            created_at: Utc::now(),
            author_id: None,
            author: None,
            comment_count: 0,
        }))
    }

    async fn create_user_post(
        &self,
        author_id: &str,
        title: &str,
        content: &str,
    ) -> Result<StoredPost> {
        let mut tables = self.tables.write().await;
        Ok(tables.insert_post(StoredPost {
            id: 0,
            title: title.to_string(),
            summary: Some(text::smart_truncate(content, SUMMARY_MAX_CHARS)),
            content: Some(content.to_string()),
            source: Some(USER_POST_SOURCE.to_string()),
            url: ids::user_post_token(),
            is_user_post: true,
            created_at: Utc::now(),
            author_id: Some(author_id.to_string()),
            author: None,
            comment_count: 0,
        }))
    }

    async fn upsert_author(&self, user_id: &str, author: &Author) -> Result<()> {
        let mut tables = self.tables.write().await;
        let entry = tables.authors.entry(user_id.to_string()).or_default();
        if author.name.is_some() {
            entry.name = author.name.clone();
        }
        if author.image.is_some() {
            entry.image = author.image.clone();
        }
        Ok(())
    }

    async fn list_comments(&self, news_id: i64) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        // Stored oldest first; newest first is the reverse.
        Ok(tables
            .comments
            .iter()
            .rev()
            .filter(|c| c.news_id == news_id)
            .map(|c| {
                let mut comment = c.clone();
                comment.author = tables
                    .comment_authors
                    .get(&c.id)
                    .and_then(|author_id| tables.authors.get(author_id))
                    .cloned()
                    .unwrap_or_default();
                comment
            })
            .collect())
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let mut tables = self.tables.write().await;

        if !tables.posts.iter().any(|p| p.id == comment.news_id) {
            return Err(AggregatorError::PostNotFound { id: comment.news_id });
        }
        if let Some(parent_id) = &comment.parent_id {
            let same_post = tables
                .comments
                .iter()
                .any(|c| &c.id == parent_id && c.news_id == comment.news_id);
            if !same_post {
                return Err(AggregatorError::ParentNotFound { id: parent_id.clone() });
            }
        }

        let created = Comment {
            id: Uuid::new_v4().to_string(),
            news_id: comment.news_id,
            content: comment.content,
            created_at: Utc::now(),
            parent_id: comment.parent_id,
            author: tables.authors.get(&comment.author_id).cloned().unwrap_or_default(),
        };
        tables.comment_authors.insert(created.id.clone(), comment.author_id);
        tables.comments.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl ClickLedger for MemoryNewsStore {
    async fn record_click(&self, record: ClickRecord) -> Result<()> {
        self.tables.write().await.clicks.push(record);
        Ok(())
    }

    async fn top_keywords(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<(String, i64)>> {
        let tables = self.tables.read().await;
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for click in tables.clicks.iter().filter(|c| c.created_at >= since) {
            *counts.entry(click.keyword.as_str()).or_default() += 1;
        }

        let mut ranked: Vec<(String, i64)> = counts
            .into_iter()
            .map(|(keyword, count)| (keyword.to_string(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        Ok(ranked)
    }
}
