use super::{MATERIALISED_SOURCE, MATERIALISED_SUMMARY, SUMMARY_MAX_CHARS, USER_POST_SOURCE};
use crate::traits::{ClickLedger, NewsStore};
use crate::types::{AggregatorError, Author, ClickRecord, Comment, NewComment, Result, StoredPost};
use crate::utils::{ids, text};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA: [&str; 6] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT,
        image TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS news (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        summary TEXT,
        content TEXT,
        source TEXT,
        url TEXT NOT NULL UNIQUE,
        is_user_post BOOLEAN NOT NULL DEFAULT FALSE,
        user_id TEXT REFERENCES users(id),
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id TEXT PRIMARY KEY,
        content TEXT NOT NULL,
        news_id BIGINT NOT NULL REFERENCES news(id) ON DELETE CASCADE,
        user_id TEXT NOT NULL REFERENCES users(id),
        parent_id TEXT REFERENCES comments(id) ON DELETE CASCADE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS comments_news_id_idx ON comments (news_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS click_logs (
        id BIGSERIAL PRIMARY KEY,
        keyword TEXT NOT NULL,
        url TEXT NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS click_logs_created_at_idx ON click_logs (created_at)",
];

const POST_COLUMNS: &str = r#"
    n.id, n.title, n.summary, n.content, n.source, n.url, n.is_user_post, n.created_at, n.user_id,
    u.name AS author_name, u.image AS author_image,
    (SELECT COUNT(*) FROM comments c WHERE c.news_id = n.id) AS comment_count
    FROM news n
    LEFT JOIN users u ON u.id = n.user_id
"#;

const COMMENT_COLUMNS: &str = r#"
    c.id, c.news_id, c.content, c.created_at, c.parent_id,
    u.name AS author_name, u.image AS author_image
    FROM comments c
    LEFT JOIN users u ON u.id = c.user_id
"#;

/// Postgres-backed store for posts, comments and click logs.
pub struct PgNewsStore {
    pool: PgPool,
}

impl PgNewsStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn setup_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("News schema is ready");
        Ok(())
    }

    async fn fetch_post_where(
        &self,
        clause: &str,
        bind: PostKey<'_>,
    ) -> Result<Option<StoredPost>> {
        let sql = format!("SELECT {} WHERE {}", POST_COLUMNS, clause);
        let query = sqlx::query(&sql);
        let query = match bind {
            PostKey::Id(id) => query.bind(id),
            PostKey::Url(url) => query.bind(url),
        };

        let row = query.fetch_optional(&self.pool).await?;
        row.as_ref().map(post_from_row).transpose()
    }

    async fn fetch_comment(&self, id: &str) -> Result<Comment> {
        let sql = format!("SELECT {} WHERE c.id = $1", COMMENT_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_one(&self.pool).await?;
        comment_from_row(&row)
    }
}

enum PostKey<'a> {
    Id(i64),
    Url(&'a str),
}

fn author_from_row(row: &PgRow) -> Result<Author> {
    Ok(Author {
        name: row.try_get("author_name")?,
        image: row.try_get("author_image")?,
    })
}

fn post_from_row(row: &PgRow) -> Result<StoredPost> {
    let author_id: Option<String> = row.try_get("user_id")?;
    let author = match author_id {
        Some(_) => Some(author_from_row(row)?),
        None => None,
    };

    Ok(StoredPost {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        summary: row.try_get("summary")?,
        content: row.try_get("content")?,
        source: row.try_get("source")?,
        url: row.try_get("url")?,
        is_user_post: row.try_get("is_user_post")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        author_id,
        author,
        comment_count: row.try_get("comment_count")?,
    })
}

fn comment_from_row(row: &PgRow) -> Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        news_id: row.try_get("news_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        parent_id: row.try_get("parent_id")?,
        author: author_from_row(row)?,
    })
}

#[async_trait]
impl NewsStore for PgNewsStore {
    async fn count_posts(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<StoredPost>> {
        let sql = format!(
            "SELECT {} ORDER BY n.created_at DESC, n.id DESC LIMIT $1 OFFSET $2",
            POST_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(post_from_row).collect()
    }

    async fn get_post(&self, id: i64) -> Result<Option<StoredPost>> {
        self.fetch_post_where("n.id = $1", PostKey::Id(id)).await
    }

    async fn find_post_by_url(&self, url: &str) -> Result<Option<StoredPost>> {
        self.fetch_post_where("n.url = $1", PostKey::Url(url)).await
    }

    async fn find_or_create_by_url(&self, url: &str, title: &str) -> Result<StoredPost> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO news (title, summary, source, url, is_user_post)
            VALUES ($1, $2, $3, $4, false)
            ON CONFLICT (url) DO NOTHING
            "#,
        )
        .bind(title)
        .bind(MATERIALISED_SUMMARY)
        .bind(MATERIALISED_SOURCE)
        .bind(url)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() > 0 {
            info!("Materialised stored post for {}", url);
        }

        self.find_post_by_url(url)
            .await?
            .ok_or_else(|| AggregatorError::General(format!("stored post for {} vanished", url)))
    }

    async fn create_user_post(
        &self,
        author_id: &str,
        title: &str,
        content: &str,
    ) -> Result<StoredPost> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO news (title, summary, content, source, url, is_user_post, user_id)
            VALUES ($1, $2, $3, $4, $5, true, $6)
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(text::smart_truncate(content, SUMMARY_MAX_CHARS))
        .bind(content)
        .bind(USER_POST_SOURCE)
        .bind(ids::user_post_token())
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        self.get_post(id)
            .await?
            .ok_or(AggregatorError::PostNotFound { id })
    }

    async fn upsert_author(&self, user_id: &str, author: &Author) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, image)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                name = COALESCE(EXCLUDED.name, users.name),
                image = COALESCE(EXCLUDED.image, users.image)
            "#,
        )
        .bind(user_id)
        .bind(&author.name)
        .bind(&author.image)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_comments(&self, news_id: i64) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {} WHERE c.news_id = $1 ORDER BY c.created_at DESC, c.id DESC",
            COMMENT_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(news_id).fetch_all(&self.pool).await?;
        debug!("Loaded {} comments for post {}", rows.len(), news_id);

        rows.iter().map(comment_from_row).collect()
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM news WHERE id = $1)")
            .bind(comment.news_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(AggregatorError::PostNotFound { id: comment.news_id });
        }

        if let Some(parent_id) = &comment.parent_id {
            let parent_news: Option<i64> =
                sqlx::query_scalar("SELECT news_id FROM comments WHERE id = $1")
                    .bind(parent_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if parent_news != Some(comment.news_id) {
                return Err(AggregatorError::ParentNotFound { id: parent_id.clone() });
            }
        }

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO comments (id, content, news_id, user_id, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&id)
        .bind(&comment.content)
        .bind(comment.news_id)
        .bind(&comment.author_id)
        .bind(&comment.parent_id)
        .execute(&self.pool)
        .await?;

        self.fetch_comment(&id).await
    }
}

#[async_trait]
impl ClickLedger for PgNewsStore {
    async fn record_click(&self, record: ClickRecord) -> Result<()> {
        sqlx::query("INSERT INTO click_logs (keyword, url, created_at) VALUES ($1, $2, $3)")
            .bind(&record.keyword)
            .bind(&record.url)
            .bind(record.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn top_keywords(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT keyword, COUNT(*) AS count
            FROM click_logs
            WHERE created_at >= $1
            GROUP BY keyword
            ORDER BY count DESC, keyword ASC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<(String, i64)> {
                Ok((row.try_get("keyword")?, row.try_get("count")?))
            })
            .collect()
    }
}
