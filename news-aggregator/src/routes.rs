use crate::auth::AuthUser;
use crate::comments::{flatten_thread, NewsRef};
use crate::composer::validate_post;
use crate::error::AppError;
use crate::state::AppState;
use crate::types::{Comment, FeedPage, HotTopic, NewsItem, SourceFilter, StoredPost, ThreadEntry};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, warn};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/news", get(list_news).post(create_post))
        .route("/api/comments", get(list_comments).post(create_comment))
        .route("/api/comments/tree", get(comment_tree))
        .route("/api/track-click", post(track_click))
        .route("/api/hot-topics", get(hot_topics))
        .route("/api/test-crawl", get(test_crawl))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Turns a JSON extraction failure into the usual `{ error }` body.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        debug!("Rejected request body: {}", rejection.body_text());
        AppError::BadRequest("Invalid request body".to_string())
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    page: Option<String>,
    source: Option<String>,
}

impl FeedQuery {
    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
    }

    fn source(&self) -> SourceFilter {
        self.source
            .as_deref()
            .map(|raw| {
                raw.parse().unwrap_or_else(|e| {
                    warn!("{}, using all", e);
                    SourceFilter::All
                })
            })
            .unwrap_or_default()
    }
}

async fn list_news(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedPage>, AppError> {
    let page = state
        .composer
        .compose(query.page(), query.source())
        .await
        .map_err(AppError::or_internal("Failed to fetch news"))?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    title: Option<String>,
    content: Option<String>,
}

async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StoredPost>), AppError> {
    let request = json_body(body)?;
    validate_post(request.title.as_deref(), request.content.as_deref())?;

    state
        .store
        .upsert_author(&user.id, &user.author)
        .await
        .map_err(AppError::or_internal("Failed to create post"))?;

    let post = state
        .composer
        .submit_post(&user.id, request.title.as_deref(), request.content.as_deref())
        .await
        .map_err(AppError::or_internal("Failed to create post"))?;
    Ok((StatusCode::CREATED, Json(post)))
}

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    #[serde(rename = "newsId")]
    news_id: Option<String>,
}

impl CommentsQuery {
    fn news_ref(&self) -> Result<NewsRef, AppError> {
        self.news_id
            .as_deref()
            .and_then(NewsRef::parse)
            .ok_or_else(|| AppError::BadRequest("News ID required".to_string()))
    }
}

async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let news = query.news_ref()?;
    let comments = state
        .comments
        .list(&news)
        .await
        .map_err(AppError::or_internal("Failed to fetch comments"))?;
    Ok(Json(comments))
}

async fn comment_tree(
    State(state): State<AppState>,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<Vec<ThreadEntry>>, AppError> {
    let news = query.news_ref()?;
    let thread = state
        .comments
        .thread(&news)
        .await
        .map_err(AppError::or_internal("Failed to fetch comments"))?;
    Ok(Json(flatten_thread(&thread)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default)]
    news_id: Value,
    content: Option<String>,
    parent_id: Option<String>,
    title: Option<String>,
}

async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<Json<Comment>, AppError> {
    let request = json_body(body)?;

    let news = NewsRef::from_json(&request.news_id);
    let content = request.content.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let (Some(news), Some(content)) = (news, content) else {
        return Err(AppError::BadRequest("Missing fields".to_string()));
    };

    state
        .store
        .upsert_author(&user.id, &user.author)
        .await
        .map_err(AppError::or_internal("Failed to post comment"))?;

    let comment = state
        .comments
        .post(
            &user.id,
            &news,
            content,
            request.parent_id.as_deref(),
            request.title.as_deref(),
        )
        .await
        .map_err(AppError::or_internal("Failed to post comment"))?;
    Ok(Json(comment))
}

#[derive(Debug, Deserialize)]
pub struct TrackClickRequest {
    keyword: Option<String>,
    url: Option<String>,
}

async fn track_click(
    State(state): State<AppState>,
    body: Result<Json<TrackClickRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let request = json_body(body)?;
    state
        .telemetry
        .record(request.keyword.as_deref(), request.url.as_deref())
        .await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Serialize)]
pub struct HotTopicsResponse {
    topics: Vec<HotTopic>,
}

async fn hot_topics(State(state): State<AppState>) -> Result<Json<HotTopicsResponse>, AppError> {
    let topics = state.telemetry.hot_topics().await?;
    Ok(Json(HotTopicsResponse { topics }))
}

#[derive(Debug, Serialize)]
pub struct CrawlResponse {
    count: usize,
    news: Vec<NewsItem>,
}

async fn test_crawl(State(state): State<AppState>) -> Json<CrawlResponse> {
    let news = state.source.fetch_page(1).await;
    Json(CrawlResponse {
        count: news.len(),
        news,
    })
}
