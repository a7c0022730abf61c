mod common;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::init_tracing;
use news_aggregator::{
    router, AggregatorError, AppState, Author, Comment, ComposerConfig, MemoryNewsStore,
    NewComment, NewsStore, Result, StaticNewsSource, StoredPost,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    app_with_store().0
}

fn app_with_store() -> (Router, Arc<MemoryNewsStore>) {
    init_tracing();
    let store = Arc::new(MemoryNewsStore::new());
    let source = Arc::new(StaticNewsSource::numbered("hada", 5));
    let state = AppState::new(store.clone(), store.clone(), source, ComposerConfig::default());
    (router(state), store)
}

/// Store whose every query fails, as when the database is unreachable.
struct UnreachableStore;

fn unreachable() -> AggregatorError {
    AggregatorError::General("connection refused".to_string())
}

#[async_trait]
impl NewsStore for UnreachableStore {
    async fn count_posts(&self) -> Result<i64> {
        Err(unreachable())
    }

    async fn list_posts(&self, _offset: i64, _limit: i64) -> Result<Vec<StoredPost>> {
        Err(unreachable())
    }

    async fn get_post(&self, _id: i64) -> Result<Option<StoredPost>> {
        Err(unreachable())
    }

    async fn find_post_by_url(&self, _url: &str) -> Result<Option<StoredPost>> {
        Err(unreachable())
    }

    async fn find_or_create_by_url(&self, _url: &str, _title: &str) -> Result<StoredPost> {
        Err(unreachable())
    }

    async fn create_user_post(
        &self,
        _author_id: &str,
        _title: &str,
        _content: &str,
    ) -> Result<StoredPost> {
        Err(unreachable())
    }

    async fn upsert_author(&self, _user_id: &str, _author: &Author) -> Result<()> {
        Err(unreachable())
    }

    async fn list_comments(&self, _news_id: i64) -> Result<Vec<Comment>> {
        Err(unreachable())
    }

    async fn create_comment(&self, _comment: NewComment) -> Result<Comment> {
        Err(unreachable())
    }
}

fn app_without_database() -> Router {
    init_tracing();
    let ledger = Arc::new(MemoryNewsStore::new());
    let source = Arc::new(StaticNewsSource::numbered("hada", 5));
    router(AppState::new(
        Arc::new(UnreachableStore),
        ledger,
        source,
        ComposerConfig::default(),
    ))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn short_title_post() -> Value {
    json!({ "title": "A", "content": "long enough body" })
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user).header("x-user-name", "Park");
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn news_page_with_lenient_query() {
    let app = app();

    let (status, body) = send(&app, get("/api/news?page=abc&source=bogus")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["totalPages"], 1);
    assert_eq!(body["totalCount"], 0);
    assert_eq!(body["source"], "all");
    assert_eq!(body["news"].as_array().unwrap().len(), 5);
    assert_eq!(body["news"][0]["kind"], "scraped");
}

#[tokio::test]
async fn crawl_page_has_no_total_count() {
    let app = app();

    let (status, body) = send(&app, get("/api/news?page=3&source=crawl")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentPage"], 3);
    assert_eq!(body["totalPages"], 10);
    assert!(body.get("totalCount").is_none());
}

#[tokio::test]
async fn posting_news_requires_a_user() {
    let app = app();
    let payload = json!({ "title": "Hello GeekNews", "content": "My first post on this board." });

    let (status, body) = send(&app, post_json("/api/news", None, payload.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, body) = send(&app, post_json("/api/news", Some("user-7"), payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["isUserPost"], true);
    assert_eq!(body["author"]["name"], "Park");

    let (_, page) = send(&app, get("/api/news?source=db")).await;
    assert_eq!(page["news"][0]["url"], format!("/news/{}", body["id"]));
}

#[tokio::test]
async fn invalid_news_is_a_bad_request() {
    let app = app();

    let (status, body) = send(
        &app,
        post_json("/api/news", Some("user-7"), short_title_post()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title must be at least 2 characters");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/news")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-user-id", "user-7")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comment_round_trip_on_external_link() {
    let app = app();
    let link = "https://example.com/hada/1";

    let (status, body) = send(&app, get("/api/comments")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "News ID required");

    let (status, body) = send(
        &app,
        post_json("/api/comments", Some("user-1"), json!({ "newsId": link, "content": "nice" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title required for new news item");

    let (status, root) = send(
        &app,
        post_json(
            "/api/comments",
            Some("user-1"),
            json!({ "newsId": link, "content": "nice", "title": "hada 1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(root["author"]["name"], "Park");

    let (status, _) = send(
        &app,
        post_json(
            "/api/comments",
            Some("user-2"),
            json!({ "newsId": root["newsId"], "content": "agreed", "parentId": root["id"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/comments?newsId={}", root["newsId"]);
    let (status, flat) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flat.as_array().unwrap().len(), 2);

    let uri = format!("/api/comments/tree?newsId={}", root["newsId"]);
    let (_, tree) = send(&app, get(&uri)).await;
    assert_eq!(tree.as_array().unwrap().len(), 2);
    assert_eq!(tree[0]["id"], root["id"]);
    assert_eq!(tree[0]["depth"], 0);
    assert_eq!(tree[0]["replyCount"], 1);
    assert_eq!(tree[1]["content"], "agreed");
    assert_eq!(tree[1]["depth"], 1);
    assert_eq!(tree[1]["parent"], 0);

    let (_, unknown) = send(&app, get("/api/comments?newsId=https%3A%2F%2Fnowhere.example")).await;
    assert_eq!(unknown, json!([]));
}

#[tokio::test]
async fn missing_comment_fields() {
    let app = app();

    let (status, body) = send(
        &app,
        post_json("/api/comments", Some("user-1"), json!({ "content": "orphan" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing fields");

    let anonymous = post_json("/api/comments", None, json!({ "newsId": 1, "content": "x" }));
    let (status, _) = send(&app, anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn clicks_feed_hot_topics() {
    let app = app();

    let (_, body) = send(&app, get("/api/hot-topics")).await;
    assert_eq!(body["topics"].as_array().unwrap().len(), 5);
    assert_eq!(body["topics"][0]["keyword"], "AI");

    let no_url = post_json("/api/track-click", None, json!({ "keyword": "Rust" }));
    let (status, body) = send(&app, no_url).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing keyword or url");

    let (status, body) = send(
        &app,
        post_json(
            "/api/track-click",
            None,
            json!({ "keyword": "Rust", "url": "https://rust-lang.org" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (_, body) = send(&app, get("/api/hot-topics")).await;
    assert_eq!(body["topics"], json!([{ "rank": 1, "keyword": "Rust", "count": 1 }]));
}

#[tokio::test]
async fn test_crawl_reports_first_page() {
    let app = app();

    let (status, body) = send(&app, get("/api/test-crawl")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 5);
    assert_eq!(body["news"][0]["link"], "https://example.com/hada/1");
}

#[tokio::test]
async fn store_failures_become_generic_500s() {
    let app = app_without_database();

    let (status, body) = send(&app, get("/api/news")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to fetch news" }));

    let (status, body) = send(&app, get("/api/comments?newsId=1")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to fetch comments" }));

    let (status, body) = send(&app, get("/api/comments/tree?newsId=1")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to fetch comments" }));

    // Crawl mode never touches the store.
    let (status, _) = send(&app, get("/api/news?source=crawl")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rejected_post_does_not_record_the_author() {
    let (app, store) = app_with_store();

    let (status, _) = send(
        &app,
        post_json("/api/news", Some("user-9"), short_title_post()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(store.author("user-9").await.is_none());

    let (status, _) = send(
        &app,
        post_json(
            "/api/news",
            Some("user-9"),
            json!({ "title": "Accepted", "content": "long enough body" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let author = store.author("user-9").await.unwrap();
    assert_eq!(author.name.as_deref(), Some("Park"));
}
