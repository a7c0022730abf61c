#![allow(dead_code)]

use async_trait::async_trait;
use news_aggregator::{AggregatorError, HtmlFetcher, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Serves canned HTML and remembers every URL it was asked for.
pub struct CannedFetcher {
    html: String,
    fail: bool,
    requests: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl CannedFetcher {
    pub fn new(html: &str) -> Self {
        Self {
            html: html.to_string(),
            fail: false,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HtmlFetcher for CannedFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(url.to_string());
        if self.fail {
            return Err(AggregatorError::UpstreamStatus {
                status: 503,
                url: url.to_string(),
            });
        }
        Ok(self.html.clone())
    }
}

/// A listing page with `count` rows linking to `/topic?id=N`.
pub fn listing_html(count: usize) -> String {
    let rows: String = (1..=count)
        .map(|n| {
            format!(
                r#"<div class="topic_row">
                  <div class="topictitle"><a href="/topic?id={n}">Topic {n}</a></div>
                  <div class="topicdesc"><a href="/user?id=u{n}">writer{n}</a> · {n}시간 전</div>
                </div>"#
            )
        })
        .collect();
    format!("<html><body><div class=\"topics\">{}</div></body></html>", rows)
}
