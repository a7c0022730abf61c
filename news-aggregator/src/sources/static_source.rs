use crate::traits::NewsSource;
use crate::types::NewsItem;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves a fixed list of items regardless of page, for development and tests.
pub struct StaticNewsSource {
    items: Vec<NewsItem>,
    calls: AtomicUsize,
}

impl StaticNewsSource {
    pub fn new(items: Vec<NewsItem>) -> Self {
        Self {
            items,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// `count` items linking to `https://example.com/{prefix}/{n}`.
    pub fn numbered(prefix: &str, count: usize) -> Self {
        let items = (1..=count)
            .map(|n| {
                let link = format!("https://example.com/{}/{}", prefix, n);
                NewsItem {
                    id: link.clone(),
                    title: format!("{} {}", prefix, n),
                    link,
                    source: Some("example.com".to_string()),
                    time_ago: Some(format!("{}시간 전", n)),
                    summary: None,
                }
            })
            .collect();
        Self::new(items)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsSource for StaticNewsSource {
    fn source_name(&self) -> String {
        "Static".to_string()
    }

    async fn fetch_page(&self, _page: u32) -> Vec<NewsItem> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.items.clone()
    }
}
