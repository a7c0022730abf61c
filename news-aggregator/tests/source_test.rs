mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{init_tracing, listing_html, CannedFetcher};
use news_aggregator::{HadaNewsSource, ManualClock, NewsSource, TtlPageCache};
use std::sync::Arc;

const BASE_URL: &str = "https://news.hada.io";

fn source_with(fetcher: Arc<CannedFetcher>, cache: Arc<TtlPageCache>) -> HadaNewsSource {
    HadaNewsSource::new(fetcher, cache, BASE_URL).unwrap()
}

#[tokio::test]
async fn scrapes_listing_rows() {
    init_tracing();
    let fetcher = Arc::new(CannedFetcher::new(&listing_html(3)));
    let source = source_with(fetcher.clone(), Arc::new(TtlPageCache::new(60)));

    let items = source.fetch_page(1).await;

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].title, "Topic 1");
    assert_eq!(items[0].link, "https://news.hada.io/topic?id=1");
    assert_eq!(items[0].id, items[0].link);
    assert_eq!(items[0].source.as_deref(), Some("writer1"));
    assert_eq!(items[2].time_ago.as_deref(), Some("3시간 전"));
    assert_eq!(fetcher.requests(), vec!["https://news.hada.io/?page=1".to_string()]);
}

#[tokio::test]
async fn repeated_fetch_within_ttl_hits_cache() {
    init_tracing();
    let fetcher = Arc::new(CannedFetcher::new(&listing_html(2)));
    let source = source_with(fetcher.clone(), Arc::new(TtlPageCache::new(60)));

    let first = source.fetch_page(1).await;
    let second = source.fetch_page(1).await;

    assert_eq!(first, second);
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn pages_are_cached_separately() {
    init_tracing();
    let fetcher = Arc::new(CannedFetcher::new(&listing_html(1)));
    let source = source_with(fetcher.clone(), Arc::new(TtlPageCache::new(60)));

    source.fetch_page(1).await;
    source.fetch_page(2).await;
    source.fetch_page(2).await;

    assert_eq!(
        fetcher.requests(),
        vec![
            "https://news.hada.io/?page=1".to_string(),
            "https://news.hada.io/?page=2".to_string(),
        ]
    );
}

#[tokio::test]
async fn expired_entries_are_refetched() {
    init_tracing();
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
    let cache = Arc::new(TtlPageCache::with_clock(60, clock.clone()));
    let fetcher = Arc::new(CannedFetcher::new(&listing_html(1)));
    let source = source_with(fetcher.clone(), cache);

    source.fetch_page(1).await;
    clock.advance(Duration::seconds(59));
    source.fetch_page(1).await;
    assert_eq!(fetcher.calls(), 1);

    clock.advance(Duration::seconds(1));
    source.fetch_page(1).await;
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn upstream_failure_yields_empty_list() {
    init_tracing();
    let fetcher = Arc::new(CannedFetcher::failing());
    let cache = Arc::new(TtlPageCache::new(60));
    let source = source_with(fetcher.clone(), cache.clone());

    assert!(source.fetch_page(1).await.is_empty());
    // Failures are not cached.
    assert!(source.fetch_page(1).await.is_empty());
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(cache.len().await, 0);
}

#[tokio::test]
async fn page_zero_is_treated_as_first_page() {
    let fetcher = Arc::new(CannedFetcher::new(&listing_html(0)));
    let source = source_with(fetcher, Arc::new(TtlPageCache::new(60)));

    assert_eq!(source.listing_url(0), "https://news.hada.io/?page=1");
    assert_eq!(source.listing_url(4), "https://news.hada.io/?page=4");
}

#[tokio::test]
async fn page_without_rows_is_empty() {
    let fetcher = Arc::new(CannedFetcher::new("<html><body><p>maintenance</p></body></html>"));
    let source = source_with(fetcher, Arc::new(TtlPageCache::new(60)));

    assert!(source.fetch_page(1).await.is_empty());
}

#[test]
fn rejects_unusable_base_url() {
    let fetcher = Arc::new(CannedFetcher::new(""));
    let result = HadaNewsSource::new(fetcher, Arc::new(TtlPageCache::new(60)), "not a url");
    assert!(result.is_err());
}
