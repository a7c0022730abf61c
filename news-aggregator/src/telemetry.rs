use crate::cache::SystemClock;
use crate::traits::{ClickLedger, Clock};
use crate::types::{AggregatorError, ClickRecord, HotTopic, Result};
use chrono::Duration;
use std::sync::Arc;
use tracing::debug;

pub const HOT_TOPIC_LIMIT: usize = 5;
pub const HOT_TOPIC_WINDOW_HOURS: i64 = 24;

/// Shown while nobody has clicked anything in the window.
pub const FALLBACK_TOPICS: [&str; 5] = ["AI", "Next.js", "React", "TypeScript", "Web"];

/// Records outbound clicks and ranks the keywords behind them.
pub struct ClickTelemetry {
    ledger: Arc<dyn ClickLedger>,
    clock: Arc<dyn Clock>,
}

impl ClickTelemetry {
    pub fn new(ledger: Arc<dyn ClickLedger>) -> Self {
        Self::with_clock(ledger, Arc::new(SystemClock))
    }

    pub fn with_clock(ledger: Arc<dyn ClickLedger>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }

    pub async fn record(&self, keyword: Option<&str>, url: Option<&str>) -> Result<()> {
        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());
        let url = url.map(str::trim).filter(|u| !u.is_empty());

        let (Some(keyword), Some(url)) = (keyword, url) else {
            return Err(AggregatorError::Validation("Missing keyword or url".to_string()));
        };

        debug!("Click on {} ({})", url, keyword);
        self.ledger
            .record_click(ClickRecord {
                keyword: keyword.to_string(),
                url: url.to_string(),
                created_at: self.clock.now(),
            })
            .await
    }

    /// Top keywords of the trailing window, or the fallback list when the
    /// window is empty.
    pub async fn hot_topics(&self) -> Result<Vec<HotTopic>> {
        let since = self.clock.now() - Duration::hours(HOT_TOPIC_WINDOW_HOURS);
        let ranked = self.ledger.top_keywords(since, HOT_TOPIC_LIMIT).await?;

        if ranked.is_empty() {
            return Ok(FALLBACK_TOPICS
                .iter()
                .zip(1..)
                .map(|(keyword, rank)| HotTopic {
                    rank,
                    keyword: keyword.to_string(),
                    count: 0,
                })
                .collect());
        }

        Ok(ranked
            .into_iter()
            .zip(1..)
            .map(|((keyword, count), rank)| HotTopic { rank, keyword, count })
            .collect())
    }
}
