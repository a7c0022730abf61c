use crate::traits::{Clock, PageCache};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::debug;

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Process-local page cache with a fixed time to live.
pub struct TtlPageCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, (DateTime<Utc>, String)>>,
}

impl TtlPageCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self::with_clock(ttl_seconds, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl_seconds: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: Duration::seconds(ttl_seconds as i64),
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl PageCache for TtlPageCache {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        let (stored_at, body) = entries.get(key)?;

        if self.clock.now() - *stored_at < self.ttl {
            debug!("Cache hit for {}", key);
            Some(body.clone())
        } else {
            debug!("Cache entry expired for {}", key);
            None
        }
    }

    async fn put(&self, key: &str, body: String) {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        // Drop anything stale while we hold the lock.
        entries.retain(|_, (stored_at, _)| now - *stored_at < self.ttl);
        entries.insert(key.to_string(), (now, body));
    }
}
