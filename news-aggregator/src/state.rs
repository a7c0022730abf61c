use crate::comments::CommentBoard;
use crate::composer::FeedComposer;
use crate::config::ServerArgs;
use crate::sources::HadaNewsSource;
use crate::store::{MemoryNewsStore, PgNewsStore};
use crate::telemetry::ClickTelemetry;
use crate::traits::{ClickLedger, NewsSource, NewsStore};
use crate::types::{ComposerConfig, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the HTTP handlers share.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn NewsStore>,
    pub source: Arc<dyn NewsSource>,
    pub composer: Arc<FeedComposer>,
    pub comments: Arc<CommentBoard>,
    pub telemetry: Arc<ClickTelemetry>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn NewsStore>,
        ledger: Arc<dyn ClickLedger>,
        source: Arc<dyn NewsSource>,
        config: ComposerConfig,
    ) -> Self {
        Self {
            composer: Arc::new(FeedComposer::new(store.clone(), source.clone(), config)),
            comments: Arc::new(CommentBoard::new(store.clone())),
            telemetry: Arc::new(ClickTelemetry::new(ledger)),
            store,
            source,
        }
    }

    /// Wires the real scraper and either Postgres or the in-memory store.
    pub async fn from_args(args: &ServerArgs) -> Result<Self> {
        let source: Arc<dyn NewsSource> =
            Arc::new(HadaNewsSource::from_config(&args.fetch_config())?);

        let state = match args.database_url.as_deref() {
            Some(database_url) => {
                info!(
                    "Connecting to database: {}",
                    args.redacted_database_url().unwrap_or_default()
                );
                let store = Arc::new(PgNewsStore::connect(database_url).await?);
                store.setup_schema().await?;
                Self::new(store.clone(), store, source, args.composer_config())
            }
            None => {
                warn!("DATABASE_URL not set, keeping posts and comments in memory");
                let store = Arc::new(MemoryNewsStore::new());
                Self::new(store.clone(), store, source, args.composer_config())
            }
        };

        Ok(state)
    }
}
