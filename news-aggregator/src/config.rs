use crate::types::{ComposerConfig, FetchConfig, BROWSER_USER_AGENT, DEFAULT_SOURCE_BASE_URL};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "news-aggregator",
    about = "Tech news feed: scraped headlines, user posts and comment threads"
)]
pub struct ServerArgs {
    /// Address the HTTP server listens on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind: String,

    /// Postgres connection string; posts live in memory when unset
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Origin of the scraped listing
    #[arg(long, env = "NEWS_SOURCE_BASE_URL", default_value = DEFAULT_SOURCE_BASE_URL)]
    pub source_base_url: String,

    /// How long a fetched listing page is reused
    #[arg(long, env = "NEWS_CACHE_TTL_SECS", default_value_t = 60)]
    pub cache_ttl_secs: u64,

    #[arg(long, env = "NEWS_USER_AGENT", default_value = BROWSER_USER_AGENT)]
    pub user_agent: String,

    /// Outbound request timeout; transport default when unset
    #[arg(long, env = "NEWS_FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: Option<u64>,

    /// Page count reported in crawl-only mode
    #[arg(long, env = "NEWS_CRAWL_TOTAL_PAGES", default_value_t = 10)]
    pub crawl_total_pages: u32,
}

impl ServerArgs {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            base_url: self.source_base_url.clone(),
            user_agent: self.user_agent.clone(),
            timeout_seconds: self.fetch_timeout_secs,
            cache_ttl_seconds: self.cache_ttl_secs,
            ..FetchConfig::default()
        }
    }

    pub fn composer_config(&self) -> ComposerConfig {
        ComposerConfig {
            crawl_total_pages: self.crawl_total_pages,
            ..ComposerConfig::default()
        }
    }

    /// Connection string with the password masked, for logs.
    pub fn redacted_database_url(&self) -> Option<String> {
        let raw = self.database_url.as_deref()?;
        match url::Url::parse(raw) {
            Ok(mut parsed) if parsed.password().is_some() => {
                let _ = parsed.set_password(Some("***"));
                Some(parsed.to_string())
            }
            _ => Some(raw.to_string()),
        }
    }
}
