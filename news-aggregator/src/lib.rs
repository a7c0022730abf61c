pub mod auth;
pub mod cache;
pub mod comments;
pub mod composer;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod parser;
pub mod routes;
pub mod sources;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod utils;

pub use cache::{ManualClock, SystemClock, TtlPageCache};
pub use comments::{build_comment_tree, flatten_thread, CommentBoard, NewsRef};
pub use composer::FeedComposer;
pub use config::ServerArgs;
pub use error::AppError;
pub use fetcher::Fetcher;
pub use parser::ListingParser;
pub use routes::router;
pub use sources::{HadaNewsSource, StaticNewsSource};
pub use state::AppState;
pub use store::{MemoryNewsStore, PgNewsStore};
pub use telemetry::ClickTelemetry;
pub use traits::*;
pub use types::*;
