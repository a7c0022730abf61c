pub mod memory;
pub mod postgres;

pub use memory::MemoryNewsStore;
pub use postgres::PgNewsStore;

/// Source label and summary given to posts materialised from a scraped link.
pub const MATERIALISED_SOURCE: &str = "GeekNews";
pub const MATERIALISED_SUMMARY: &str = "Community discussion";

/// Source label of user submissions.
pub const USER_POST_SOURCE: &str = "Community";

pub const SUMMARY_MAX_CHARS: usize = 200;
