//! Recipe feed
//!
//! Incremental loading of the reverse-chronological recipe feed:
//!
//! - `store`: the document-database capability the feed consumes
//! - `record`: validated-parse boundary from raw documents to `RecipeRecord`
//! - `paginator`: the per-session state machine (single-flight page loads,
//!   end-of-data tracking, client-side title filtering)

pub mod paginator;
pub mod record;
pub mod store;

pub use paginator::{FeedConfig, FeedSession};
pub use record::{Ingredient, RecipeRecord};
pub use store::{DocumentStore, SortDirection};

/// Default number of records fetched per page
pub const DEFAULT_PAGE_SIZE: usize = 24;

/// Ordering key used for feed pagination
pub const FEED_ORDER_KEY: &str = "createdAt";
