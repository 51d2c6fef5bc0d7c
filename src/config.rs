//! Configuration for Larder
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;

/// Larder - recipe feed and portioning core
#[derive(Parser, Debug, Clone)]
#[command(name = "larder")]
#[command(about = "Feed pagination and portion scaling for the Larder recipe platform")]
pub struct Args {
    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "larder")]
    pub mongodb_db: String,

    /// Collection holding recipe documents
    #[arg(long, env = "RECIPES_COLLECTION", default_value = "recipes")]
    pub recipes_collection: String,

    /// Collection holding user profile documents (author lookups)
    #[arg(long, env = "USERS_COLLECTION", default_value = "users")]
    pub users_collection: String,

    /// Feed page size (records fetched per scroll trigger)
    #[arg(long, env = "PAGE_SIZE", default_value = "24")]
    pub page_size: usize,

    /// Maximum number of pages the demo binary walks before stopping
    #[arg(long, env = "FEED_PAGES", default_value = "5")]
    pub feed_pages: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 {
            return Err("PAGE_SIZE must be greater than zero".to_string());
        }

        if self.recipes_collection.is_empty() {
            return Err("RECIPES_COLLECTION must not be empty".to_string());
        }

        Ok(())
    }
}
