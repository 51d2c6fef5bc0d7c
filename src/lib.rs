//! Larder - recipe feed and portioning core
//!
//! Larder is a recipe-sharing platform backed by a document database. This
//! crate is the client-side core that sits between the store and the
//! presentation layer:
//!
//! - **Feed**: incremental, reverse-chronological page loading of recipe
//!   records with a single-flight fetch guard (infinite scroll)
//! - **Scale**: per-view portion adjustment and proportional ingredient
//!   quantity display
//! - **Store**: the document-database capability the feed consumes, with a
//!   MongoDB-backed implementation
//!
//! Rendering, routing, and auth flows live elsewhere; they consume the state
//! this crate exposes.

pub mod config;
pub mod db;
pub mod feed;
pub mod scale;
pub mod session;
pub mod types;

pub use config::Args;
pub use feed::{DocumentStore, FeedSession, RecipeRecord};
pub use scale::PortionScaler;
pub use session::Session;
pub use types::{LarderError, Result};
