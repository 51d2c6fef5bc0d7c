//! Database layer
//!
//! MongoDB-backed implementation of the `DocumentStore` capability.

pub mod mongo;

pub use mongo::{MongoClient, MongoStore};
