//! Document store capability
//!
//! The feed treats persistence as an opaque capability: ordered page queries
//! with start-after cursor semantics, and by-id lookups. The MongoDB-backed
//! implementation lives in `crate::db::mongo`; tests substitute mocks.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::types::Result;

/// Sort direction over the ordering key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Capability interface over the document database
///
/// `query_page` must provide stable "start after" semantics: given the
/// ordering-key value of the last record of page N, page N+1 contains only
/// records strictly past it in the requested direction.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch up to `limit` raw documents from `collection`, ordered by
    /// `order_by`, starting strictly after `after` when present.
    async fn query_page(
        &self,
        collection: &str,
        order_by: &str,
        direction: SortDirection,
        limit: usize,
        after: Option<&JsonValue>,
    ) -> Result<Vec<JsonValue>>;

    /// Fetch a single raw document by its id field
    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<JsonValue>>;
}
