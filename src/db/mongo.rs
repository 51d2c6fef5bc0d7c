//! MongoDB client and document store implementation
//!
//! Wraps the MongoDB driver behind the `DocumentStore` capability the feed
//! consumes. Documents cross the boundary as relaxed extended JSON; the
//! typed parse happens in `crate::feed::record`, not here.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures_util::StreamExt;
use mongodb::Client;
use serde_json::Value as JsonValue;
use tracing::{error, info};

use crate::feed::record::parse_timestamp;
use crate::feed::store::{DocumentStore, SortDirection};
use crate::types::{LarderError, Result};

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| LarderError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        // Verify connection with timeout
        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| LarderError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Document store view over this client
    pub fn store(&self) -> MongoStore {
        MongoStore {
            client: self.client.clone(),
            db_name: self.db_name.clone(),
        }
    }

    /// Get the raw MongoDB client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// `DocumentStore` implementation over MongoDB
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db_name: String,
}

impl MongoStore {
    /// Convert a cursor value into the BSON the ordering-key filter needs
    ///
    /// Feed cursors are timestamp values; anything parseable as one becomes
    /// a BSON datetime so the comparison matches the stored field type.
    fn cursor_to_bson(after: &JsonValue) -> Result<Bson> {
        if let Some(dt) = parse_timestamp(after) {
            return Ok(Bson::DateTime(bson::DateTime::from_millis(
                dt.timestamp_millis(),
            )));
        }
        Err(LarderError::Database(format!(
            "unusable pagination cursor: {}",
            after
        )))
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn query_page(
        &self,
        collection: &str,
        order_by: &str,
        direction: SortDirection,
        limit: usize,
        after: Option<&JsonValue>,
    ) -> Result<Vec<JsonValue>> {
        let coll = self
            .client
            .database(&self.db_name)
            .collection::<Document>(collection);

        let (sort_order, range_op) = match direction {
            SortDirection::Descending => (-1, "$lt"),
            SortDirection::Ascending => (1, "$gt"),
        };

        // Start strictly after the cursor in the sort direction
        let filter = match after {
            Some(cursor) => doc! { order_by: { range_op: Self::cursor_to_bson(cursor)? } },
            None => Document::new(),
        };

        let cursor = coll
            .find(filter)
            .sort(doc! { order_by: sort_order })
            .limit(limit as i64)
            .await
            .map_err(|e| LarderError::Database(format!("Find failed: {}", e)))?;

        let docs: Vec<JsonValue> = cursor
            .filter_map(|doc| async {
                match doc {
                    Ok(d) => Some(Bson::Document(d).into_relaxed_extjson()),
                    Err(e) => {
                        error!("Error reading document: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(docs)
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<JsonValue>> {
        let coll = self
            .client
            .database(&self.db_name)
            .collection::<Document>(collection);

        // Tolerate either an application-level id field or a string _id
        let filter = doc! { "$or": [ { "id": id }, { "_id": id } ] };

        let found = coll
            .find_one(filter)
            .await
            .map_err(|e| LarderError::Database(format!("Find failed: {}", e)))?;

        Ok(found.map(|d| Bson::Document(d).into_relaxed_extjson()))
    }
}
