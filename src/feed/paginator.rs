//! Feed pagination state machine
//!
//! One `FeedSession` per visible feed. The session owns the accumulated
//! record list and the pagination cursor, and guards the store with a
//! single-flight rule: at most one page fetch in flight at a time.
//!
//! ## Triggering
//!
//! The presentation layer calls `load_initial` once when the feed mounts and
//! `sentinel_visible` whenever the scroll sentinel enters the viewport.
//! Sentinel visibility is level-triggered, so `sentinel_visible` may fire
//! repeatedly while a fetch is still in flight; the `is_loading`/`has_more`
//! guards make the extra calls no-ops rather than duplicate fetches.

use std::sync::{Arc, Mutex};

use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::feed::record::{parse_timestamp, RecipeRecord};
use crate::feed::store::{DocumentStore, SortDirection};
use crate::feed::{DEFAULT_PAGE_SIZE, FEED_ORDER_KEY};
use crate::session::Session;
use crate::types::{LarderError, Result};

/// Feed tuning knobs
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Records fetched per page
    pub page_size: usize,
    /// Collection holding recipe documents
    pub recipes_collection: String,
    /// Collection holding user profiles (author lookups)
    pub users_collection: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            recipes_collection: "recipes".to_string(),
            users_collection: "users".to_string(),
        }
    }
}

/// Mutable per-session pagination state
struct FeedState {
    /// Append-only accumulated records, newest first
    records: Vec<RecipeRecord>,
    /// Ordering-key value (epoch millis) of the last record of the most
    /// recently fetched page
    last_cursor: Option<i64>,
    /// False once a fetched page came back shorter than the page size
    has_more: bool,
    /// Single-flight guard: true only while a fetch is in flight
    is_loading: bool,
    /// Whether the initial load has succeeded
    loaded: bool,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            last_cursor: None,
            has_more: true,
            is_loading: false,
            loaded: false,
        }
    }
}

/// A feed browsing session over the recipe collection
///
/// All methods take `&self`; state lives behind a mutex that is never held
/// across an await, so a session can be shared as `Arc<FeedSession>` between
/// the scroll handler and the rest of the view.
pub struct FeedSession {
    store: Arc<dyn DocumentStore>,
    session: Session,
    config: FeedConfig,
    state: Mutex<FeedState>,
}

impl FeedSession {
    /// Create a session for the given identity over the given store
    pub fn new(store: Arc<dyn DocumentStore>, session: Session, config: FeedConfig) -> Self {
        Self {
            store,
            session,
            config,
            state: Mutex::new(FeedState::default()),
        }
    }

    /// Identity this session was created for
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Load the first feed page, replacing any accumulated records
    ///
    /// A second call after a successful load is ignored; use `reset` to
    /// restart the session. On failure the accumulated list and `has_more`
    /// are left untouched and the error is returned for user-visible
    /// notification; there is no automatic retry.
    pub async fn load_initial(&self) -> Result<()> {
        {
            let mut state = self.state.lock().expect("feed state poisoned");
            if state.loaded {
                debug!("initial load already complete, ignoring");
                return Ok(());
            }
            if state.is_loading {
                return Ok(());
            }
            state.is_loading = true;
        }

        let result = self.fetch_page(None).await;

        let mut state = self.state.lock().expect("feed state poisoned");
        state.is_loading = false;

        let raw_page = result?;
        let page_len = raw_page.len();
        let records = decode_page(&raw_page);

        state.has_more = page_len == self.config.page_size;
        state.last_cursor = page_cursor(&raw_page, &records);
        if state.last_cursor.is_none() && page_len > 0 {
            // No usable ordering key on this page; refetching would loop
            warn!("page without usable {} values, ending feed", FEED_ORDER_KEY);
            state.has_more = false;
        }
        state.records = records;
        state.loaded = true;

        info!(
            records = state.records.len(),
            has_more = state.has_more,
            "initial feed page loaded"
        );
        Ok(())
    }

    /// Load the next feed page, appending to the accumulated records
    ///
    /// A no-op (`Ok(false)`) when the feed is exhausted, a fetch is already
    /// in flight, or the initial load has not happened yet. Returns
    /// `Ok(true)` when a page was fetched and applied.
    pub async fn load_more(&self) -> Result<bool> {
        let cursor = {
            let mut state = self.state.lock().expect("feed state poisoned");
            if !state.loaded || !state.has_more || state.is_loading {
                return Ok(false);
            }
            // Check-and-set under the lock: the single-flight guard
            state.is_loading = true;
            state.last_cursor
        };

        let result = self.fetch_page(cursor.map(JsonValue::from)).await;

        let mut state = self.state.lock().expect("feed state poisoned");
        state.is_loading = false;

        let raw_page = result?;
        let page_len = raw_page.len();
        let records = decode_page(&raw_page);

        state.has_more = page_len == self.config.page_size;
        if let Some(cursor) = page_cursor(&raw_page, &records) {
            state.last_cursor = Some(cursor);
        } else if page_len > 0 {
            warn!("page without usable {} values, ending feed", FEED_ORDER_KEY);
            state.has_more = false;
        }
        state.records.extend(records);

        debug!(
            total = state.records.len(),
            has_more = state.has_more,
            "feed page appended"
        );
        Ok(true)
    }

    /// Scroll-sentinel hook
    ///
    /// Level-triggered: safe to call on every visibility notification while
    /// the sentinel stays on screen. Correctness comes from the guards in
    /// `load_more`, not from how often this fires.
    pub async fn sentinel_visible(&self) -> Result<bool> {
        self.load_more().await
    }

    /// Return to the initial state for a fresh feed session
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("feed state poisoned");
        *state = FeedState::default();
        debug!("feed session reset");
    }

    /// Snapshot of the accumulated records, newest first
    pub fn records(&self) -> Vec<RecipeRecord> {
        self.state.lock().expect("feed state poisoned").records.clone()
    }

    /// Number of accumulated records
    pub fn len(&self) -> usize {
        self.state.lock().expect("feed state poisoned").records.len()
    }

    /// Whether no records have been accumulated
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether more pages may exist
    pub fn has_more(&self) -> bool {
        self.state.lock().expect("feed state poisoned").has_more
    }

    /// Whether a fetch is currently in flight
    pub fn is_loading(&self) -> bool {
        self.state.lock().expect("feed state poisoned").is_loading
    }

    /// Case-insensitive substring filter on titles
    ///
    /// Operates on the accumulated list only: never fetches, never removes
    /// records from the underlying list, leaves pagination state untouched.
    pub fn filtered(&self, pattern: &str) -> Vec<RecipeRecord> {
        let state = self.state.lock().expect("feed state poisoned");
        if pattern.is_empty() {
            return state.records.clone();
        }
        let needle = pattern.to_lowercase();
        state
            .records
            .iter()
            .filter(|r| r.title.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Resolve a recipe's author profile for display
    ///
    /// Lookup failures are tolerated: the recipe stays in the feed and the
    /// caller renders without author details.
    pub async fn resolve_author(&self, record: &RecipeRecord) -> Option<JsonValue> {
        let author = record.author.as_deref()?;
        match self
            .store
            .get_by_id(&self.config.users_collection, author)
            .await
        {
            Ok(profile) => profile,
            Err(e) => {
                warn!(recipe = %record.id, author, error = %e, "author lookup failed");
                None
            }
        }
    }

    /// Fetch one raw page from the store
    async fn fetch_page(&self, after: Option<JsonValue>) -> Result<Vec<JsonValue>> {
        self.store
            .query_page(
                &self.config.recipes_collection,
                FEED_ORDER_KEY,
                SortDirection::Descending,
                self.config.page_size,
                after.as_ref(),
            )
            .await
            .map_err(|e| match e {
                LarderError::Fetch(_) => e,
                other => LarderError::Fetch(other.to_string()),
            })
    }
}

/// Decode a raw page, skipping undecodable documents with a warning
fn decode_page(raw_page: &[JsonValue]) -> Vec<RecipeRecord> {
    raw_page
        .iter()
        .filter_map(|raw| {
            let record = RecipeRecord::from_value(raw);
            if record.is_none() {
                warn!("skipping undecodable recipe document");
            }
            record
        })
        .collect()
}

/// Ordering-key cursor for the page: the last raw document's `createdAt`,
/// falling back to the last decoded record when the raw value is unusable
fn page_cursor(raw_page: &[JsonValue], records: &[RecipeRecord]) -> Option<i64> {
    raw_page
        .last()
        .and_then(|raw| raw.get(FEED_ORDER_KEY))
        .and_then(parse_timestamp)
        .map(|dt| dt.timestamp_millis())
        .or_else(|| records.last().map(|r| r.created_at.timestamp_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Scripted store: serves queued pages in order, errors when the queue
    /// runs dry, and can block a given fetch for single-flight tests.
    struct MockStore {
        pages: Mutex<VecDeque<Vec<JsonValue>>>,
        fetch_count: AtomicUsize,
        /// Fetch number (1-based) from which fetches wait on `release`
        gate_from: usize,
        release: Notify,
        fail_author_lookup: bool,
    }

    impl MockStore {
        fn with_pages(pages: Vec<Vec<JsonValue>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                fetch_count: AtomicUsize::new(0),
                gate_from: usize::MAX,
                release: Notify::new(),
                fail_author_lookup: false,
            }
        }

        fn gated_from(mut self, fetch_number: usize) -> Self {
            self.gate_from = fetch_number;
            self
        }

        fn fetches(&self) -> usize {
            self.fetch_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DocumentStore for MockStore {
        async fn query_page(
            &self,
            _collection: &str,
            _order_by: &str,
            _direction: SortDirection,
            _limit: usize,
            _after: Option<&JsonValue>,
        ) -> Result<Vec<JsonValue>> {
            let n = self.fetch_count.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.gate_from {
                self.release.notified().await;
            }
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LarderError::Fetch("connection reset".to_string()))
        }

        async fn get_by_id(&self, _collection: &str, id: &str) -> Result<Option<JsonValue>> {
            if self.fail_author_lookup {
                return Err(LarderError::Database("profile store down".to_string()));
            }
            Ok(Some(json!({ "id": id, "displayName": "Test User" })))
        }
    }

    fn raw_recipe(i: usize) -> JsonValue {
        // Descending createdAt as i grows, matching feed order
        json!({
            "id": format!("r-{}", i),
            "title": format!("Recipe {}", i),
            "basePortions": 2,
            "author": "maija",
            "createdAt": 1_700_000_000_000i64 - (i as i64) * 1000,
            "ingredients": [
                { "name": "flour", "amount": 3.0, "unit": "dl" },
            ],
        })
    }

    fn page(from: usize, count: usize) -> Vec<JsonValue> {
        (from..from + count).map(raw_recipe).collect()
    }

    fn feed(store: MockStore) -> Arc<FeedSession> {
        Arc::new(FeedSession::new(
            Arc::new(store),
            Session::anonymous(),
            FeedConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_initial_load_full_page() {
        let feed = feed(MockStore::with_pages(vec![page(0, 24)]));

        feed.load_initial().await.unwrap();

        assert_eq!(feed.len(), 24);
        assert!(feed.has_more());
        assert!(!feed.is_loading());
        assert_eq!(feed.records()[0].id, "r-0");
    }

    #[tokio::test]
    async fn test_short_page_ends_feed() {
        // 24 then 10 -> has_more false, 34 total
        let feed = feed(MockStore::with_pages(vec![page(0, 24), page(24, 10)]));

        feed.load_initial().await.unwrap();
        assert!(feed.has_more());

        let fetched = feed.load_more().await.unwrap();
        assert!(fetched);
        assert_eq!(feed.len(), 34);
        assert!(!feed.has_more());
    }

    #[tokio::test]
    async fn test_sentinel_repeats_do_not_refetch_when_exhausted() {
        let store = Arc::new(MockStore::with_pages(vec![page(0, 5)]));
        let feed = FeedSession::new(store.clone(), Session::anonymous(), FeedConfig::default());

        feed.load_initial().await.unwrap();
        for _ in 0..10 {
            assert!(!feed.sentinel_visible().await.unwrap());
        }
        assert_eq!(store.fetches(), 1);
    }

    #[tokio::test]
    async fn test_load_more_before_initial_is_noop() {
        let store = Arc::new(MockStore::with_pages(vec![page(0, 24)]));
        let feed = FeedSession::new(store.clone(), Session::anonymous(), FeedConfig::default());

        assert!(!feed.load_more().await.unwrap());
        assert_eq!(store.fetches(), 0);
    }

    #[tokio::test]
    async fn test_load_initial_second_call_ignored() {
        let store = Arc::new(MockStore::with_pages(vec![page(0, 24), page(24, 24)]));
        let feed = FeedSession::new(store.clone(), Session::anonymous(), FeedConfig::default());

        feed.load_initial().await.unwrap();
        feed.load_initial().await.unwrap();

        assert_eq!(store.fetches(), 1);
        assert_eq!(feed.len(), 24);
    }

    #[tokio::test]
    async fn test_single_flight_concurrent_load_more() {
        // Fetch 2 (the first load_more) blocks until released
        let store = Arc::new(MockStore::with_pages(vec![page(0, 24), page(24, 24)]).gated_from(2));
        let feed = Arc::new(FeedSession::new(
            store.clone(),
            Session::anonymous(),
            FeedConfig::default(),
        ));

        feed.load_initial().await.unwrap();
        assert_eq!(store.fetches(), 1);

        let in_flight = {
            let feed = feed.clone();
            tokio::spawn(async move { feed.load_more().await })
        };

        // Let the spawned fetch reach the store and park on the gate
        while !feed.is_loading() {
            tokio::task::yield_now().await;
        }

        // Repeated triggers while loading are rejected without fetching
        assert!(!feed.load_more().await.unwrap());
        assert!(!feed.sentinel_visible().await.unwrap());
        assert_eq!(store.fetches(), 2);

        store.release.notify_one();
        assert!(in_flight.await.unwrap().unwrap());

        assert_eq!(feed.len(), 48);
        assert!(!feed.is_loading());
    }

    #[tokio::test]
    async fn test_failed_load_leaves_state_unchanged() {
        // Queue runs dry on the second fetch
        let store = Arc::new(MockStore::with_pages(vec![page(0, 24)]));
        let feed = FeedSession::new(store.clone(), Session::anonymous(), FeedConfig::default());

        feed.load_initial().await.unwrap();

        let err = feed.load_more().await.unwrap_err();
        assert!(matches!(err, LarderError::Fetch(_)));

        // Accumulated list and has_more untouched, guard released for retry
        assert_eq!(feed.len(), 24);
        assert!(feed.has_more());
        assert!(!feed.is_loading());

        // The session stays usable: the next trigger fetches again
        let _ = feed.load_more().await;
        assert_eq!(store.fetches(), 3);
    }

    #[tokio::test]
    async fn test_failed_initial_load_reports_and_recovers() {
        let store = Arc::new(MockStore::with_pages(vec![]));
        let feed = FeedSession::new(store.clone(), Session::anonymous(), FeedConfig::default());

        assert!(feed.load_initial().await.is_err());
        assert!(feed.is_empty());
        assert!(!feed.is_loading());
    }

    #[tokio::test]
    async fn test_undecodable_documents_skipped_but_counted() {
        // A full page where two documents fail the parse boundary: the feed
        // keeps 22 records but the raw page length still drives has_more
        let mut raw = page(0, 22);
        raw.push(json!({ "garbage": true }));
        raw.push(json!({ "id": "x", "createdAt": "not-a-date" }));
        let feed = feed(MockStore::with_pages(vec![raw]));

        feed.load_initial().await.unwrap();
        assert_eq!(feed.len(), 22);
        assert!(feed.has_more());
    }

    #[tokio::test]
    async fn test_ordering_non_increasing_across_pages() {
        let feed = feed(MockStore::with_pages(vec![page(0, 24), page(24, 24)]));

        feed.load_initial().await.unwrap();
        feed.load_more().await.unwrap();

        let records = feed.records();
        assert!(records
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_filter_is_case_insensitive_and_non_destructive() {
        let raw = vec![
            json!({ "id": "a", "title": "Pancakes", "createdAt": 3_000i64 }),
            json!({ "id": "b", "title": "Karelian Pie", "createdAt": 2_000i64 }),
            json!({ "id": "c", "title": "Banana Pancake Stack", "createdAt": 1_000i64 }),
        ];
        let feed = feed(MockStore::with_pages(vec![raw]));
        feed.load_initial().await.unwrap();

        let hits = feed.filtered("PANCAKE");
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|r| r.title.to_lowercase().contains("pancake")));

        // Underlying list and pagination state untouched
        assert_eq!(feed.len(), 3);
        assert_eq!(feed.filtered("").len(), 3);
    }

    #[tokio::test]
    async fn test_reset_returns_to_initial_state() {
        let store = Arc::new(MockStore::with_pages(vec![page(0, 24), page(0, 10)]));
        let feed = FeedSession::new(store.clone(), Session::anonymous(), FeedConfig::default());

        feed.load_initial().await.unwrap();
        assert_eq!(feed.len(), 24);

        feed.reset();
        assert!(feed.is_empty());
        assert!(!feed.is_loading());

        // A fresh initial load runs again after reset
        feed.load_initial().await.unwrap();
        assert_eq!(store.fetches(), 2);
        assert_eq!(feed.len(), 10);
        assert!(!feed.has_more());
    }

    #[tokio::test]
    async fn test_resolve_author_tolerates_lookup_failure() {
        let mut store = MockStore::with_pages(vec![page(0, 1)]);
        store.fail_author_lookup = true;
        let feed = feed(store);

        feed.load_initial().await.unwrap();
        let record = feed.records().remove(0);

        // Lookup fails, recipe stays in the feed
        assert!(feed.resolve_author(&record).await.is_none());
        assert_eq!(feed.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_author_returns_profile() {
        let feed = feed(MockStore::with_pages(vec![page(0, 1)]));
        feed.load_initial().await.unwrap();
        let record = feed.records().remove(0);

        let profile = feed.resolve_author(&record).await.unwrap();
        assert_eq!(profile.get("id").and_then(|v| v.as_str()), Some("maija"));
    }
}
