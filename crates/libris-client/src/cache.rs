//! # Query Cache
//!
//! Keyed cache of fetched collections with a stale time and one retry.
//!
//! ## Entry States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   (absent) ── fetch ──► Loading ── ok ──► Success (fresh)              │
//! │                            │                  │                         │
//! │                            │                  │ stale_time elapsed      │
//! │                            │                  │ or invalidate(prefix)   │
//! │                            │                  ▼                         │
//! │                            │             Success (stale) ── fetch ──►  │
//! │                            │                                            │
//! │                            └── err (after retry) ──► Error             │
//! │                                (previous data kept)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Invalidation only marks entries stale. The next read refetches; nothing
//! is fetched eagerly. Concurrent reads of a stale key may both fetch and
//! the last response wins.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::CacheSettings;
use crate::error::{ClientError, ClientResult};
use libris_core::{BookId, MemberId};

// =============================================================================
// Query Keys
// =============================================================================

/// One segment of a [`QueryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Name(String),
    Id(i64),
}

/// Hierarchical cache key, e.g. `books/search/dune`.
///
/// Invalidating a key also invalidates every key it prefixes, so
/// `books` covers `books/42` and `books/search/dune`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
    pub fn new(parts: Vec<KeyPart>) -> Self {
        QueryKey(parts)
    }

    fn named(names: &[&str]) -> Self {
        QueryKey(names.iter().map(|n| KeyPart::Name(n.to_string())).collect())
    }

    pub fn books() -> Self {
        Self::named(&["books"])
    }

    pub fn book(id: BookId) -> Self {
        QueryKey(vec![KeyPart::Name("books".into()), KeyPart::Id(id)])
    }

    pub fn book_search(query: &str) -> Self {
        QueryKey(vec![
            KeyPart::Name("books".into()),
            KeyPart::Name("search".into()),
            KeyPart::Name(query.to_string()),
        ])
    }

    pub fn members() -> Self {
        Self::named(&["members"])
    }

    pub fn member(id: MemberId) -> Self {
        QueryKey(vec![KeyPart::Name("members".into()), KeyPart::Id(id)])
    }

    pub fn transactions() -> Self {
        Self::named(&["transactions"])
    }

    pub fn active_transactions() -> Self {
        Self::named(&["transactions", "active"])
    }

    pub fn overdue_transactions() -> Self {
        Self::named(&["transactions", "overdue"])
    }

    pub fn dashboard() -> Self {
        Self::named(&["dashboard"])
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// Whether `prefix` is this key or one of its ancestors.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match part {
                KeyPart::Name(name) => f.write_str(name)?,
                KeyPart::Id(id) => write!(f, "{}", id)?,
            }
        }
        Ok(())
    }
}

// =============================================================================
// Entries
// =============================================================================

/// Fetch state of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched.
    Idle,
    Loading,
    Success,
    Error,
}

struct Entry {
    data: Option<Arc<dyn Any + Send + Sync>>,
    fetched_at: Option<Instant>,
    stale: bool,
    status: QueryStatus,
    error: Option<ClientError>,
}

impl Entry {
    fn empty() -> Self {
        Entry {
            data: None,
            fetched_at: None,
            stale: true,
            status: QueryStatus::Idle,
            error: None,
        }
    }

    fn is_fresh(&self, stale_time: Duration) -> bool {
        !self.stale
            && self.data.is_some()
            && self
                .fetched_at
                .map(|at| at.elapsed() < stale_time)
                .unwrap_or(false)
    }
}

// =============================================================================
// Query Cache
// =============================================================================

/// Shared query cache.
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    stale_time: Duration,
    retry: u32,
}

impl QueryCache {
    pub fn new(stale_time: Duration, retry: u32) -> Self {
        QueryCache {
            entries: Mutex::new(HashMap::new()),
            stale_time,
            retry,
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.stale_time(), settings.retry)
    }

    /// Returns cached data for `key` while fresh, otherwise runs `fetcher`.
    ///
    /// A failed fetch is retried up to `retry` times when the error is
    /// transient (network, decode, 5xx). On final failure the entry keeps
    /// its previous data and records the error.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> ClientResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        {
            let mut entries = self.entries.lock().expect("Query cache mutex poisoned");
            let entry = entries.entry(key.clone()).or_insert_with(Entry::empty);

            if entry.is_fresh(self.stale_time) {
                if let Some(hit) = entry.data.as_ref().and_then(|d| d.downcast_ref::<T>()) {
                    debug!(key = %key, "Cache hit");
                    return Ok(hit.clone());
                }
            }

            debug!(key = %key, "Cache miss");
            entry.status = QueryStatus::Loading;
        }

        let mut attempt = 0;
        let result = loop {
            match fetcher().await {
                Ok(value) => break Ok(value),
                Err(e) if attempt < self.retry && e.is_retryable() => {
                    attempt += 1;
                    warn!(key = %key, attempt, error = %e, "Query failed, retrying");
                }
                Err(e) => break Err(e),
            }
        };

        let mut entries = self.entries.lock().expect("Query cache mutex poisoned");
        let entry = entries.entry(key.clone()).or_insert_with(Entry::empty);
        match &result {
            Ok(value) => {
                entry.data = Some(Arc::new(value.clone()));
                entry.fetched_at = Some(Instant::now());
                entry.stale = false;
                entry.status = QueryStatus::Success;
                entry.error = None;
            }
            Err(e) => {
                entry.status = QueryStatus::Error;
                entry.error = Some(e.clone());
            }
        }

        result
    }

    /// Last successfully fetched data, fresh or not.
    pub fn get<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        let entries = self.entries.lock().expect("Query cache mutex poisoned");
        entries
            .get(key)
            .and_then(|e| e.data.as_ref())
            .and_then(|d| d.downcast_ref::<T>())
            .cloned()
    }

    pub fn status(&self, key: &QueryKey) -> QueryStatus {
        let entries = self.entries.lock().expect("Query cache mutex poisoned");
        entries
            .get(key)
            .map(|e| e.status)
            .unwrap_or(QueryStatus::Idle)
    }

    /// Error from the last failed fetch of `key`.
    pub fn error(&self, key: &QueryKey) -> Option<ClientError> {
        let entries = self.entries.lock().expect("Query cache mutex poisoned");
        entries.get(key).and_then(|e| e.error.clone())
    }

    /// Whether the next read of `key` will refetch.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        let entries = self.entries.lock().expect("Query cache mutex poisoned");
        entries
            .get(key)
            .map(|e| !e.is_fresh(self.stale_time))
            .unwrap_or(true)
    }

    /// Marks every entry under `prefix` stale. Returns how many matched.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries.lock().expect("Query cache mutex poisoned");
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.stale = true;
                count += 1;
            }
        }
        debug!(prefix = %prefix, count, "Invalidated queries");
        count
    }

    /// Drops everything (logout).
    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("Query cache mutex poisoned");
        entries.clear();
        debug!("Query cache cleared");
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.entries.lock().map(|e| e.len()).unwrap_or(0);
        f.debug_struct("QueryCache")
            .field("entries", &len)
            .field("stale_time", &self.stale_time)
            .field("retry", &self.retry)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
