//! # Cache Coordinator
//!
//! Turns successful mutations into cache invalidations.
//!
//! ## Invalidation Map
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────────────┐
//! │  MutationEvent               │  Invalidated query prefixes              │
//! ├──────────────────────────────┼──────────────────────────────────────────┤
//! │  BookCreated / BookDeleted   │  books, dashboard                        │
//! │  BookUpdated                 │  books, dashboard                        │
//! │  MemberCreated / Deleted     │  members, dashboard                      │
//! │  MemberUpdated               │  members                                 │
//! │  BookIssued / BookReturned   │  transactions, books, dashboard          │
//! │  LoggedOut                   │  (entire cache cleared)                  │
//! └──────────────────────────────┴──────────────────────────────────────────┘
//! ```
//!
//! Every event is also broadcast so front-ends can refresh the views they
//! have open. Nobody listening is fine.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use crate::cache::{QueryCache, QueryKey};
use libris_core::{BookId, MemberId, TransactionId};

/// Capacity of the event channel. Slow subscribers lose the oldest events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A mutation the server accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationEvent {
    BookCreated(BookId),
    BookUpdated(BookId),
    BookDeleted(BookId),
    MemberCreated(MemberId),
    MemberUpdated(MemberId),
    MemberDeleted(MemberId),
    BookIssued {
        transaction_id: TransactionId,
        book_id: BookId,
    },
    BookReturned {
        transaction_id: TransactionId,
        book_id: BookId,
    },
    LoggedOut,
}

impl MutationEvent {
    /// Query prefixes made stale by this event.
    pub fn invalidates(&self) -> Vec<QueryKey> {
        match self {
            MutationEvent::BookCreated(_)
            | MutationEvent::BookUpdated(_)
            | MutationEvent::BookDeleted(_) => vec![QueryKey::books(), QueryKey::dashboard()],
            MutationEvent::MemberCreated(_) | MutationEvent::MemberDeleted(_) => {
                vec![QueryKey::members(), QueryKey::dashboard()]
            }
            MutationEvent::MemberUpdated(_) => vec![QueryKey::members()],
            MutationEvent::BookIssued { .. } | MutationEvent::BookReturned { .. } => vec![
                QueryKey::transactions(),
                QueryKey::books(),
                QueryKey::dashboard(),
            ],
            MutationEvent::LoggedOut => Vec::new(),
        }
    }
}

/// Applies [`MutationEvent`]s to the [`QueryCache`] and rebroadcasts them.
#[derive(Debug)]
pub struct CacheCoordinator {
    cache: Arc<QueryCache>,
    events: broadcast::Sender<MutationEvent>,
}

impl CacheCoordinator {
    pub fn new(cache: Arc<QueryCache>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        CacheCoordinator { cache, events }
    }

    /// Receives every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<MutationEvent> {
        self.events.subscribe()
    }

    /// Invalidates the related queries, then broadcasts the event.
    ///
    /// Returns the number of cache entries marked stale.
    pub fn publish(&self, event: MutationEvent) -> usize {
        let stale = match &event {
            MutationEvent::LoggedOut => {
                self.cache.clear();
                0
            }
            other => other
                .invalidates()
                .iter()
                .map(|prefix| self.cache.invalidate(prefix))
                .sum(),
        };

        debug!(?event, stale, "Mutation applied to cache");

        // No receivers is fine
        let _ = self.events.send(event);
        stale
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::time::Duration;

    async fn warm(cache: &QueryCache, keys: &[QueryKey]) {
        for key in keys {
            cache
                .fetch(key.clone(), || async { Ok::<_, ClientError>(1u32) })
                .await
                .unwrap();
        }
    }

    fn all_keys() -> Vec<QueryKey> {
        vec![
            QueryKey::books(),
            QueryKey::book(1),
            QueryKey::book_search("dune"),
            QueryKey::members(),
            QueryKey::active_transactions(),
            QueryKey::overdue_transactions(),
            QueryKey::dashboard(),
        ]
    }

    fn stale_keys(cache: &QueryCache) -> Vec<String> {
        all_keys()
            .into_iter()
            .filter(|k| cache.is_stale(k))
            .map(|k| k.to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_issue_invalidates_books_transactions_dashboard() {
        let cache = Arc::new(QueryCache::new(Duration::from_secs(300), 1));
        warm(&cache, &all_keys()).await;
        let coordinator = CacheCoordinator::new(cache.clone());

        let stale = coordinator.publish(MutationEvent::BookIssued {
            transaction_id: 1,
            book_id: 1,
        });

        assert_eq!(stale, 6);
        assert_eq!(
            stale_keys(&cache),
            vec![
                "books",
                "books/1",
                "books/search/dune",
                "transactions/active",
                "transactions/overdue",
                "dashboard"
            ]
        );
    }

    #[tokio::test]
    async fn test_member_update_only_touches_members() {
        let cache = Arc::new(QueryCache::new(Duration::from_secs(300), 1));
        warm(&cache, &all_keys()).await;
        let coordinator = CacheCoordinator::new(cache.clone());

        coordinator.publish(MutationEvent::MemberUpdated(4));
        assert_eq!(stale_keys(&cache), vec!["members"]);

        coordinator.publish(MutationEvent::MemberDeleted(4));
        assert_eq!(stale_keys(&cache), vec!["members", "dashboard"]);
    }

    #[tokio::test]
    async fn test_book_update_leaves_transactions_fresh() {
        let cache = Arc::new(QueryCache::new(Duration::from_secs(300), 1));
        warm(&cache, &all_keys()).await;
        let coordinator = CacheCoordinator::new(cache.clone());

        coordinator.publish(MutationEvent::BookUpdated(1));
        assert!(!cache.is_stale(&QueryKey::active_transactions()));
        assert!(cache.is_stale(&QueryKey::book(1)));
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let cache = Arc::new(QueryCache::new(Duration::from_secs(300), 1));
        let coordinator = CacheCoordinator::new(cache.clone());
        let mut rx = coordinator.subscribe();

        coordinator.publish(MutationEvent::BookCreated(9));
        coordinator.publish(MutationEvent::LoggedOut);

        assert_eq!(rx.recv().await.unwrap(), MutationEvent::BookCreated(9));
        assert_eq!(rx.recv().await.unwrap(), MutationEvent::LoggedOut);
    }

    #[tokio::test]
    async fn test_logout_clears_cache() {
        let cache = Arc::new(QueryCache::new(Duration::from_secs(300), 1));
        warm(&cache, &[QueryKey::books()]).await;
        let coordinator = CacheCoordinator::new(cache.clone());

        coordinator.publish(MutationEvent::LoggedOut);
        assert!(cache.get::<u32>(&QueryKey::books()).is_none());
    }
}
