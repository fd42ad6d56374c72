//! Single-flight registry for cache filling.
//!
//! A cache miss registers its fill key here before generating. If another
//! fill for the same key is already in flight, the caller waits for that
//! fill's published outcome instead of regenerating. One generation of a
//! geometry tile also produces its paired component-attribute tile, so both
//! addresses share one fill key (see `TileAddress::normalized_fill_key`) and
//! the outcome carries every tile the fill saved.
//!
//! Unrelated keys proceed fully in parallel; this is per-key dedup, not a
//! lock over the cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use tile_common::{Tile, TileError, TileKey};

/// Published result of one fill: every tile the fill saved (geometry plus
/// any paired attribute tile), or the shared error.
pub type FillOutcome = Result<Arc<Vec<Tile>>, TileError>;

/// Result of registering with the registry.
pub enum FillTicket {
    /// First request for the key. The caller must perform the fill and call
    /// `complete()`; the receiver yields the published outcome.
    Owner(broadcast::Receiver<FillOutcome>),
    /// A fill is already in flight; wait on the receiver for its outcome.
    Waiter(broadcast::Receiver<FillOutcome>),
}

impl FillTicket {
    pub fn is_owner(&self) -> bool {
        matches!(self, FillTicket::Owner(_))
    }

    /// Wait for the fill's published outcome.
    ///
    /// Errors only if the fill was abandoned without publishing, which the
    /// filler's completion discipline rules out.
    pub async fn outcome(self) -> Result<FillOutcome, broadcast::error::RecvError> {
        let mut rx = match self {
            FillTicket::Owner(rx) | FillTicket::Waiter(rx) => rx,
        };
        rx.recv().await
    }
}

/// Counters for monitoring fill dedup effectiveness.
#[derive(Debug, Default)]
pub struct FillRegistryStats {
    /// Fills that performed generation.
    pub owned: AtomicU64,
    /// Fills that joined an in-flight generation.
    pub joined: AtomicU64,
}

/// Tracks in-flight fills by normalized tile key.
#[derive(Debug, Default)]
pub struct FillRegistry {
    in_flight: Mutex<HashMap<TileKey, broadcast::Sender<FillOutcome>>>,
    stats: FillRegistryStats,
}

impl FillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically register interest in a fill key.
    pub async fn register(&self, key: &TileKey) -> FillTicket {
        let mut in_flight = self.in_flight.lock().await;

        if let Some(tx) = in_flight.get(key) {
            self.stats.joined.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "joining in-flight tile generation");
            FillTicket::Waiter(tx.subscribe())
        } else {
            // A fill publishes exactly one message; capacity covers stragglers.
            let (tx, rx) = broadcast::channel(4);
            in_flight.insert(key.clone(), tx);
            self.stats.owned.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "starting tile generation");
            FillTicket::Owner(rx)
        }
    }

    /// Publish a fill's outcome to the owner and all waiters and deregister
    /// the key. Must be called on success AND failure; a failed fill that
    /// never completes would block its waiters indefinitely.
    pub async fn complete(&self, key: &TileKey, outcome: FillOutcome) {
        let mut in_flight = self.in_flight.lock().await;
        if let Some(tx) = in_flight.remove(key) {
            // Send errors only mean every receiver is gone; nothing to do.
            let _ = tx.send(outcome);
        }
    }

    pub async fn in_flight_count(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    pub fn stats(&self) -> &FillRegistryStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tile_common::{TileAddress, TileKind};

    fn key() -> TileKey {
        TileAddress::new(3, 1, 1, "Roads", TileKind::Geometry).key()
    }

    fn outcome_tiles() -> FillOutcome {
        Ok(Arc::new(vec![Tile {
            address: TileAddress::new(3, 1, 1, "Roads", TileKind::Geometry).with_hash("h"),
            content: Bytes::from_static(b"x"),
        }]))
    }

    #[tokio::test]
    async fn test_first_registration_owns() {
        let registry = FillRegistry::new();
        assert!(registry.register(&key()).await.is_owner());
    }

    #[tokio::test]
    async fn test_second_registration_waits() {
        let registry = FillRegistry::new();
        let _owner = registry.register(&key()).await;
        assert!(!registry.register(&key()).await.is_owner());
    }

    #[tokio::test]
    async fn test_distinct_keys_both_own() {
        let registry = FillRegistry::new();
        let other = TileAddress::new(3, 1, 2, "Roads", TileKind::Geometry).key();

        assert!(registry.register(&key()).await.is_owner());
        assert!(registry.register(&other).await.is_owner());
    }

    #[tokio::test]
    async fn test_complete_reaches_owner_and_waiters() {
        let registry = Arc::new(FillRegistry::new());
        let owner = registry.register(&key()).await;
        let waiter = registry.register(&key()).await;

        let publisher = Arc::clone(&registry);
        tokio::spawn(async move {
            publisher.complete(&key(), outcome_tiles()).await;
        });

        for ticket in [owner, waiter] {
            let outcome = ticket.outcome().await.unwrap();
            assert_eq!(outcome.unwrap().len(), 1);
        }
        assert_eq!(registry.in_flight_count().await, 0);
    }

    #[tokio::test]
    async fn test_failure_releases_waiters() {
        let registry = Arc::new(FillRegistry::new());
        let _owner = registry.register(&key()).await;
        let waiter = registry.register(&key()).await;

        let publisher = Arc::clone(&registry);
        tokio::spawn(async move {
            publisher
                .complete(&key(), Err(TileError::Repository("db down".into())))
                .await;
        });

        let outcome = waiter.outcome().await.unwrap();
        let err = outcome.unwrap_err();
        assert!(matches!(err, TileError::Repository(_)));
    }

    #[tokio::test]
    async fn test_key_reusable_after_completion() {
        let registry = FillRegistry::new();
        let _ = registry.register(&key()).await;
        registry.complete(&key(), outcome_tiles()).await;
        assert!(registry.register(&key()).await.is_owner());
    }

    #[tokio::test]
    async fn test_concurrent_registration_single_owner() {
        let registry = Arc::new(FillRegistry::new());

        let mut handles = Vec::new();
        for _ in 0..10 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.register(&key()).await.is_owner()
            }));
        }

        let results = futures::future::join_all(handles).await;
        let owners = results
            .into_iter()
            .map(|r| r.unwrap())
            .filter(|owned| *owned)
            .count();

        assert_eq!(owners, 1, "exactly one registration may own the fill");
        assert_eq!(registry.stats().joined.load(Ordering::Relaxed), 9);
    }
}
