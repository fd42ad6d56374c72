//! In-memory tile store.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use tile_common::{Tile, TileKey, TileResult};

use crate::store::TileStore;

/// Statistics for the in-memory tile store.
///
/// All fields are atomic for lock-free reads.
#[derive(Debug, Default)]
pub struct TileStoreStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub saves: AtomicU64,
}

impl TileStoreStats {
    /// Cache hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// Tile cache held in process memory, hashed with SHA-256.
#[derive(Debug, Default)]
pub struct MemoryTileStore {
    tiles: RwLock<HashMap<TileKey, Tile>>,
    stats: TileStoreStats,
}

impl MemoryTileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &TileStoreStats {
        &self.stats
    }

    pub async fn len(&self) -> usize {
        self.tiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tiles.read().await.is_empty()
    }
}

/// Hex SHA-256 of tile content.
fn content_hash(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

#[async_trait]
impl TileStore for MemoryTileStore {
    async fn load(&self, key: &TileKey) -> TileResult<Option<Tile>> {
        let tiles = self.tiles.read().await;
        match tiles.get(key) {
            Some(tile) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(tile.clone()))
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn save(&self, tile: Tile) -> TileResult<Tile> {
        let hash = content_hash(&tile.content);
        let stored = Tile {
            address: tile.address.with_hash(hash),
            content: tile.content,
        };

        let mut tiles = self.tiles.write().await;
        tiles.insert(stored.address.key(), stored.clone());
        self.stats.saves.fetch_add(1, Ordering::Relaxed);

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tile_common::{TileAddress, TileKind};

    fn tile(kind: TileKind, content: &str) -> Tile {
        Tile {
            address: TileAddress::new(4, 2, 3, "Roads", kind),
            content: Bytes::from(content.to_string()),
        }
    }

    #[tokio::test]
    async fn test_save_assigns_content_hash() {
        let store = MemoryTileStore::new();
        let saved = store.save(tile(TileKind::Geometry, "payload")).await.unwrap();
        let hash = saved.address.hash.expect("hash assigned at save");
        assert_eq!(hash.len(), 64);
    }

    #[tokio::test]
    async fn test_same_content_same_hash() {
        let store = MemoryTileStore::new();
        let a = store.save(tile(TileKind::Geometry, "payload")).await.unwrap();
        let b = store
            .save(tile(TileKind::Attribute("name".into()), "payload"))
            .await
            .unwrap();
        assert_eq!(a.address.hash, b.address.hash);
    }

    #[tokio::test]
    async fn test_load_by_hashless_key() {
        let store = MemoryTileStore::new();
        let original = tile(TileKind::Geometry, "payload");
        let key = original.address.key();

        assert!(store.load(&key).await.unwrap().is_none());

        store.save(original).await.unwrap();

        // The lookup key carries no hash; identity excludes it.
        let loaded = store.load(&key).await.unwrap().expect("hit after save");
        assert!(loaded.address.hash.is_some());
        assert_eq!(loaded.content, Bytes::from("payload"));

        let stats = store.stats();
        assert_eq!(stats.hits.load(Ordering::Relaxed), 1);
        assert_eq!(stats.misses.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_save_replaces_entry() {
        let store = MemoryTileStore::new();
        store.save(tile(TileKind::Geometry, "old")).await.unwrap();
        store.save(tile(TileKind::Geometry, "new")).await.unwrap();

        assert_eq!(store.len().await, 1);
        let key = tile(TileKind::Geometry, "new").address.key();
        let loaded = store.load(&key).await.unwrap().unwrap();
        assert_eq!(loaded.content, Bytes::from("new"));
    }
}
