//! The tile storage contract.

use async_trait::async_trait;

use tile_common::{Tile, TileKey, TileResult};

/// Content-addressed tile cache.
///
/// The cache key is the address identity with the hash excluded; the content
/// hash is computed by the store at save time and returned on the stored
/// tile's address, where it feeds cache-validation tokens.
#[async_trait]
pub trait TileStore: Send + Sync {
    /// Look up a tile. `None` on miss.
    async fn load(&self, key: &TileKey) -> TileResult<Option<Tile>>;

    /// Persist a tile, assigning its content hash. Saving an existing key
    /// replaces the entry.
    async fn save(&self, tile: Tile) -> TileResult<Tile>;
}
