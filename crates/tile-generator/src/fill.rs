//! The cache-fill protocol: lookup, miss, generate, store, return.
//!
//! At most one generation is in flight per cache key. A geometry tile and
//! its component-attribute tile come out of one generation call, so both
//! addresses share a single fill (see `TileAddress::normalized_fill_key`);
//! a miss on either waits for, or triggers, the same generation. Unrelated
//! keys fill fully in parallel.

use std::sync::Arc;
use tracing::debug;

use tile_common::{
    GeometryAndAttributeTiles, Tile, TileAddress, TileError, TileKey, TileKind, TileResult,
};
use tile_storage::{FillRegistry, TileStore};

use crate::generator::TileGenerator;
use crate::sequence::TileSequence;

/// Serves tiles from storage, generating on miss.
#[derive(Clone)]
pub struct TileCacheFiller {
    store: Arc<dyn TileStore>,
    generator: TileGenerator,
    registry: Arc<FillRegistry>,
}

impl TileCacheFiller {
    pub fn new(store: Arc<dyn TileStore>, generator: TileGenerator) -> Self {
        Self {
            store,
            generator,
            registry: Arc::new(FillRegistry::new()),
        }
    }

    pub fn registry(&self) -> &FillRegistry {
        &self.registry
    }

    /// Fetch a tile, generating and storing it on a cache miss.
    ///
    /// Retry is safe on transient errors: generation is idempotent against
    /// a fixed database snapshot.
    pub async fn fetch(&self, address: &TileAddress) -> TileResult<Tile> {
        let key = address.key();
        if let Some(tile) = self.store.load(&key).await? {
            return Ok(tile);
        }

        let fill_key = address.normalized_fill_key();
        let ticket = self.registry.register(&fill_key).await;

        if ticket.is_owner() {
            // The fill runs in its own task: a caller that goes away
            // mid-generation must not abandon the pair half-written, and
            // waiters must always see a published outcome.
            let filler = self.clone();
            let owned_key = fill_key.clone();
            tokio::spawn(async move {
                let outcome = filler.run_fill(&owned_key).await.map(Arc::new);
                filler.registry.complete(&owned_key, outcome).await;
            });
        }

        let outcome = ticket.outcome().await.map_err(|_| {
            TileError::Internal("tile generation ended without publishing a result".into())
        })?;

        match outcome {
            Ok(saved) => saved
                .iter()
                .find(|tile| tile.address.key() == key)
                .cloned()
                .ok_or_else(|| TileError::TileNotFound(address.to_string())),
            Err(err) => Err(err),
        }
    }

    /// Generate for one fill key and write every produced tile through the
    /// store. Returns the stored tiles, hashes assigned.
    async fn run_fill(&self, key: &TileKey) -> TileResult<Vec<Tile>> {
        let address = key.to_address();
        let produced = match &key.kind {
            TileKind::Geometry => {
                let bundle = self.generator.create_geometry_tile(&address).await?;
                encode_bundle(&bundle)?
            }
            TileKind::Attribute(_) => {
                let attr_tile = self.generator.create_attribute_tile(&address).await?;
                vec![Tile::from_attributes(&attr_tile)?]
            }
            // Normalization maps component-attribute keys onto their paired
            // geometry key before registration.
            TileKind::ComponentAttributes => {
                return Err(TileError::Internal(
                    "component-attribute fill was not normalized".into(),
                ))
            }
        };

        let mut saved = Vec::with_capacity(produced.len());
        for tile in produced {
            saved.push(self.store.save(tile).await?);
        }

        debug!(key = %key, tiles = saved.len(), "fill complete");
        Ok(saved)
    }

    /// Persist one bundle through the store. Returns the number of tiles
    /// written.
    pub async fn save_bundle(&self, bundle: &GeometryAndAttributeTiles) -> TileResult<u64> {
        let tiles = encode_bundle(bundle)?;
        let count = tiles.len() as u64;
        for tile in tiles {
            self.store.save(tile).await?;
        }
        Ok(count)
    }

    /// Drain a bulk sequence, persisting each bundle as it arrives.
    ///
    /// Bulk generation shares the single-tile write path, so concurrent
    /// single-tile requests observe bulk-produced tiles consistently.
    pub async fn save_sequence(&self, sequence: &mut TileSequence) -> TileResult<u64> {
        let mut saved = 0;
        while let Some(item) = sequence.next().await {
            saved += self.save_bundle(&item?).await?;
        }
        Ok(saved)
    }
}

fn encode_bundle(bundle: &GeometryAndAttributeTiles) -> TileResult<Vec<Tile>> {
    let mut tiles = Vec::with_capacity(1 + bundle.attributes.len());
    tiles.push(Tile::from_geometry(&bundle.geometry)?);
    for attr_tile in &bundle.attributes {
        tiles.push(Tile::from_attributes(attr_tile)?);
    }
    Ok(tiles)
}
