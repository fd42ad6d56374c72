//! Pull-driven tile sequence produced by bulk generation.

use tokio::sync::mpsc;

use tile_common::{GeometryAndAttributeTiles, TileResult};

/// A lazy sequence of tile bundles.
///
/// Bundles are produced by a background task through a bounded channel, so a
/// bulk export over a full map is consumable without materializing the tile
/// set in memory, and a slow consumer backpressures the producer. Dropping
/// the sequence cancels production promptly: the producer stops at its next
/// send. A bundle is always emitted whole; a cancelled generation never
/// surfaces half a geometry/attribute pair.
#[derive(Debug)]
pub struct TileSequence {
    rx: mpsc::Receiver<TileResult<GeometryAndAttributeTiles>>,
}

impl TileSequence {
    pub(crate) fn new(rx: mpsc::Receiver<TileResult<GeometryAndAttributeTiles>>) -> Self {
        Self { rx }
    }

    /// The next bundle, or `None` when the sequence is exhausted.
    ///
    /// An `Err` item ends the sequence; production stops after the first
    /// failure.
    pub async fn next(&mut self) -> Option<TileResult<GeometryAndAttributeTiles>> {
        self.rx.recv().await
    }

    /// Drain the sequence into memory. Intended for tests and small extents.
    pub async fn collect(mut self) -> TileResult<Vec<GeometryAndAttributeTiles>> {
        let mut bundles = Vec::new();
        while let Some(item) = self.next().await {
            bundles.push(item?);
        }
        Ok(bundles)
    }
}
