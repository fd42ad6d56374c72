//! Shared types for the vector-tile-server workspace.
//!
//! Tile addressing, the scale-level grid, coordinate-width policy, tile
//! content types, envelope/projection helpers, and the common error taxonomy.

pub mod address;
pub mod encoding;
pub mod envelope;
pub mod error;
pub mod grid;
pub mod projection;
pub mod tiles;

pub use address::{TileAddress, TileKey, TileKind};
pub use encoding::bytes_per_coordinate;
pub use envelope::Envelope;
pub use error::{TileError, TileResult};
pub use grid::{GridRect, MAX_SCALE_LEVEL, MIN_SCALE_LEVEL, WORLD_EXTENT};
pub use projection::{ProjectionConverter, ProjectionId};
pub use tiles::{
    AttributeTile, GeometryAndAttributeTiles, GeometryTile, Tile, TileAttribute, TileShape,
};
