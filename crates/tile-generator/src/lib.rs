//! Tile generation engine.
//!
//! Produces geometry and attribute tiles from a feature database, either one
//! tile at a time (the cache-fill path, with single-flight dedup) or in bulk
//! over an extent or map project (a pull-driven bounded sequence).

mod attrs;
pub mod fill;
pub mod generator;
pub mod preparer;
pub mod sequence;

pub use fill::TileCacheFiller;
pub use generator::TileGenerator;
pub use preparer::{GeometryTilePreparer, PassthroughPreparer, PreparedShapes};
pub use sequence::TileSequence;
