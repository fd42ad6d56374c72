//! Tile cache: the storage contract, an in-memory implementation, and the
//! single-flight registry used by the cache-fill protocol.

pub mod coalesce;
pub mod memory;
pub mod store;

pub use coalesce::{FillOutcome, FillRegistry, FillRegistryStats, FillTicket};
pub use memory::{MemoryTileStore, TileStoreStats};
pub use store::TileStore;
