//! Application state and shared resources.

use std::path::Path;
use std::sync::Arc;

use feature_catalog::MemoryRepository;
use tile_common::TileResult;
use tile_generator::{PassthroughPreparer, TileCacheFiller, TileGenerator};
use tile_storage::MemoryTileStore;

use crate::dataset::Dataset;

/// Shared application state.
pub struct AppState {
    pub generator: TileGenerator,
    pub filler: TileCacheFiller,
    pub store: Arc<MemoryTileStore>,
}

impl AppState {
    /// Load the feature database from a YAML dataset file.
    pub fn from_dataset_file(path: &Path) -> TileResult<Self> {
        let repository = Arc::new(Dataset::from_file(path)?.into_repository()?);
        Ok(Self::from_repository(repository))
    }

    pub fn from_repository(repository: Arc<MemoryRepository>) -> Self {
        let generator = TileGenerator::new(
            repository.clone(),
            repository.clone(),
            repository.clone(),
            repository,
            Arc::new(PassthroughPreparer),
        );
        let store = Arc::new(MemoryTileStore::new());
        let filler = TileCacheFiller::new(store.clone(), generator.clone());

        Self {
            generator,
            filler,
            store,
        }
    }
}
