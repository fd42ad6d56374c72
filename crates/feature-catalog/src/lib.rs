//! Feature-class, presentation and labeling domain model, with the
//! repository traits the tile generator reads through.

pub mod catalog;
pub mod memory;
pub mod names;
pub mod presentation;
pub mod repository;
pub mod types;

pub use catalog::FeatureClassCatalog;
pub use memory::MemoryRepository;
pub use presentation::{filter_attribute_names, resolve_labeling, LabelingStyle, Layer, Presentation};
pub use repository::{
    FeatureClassRepository, FeatureRepository, LabelingStyleRepository, PresentationRepository,
};
pub use types::{AttributeValue, DirectoryValue, Feature, FeatureClass, FeatureGeometry};
