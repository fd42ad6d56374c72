//! Repository traits: the external collaborators the generator reads from.
//!
//! All repositories are read-only from the generator's point of view. A
//! transient backend failure surfaces as `TileError::Repository` and is safe
//! to retry at the caller since generation is idempotent.

use async_trait::async_trait;
use std::collections::BTreeMap;

use tile_common::{Envelope, TileAttribute, TileResult};

use crate::catalog::FeatureClassCatalog;
use crate::presentation::{LabelingStyle, Presentation};
use crate::types::{Feature, FeatureGeometry};

/// Source of the feature-class hierarchy.
#[async_trait]
pub trait FeatureClassRepository: Send + Sync {
    async fn load_feature_classes(&self) -> TileResult<FeatureClassCatalog>;
}

/// Read-only source of feature geometry and attribute values.
#[async_trait]
pub trait FeatureRepository: Send + Sync {
    /// Geometry of features intersecting `extent`, grouped by originating
    /// class id. `class_ids` is a class family (a root plus descendants);
    /// classes without matching features are absent from the result.
    async fn geometry_in(
        &self,
        extent: &Envelope,
        class_ids: &[i64],
    ) -> TileResult<BTreeMap<i64, Vec<FeatureGeometry>>>;

    /// Values of one named attribute over features intersecting `extent`.
    async fn attribute_in(
        &self,
        extent: &Envelope,
        class_ids: &[i64],
        attribute: &str,
    ) -> TileResult<Vec<TileAttribute>>;

    /// The map-project feature whose directory attribute carries `syscode`.
    ///
    /// Indexed exact lookup; "not found" is the only defined failure mode.
    async fn project_by_syscode(&self, syscode: i64) -> TileResult<Option<Feature>>;
}

/// Source of cartographic presentations for a project.
#[async_trait]
pub trait PresentationRepository: Send + Sync {
    async fn load_presentations(&self, project_syscode: i64) -> TileResult<Vec<Presentation>>;
}

/// Source of label styling rules.
#[async_trait]
pub trait LabelingStyleRepository: Send + Sync {
    async fn load_labeling_styles(&self) -> TileResult<Vec<LabelingStyle>>;
}
