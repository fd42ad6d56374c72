//! In-memory repository backing the service dataset loader and tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

use tile_common::{Envelope, TileAttribute, TileResult};

use crate::catalog::FeatureClassCatalog;
use crate::names;
use crate::presentation::{LabelingStyle, Presentation};
use crate::repository::{
    FeatureClassRepository, FeatureRepository, LabelingStyleRepository, PresentationRepository,
};
use crate::types::{Feature, FeatureClass, FeatureGeometry};

/// One feature together with the class it belongs to.
#[derive(Debug, Clone)]
struct StoredFeature {
    class_id: i64,
    feature: Feature,
}

/// A complete feature database held in memory.
///
/// Implements all four repository traits. The map-project syscode index is
/// built once at construction, giving the indexed exact lookup the project
/// resolution contract requires.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    classes: Vec<FeatureClass>,
    features: Vec<StoredFeature>,
    presentations: HashMap<i64, Vec<Presentation>>,
    labeling_styles: Vec<LabelingStyle>,
    projects: HashMap<i64, Feature>,
}

impl MemoryRepository {
    pub fn new(
        classes: Vec<FeatureClass>,
        features: Vec<(i64, Feature)>,
        presentations: HashMap<i64, Vec<Presentation>>,
        labeling_styles: Vec<LabelingStyle>,
    ) -> Self {
        let map_project_class_id = classes
            .iter()
            .find(|c| c.name == names::MAP_PROJECT_CLASS)
            .map(|c| c.id);

        let mut projects = HashMap::new();
        let features: Vec<StoredFeature> = features
            .into_iter()
            .map(|(class_id, feature)| StoredFeature { class_id, feature })
            .collect();

        if let Some(project_class_id) = map_project_class_id {
            for stored in features.iter().filter(|f| f.class_id == project_class_id) {
                let syscode = stored
                    .feature
                    .attribute(names::BRANCH_DIRECTORY_ATTR)
                    .and_then(|v| v.directory_syscode());
                if let Some(syscode) = syscode {
                    projects.insert(syscode, stored.feature.clone());
                }
            }
        }

        Self {
            classes,
            features,
            presentations,
            labeling_styles,
            projects,
        }
    }
}

#[async_trait]
impl FeatureClassRepository for MemoryRepository {
    async fn load_feature_classes(&self) -> TileResult<FeatureClassCatalog> {
        FeatureClassCatalog::new(self.classes.clone())
    }
}

#[async_trait]
impl FeatureRepository for MemoryRepository {
    async fn geometry_in(
        &self,
        extent: &Envelope,
        class_ids: &[i64],
    ) -> TileResult<BTreeMap<i64, Vec<FeatureGeometry>>> {
        let mut result: BTreeMap<i64, Vec<FeatureGeometry>> = BTreeMap::new();

        for stored in &self.features {
            if !class_ids.contains(&stored.class_id) {
                continue;
            }
            if !stored.feature.envelope.intersects(extent) {
                continue;
            }
            result
                .entry(stored.class_id)
                .or_default()
                .push(FeatureGeometry {
                    feature_id: stored.feature.id,
                    geometry: stored.feature.geometry.clone(),
                });
        }

        for shapes in result.values_mut() {
            shapes.sort_by_key(|s| s.feature_id);
        }

        Ok(result)
    }

    async fn attribute_in(
        &self,
        extent: &Envelope,
        class_ids: &[i64],
        attribute: &str,
    ) -> TileResult<Vec<TileAttribute>> {
        let mut values: Vec<TileAttribute> = self
            .features
            .iter()
            .filter(|stored| class_ids.contains(&stored.class_id))
            .filter(|stored| stored.feature.envelope.intersects(extent))
            .filter_map(|stored| {
                stored.feature.attribute(attribute).map(|value| TileAttribute {
                    feature_id: stored.feature.id,
                    value: value.to_json(),
                })
            })
            .collect();

        values.sort_by_key(|v| v.feature_id);
        Ok(values)
    }

    async fn project_by_syscode(&self, syscode: i64) -> TileResult<Option<Feature>> {
        Ok(self.projects.get(&syscode).cloned())
    }
}

#[async_trait]
impl PresentationRepository for MemoryRepository {
    async fn load_presentations(&self, project_syscode: i64) -> TileResult<Vec<Presentation>> {
        Ok(self
            .presentations
            .get(&project_syscode)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl LabelingStyleRepository for MemoryRepository {
    async fn load_labeling_styles(&self) -> TileResult<Vec<LabelingStyle>> {
        Ok(self.labeling_styles.clone())
    }
}
