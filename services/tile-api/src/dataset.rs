//! YAML dataset loading.
//!
//! The service reads its feature database from a YAML file at startup and
//! serves it through the in-memory repository. Classes are referenced by
//! name inside the file and resolved to ids while building the repository.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use feature_catalog::{
    AttributeValue, Feature, FeatureClass, LabelingStyle, Layer, MemoryRepository, Presentation,
};
use tile_common::{Envelope, TileError, TileResult};

#[derive(Debug, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub feature_classes: Vec<FeatureClass>,
    #[serde(default)]
    pub features: Vec<DatasetFeature>,
    #[serde(default)]
    pub presentations: Vec<DatasetPresentation>,
    #[serde(default)]
    pub labeling_styles: Vec<LabelingStyle>,
}

#[derive(Debug, Deserialize)]
pub struct DatasetFeature {
    /// Feature class name, resolved against `feature_classes`.
    pub class: String,
    pub id: i64,
    pub envelope: Envelope,
    #[serde(default)]
    pub geometry: Vec<u8>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

#[derive(Debug, Deserialize)]
pub struct DatasetPresentation {
    pub project_syscode: i64,
    pub name: String,
    #[serde(default)]
    pub layers: Vec<DatasetLayer>,
}

#[derive(Debug, Deserialize)]
pub struct DatasetLayer {
    pub feature_class: String,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub labeling_style_id: Option<i64>,
}

impl Dataset {
    pub fn from_file(path: &Path) -> TileResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TileError::Internal(format!("cannot read dataset {}: {e}", path.display()))
        })?;
        serde_yaml::from_str(&raw)
            .map_err(|e| TileError::Internal(format!("cannot parse dataset: {e}")))
    }

    pub fn into_repository(self) -> TileResult<MemoryRepository> {
        let class_ids: HashMap<String, i64> = self
            .feature_classes
            .iter()
            .map(|c| (c.name.clone(), c.id))
            .collect();

        let resolve = |name: &str| -> TileResult<i64> {
            class_ids
                .get(name)
                .copied()
                .ok_or_else(|| TileError::Internal(format!("dataset references unknown class '{name}'")))
        };

        let mut features = Vec::with_capacity(self.features.len());
        for f in self.features {
            let class_id = resolve(&f.class)?;
            features.push((
                class_id,
                Feature {
                    id: f.id,
                    envelope: f.envelope,
                    geometry: f.geometry,
                    attributes: f.attributes,
                },
            ));
        }

        let mut presentations: HashMap<i64, Vec<Presentation>> = HashMap::new();
        for p in self.presentations {
            let mut layers = Vec::with_capacity(p.layers.len());
            for layer in p.layers {
                layers.push(Layer {
                    feature_class_id: resolve(&layer.feature_class)?,
                    filter: layer.filter,
                    labeling_style_id: layer.labeling_style_id,
                    label_attribute: None,
                });
            }
            presentations
                .entry(p.project_syscode)
                .or_default()
                .push(Presentation {
                    name: p.name,
                    layers,
                });
        }

        Ok(MemoryRepository::new(
            self.feature_classes,
            features,
            presentations,
            self.labeling_styles,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_build() {
        let yaml = r#"
feature_classes:
  - id: 1
    parent_id: null
    name: Roads
    min_visible_level: 0
    min_nongeneralized_level: 14
    attributes: [name, kind]
features:
  - class: Roads
    id: 100
    envelope: { min_x: -1000.0, min_y: -1000.0, max_x: 1000.0, max_y: 1000.0 }
    attributes:
      name: Main St
      kind: street
labeling_styles:
  - id: 1
    label_attribute: name
"#;

        let dataset: Dataset = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(dataset.feature_classes.len(), 1);
        assert_eq!(dataset.features.len(), 1);
        dataset.into_repository().unwrap();
    }

    #[test]
    fn test_unknown_class_reference_rejected() {
        let yaml = r#"
features:
  - class: Ghost
    id: 1
    envelope: { min_x: 0.0, min_y: 0.0, max_x: 1.0, max_y: 1.0 }
"#;
        let dataset: Dataset = serde_yaml::from_str(yaml).unwrap();
        assert!(dataset.into_repository().is_err());
    }
}
