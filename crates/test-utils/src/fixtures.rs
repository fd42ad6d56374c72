//! A small in-memory world used across the workspace's tests.
//!
//! Class hierarchy:
//!
//! ```text
//! Roads (1) ── RoadsMajor (2)
//! Water (3)
//! Contours (4, visible from level 8, no features)
//! MapProject (10)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use feature_catalog::{
    names, AttributeValue, DirectoryValue, Feature, FeatureClass, LabelingStyle, Layer,
    MemoryRepository, Presentation,
};
use tile_common::Envelope;
use tile_generator::{PassthroughPreparer, TileGenerator};

/// Syscode of the sample map project.
pub const PROJECT_SYSCODE: i64 = 4242;

fn class(
    id: i64,
    parent_id: Option<i64>,
    name: &str,
    min_visible_level: u8,
    attributes: &[&str],
) -> FeatureClass {
    FeatureClass {
        id,
        parent_id,
        name: name.into(),
        min_visible_level,
        min_nongeneralized_level: 14,
        attributes: attributes.iter().map(|a| a.to_string()).collect(),
    }
}

fn feature(id: i64, envelope: Envelope, attributes: &[(&str, AttributeValue)]) -> Feature {
    Feature {
        id,
        envelope,
        geometry: vec![id as u8, 0xBE, 0xEF],
        attributes: attributes
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect(),
    }
}

fn text(value: &str) -> AttributeValue {
    AttributeValue::Text(value.into())
}

/// The sample feature database.
pub fn sample_repository() -> Arc<MemoryRepository> {
    let classes = vec![
        class(1, None, "Roads", 0, &["name", "kind", "lanes"]),
        class(2, Some(1), "RoadsMajor", 0, &["name", "kind", "lanes", "toll"]),
        class(3, None, "Water", 0, &["name", "depth"]),
        class(4, None, "Contours", 8, &["elevation"]),
        class(
            10,
            None,
            names::MAP_PROJECT_CLASS,
            0,
            &[names::BRANCH_DIRECTORY_ATTR, "name"],
        ),
    ];

    let mut project = feature(
        900,
        Envelope::new(-20000.0, -20000.0, 20000.0, 20000.0),
        &[("name", text("sample project"))],
    );
    project.attributes.insert(
        names::BRANCH_DIRECTORY_ATTR.into(),
        AttributeValue::Directory(DirectoryValue {
            syscode: PROJECT_SYSCODE,
            name: Some("main".into()),
        }),
    );

    let features = vec![
        (
            1,
            feature(
                100,
                Envelope::new(-1000.0, -1000.0, 1000.0, 1000.0),
                &[
                    ("name", text("Main St")),
                    ("kind", text("street")),
                    ("lanes", AttributeValue::Integer(2)),
                ],
            ),
        ),
        (
            2,
            feature(
                101,
                Envelope::new(500.0, 500.0, 2000.0, 2000.0),
                &[
                    ("name", text("Highway 1")),
                    ("kind", text("highway")),
                    ("lanes", AttributeValue::Integer(4)),
                    ("toll", AttributeValue::Integer(1)),
                ],
            ),
        ),
        (
            1,
            feature(
                102,
                Envelope::new(-9_000_000.0, 3_000_000.0, -8_900_000.0, 3_100_000.0),
                &[("name", text("Far Rd")), ("kind", text("street"))],
            ),
        ),
        (
            3,
            feature(
                200,
                Envelope::new(-500.0, -500.0, 300.0, 300.0),
                &[("name", text("Lake")), ("depth", AttributeValue::Real(12.5))],
            ),
        ),
        (10, project),
    ];

    let presentations = HashMap::from([(
        PROJECT_SYSCODE,
        vec![Presentation {
            name: "base".into(),
            layers: vec![
                Layer {
                    feature_class_id: 1,
                    filter: Some("[kind] = 'street'".into()),
                    labeling_style_id: Some(1),
                    label_attribute: None,
                },
                Layer {
                    feature_class_id: 2,
                    filter: Some("[toll] = 1".into()),
                    labeling_style_id: None,
                    label_attribute: None,
                },
            ],
        }],
    )]);

    let labeling_styles = vec![LabelingStyle {
        id: 1,
        label_attribute: Some("name".into()),
    }];

    Arc::new(MemoryRepository::new(
        classes,
        features,
        presentations,
        labeling_styles,
    ))
}

/// A generator over the sample repository with the passthrough preparer.
pub fn sample_generator(repository: Arc<MemoryRepository>) -> TileGenerator {
    TileGenerator::new(
        repository.clone(),
        repository.clone(),
        repository.clone(),
        repository,
        Arc::new(PassthroughPreparer),
    )
}
