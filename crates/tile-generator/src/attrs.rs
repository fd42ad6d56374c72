//! Presentation-derived attribute resolution.
//!
//! For a feature class inside a project context, the attribute tiles that
//! must be materialized are the attributes referenced by the filter
//! expressions of every presentation layer bound to the class or to any of
//! its direct children, after labeling styles have been resolved onto the
//! layers (a label source field is an attribute dependency too).

use std::collections::BTreeSet;

use feature_catalog::{
    filter_attribute_names, resolve_labeling, FeatureClass, FeatureClassCatalog, LabelingStyle,
    Layer, Presentation,
};

/// Deduplicated attribute names for one feature class, in deterministic
/// (sorted) order.
pub(crate) fn presentation_attributes(
    presentations: &[Presentation],
    class: &FeatureClass,
    catalog: &FeatureClassCatalog,
    styles: &[LabelingStyle],
) -> Vec<String> {
    let mut bound_ids: Vec<i64> = vec![class.id];
    bound_ids.extend(catalog.children_of(class.id).map(|c| c.id));

    let mut layers: Vec<Layer> = presentations
        .iter()
        .flat_map(|p| p.layers.iter())
        .filter(|layer| bound_ids.contains(&layer.feature_class_id))
        .cloned()
        .collect();

    resolve_labeling(&mut layers, styles);

    let mut names = BTreeSet::new();
    for layer in &layers {
        if let Some(filter) = &layer.filter {
            names.extend(filter_attribute_names(filter));
        }
        if let Some(label) = &layer.label_attribute {
            names.insert(label.clone());
        }
    }

    names.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(id: i64, parent_id: Option<i64>, name: &str) -> FeatureClass {
        FeatureClass {
            id,
            parent_id,
            name: name.into(),
            min_visible_level: 0,
            min_nongeneralized_level: 14,
            attributes: Vec::new(),
        }
    }

    fn layer(feature_class_id: i64, filter: &str, labeling_style_id: Option<i64>) -> Layer {
        Layer {
            feature_class_id,
            filter: Some(filter.into()),
            labeling_style_id,
            label_attribute: None,
        }
    }

    #[test]
    fn test_union_over_class_and_direct_children() {
        let catalog = FeatureClassCatalog::new(vec![
            class(1, None, "Roads"),
            class(2, Some(1), "RoadsMajor"),
            class(3, Some(2), "Motorways"),
            class(4, None, "Water"),
        ])
        .unwrap();

        let presentations = vec![Presentation {
            name: "base".into(),
            layers: vec![
                layer(1, "[kind] = 'road'", None),
                layer(2, "[lanes] > 2", Some(1)),
                // Grandchild layer: not a direct child, must not contribute.
                layer(3, "[toll] = 1", None),
                // Unrelated class.
                layer(4, "[depth] > 0", None),
            ],
        }];
        let styles = vec![LabelingStyle {
            id: 1,
            label_attribute: Some("name".into()),
        }];

        let roads = catalog.get_by_name("Roads").unwrap();
        let attrs = presentation_attributes(&presentations, roads, &catalog, &styles);

        assert_eq!(attrs, vec!["kind", "lanes", "name"]);
    }

    #[test]
    fn test_deduplicates_across_presentations() {
        let catalog = FeatureClassCatalog::new(vec![class(1, None, "Roads")]).unwrap();

        let presentations = vec![
            Presentation {
                name: "a".into(),
                layers: vec![layer(1, "[kind] = 'x'", None)],
            },
            Presentation {
                name: "b".into(),
                layers: vec![layer(1, "[kind] = 'y' AND [name] IS NOT NULL", None)],
            },
        ];

        let roads = catalog.get_by_name("Roads").unwrap();
        let attrs = presentation_attributes(&presentations, roads, &catalog, &[]);

        assert_eq!(attrs, vec!["kind", "name"]);
    }

    #[test]
    fn test_no_layers_yields_no_attributes() {
        let catalog = FeatureClassCatalog::new(vec![class(1, None, "Roads")]).unwrap();
        let roads = catalog.get_by_name("Roads").unwrap();
        assert!(presentation_attributes(&[], roads, &catalog, &[]).is_empty());
    }
}
