//! Presentations, layers, and labeling styles.
//!
//! Presentations are consumed for one purpose in this core: determining
//! which attribute names must be materialized as attribute tiles for a
//! feature class within a project context.

use serde::{Deserialize, Serialize};

/// Label styling rule; can pull an extra attribute into a layer's
/// dependencies (the field used as a label source).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelingStyle {
    pub id: i64,
    #[serde(default)]
    pub label_attribute: Option<String>,
}

/// One layer of a presentation, bound to a feature class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub feature_class_id: i64,
    /// Filter expression; attribute references are written `[name]`.
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub labeling_style_id: Option<i64>,
    /// Resolved from the labeling style; not part of the stored layer.
    #[serde(skip)]
    pub label_attribute: Option<String>,
}

/// A named grouping of layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub name: String,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

/// Attach labeling styles to layers by id, resolving each layer's label
/// source attribute.
pub fn resolve_labeling(layers: &mut [Layer], styles: &[LabelingStyle]) {
    for layer in layers {
        if let Some(style_id) = layer.labeling_style_id {
            layer.label_attribute = styles
                .iter()
                .find(|s| s.id == style_id)
                .and_then(|s| s.label_attribute.clone());
        }
    }
}

/// Attribute names referenced by a filter expression.
///
/// References are square-bracketed: `[kind] = 'highway' AND [lanes] > 2`
/// yields `kind` and `lanes`. An unterminated bracket is ignored.
pub fn filter_attribute_names(filter: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = filter;

    while let Some(open) = rest.find('[') {
        rest = &rest[open + 1..];
        match rest.find(']') {
            Some(close) => {
                let name = rest[..close].trim();
                if !name.is_empty() {
                    names.push(name.to_string());
                }
                rest = &rest[close + 1..];
            }
            None => break,
        }
    }

    names
}
