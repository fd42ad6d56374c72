//! Feature-class and feature domain types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tile_common::Envelope;

/// A named, possibly hierarchical schema for a set of geographic features.
///
/// Owned by the catalog and read-only to the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureClass {
    pub id: i64,
    /// Parent class id; `None` for a root of a class family.
    pub parent_id: Option<i64>,
    pub name: String,
    /// Scale level below which the class has no tiles.
    pub min_visible_level: u8,
    /// Scale level at/above which geometry is stored at full precision.
    pub min_nongeneralized_level: u8,
    /// Attribute names defined on the class.
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl FeatureClass {
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }
}

/// A reference into a directory (classifier) table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryValue {
    pub syscode: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// One attribute value of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Directory(DirectoryValue),
}

impl AttributeValue {
    /// Directory syscode, when this value is a directory reference.
    pub fn directory_syscode(&self) -> Option<i64> {
        match self {
            AttributeValue::Directory(d) => Some(d.syscode),
            _ => None,
        }
    }

    /// JSON form used in attribute tiles.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttributeValue::Null => serde_json::Value::Null,
            AttributeValue::Integer(v) => serde_json::json!(v),
            AttributeValue::Real(v) => serde_json::json!(v),
            AttributeValue::Text(v) => serde_json::json!(v),
            AttributeValue::Directory(d) => serde_json::json!({
                "syscode": d.syscode,
                "name": d.name,
            }),
        }
    }
}

/// One geographic record: geometry plus attribute values.
///
/// Transient — read per query, never persisted by this core. The envelope is
/// the geometry's bounding rectangle in the working projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: i64,
    pub envelope: Envelope,
    #[serde(default)]
    pub geometry: Vec<u8>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Feature {
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

/// A feature's raw geometry as handed to the tile preparer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureGeometry {
    pub feature_id: i64,
    pub geometry: Vec<u8>,
}
