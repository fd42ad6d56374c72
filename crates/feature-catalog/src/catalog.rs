//! Feature-class hierarchy index.
//!
//! The parent/child hierarchy is materialized once per catalog load into
//! owned maps (id, name, children adjacency). Traversal never relies on
//! back-references held by the classes themselves.

use std::collections::HashMap;

use tile_common::{TileError, TileResult};

use crate::types::FeatureClass;

/// All feature classes of a database, indexed for hierarchy traversal.
#[derive(Debug, Clone)]
pub struct FeatureClassCatalog {
    by_id: HashMap<i64, FeatureClass>,
    name_to_id: HashMap<String, i64>,
    children: HashMap<i64, Vec<i64>>,
}

impl FeatureClassCatalog {
    pub fn new(classes: Vec<FeatureClass>) -> TileResult<Self> {
        let mut by_id = HashMap::with_capacity(classes.len());
        let mut name_to_id = HashMap::with_capacity(classes.len());
        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();

        for class in classes {
            if name_to_id.insert(class.name.clone(), class.id).is_some() {
                return Err(TileError::Internal(format!(
                    "duplicate feature class name '{}'",
                    class.name
                )));
            }
            if let Some(parent_id) = class.parent_id {
                children.entry(parent_id).or_default().push(class.id);
            }
            if by_id.insert(class.id, class).is_some() {
                return Err(TileError::Internal("duplicate feature class id".into()));
            }
        }

        for parent_id in children.keys() {
            if !by_id.contains_key(parent_id) {
                return Err(TileError::Internal(format!(
                    "dangling parent id {parent_id} in feature class hierarchy"
                )));
            }
        }

        // Deterministic traversal order.
        for ids in children.values_mut() {
            ids.sort_unstable();
        }

        Ok(Self {
            by_id,
            name_to_id,
            children,
        })
    }

    pub fn get_by_id(&self, id: i64) -> Option<&FeatureClass> {
        self.by_id.get(&id)
    }

    /// Case-sensitive name lookup.
    pub fn get_by_name(&self, name: &str) -> Option<&FeatureClass> {
        self.name_to_id.get(name).and_then(|id| self.by_id.get(id))
    }

    /// The top-most ancestor of a class (the class itself when it is a root).
    pub fn root_of(&self, id: i64) -> Option<&FeatureClass> {
        let mut current = self.by_id.get(&id)?;
        let mut hops = 0;
        while let Some(parent_id) = current.parent_id {
            current = self.by_id.get(&parent_id)?;
            hops += 1;
            if hops > self.by_id.len() {
                // Cycle in the stored hierarchy; treat as broken catalog.
                return None;
            }
        }
        Some(current)
    }

    /// Direct children of a class.
    pub fn children_of(&self, id: i64) -> impl Iterator<Item = &FeatureClass> {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|child_id| self.by_id.get(child_id))
    }

    /// A class and all of its descendants, depth-first, deterministic order.
    pub fn family_of(&self, id: i64) -> Vec<&FeatureClass> {
        let mut family = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(class) = self.by_id.get(&current) {
                family.push(class);
                if let Some(child_ids) = self.children.get(&current) {
                    // Reverse keeps DFS order matching ascending child ids.
                    stack.extend(child_ids.iter().rev());
                }
            }
        }
        family
    }

    /// Ids of a class and all of its descendants.
    pub fn family_ids(&self, id: i64) -> Vec<i64> {
        self.family_of(id).iter().map(|c| c.id).collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
