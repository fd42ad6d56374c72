//! Tile content types: geometry tiles, attribute tiles, and the bundle
//! produced by one geometry-tile generation.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::address::TileAddress;
use crate::error::TileResult;

/// One clipped/simplified shape inside a geometry tile.
///
/// Geometry that results from clipping may be topologically invalid
/// (self-intersecting, degenerate). That is accepted output, not an error;
/// consumers must tolerate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileShape {
    pub feature_id: i64,
    pub geometry: Vec<u8>,
}

/// A geometry tile: per originating sub-class id, the ordered shapes that
/// survived clipping, plus the coordinate byte width used for encoding.
///
/// `BTreeMap` keeps the per-class ordering deterministic so regeneration over
/// an unchanged database is byte-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryTile {
    pub address: TileAddress,
    pub shapes: BTreeMap<i64, Vec<TileShape>>,
    pub coordinate_size: u8,
}

impl GeometryTile {
    /// Total number of shapes across all originating classes.
    pub fn shape_count(&self) -> usize {
        self.shapes.values().map(Vec::len).sum()
    }
}

/// One feature's value for one attribute, scoped to a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileAttribute {
    pub feature_id: i64,
    pub value: serde_json::Value,
}

/// An attribute tile: values of one attribute over the features intersecting
/// the tile, ordered by feature identifier for determinism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeTile {
    pub address: TileAddress,
    pub attributes: Vec<TileAttribute>,
}

/// A geometry tile plus the attribute tiles produced alongside it.
///
/// Transport bundle only: constructed once per geometry-tile generation,
/// consumed immediately by the cache-fill or bulk caller, then discarded.
/// Storage persists each contained tile independently under its own address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryAndAttributeTiles {
    pub geometry: GeometryTile,
    pub attributes: Vec<AttributeTile>,
}

impl GeometryAndAttributeTiles {
    pub fn new(geometry: GeometryTile) -> Self {
        Self {
            geometry,
            attributes: Vec::new(),
        }
    }
}

/// A tile in its stored form: address plus encoded content.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub address: TileAddress,
    pub content: Bytes,
}

impl Tile {
    /// Encode a geometry tile for storage.
    pub fn from_geometry(tile: &GeometryTile) -> TileResult<Self> {
        Ok(Self {
            address: tile.address.clone(),
            content: Bytes::from(serde_json::to_vec(tile)?),
        })
    }

    /// Encode an attribute tile for storage.
    pub fn from_attributes(tile: &AttributeTile) -> TileResult<Self> {
        Ok(Self {
            address: tile.address.clone(),
            content: Bytes::from(serde_json::to_vec(tile)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::TileKind;

    fn geometry_tile() -> GeometryTile {
        let mut shapes = BTreeMap::new();
        shapes.insert(
            1,
            vec![
                TileShape {
                    feature_id: 10,
                    geometry: vec![1, 2, 3],
                },
                TileShape {
                    feature_id: 11,
                    geometry: vec![4, 5],
                },
            ],
        );
        shapes.insert(
            2,
            vec![TileShape {
                feature_id: 20,
                geometry: vec![9],
            }],
        );

        GeometryTile {
            address: TileAddress::new(3, 1, 2, "Roads", TileKind::Geometry),
            shapes,
            coordinate_size: 2,
        }
    }

    #[test]
    fn test_shape_count() {
        assert_eq!(geometry_tile().shape_count(), 3);
    }

    #[test]
    fn test_geometry_encoding_is_reproducible() {
        let tile = geometry_tile();
        let first = Tile::from_geometry(&tile).unwrap();
        let second = Tile::from_geometry(&tile).unwrap();
        assert_eq!(first.content, second.content);
    }

    #[test]
    fn test_attribute_encoding_roundtrip() {
        let tile = AttributeTile {
            address: TileAddress::new(3, 1, 2, "Roads", TileKind::Attribute("name".into())),
            attributes: vec![
                TileAttribute {
                    feature_id: 1,
                    value: serde_json::json!("Main St"),
                },
                TileAttribute {
                    feature_id: 2,
                    value: serde_json::json!(42),
                },
            ],
        };

        let stored = Tile::from_attributes(&tile).unwrap();
        let decoded: AttributeTile = serde_json::from_slice(&stored.content).unwrap();
        assert_eq!(decoded, tile);
    }
}
