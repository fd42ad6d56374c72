//! Tile addresses: the identity of a cached unit of map data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a tile carries.
///
/// The source system encoded this as a reserved attribute-name string; a
/// tagged variant removes the invalid-state combinations outright.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Clipped/simplified vector shapes for a feature class.
    Geometry,
    /// Values of one named attribute for a feature class.
    Attribute(String),
    /// The synthetic attribute tile produced as a side effect of geometry
    /// clipping, carrying attributes needed to re-style surviving features.
    ComponentAttributes,
}

impl TileKind {
    pub fn is_geometry(&self) -> bool {
        matches!(self, TileKind::Geometry)
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileKind::Geometry => write!(f, "@geom"),
            TileKind::Attribute(name) => write!(f, "{name}"),
            TileKind::ComponentAttributes => write!(f, "@components"),
        }
    }
}

/// Immutable identity of a tile.
///
/// Two addresses refer to the same cache entry iff all fields except `hash`
/// are equal; the hash is assigned by storage at save time and a new address
/// is constructed when it becomes known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileAddress {
    pub scale_level: u8,
    pub row: u32,
    pub col: u32,
    pub feature_class: String,
    pub kind: TileKind,
    /// Content hash, `None` until the tile has been stored.
    pub hash: Option<String>,
}

impl TileAddress {
    /// Create an address with an unresolved hash.
    pub fn new(
        scale_level: u8,
        row: u32,
        col: u32,
        feature_class: impl Into<String>,
        kind: TileKind,
    ) -> Self {
        Self {
            scale_level,
            row,
            col,
            feature_class: feature_class.into(),
            kind,
            hash: None,
        }
    }

    pub fn is_geometry(&self) -> bool {
        self.kind.is_geometry()
    }

    /// The cache identity of this address: every field except the hash.
    pub fn key(&self) -> TileKey {
        TileKey {
            scale_level: self.scale_level,
            row: self.row,
            col: self.col,
            feature_class: self.feature_class.clone(),
            kind: self.kind.clone(),
        }
    }

    /// The single-flight key for cache filling.
    ///
    /// A component-attribute tile is produced by the same generation call as
    /// its paired geometry tile, so both addresses map onto the geometry key
    /// and concurrent requests for either join one generation.
    pub fn normalized_fill_key(&self) -> TileKey {
        let mut key = self.key();
        if key.kind == TileKind::ComponentAttributes {
            key.kind = TileKind::Geometry;
        }
        key
    }

    /// A copy of this address with the content hash resolved.
    pub fn with_hash(&self, hash: impl Into<String>) -> Self {
        Self {
            hash: Some(hash.into()),
            ..self.clone()
        }
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.feature_class, self.scale_level, self.row, self.col, self.kind
        )
    }
}

/// Cache identity of a tile: a [`TileAddress`] without the hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileKey {
    pub scale_level: u8,
    pub row: u32,
    pub col: u32,
    pub feature_class: String,
    pub kind: TileKind,
}

impl TileKey {
    /// The address this key identifies, with an unresolved hash.
    pub fn to_address(&self) -> TileAddress {
        TileAddress {
            scale_level: self.scale_level,
            row: self.row,
            col: self.col,
            feature_class: self.feature_class.clone(),
            kind: self.kind.clone(),
            hash: None,
        }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.feature_class, self.scale_level, self.row, self.col, self.kind
        )
    }
}
