//! The geometry-preparation contract.
//!
//! Clipping a feature's geometry to the tile envelope, simplifying it for
//! the scale level, and quantizing coordinates to the tile's byte width is
//! an external concern; the generator only depends on this contract.

use feature_catalog::{FeatureClass, FeatureGeometry};
use tile_common::{TileAddress, TileAttribute, TileResult, TileShape};

/// Output of preparing one class's shapes for one tile.
#[derive(Debug, Default)]
pub struct PreparedShapes {
    /// Shapes clipped to the tile. May be topologically invalid after
    /// clipping; that is accepted output.
    pub shapes: Vec<TileShape>,
    /// Attribute records needed to re-style features the clipping altered.
    pub component_attributes: Vec<TileAttribute>,
}

/// Clips, simplifies, and encodes shapes for one tile.
pub trait GeometryTilePreparer: Send + Sync {
    fn prepare(
        &self,
        address: &TileAddress,
        class: &FeatureClass,
        shapes: &[FeatureGeometry],
        coordinate_size: u8,
    ) -> TileResult<PreparedShapes>;
}

/// Baseline preparer: passes shapes through untouched and derives no
/// component attributes.
///
/// The feature repository already restricts shapes to those intersecting the
/// tile envelope, so this is a usable stand-in wherever real clipping and
/// simplification has not been wired in.
#[derive(Debug, Default)]
pub struct PassthroughPreparer;

impl GeometryTilePreparer for PassthroughPreparer {
    fn prepare(
        &self,
        _address: &TileAddress,
        _class: &FeatureClass,
        shapes: &[FeatureGeometry],
        _coordinate_size: u8,
    ) -> TileResult<PreparedShapes> {
        Ok(PreparedShapes {
            shapes: shapes
                .iter()
                .map(|shape| TileShape {
                    feature_id: shape.feature_id,
                    geometry: shape.geometry.clone(),
                })
                .collect(),
            component_attributes: Vec::new(),
        })
    }
}
