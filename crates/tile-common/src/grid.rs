//! Scale-level grid math for the world-Mercator tile pyramid.
//!
//! Level `n` has 2^n x 2^n tiles spanning the full world extent. Row 0 is the
//! top (northernmost) row, column 0 the westernmost column.

use crate::address::TileAddress;
use crate::envelope::Envelope;

/// Half-width of the square world extent in projected meters.
pub const WORLD_EXTENT: f64 = 20037508.342789244;

/// Coarsest scale level of the pyramid.
pub const MIN_SCALE_LEVEL: u8 = 0;

/// Finest scale level of the pyramid.
pub const MAX_SCALE_LEVEL: u8 = 20;

/// The full world envelope in the working projection.
pub fn world_envelope() -> Envelope {
    Envelope::new(-WORLD_EXTENT, -WORLD_EXTENT, WORLD_EXTENT, WORLD_EXTENT)
}

/// A rectangle of tile indices at one scale level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRect {
    pub min_row: u32,
    pub max_row: u32,
    pub min_col: u32,
    pub max_col: u32,
}

impl GridRect {
    /// Number of tiles covered by the rectangle.
    pub fn tile_count(&self) -> u64 {
        let rows = (self.max_row - self.min_row + 1) as u64;
        let cols = (self.max_col - self.min_col + 1) as u64;
        rows * cols
    }
}

/// Number of tiles per side at a scale level.
fn tiles_per_side(scale_level: u8) -> u32 {
    1u32 << scale_level
}

/// Width (== height) of one tile in projected meters at a scale level.
fn tile_span(scale_level: u8) -> f64 {
    (2.0 * WORLD_EXTENT) / tiles_per_side(scale_level) as f64
}

/// The rectangle of tile indices intersecting `extent` at `scale_level`.
///
/// Returns `None` when the extent is degenerate or lies entirely outside the
/// world extent. Indices are clamped to the pyramid bounds, so a partially
/// out-of-world extent yields the in-world portion.
pub fn extent_to_grid(extent: &Envelope, scale_level: u8) -> Option<GridRect> {
    if extent.is_degenerate() {
        return None;
    }

    let clipped = extent.intersection(&world_envelope())?;

    let span = tile_span(scale_level);
    let last = tiles_per_side(scale_level) - 1;

    let col_of = |x: f64| (((x + WORLD_EXTENT) / span).floor() as i64).clamp(0, last as i64) as u32;
    let row_of = |y: f64| (((WORLD_EXTENT - y) / span).floor() as i64).clamp(0, last as i64) as u32;

    Some(GridRect {
        min_row: row_of(clipped.max_y),
        max_row: row_of(clipped.min_y),
        min_col: col_of(clipped.min_x),
        max_col: col_of(clipped.max_x),
    })
}

/// [`extent_to_grid`] gated on a feature class's visibility level: below
/// `min_visible_level` the class has no tiles and the whole level is skipped.
pub fn visible_grid(
    min_visible_level: u8,
    extent: &Envelope,
    scale_level: u8,
) -> Option<GridRect> {
    if scale_level < min_visible_level {
        return None;
    }
    extent_to_grid(extent, scale_level)
}

/// The bounding envelope of one tile.
///
/// Deterministic inverse of the grid mapping: the same (scale, row, col)
/// always yields a byte-identical envelope, which cache correctness and clip
/// reproducibility depend on.
pub fn tile_envelope(scale_level: u8, row: u32, col: u32) -> Envelope {
    let span = tile_span(scale_level);

    let min_x = -WORLD_EXTENT + col as f64 * span;
    let max_y = WORLD_EXTENT - row as f64 * span;

    Envelope::new(min_x, max_y - span, min_x + span, max_y)
}

/// The bounding envelope of an addressed tile.
pub fn address_envelope(address: &TileAddress) -> Envelope {
    tile_envelope(address.scale_level, address.row, address.col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::TileKind;

    #[test]
    fn test_level_zero_covers_world_with_one_tile() {
        let grid = extent_to_grid(&world_envelope(), 0).unwrap();
        assert_eq!(
            grid,
            GridRect {
                min_row: 0,
                max_row: 0,
                min_col: 0,
                max_col: 0
            }
        );
        assert_eq!(grid.tile_count(), 1);
    }

    #[test]
    fn test_world_extent_at_level_two() {
        let grid = extent_to_grid(&world_envelope(), 2).unwrap();
        assert_eq!(grid.min_row, 0);
        assert_eq!(grid.max_row, 3);
        assert_eq!(grid.min_col, 0);
        assert_eq!(grid.max_col, 3);
        assert_eq!(grid.tile_count(), 16);
    }

    #[test]
    fn test_degenerate_extent() {
        let degenerate = Envelope::new(5.0, 5.0, 5.0, 10.0);
        assert!(extent_to_grid(&degenerate, 3).is_none());
    }

    #[test]
    fn test_extent_outside_world() {
        let outside = Envelope::new(WORLD_EXTENT + 1.0, 0.0, WORLD_EXTENT + 2.0, 1.0);
        assert!(extent_to_grid(&outside, 3).is_none());
    }

    #[test]
    fn test_visible_grid_skips_below_visibility() {
        let extent = world_envelope();
        assert!(visible_grid(8, &extent, 7).is_none());
        assert!(visible_grid(8, &extent, 8).is_some());
    }

    #[test]
    fn test_tile_envelope_tiles_partition_row() {
        // Adjacent tiles in a row share an edge exactly.
        let a = tile_envelope(4, 7, 3);
        let b = tile_envelope(4, 7, 4);
        assert_eq!(a.max_x, b.min_x);
        assert_eq!(a.min_y, b.min_y);
        assert_eq!(a.max_y, b.max_y);
    }

    #[test]
    fn test_tile_envelope_row_zero_touches_top() {
        let top = tile_envelope(5, 0, 0);
        assert_eq!(top.max_y, WORLD_EXTENT);
        assert_eq!(top.min_x, -WORLD_EXTENT);
    }

    #[test]
    fn test_envelope_is_deterministic() {
        let address = TileAddress::new(9, 130, 255, "Roads", TileKind::Geometry);
        let first = address_envelope(&address);
        for _ in 0..10 {
            let again = address_envelope(&address);
            assert_eq!(first.min_x.to_bits(), again.min_x.to_bits());
            assert_eq!(first.min_y.to_bits(), again.min_y.to_bits());
            assert_eq!(first.max_x.to_bits(), again.max_x.to_bits());
            assert_eq!(first.max_y.to_bits(), again.max_y.to_bits());
        }
    }

    #[test]
    fn test_grid_cell_envelope_contains_extent_portion() {
        // Every cell envelope contains the portion of the extent that falls
        // into that cell.
        let extent = Envelope::new(-1000.0, -1000.0, 1000.0, 1000.0);
        let level = 10;
        let grid = extent_to_grid(&extent, level).unwrap();

        for row in grid.min_row..=grid.max_row {
            for col in grid.min_col..=grid.max_col {
                let cell = tile_envelope(level, row, col);
                let portion = extent.intersection(&cell);
                assert!(portion.is_some(), "cell ({row},{col}) must overlap extent");
                assert!(cell.contains(&portion.unwrap()));
            }
        }
    }

    #[test]
    fn test_point_extent_maps_to_single_cell_roundtrip() {
        let level = 12;
        let probe = Envelope::new(1234.5, -9876.5, 1234.6, -9876.4);
        let grid = extent_to_grid(&probe, level).unwrap();
        assert_eq!(grid.tile_count(), 1);

        let cell = tile_envelope(level, grid.min_row, grid.min_col);
        assert!(cell.contains(&probe));
    }
}
