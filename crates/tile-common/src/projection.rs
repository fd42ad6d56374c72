//! Reprojection at the request boundary.
//!
//! Request extents arrive in geographic coordinates and are reprojected to
//! the working world-Mercator projection before being handed to the
//! generator. Only the envelope conversion lives here; geometry reprojection
//! is the feature repository's concern.

use crate::envelope::Envelope;
use crate::error::{TileError, TileResult};
use crate::grid::WORLD_EXTENT;

/// Latitude beyond which the spherical Mercator projection is unusable.
const MAX_LATITUDE: f64 = 85.05112878;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionId {
    /// WGS84 longitude/latitude in degrees.
    Geographic,
    /// Spherical ("world") Mercator in meters.
    WorldMercator,
}

/// Converts envelopes between the geographic and world-Mercator projections.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionConverter {
    from: ProjectionId,
    to: ProjectionId,
}

impl ProjectionConverter {
    pub fn new(from: ProjectionId, to: ProjectionId) -> Self {
        Self { from, to }
    }

    pub fn convert_envelope(&self, envelope: &Envelope) -> TileResult<Envelope> {
        match (self.from, self.to) {
            (ProjectionId::Geographic, ProjectionId::WorldMercator) => {
                let (min_x, min_y) = geographic_to_mercator(envelope.min_x, envelope.min_y)?;
                let (max_x, max_y) = geographic_to_mercator(envelope.max_x, envelope.max_y)?;
                Ok(Envelope::new(min_x, min_y, max_x, max_y))
            }
            (ProjectionId::WorldMercator, ProjectionId::Geographic) => {
                let (min_x, min_y) = mercator_to_geographic(envelope.min_x, envelope.min_y);
                let (max_x, max_y) = mercator_to_geographic(envelope.max_x, envelope.max_y);
                Ok(Envelope::new(min_x, min_y, max_x, max_y))
            }
            _ => Ok(*envelope),
        }
    }
}

fn geographic_to_mercator(lon: f64, lat: f64) -> TileResult<(f64, f64)> {
    if !(-180.0..=180.0).contains(&lon) {
        return Err(TileError::InvalidExtent(format!(
            "longitude {lon} out of range"
        )));
    }

    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = lon / 180.0 * WORLD_EXTENT;
    let y = (lat.to_radians() / 2.0 + std::f64::consts::FRAC_PI_4)
        .tan()
        .ln()
        / std::f64::consts::PI
        * WORLD_EXTENT;

    Ok((x, y))
}

fn mercator_to_geographic(x: f64, y: f64) -> (f64, f64) {
    let lon = x / WORLD_EXTENT * 180.0;
    let lat = ((y / WORLD_EXTENT * std::f64::consts::PI).exp().atan() * 2.0
        - std::f64::consts::FRAC_PI_2)
        .to_degrees();
    (lon, lat)
}
