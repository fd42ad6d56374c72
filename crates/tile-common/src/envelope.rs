//! Envelope (axis-aligned bounding rectangle) type and operations.

use serde::{Deserialize, Serialize};

/// A geographic or projected envelope.
///
/// For geographic coordinates the values are degrees; for the working
/// world-Mercator projection they are meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    /// Create a new envelope from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse an extent parameter string: "minx,miny,maxx,maxy"
    pub fn parse(s: &str) -> Result<Self, EnvelopeParseError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(EnvelopeParseError::InvalidFormat(s.to_string()));
        }

        let mut values = [0f64; 4];
        for (i, part) in parts.iter().enumerate() {
            values[i] = part
                .trim()
                .parse()
                .map_err(|_| EnvelopeParseError::InvalidNumber(part.to_string()))?;
        }

        let envelope = Self::new(values[0], values[1], values[2], values[3]);
        if envelope.is_degenerate() {
            return Err(EnvelopeParseError::Degenerate(s.to_string()));
        }

        Ok(envelope)
    }

    /// Width of the envelope in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the envelope in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True when the envelope encloses no area (inverted or zero-size),
    /// or any corner is not a finite number.
    pub fn is_degenerate(&self) -> bool {
        !(self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite())
            || self.min_x >= self.max_x
            || self.min_y >= self.max_y
    }

    /// Check if this envelope intersects another.
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Compute the intersection of two envelopes.
    pub fn intersection(&self, other: &Envelope) -> Option<Envelope> {
        if !self.intersects(other) {
            return None;
        }

        Some(Envelope {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }

    /// Check if a point is contained within this envelope.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Check if another envelope lies entirely within this one.
    pub fn contains(&self, other: &Envelope) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeParseError {
    #[error("invalid extent format: {0}. Expected 'minx,miny,maxx,maxy'")]
    InvalidFormat(String),

    #[error("invalid number in extent: {0}")]
    InvalidNumber(String),

    #[error("degenerate extent: {0}")]
    Degenerate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extent() {
        let envelope = Envelope::parse("-125.0,24.0,-66.0,50.0").unwrap();
        assert_eq!(envelope.min_x, -125.0);
        assert_eq!(envelope.min_y, 24.0);
        assert_eq!(envelope.max_x, -66.0);
        assert_eq!(envelope.max_y, 50.0);
    }

    #[test]
    fn test_parse_rejects_wrong_arity() {
        assert!(Envelope::parse("1,2,3").is_err());
        assert!(Envelope::parse("1,2,3,4,5").is_err());
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(Envelope::parse("a,2,3,4").is_err());
    }

    #[test]
    fn test_parse_rejects_inverted() {
        assert!(Envelope::parse("10.0,0.0,-10.0,5.0").is_err());
    }

    #[test]
    fn test_intersects() {
        let a = Envelope::new(0.0, 0.0, 10.0, 10.0);
        let b = Envelope::new(5.0, 5.0, 15.0, 15.0);
        let c = Envelope::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_intersection() {
        let a = Envelope::new(0.0, 0.0, 10.0, 10.0);
        let b = Envelope::new(5.0, 5.0, 15.0, 15.0);

        let i = a.intersection(&b).unwrap();
        assert_eq!(i, Envelope::new(5.0, 5.0, 10.0, 10.0));
        assert!(a.intersection(&Envelope::new(20.0, 20.0, 30.0, 30.0)).is_none());
    }

    #[test]
    fn test_degenerate() {
        assert!(Envelope::new(1.0, 1.0, 1.0, 5.0).is_degenerate());
        assert!(Envelope::new(1.0, 1.0, 0.0, 5.0).is_degenerate());
        assert!(Envelope::new(0.0, 0.0, f64::NAN, 5.0).is_degenerate());
        assert!(!Envelope::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }
}
