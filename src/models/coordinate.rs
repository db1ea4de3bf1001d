//! Coordinate and bounding box primitives.

use serde::{Deserialize, Serialize};

use crate::error::CoordError;

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// A validated geographic point in degrees.
///
/// Construct through [`Coordinate::new`]; out-of-range and NaN values are
/// rejected rather than clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordError> {
        // Written so that NaN fails both checks.
        if !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(CoordError::InvalidLatitude(lat));
        }
        if !(MIN_LON..=MAX_LON).contains(&lon) {
            return Err(CoordError::InvalidLongitude(lon));
        }
        Ok(Self { lat, lon })
    }

    /// The same point expressed on the other side of the antimeridian.
    ///
    /// Only points exactly on ±180° have an alias.
    pub fn antimeridian_alias(&self) -> Option<Self> {
        if self.lon == MAX_LON || self.lon == MIN_LON {
            Some(Self {
                lat: self.lat,
                lon: -self.lon,
            })
        } else {
            None
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5},{:.5})", self.lat, self.lon)
    }
}

/// Axis-aligned bounding box.
///
/// Longitudes may exceed 180 for boxes of antimeridian-crossing polygons,
/// whose vertices are stored shifted into [0, 360).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// A box containing nothing, ready for [`BoundingBox::extend`].
    pub fn empty() -> Self {
        Self {
            min_lon: f64::INFINITY,
            min_lat: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            max_lat: f64::NEG_INFINITY,
        }
    }

    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon: min_lon.min(max_lon),
            min_lat: min_lat.min(max_lat),
            max_lon: min_lon.max(max_lon),
            max_lat: min_lat.max(max_lat),
        }
    }

    pub fn extend(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
    }

    pub fn is_empty(&self) -> bool {
        self.min_lon > self.max_lon || self.min_lat > self.max_lat
    }

    /// Inclusive containment test.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.max_lon > MAX_LON
    }

    /// Split into boxes that each lie within [-180, 180].
    ///
    /// A box extending past 180 yields its eastern part `[min_lon, 180]` and
    /// its wrapped western part `[-180, max_lon - 360]`.
    pub fn split_at_antimeridian(&self) -> Vec<BoundingBox> {
        if !self.crosses_antimeridian() {
            return vec![*self];
        }

        let mut parts = Vec::with_capacity(2);
        if self.min_lon <= MAX_LON {
            parts.push(BoundingBox::new(
                self.min_lon,
                self.min_lat,
                MAX_LON,
                self.max_lat,
            ));
        }
        let west_min = (self.min_lon - 360.0).max(MIN_LON);
        parts.push(BoundingBox::new(
            west_min,
            self.min_lat,
            self.max_lon - 360.0,
            self.max_lat,
        ));
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_extremes() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert_eq!(
            Coordinate::new(95.0, 0.0),
            Err(CoordError::InvalidLatitude(95.0))
        );
        assert_eq!(
            Coordinate::new(0.0, 200.0),
            Err(CoordError::InvalidLongitude(200.0))
        );
    }

    #[test]
    fn test_new_rejects_nan() {
        assert!(matches!(
            Coordinate::new(f64::NAN, 0.0),
            Err(CoordError::InvalidLatitude(_))
        ));
        assert!(matches!(
            Coordinate::new(0.0, f64::NAN),
            Err(CoordError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn test_antimeridian_alias() {
        let east = Coordinate::new(-17.0, 180.0).unwrap();
        assert_eq!(east.antimeridian_alias().unwrap().lon, -180.0);
        let west = Coordinate::new(-17.0, -180.0).unwrap();
        assert_eq!(west.antimeridian_alias().unwrap().lon, 180.0);
        assert!(Coordinate::new(-17.0, 179.9)
            .unwrap()
            .antimeridian_alias()
            .is_none());
    }

    #[test]
    fn test_bbox_extend_and_contains() {
        let mut bbox = BoundingBox::empty();
        assert!(bbox.is_empty());
        bbox.extend(-97.0, 29.0);
        bbox.extend(-85.0, 49.0);
        assert!(!bbox.is_empty());
        assert!(bbox.contains(-87.6, 41.8));
        assert!(bbox.contains(-85.0, 49.0));
        assert!(!bbox.contains(-84.9, 41.8));
    }

    #[test]
    fn test_split_non_crossing_is_identity() {
        let bbox = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
        assert_eq!(bbox.split_at_antimeridian(), vec![bbox]);
    }

    #[test]
    fn test_split_crossing() {
        // 177E .. 178W, stored unwrapped as 177 .. 182
        let bbox = BoundingBox::new(177.0, -20.0, 182.0, -15.0);
        let parts = bbox.split_at_antimeridian();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], BoundingBox::new(177.0, -20.0, 180.0, -15.0));
        assert_eq!(parts[1], BoundingBox::new(-180.0, -20.0, -178.0, -15.0));
    }
}
