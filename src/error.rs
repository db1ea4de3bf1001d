//! Error types for dataset loading and coordinate validation.

use thiserror::Error;

use crate::models::coordinate::{MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// A query coordinate outside the valid range.
///
/// Reported per query; never affects shared state.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordError {
    /// Latitude is NaN or outside -90..=90
    #[error("invalid latitude: {0} (must be between {} and {})", MIN_LAT, MAX_LAT)]
    InvalidLatitude(f64),
    /// Longitude is NaN or outside -180..=180
    #[error("invalid longitude: {0} (must be between {} and {})", MIN_LON, MAX_LON)]
    InvalidLongitude(f64),
}

/// The boundary dataset is malformed or internally inconsistent.
///
/// Fatal at initialization: no partially loaded store is ever returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decompress dataset body: {0}")]
    Decompress(std::io::Error),

    #[error("malformed dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dataset does not start with a known header")]
    BadMagic,

    #[error("unsupported dataset format version {0}")]
    UnsupportedVersion(u16),

    #[error("dataset checksum mismatch (expected {expected:016x}, found {found:016x})")]
    ChecksumMismatch { expected: u64, found: u64 },

    #[error("zone #{index} has an empty identifier")]
    EmptyIdentifier { index: usize },

    #[error("zone '{0}' appears more than once")]
    DuplicateZone(String),

    #[error("zone '{0}' has no polygons")]
    EmptyZone(String),

    #[error("zone '{zone}' polygon {polygon} has a ring with {vertices} distinct vertices (need at least 3)")]
    DegenerateRing {
        zone: String,
        polygon: usize,
        vertices: usize,
    },

    #[error("zone '{zone}' polygon {polygon} outer ring intersects itself")]
    SelfIntersection { zone: String, polygon: usize },

    #[error("zone '{zone}' polygon {polygon} has vertex ({lon}, {lat}) out of range")]
    VertexOutOfRange {
        zone: String,
        polygon: usize,
        lon: f64,
        lat: f64,
    },
}
