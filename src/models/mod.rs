//! Core data models for timezone boundary lookup.

pub mod coordinate;
pub mod result;
pub mod zone;

pub use coordinate::{BoundingBox, Coordinate};
pub use result::LookupResult;
pub use zone::{Polygon, Ring, Zone};
