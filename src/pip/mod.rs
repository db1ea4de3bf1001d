//! Point-in-polygon timezone lookup.
//!
//! Loads timezone boundaries into a [`ZoneStore`], indexes them with a
//! coarse grid ([`GridIndex`]) and resolves coordinates to IANA zone
//! identifiers through [`TimezoneService`].

mod boundary;
pub mod dataset;
pub mod geometry;
mod index;
mod service;

pub use boundary::{PolygonRef, ZoneStore};
pub use dataset::DatasetSource;
pub use index::{CellKey, GridIndex};
pub use service::TimezoneService;
