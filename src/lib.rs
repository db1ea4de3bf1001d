//! tzmapper - offline coordinate to IANA timezone lookup
//!
//! This library provides the boundary store, spatial index and resolver
//! shared by the `lookup` and `query` binaries.

pub mod config;
pub mod error;
pub mod models;
pub mod pip;

pub use config::Config;
pub use error::{CoordError, LoadError};
pub use models::{Coordinate, LookupResult};
pub use pip::TimezoneService;
