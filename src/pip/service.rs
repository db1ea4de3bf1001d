//! Timezone resolution service.

use rayon::prelude::*;
use tracing::{debug, info};

use super::geometry::contains;
use super::{DatasetSource, GridIndex, ZoneStore};
use crate::config::{Config, IndexConfig};
use crate::error::{CoordError, LoadError};
use crate::models::{Coordinate, LookupResult};

/// Coordinate-to-timezone lookup over one loaded dataset.
///
/// Immutable after construction; share it by reference or behind an `Arc`.
/// Several services over different datasets can coexist.
#[derive(Debug)]
pub struct TimezoneService {
    store: ZoneStore,
    index: GridIndex,
}

impl TimezoneService {
    /// Index an already loaded store.
    pub fn new(store: ZoneStore, config: &IndexConfig) -> Self {
        let index = GridIndex::build(&store, config);
        Self { store, index }
    }

    /// Load the configured dataset (or the bundled sample) and index it.
    pub fn initialize(config: &Config) -> Result<Self, LoadError> {
        let source = match &config.dataset.path {
            Some(path) => DatasetSource::Path(path.clone()),
            None => DatasetSource::Bundled,
        };
        let store = ZoneStore::load_with(&source, &config.validation)?;
        Ok(Self::new(store, &config.index))
    }

    /// Resolve a raw latitude/longitude pair.
    pub fn resolve(&self, lat: f64, lon: f64) -> Result<LookupResult, CoordError> {
        let coordinate = Coordinate::new(lat, lon)?;
        Ok(self.resolve_coordinate(coordinate))
    }

    /// Resolve a validated coordinate.
    ///
    /// When several zones contain the point, the zone whose containing
    /// polygon is smallest wins; equal areas fall back to identifier order.
    pub fn resolve_coordinate(&self, coordinate: Coordinate) -> LookupResult {
        let candidates = self.index.candidates_for(coordinate);
        if candidates.is_empty() {
            debug!("Lookup at {}: no candidates", coordinate);
            return LookupResult::NoMatch;
        }

        // (zone index, smallest containing polygon area)
        let mut matches: Vec<(u32, f64)> = Vec::new();
        for candidate in &candidates {
            let polygon = self.store.polygon(*candidate);
            if !contains(polygon, coordinate) {
                continue;
            }
            match matches.iter_mut().find(|(zone, _)| *zone == candidate.zone) {
                Some((_, area)) => *area = area.min(polygon.area),
                None => matches.push((candidate.zone, polygon.area)),
            }
        }

        debug!(
            "Lookup at {}: {} candidates, {} matching zones",
            coordinate,
            candidates.len(),
            matches.len()
        );

        let id = |zone: u32| self.store.all_zones()[zone as usize].id.as_str();

        match matches.as_mut_slice() {
            [] => LookupResult::NoMatch,
            [(zone, _)] => LookupResult::Resolved(id(*zone).to_string()),
            many => {
                many.sort_by(|(zone_a, area_a), (zone_b, area_b)| {
                    area_a
                        .total_cmp(area_b)
                        .then_with(|| id(*zone_a).cmp(id(*zone_b)))
                });
                let candidates: Vec<String> =
                    many.iter().map(|(zone, _)| id(*zone).to_string()).collect();
                LookupResult::Ambiguous {
                    zone: candidates[0].clone(),
                    candidates,
                }
            }
        }
    }

    /// Resolve many points in parallel; output order matches input order.
    pub fn resolve_batch(&self, points: &[(f64, f64)]) -> Vec<Result<LookupResult, CoordError>> {
        points
            .par_iter()
            .map(|&(lat, lon)| self.resolve(lat, lon))
            .collect()
    }

    /// Release the store and index.
    pub fn shutdown(self) {
        info!(
            "Shutting down timezone service ({} zones)",
            self.store.len()
        );
    }

    pub fn store(&self) -> &ZoneStore {
        &self.store
    }

    pub fn index(&self) -> &GridIndex {
        &self.index
    }
}
