//! Timezone boundary store.

use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;
use tracing::info;

use super::dataset::{CompiledDataset, CompiledPolygon, CompiledZone, DatasetSource};
use super::geometry::ring_self_intersects;
use crate::config::ValidationConfig;
use crate::error::LoadError;
use crate::models::coordinate::{MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use crate::models::{Polygon, Ring, Zone};

/// Non-owning handle to one polygon of one zone in a [`ZoneStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolygonRef {
    pub zone: u32,
    pub polygon: u32,
}

/// All timezone zones of a dataset, validated and immutable.
#[derive(Debug)]
pub struct ZoneStore {
    zones: Vec<Zone>,
    by_id: HashMap<String, usize>,
}

impl ZoneStore {
    /// Load and validate a dataset with default validation settings.
    pub fn load(source: &DatasetSource) -> Result<Self, LoadError> {
        Self::load_with(source, &ValidationConfig::default())
    }

    pub fn load_with(
        source: &DatasetSource,
        validation: &ValidationConfig,
    ) -> Result<Self, LoadError> {
        info!("Loading timezone boundaries...");
        let dataset = source.read()?;
        Self::from_dataset(dataset, validation)
    }

    /// Build a store from a decoded dataset.
    ///
    /// Fails on the first structural problem in dataset order; nothing is
    /// kept from a failed build.
    pub fn from_dataset(
        dataset: CompiledDataset,
        validation: &ValidationConfig,
    ) -> Result<Self, LoadError> {
        {
            let mut seen: HashSet<&str> = HashSet::with_capacity(dataset.zones.len());
            for (index, zone) in dataset.zones.iter().enumerate() {
                if zone.id.trim().is_empty() {
                    return Err(LoadError::EmptyIdentifier { index });
                }
                if !seen.insert(zone.id.as_str()) {
                    return Err(LoadError::DuplicateZone(zone.id.clone()));
                }
            }
        }

        let built: Vec<Result<Zone, LoadError>> = dataset
            .zones
            .into_par_iter()
            .map(|zone| build_zone(zone, validation))
            .collect();
        let zones = built.into_iter().collect::<Result<Vec<_>, _>>()?;

        let by_id = zones
            .iter()
            .enumerate()
            .map(|(i, zone)| (zone.id.clone(), i))
            .collect();

        let store = Self { zones, by_id };
        info!(
            "Loaded {} zones ({} polygons, {} vertices)",
            store.len(),
            store.polygon_count(),
            store.zones.iter().map(Zone::vertex_count).sum::<usize>()
        );
        Ok(store)
    }

    /// All zones in dataset order.
    pub fn all_zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Look up a zone by identifier.
    pub fn zone(&self, id: &str) -> Option<&Zone> {
        self.by_id.get(id).map(|&i| &self.zones[i])
    }

    /// The zone a polygon handle belongs to.
    pub fn zone_of(&self, polygon: PolygonRef) -> &Zone {
        &self.zones[polygon.zone as usize]
    }

    pub fn polygon(&self, polygon: PolygonRef) -> &Polygon {
        &self.zones[polygon.zone as usize].polygons[polygon.polygon as usize]
    }

    /// Handles to every polygon, in store order.
    pub fn refs(&self) -> impl Iterator<Item = PolygonRef> + '_ {
        self.zones.iter().enumerate().flat_map(|(z, zone)| {
            (0..zone.polygons.len()).map(move |p| PolygonRef {
                zone: z as u32,
                polygon: p as u32,
            })
        })
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn polygon_count(&self) -> usize {
        self.zones.iter().map(|z| z.polygons.len()).sum()
    }
}

fn build_zone(zone: CompiledZone, validation: &ValidationConfig) -> Result<Zone, LoadError> {
    if zone.polygons.is_empty() {
        return Err(LoadError::EmptyZone(zone.id));
    }

    let polygons = zone
        .polygons
        .iter()
        .enumerate()
        .map(|(i, polygon)| build_polygon(&zone.id, i, polygon, validation))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Zone::new(zone.id, polygons))
}

fn build_polygon(
    zone: &str,
    index: usize,
    raw: &CompiledPolygon,
    validation: &ValidationConfig,
) -> Result<Polygon, LoadError> {
    let ring = |points: &[[f64; 2]]| -> Result<Ring, LoadError> {
        if let Some([lon, lat]) = points.iter().find(|p| !vertex_in_range(p)) {
            return Err(LoadError::VertexOutOfRange {
                zone: zone.to_string(),
                polygon: index,
                lon: *lon,
                lat: *lat,
            });
        }

        let ring = Ring::from_lon_lat(points);
        if ring.distinct_len() < 3 {
            return Err(LoadError::DegenerateRing {
                zone: zone.to_string(),
                polygon: index,
                vertices: ring.distinct_len(),
            });
        }
        Ok(ring)
    };

    let outer = ring(&raw.outer)?;
    let holes = raw
        .holes
        .iter()
        .map(|hole| ring(hole))
        .collect::<Result<Vec<_>, _>>()?;

    let polygon = Polygon::new(outer, holes);

    // Checked after construction so crossing rings are tested unwrapped
    if polygon.outer.distinct_len() <= validation.self_intersection_vertex_limit
        && ring_self_intersects(&polygon.outer)
    {
        return Err(LoadError::SelfIntersection {
            zone: zone.to_string(),
            polygon: index,
        });
    }

    Ok(polygon)
}

fn vertex_in_range([lon, lat]: &[f64; 2]) -> bool {
    (MIN_LON..=MAX_LON).contains(lon) && (MIN_LAT..=MAX_LAT).contains(lat)
}
