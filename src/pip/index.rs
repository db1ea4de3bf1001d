//! Grid spatial index for fast candidate lookups.
//!
//! The world is cut into square cells of `cell_size_deg`. Every polygon is
//! registered into each cell its bounding box overlaps. Cells that end up
//! holding many polygons additionally get an R-tree over the entries' boxes.

use hashbrown::HashMap;
use rstar::{RTree, RTreeObject, AABB};
use tracing::{info, warn};

use super::{PolygonRef, ZoneStore};
use crate::config::IndexConfig;
use crate::models::coordinate::{MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use crate::models::{BoundingBox, Coordinate};

const MIN_CELL_SIZE: f64 = 0.01;
const MAX_CELL_SIZE: f64 = 90.0;

/// Grid bucket key: (latitude band, longitude band)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub lat_band: i32,
    pub lon_band: i32,
}

/// One bounding-box registration of a polygon
#[derive(Debug, Clone, Copy)]
struct CellEntry {
    polygon: PolygonRef,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for CellEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

#[derive(Debug, Default)]
struct Cell {
    entries: Vec<CellEntry>,
    /// Present only for polygon-dense cells
    tree: Option<RTree<CellEntry>>,
}

/// Grid index over the polygons of a [`ZoneStore`].
///
/// Holds only [`PolygonRef`] handles; the store keeps ownership.
#[derive(Debug)]
pub struct GridIndex {
    cell_size: f64,
    lat_bands: i32,
    lon_bands: i32,
    cells: HashMap<CellKey, Cell>,
    entry_count: usize,
    dense_cells: usize,
}

impl GridIndex {
    /// Build the index for every polygon in `store`.
    pub fn build(store: &ZoneStore, config: &IndexConfig) -> Self {
        let cell_size = sanitize_cell_size(config.cell_size_deg);
        info!(
            "Building spatial index for {} polygons ({}° cells)...",
            store.polygon_count(),
            cell_size
        );

        let mut index = Self {
            cell_size,
            lat_bands: ((MAX_LAT - MIN_LAT) / cell_size).ceil() as i32,
            lon_bands: ((MAX_LON - MIN_LON) / cell_size).ceil() as i32,
            cells: HashMap::new(),
            entry_count: 0,
            dense_cells: 0,
        };

        for polygon_ref in store.refs() {
            let polygon = store.polygon(polygon_ref);
            // A box crossing the antimeridian is registered as two entries
            for part in polygon.bbox.split_at_antimeridian() {
                index.register(polygon_ref, &part);
            }
        }

        for cell in index.cells.values_mut() {
            if cell.entries.len() > config.dense_cell_threshold {
                cell.tree = Some(RTree::bulk_load(cell.entries.clone()));
                index.dense_cells += 1;
            }
        }

        info!(
            "Spatial index built with {} entries in {} cells ({} dense)",
            index.entry_count,
            index.cells.len(),
            index.dense_cells
        );

        index
    }

    fn register(&mut self, polygon: PolygonRef, bbox: &BoundingBox) {
        let entry = CellEntry {
            polygon,
            envelope: AABB::from_corners([bbox.min_lon, bbox.min_lat], [bbox.max_lon, bbox.max_lat]),
        };

        let (lat_lo, lat_hi) = (self.lat_band(bbox.min_lat), self.lat_band(bbox.max_lat));
        let (lon_lo, lon_hi) = (self.lon_band(bbox.min_lon), self.lon_band(bbox.max_lon));

        for lat_band in lat_lo..=lat_hi {
            for lon_band in lon_lo..=lon_hi {
                self.cells
                    .entry(CellKey { lat_band, lon_band })
                    .or_default()
                    .entries
                    .push(entry);
                self.entry_count += 1;
            }
        }
    }

    fn lat_band(&self, lat: f64) -> i32 {
        (((lat - MIN_LAT) / self.cell_size).floor() as i32).clamp(0, self.lat_bands - 1)
    }

    fn lon_band(&self, lon: f64) -> i32 {
        (((lon - MIN_LON) / self.cell_size).floor() as i32).clamp(0, self.lon_bands - 1)
    }

    /// The cell a coordinate falls into.
    pub fn cell_key(&self, coordinate: Coordinate) -> CellKey {
        CellKey {
            lat_band: self.lat_band(coordinate.lat),
            lon_band: self.lon_band(coordinate.lon),
        }
    }

    /// Polygons that may contain `coordinate`, deduplicated, in store order.
    ///
    /// Bounding-box filtering only: never misses a containing polygon but
    /// may return polygons that do not contain the point.
    pub fn candidates_for(&self, coordinate: Coordinate) -> Vec<PolygonRef> {
        let mut candidates = Vec::new();

        let points = std::iter::once(coordinate).chain(coordinate.antimeridian_alias());
        for point in points {
            let Some(cell) = self.cells.get(&self.cell_key(point)) else {
                continue;
            };

            match &cell.tree {
                Some(tree) => candidates.extend(
                    tree.locate_in_envelope_intersecting(&AABB::from_point([point.lon, point.lat]))
                        .map(|entry| entry.polygon),
                ),
                None => candidates.extend(cell.entries.iter().map(|entry| entry.polygon)),
            }
        }

        candidates.sort_unstable();
        candidates.dedup();
        candidates
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Total polygon registrations across all cells
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn dense_cell_count(&self) -> usize {
        self.dense_cells
    }
}

fn sanitize_cell_size(cell_size: f64) -> f64 {
    if !cell_size.is_finite() || cell_size < MIN_CELL_SIZE {
        warn!(
            "Invalid cell size {}, using {}°",
            cell_size, MIN_CELL_SIZE
        );
        MIN_CELL_SIZE
    } else {
        cell_size.min(MAX_CELL_SIZE)
    }
}
