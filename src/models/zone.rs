//! Timezone boundary geometry: rings, polygons and zones.

use geo::Area;
use geo_types::{Coord, LineString};

use super::coordinate::BoundingBox;

/// Longitude jump between consecutive vertices that marks an antimeridian crossing.
///
/// Any edge jumping further than this is read as taking the short way across
/// ±180. The only exempt edges are those with both ends exactly on ±180. A
/// world-spanning ring must therefore put its seam vertices exactly on ±180:
/// one closed through ±179.5 is read as the 1° sliver across the meridian.
const ANTIMERIDIAN_JUMP: f64 = 180.0;

/// A closed boundary ring. Vertices are stored as `x = lon`, `y = lat`,
/// with the first vertex repeated at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    coords: Vec<Coord<f64>>,
}

impl Ring {
    /// Build a ring from `[lon, lat]` pairs.
    ///
    /// Consecutive duplicate vertices are dropped and the ring is closed.
    pub fn from_lon_lat(points: &[[f64; 2]]) -> Self {
        let mut coords: Vec<Coord<f64>> = Vec::with_capacity(points.len() + 1);
        for [lon, lat] in points {
            let c = Coord { x: *lon, y: *lat };
            if coords.last() != Some(&c) {
                coords.push(c);
            }
        }

        // Drop an explicit closing vertex so closing below is uniform
        while coords.len() > 1 && coords.first() == coords.last() {
            coords.pop();
        }
        if let Some(first) = coords.first().copied() {
            coords.push(first);
        }

        Self { coords }
    }

    /// All vertices, closing vertex included.
    pub fn coords(&self) -> &[Coord<f64>] {
        &self.coords
    }

    /// Number of distinct vertices (closing vertex excluded).
    pub fn distinct_len(&self) -> usize {
        self.coords.len().saturating_sub(1)
    }

    /// Iterate over the ring's edges.
    pub fn edges(&self) -> impl Iterator<Item = (Coord<f64>, Coord<f64>)> + '_ {
        self.coords.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn bbox(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for c in &self.coords {
            bbox.extend(c.x, c.y);
        }
        bbox
    }

    /// Does any edge jump across the ±180° meridian?
    ///
    /// An edge running along a parallel from -180 to 180 (world-spanning
    /// rings such as Antarctica) is not a jump.
    pub fn has_antimeridian_jump(&self) -> bool {
        self.edges().any(|(a, b)| {
            (b.x - a.x).abs() > ANTIMERIDIAN_JUMP && !(on_meridian(a.x) && on_meridian(b.x))
        })
    }

    /// Shift western longitudes by +360 so the ring is continuous across 180°.
    fn unwrapped(&self) -> Self {
        Self {
            coords: self
                .coords
                .iter()
                .map(|c| Coord {
                    x: unwrap_lon(c.x),
                    y: c.y,
                })
                .collect(),
        }
    }

    fn to_line_string(&self) -> LineString<f64> {
        LineString::new(self.coords.clone())
    }
}

#[inline]
fn on_meridian(lon: f64) -> bool {
    lon.abs() == 180.0
}

/// Map a longitude into the [0, 360) space used by antimeridian-crossing polygons.
#[inline]
pub fn unwrap_lon(lon: f64) -> f64 {
    if lon < 0.0 {
        lon + 360.0
    } else {
        lon
    }
}

/// One outer ring plus optional holes.
///
/// Polygons crossing the antimeridian keep every ring in unwrapped longitude
/// space (see [`unwrap_lon`]); `bbox` is expressed in the same space.
#[derive(Debug, Clone)]
pub struct Polygon {
    pub outer: Ring,
    pub holes: Vec<Ring>,
    pub crosses_antimeridian: bool,
    pub bbox: BoundingBox,
    /// Planar area in square degrees, holes subtracted
    pub area: f64,
}

impl Polygon {
    pub fn new(outer: Ring, holes: Vec<Ring>) -> Self {
        let crosses_antimeridian = outer.has_antimeridian_jump();

        let (outer, holes) = if crosses_antimeridian {
            let holes = holes.iter().map(Ring::unwrapped).collect();
            (outer.unwrapped(), holes)
        } else {
            (outer, holes)
        };

        let bbox = outer.bbox();
        let area = geo_types::Polygon::new(
            outer.to_line_string(),
            holes.iter().map(Ring::to_line_string).collect(),
        )
        .unsigned_area();

        Self {
            outer,
            holes,
            crosses_antimeridian,
            bbox,
            area,
        }
    }

    /// Every ring of the polygon, outer first.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }
}

/// A named timezone region.
#[derive(Debug, Clone)]
pub struct Zone {
    /// Canonical IANA identifier, e.g. "America/Chicago"
    pub id: String,
    pub polygons: Vec<Polygon>,
}

impl Zone {
    pub fn new(id: impl Into<String>, polygons: Vec<Polygon>) -> Self {
        Self {
            id: id.into(),
            polygons,
        }
    }

    /// Total area over all parts.
    pub fn area(&self) -> f64 {
        self.polygons.iter().map(|p| p.area).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.polygons
            .iter()
            .flat_map(Polygon::rings)
            .map(Ring::distinct_len)
            .sum()
    }
}
