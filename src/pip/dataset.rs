//! Dataset asset decoding.
//!
//! Three encodings are accepted and detected from the leading bytes:
//!
//! - the binary envelope: `TZMB`, a little-endian `u16` format version, a
//!   little-endian `u64` xxh64 checksum of the body, then the gzip-compressed
//!   compiled JSON body
//! - compiled JSON: `{"version": 1, "zones": [{"id", "polygons": [{"outer", "holes"}]}]}`
//! - the boundary generator's polygon list: `[{"tz", "polygon"}]`, one
//!   ring per entry, with `"uninhabited"` entries skipped. Rings use the
//!   shapefile winding: clockwise rings are outer boundaries and
//!   counter-clockwise rings are holes of the same zone
//!
//! All coordinates are `[lon, lat]` pairs.

use std::borrow::Cow;
use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use geo::{Area, Contains};
use geo_types::{LineString, Polygon};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use xxhash_rust::xxh64::xxh64;

use crate::error::LoadError;

/// Leading bytes of the binary envelope
pub const MAGIC: &[u8; 4] = b"TZMB";

/// The only format version this build reads and writes
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = 4 + 2 + 8;

/// Zone tag the boundary generator uses for unclaimed areas
const UNINHABITED: &str = "uninhabited";

/// Sample dataset compiled into the crate
static BUNDLED: &[u8] = include_bytes!("../../data/sample_zones.json");

/// Where to read the boundary dataset from.
#[derive(Debug, Clone)]
pub enum DatasetSource {
    /// A dataset file on disk
    Path(PathBuf),
    /// An in-memory asset
    Bytes(Cow<'static, [u8]>),
    /// The sample dataset shipped with the crate
    Bundled,
}

impl DatasetSource {
    /// Read and decode the dataset.
    pub fn read(&self) -> Result<CompiledDataset, LoadError> {
        match self {
            DatasetSource::Path(path) => {
                info!("Reading dataset from {}", path.display());
                let bytes = fs::read(path)?;
                decode(&bytes)
            }
            DatasetSource::Bytes(bytes) => decode(bytes),
            DatasetSource::Bundled => {
                debug!("Using bundled sample dataset");
                decode(BUNDLED)
            }
        }
    }
}

/// Compiled dataset document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledDataset {
    pub version: u16,
    pub zones: Vec<CompiledZone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledZone {
    pub id: String,
    pub polygons: Vec<CompiledPolygon>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledPolygon {
    pub outer: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<[f64; 2]>>,
}

/// One entry of the boundary generator's polygon list
#[derive(Debug, Deserialize)]
struct LegacyPolygon {
    tz: String,
    polygon: Vec<[f64; 2]>,
}

/// Decode any supported encoding.
pub fn decode(bytes: &[u8]) -> Result<CompiledDataset, LoadError> {
    if bytes.starts_with(MAGIC) {
        return decode_envelope(bytes);
    }

    let text = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match text.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => decode_compiled_json(text),
        Some(b'[') => decode_legacy_json(text),
        _ => Err(LoadError::BadMagic),
    }
}

fn decode_envelope(bytes: &[u8]) -> Result<CompiledDataset, LoadError> {
    if bytes.len() < HEADER_LEN {
        return Err(LoadError::Io(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            "truncated dataset header",
        )));
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != FORMAT_VERSION {
        return Err(LoadError::UnsupportedVersion(version));
    }

    let mut checksum = [0u8; 8];
    checksum.copy_from_slice(&bytes[6..HEADER_LEN]);
    let expected = u64::from_le_bytes(checksum);

    let body = &bytes[HEADER_LEN..];
    let found = xxh64(body, 0);
    if found != expected {
        return Err(LoadError::ChecksumMismatch { expected, found });
    }

    let mut json = Vec::new();
    GzDecoder::new(body)
        .read_to_end(&mut json)
        .map_err(LoadError::Decompress)?;
    debug!(
        "Decompressed dataset body: {} -> {} bytes",
        body.len(),
        json.len()
    );

    decode_compiled_json(&json)
}

fn decode_compiled_json(text: &[u8]) -> Result<CompiledDataset, LoadError> {
    let dataset: CompiledDataset = serde_json::from_slice(text)?;
    if dataset.version != FORMAT_VERSION {
        return Err(LoadError::UnsupportedVersion(dataset.version));
    }
    Ok(dataset)
}

/// Group the generator's one-ring-per-entry list into zones.
///
/// Winding is measured with x = lon, y = lat. A counter-clockwise ring is
/// attached as a hole to the first outer ring of its zone that contains it.
/// Holes without such a ring and zero-area rings are dropped.
fn decode_legacy_json(text: &[u8]) -> Result<CompiledDataset, LoadError> {
    let entries: Vec<LegacyPolygon> = serde_json::from_slice(text)?;

    let mut zones: Vec<CompiledZone> = Vec::new();
    let mut by_tz: HashMap<String, usize> = HashMap::new();
    let mut holes: Vec<(String, Vec<[f64; 2]>)> = Vec::new();
    let mut skipped = 0usize;
    let mut dropped = 0usize;

    for entry in entries {
        if entry.tz == UNINHABITED {
            skipped += 1;
            continue;
        }

        let area = ring_polygon(&entry.polygon).signed_area();
        if area > 0.0 {
            holes.push((entry.tz, entry.polygon));
            continue;
        }
        if area == 0.0 {
            dropped += 1;
            continue;
        }

        let polygon = CompiledPolygon {
            outer: entry.polygon,
            holes: Vec::new(),
        };

        match by_tz.get(&entry.tz) {
            Some(&i) => zones[i].polygons.push(polygon),
            None => {
                by_tz.insert(entry.tz.clone(), zones.len());
                zones.push(CompiledZone {
                    id: entry.tz,
                    polygons: vec![polygon],
                });
            }
        }
    }

    // Holes may precede their outer ring in the list
    for (tz, ring) in holes {
        let hole = ring_polygon(&ring);
        let parent = match by_tz.get(&tz) {
            Some(&i) => zones[i]
                .polygons
                .iter_mut()
                .find(|p| ring_polygon(&p.outer).contains(&hole)),
            None => None,
        };
        match parent {
            Some(polygon) => polygon.holes.push(ring),
            None => dropped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {} uninhabited polygons", skipped);
    }
    if dropped > 0 {
        warn!("Dropped {} rings with no area or no enclosing outer ring", dropped);
    }

    Ok(CompiledDataset {
        version: FORMAT_VERSION,
        zones,
    })
}

fn ring_polygon(points: &[[f64; 2]]) -> Polygon<f64> {
    Polygon::new(LineString::from(points.to_vec()), vec![])
}

/// Encode a dataset as a binary envelope.
pub fn encode_envelope(dataset: &CompiledDataset) -> Result<Vec<u8>, LoadError> {
    let json = serde_json::to_vec(dataset)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let body = encoder.finish()?;

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&xxh64(&body, 0).to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}
