use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub index: IndexConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DatasetConfig {
    /// Compiled dataset to load; the bundled sample is used when absent
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IndexConfig {
    /// Grid cell edge length in degrees
    pub cell_size_deg: f64,
    /// Cells holding more entries than this get an R-tree
    pub dense_cell_threshold: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            cell_size_deg: 1.0,
            dense_cell_threshold: 16,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ValidationConfig {
    /// Outer rings with more vertices skip the self-intersection check
    pub self_intersection_vertex_limit: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            self_intersection_vertex_limit: 4096,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
