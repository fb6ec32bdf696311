//! Project-level settings for a map tree.
//!
//! Stored as camelCase JSON next to the project, for example:
//!
//! ```json
//! {
//!   "mapsDirectory": "maps",
//!   "hierarchyFile": "maps.xml",
//!   "defaultWidth": 40,
//!   "defaultLayerFormat": { "encoding": "csv" }
//! }
//! ```
//!
//! Every field is optional; missing ones take the values of [`MapTreeConfig::default`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tiledmap_tree_assets::LayerFormat;
use tiledmap_tree_assets::paths::{DEFAULT_MAP_EXTENSION, require_file};
use tracing::debug;

use crate::error::TreeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapTreeConfig {
    /// Directory holding map files, relative to the project root.
    pub maps_directory: PathBuf,

    /// File name of the hierarchy descriptor inside the maps directory.
    pub hierarchy_file: String,

    /// Extension of map files, without the dot.
    pub map_extension: String,

    /// Size of new maps in tiles.
    pub default_width: u32,
    pub default_height: u32,

    /// Tile size of new maps in pixels.
    pub tile_width: u32,
    pub tile_height: u32,

    /// Encoding given to tile layers that do not choose their own.
    pub default_layer_format: LayerFormat,
}

impl Default for MapTreeConfig {
    fn default() -> Self {
        Self {
            maps_directory: PathBuf::from("maps"),
            hierarchy_file: "maps.xml".to_string(),
            map_extension: DEFAULT_MAP_EXTENSION.to_string(),
            default_width: 20,
            default_height: 15,
            tile_width: 32,
            tile_height: 32,
            default_layer_format: LayerFormat::default(),
        }
    }
}

impl MapTreeConfig {
    /// Load from a JSON file.
    ///
    /// # Errors
    /// * [`TreeError::InvalidPath`] if `path` is not an existing file
    /// * [`TreeError::Config`] if the JSON does not describe a config
    pub fn from_json_file(path: &Path) -> Result<Self, TreeError> {
        require_file(path)?;
        let content = fs::read_to_string(path).map_err(|e| TreeError::io(path, e))?;
        let config = serde_json::from_str(&content).map_err(|source| TreeError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded map tree config from {}", path.display());
        Ok(config)
    }

    /// Write as pretty-printed JSON.
    pub fn to_json_file(&self, path: &Path) -> Result<(), TreeError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| TreeError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|e| TreeError::io(path, e))
    }

    /// Settings applied to maps created with [`Map::with_defaults`](crate::map::Map::with_defaults).
    pub fn map_defaults(&self) -> MapDefaults {
        MapDefaults {
            width: self.default_width,
            height: self.default_height,
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            layer_format: self.default_layer_format,
        }
    }
}

/// The part of the configuration a single map needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapDefaults {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub layer_format: LayerFormat,
}

impl Default for MapDefaults {
    fn default() -> Self {
        MapTreeConfig::default().map_defaults()
    }
}
