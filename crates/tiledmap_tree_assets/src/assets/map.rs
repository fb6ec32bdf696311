use std::collections::BTreeMap;

use crate::tile_data::LayerFormat;

/// Custom properties as stored in the file: always string-valued.
///
/// Ordered so that writing the same map twice produces identical bytes.
pub type Properties = BTreeMap<String, String>;

/// Everything a map file holds, independent of any tree.
///
/// The map id is not part of the document: it lives in the file name.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDocument {
    /// Map size in tiles
    pub width: u32,
    pub height: u32,

    /// Tile size in pixels
    pub tile_width: u32,
    pub tile_height: u32,

    pub properties: Properties,

    /// Tileset bindings in file order
    pub tilesets: Vec<TilesetBinding>,

    /// Layers bottom to top
    pub layers: Vec<LayerDocument>,
}

impl MapDocument {
    /// Highest object id found across all object layers, or 0.
    pub fn max_object_id(&self) -> u32 {
        self.layers
            .iter()
            .filter_map(|layer| match layer {
                LayerDocument::Objects { objects, .. } => {
                    objects.iter().map(|o| o.id).max()
                }
                LayerDocument::Tiles { .. } => None,
            })
            .max()
            .unwrap_or(0)
    }
}

/// A `<tileset>` reference inside a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilesetBinding {
    /// First GID of this tileset in the map
    pub first_gid: u32,
    /// Path of the external `.tsx`, as written in the file
    pub source: String,
    pub name: String,
    /// Number of tiles, `None` if the file did not say
    pub tile_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerDocument {
    /// `<layer>` with its decoded GIDs
    Tiles {
        name: String,
        width: u32,
        height: u32,
        format: LayerFormat,
        tiles: Vec<u32>,
        properties: Properties,
    },
    /// `<objectgroup>`
    Objects {
        name: String,
        objects: Vec<ObjectDocument>,
        properties: Properties,
    },
}

impl LayerDocument {
    pub fn name(&self) -> &str {
        match self {
            LayerDocument::Tiles { name, .. } | LayerDocument::Objects { name, .. } => name,
        }
    }
}

/// An `<object>` inside an object group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectDocument {
    pub id: u32,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Tile GID for tile objects, 0 otherwise
    pub gid: u32,
    pub properties: Properties,
}
