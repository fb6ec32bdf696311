//! One map, one file.
//!
//! [`MapFileCodec`] moves a [`Map`] to and from its `<id>.<ext>` file. The id is
//! only ever stored in the file name; the document itself is the TMX content
//! read and written by `tiledmap_tree_assets`.

use std::fmt;
use std::path::{Path, PathBuf};

use tiledmap_tree_assets::assets::map::{MapDocument, TilesetBinding};
use tiledmap_tree_assets::loaders::map::{read_map_document, write_map_document};
use tiledmap_tree_assets::paths::{map_file_name, map_id_from_path, require_directory};
use tiledmap_tree_assets::{CodecError, DefaultTileDataCodec, LayerFormat, TileDataCodec};
use tracing::{debug, warn};

use crate::config::MapTreeConfig;
use crate::ids::{ObjectIdAllocator, TilesetGidAllocator};
use crate::layer::Layer;
use crate::map::{Map, MapState};
use crate::tileset::TilesetRef;

pub struct MapFileCodec {
    extension: String,
    /// Format for loaded maps' new tile layers
    layer_format: LayerFormat,
    tile_data: Box<dyn TileDataCodec>,
}

impl Default for MapFileCodec {
    fn default() -> Self {
        Self::new(&MapTreeConfig::default())
    }
}

impl MapFileCodec {
    pub fn new(config: &MapTreeConfig) -> Self {
        Self {
            extension: config.map_extension.clone(),
            layer_format: config.default_layer_format,
            tile_data: Box::new(DefaultTileDataCodec),
        }
    }

    /// Use `codec` for tile layer payloads, for example to support compression.
    pub fn with_tile_data_codec(mut self, codec: impl TileDataCodec + 'static) -> Self {
        self.tile_data = Box::new(codec);
        self
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// File name of map `id`, e.g. `0001.tmx`.
    pub fn file_name(&self, id: u32) -> String {
        map_file_name(id, &self.extension)
    }

    pub fn path_for(&self, directory: &Path, id: u32) -> PathBuf {
        directory.join(self.file_name(id))
    }

    /// Load the map stored at `path` as a root with no observers.
    ///
    /// # Errors
    /// * [`CodecError::MalformedMapFile`] if the file name does not encode an
    ///   id, or the file is empty or not a map
    /// * [`CodecError::InvalidPath`] if the file does not exist
    /// * [`CodecError::Parse`] for syntax errors and bad attributes
    pub fn decode(&self, path: &Path) -> Result<Map, CodecError> {
        let id = map_id_from_path(path).map_err(|e| CodecError::MalformedMapFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let document = read_map_document(path, self.tile_data.as_ref())?;
        let map = self.build_map(id, document);
        debug!("Decoded map {} from {}", id, path.display());
        Ok(map)
    }

    /// Write `map` to `directory/<id>.<ext>`, replacing any existing file.
    ///
    /// # Errors
    /// * [`CodecError::InvalidPath`] if `directory` does not exist
    pub fn encode(&self, map: &Map, directory: &Path) -> Result<PathBuf, CodecError> {
        require_directory(directory)?;
        let path = self.path_for(directory, map.id());
        let document = self.to_document(map);
        write_map_document(&document, &path, self.tile_data.as_ref())?;
        Ok(path)
    }

    /// Build a root map from file content.
    pub fn build_map(&self, id: u32, document: MapDocument) -> Map {
        let object_ids = ObjectIdAllocator::starting_after(document.max_object_id());
        let tilesets: Vec<(u32, TilesetRef)> = document
            .tilesets
            .into_iter()
            .map(|binding| {
                let tile_count = binding.tile_count.unwrap_or_else(|| {
                    warn!(
                        "Map {id}: tileset at gid {} has no tile count",
                        binding.first_gid
                    );
                    0
                });
                (
                    binding.first_gid,
                    TilesetRef::new(binding.name, binding.source, tile_count),
                )
            })
            .collect();

        let gids = TilesetGidAllocator::from_ranges(
            tilesets
                .iter()
                .map(|(first_gid, tileset)| (*first_gid, tileset.tile_count)),
        );

        let state = MapState {
            width: document.width,
            height: document.height,
            tile_width: document.tile_width,
            tile_height: document.tile_height,
            layer_format: self.layer_format,
            properties: document.properties,
            layers: document.layers.into_iter().map(Layer::from_document).collect(),
            tilesets,
            gids,
        };
        Map::from_state(id, state, object_ids)
    }

    /// Snapshot a map's content as a document.
    pub fn to_document(&self, map: &Map) -> MapDocument {
        let state = map.state();
        MapDocument {
            width: state.width,
            height: state.height,
            tile_width: state.tile_width,
            tile_height: state.tile_height,
            properties: state.properties.clone(),
            tilesets: state
                .tilesets
                .iter()
                .map(|(first_gid, tileset)| TilesetBinding {
                    first_gid: *first_gid,
                    source: tileset.source.clone(),
                    name: tileset.name.clone(),
                    tile_count: Some(tileset.tile_count),
                })
                .collect(),
            layers: state
                .layers
                .iter()
                .map(|layer| layer.to_document(state.layer_format))
                .collect(),
        }
    }
}

impl fmt::Debug for MapFileCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapFileCodec")
            .field("extension", &self.extension)
            .field("layer_format", &self.layer_format)
            .finish_non_exhaustive()
    }
}
