use std::path::Path;

use tiledmap_tree_assets::CodecError;
use tiledmap_tree_assets::loaders::tileset::load_tileset_summary;

/// A tileset bound into a map.
///
/// Only what is needed to place it in the GID space and write it back out:
/// the image data stays in the `.tsx` named by `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilesetRef {
    pub name: String,
    /// Path of the `.tsx`, as written into the map file
    pub source: String,
    /// Number of tiles; the width of the GID range the tileset occupies
    pub tile_count: u32,
}

impl TilesetRef {
    pub fn new(name: impl Into<String>, source: impl Into<String>, tile_count: u32) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            tile_count,
        }
    }

    /// Read a `.tsx` with the `tiled` crate.
    ///
    /// `source` is what the map file will reference, usually `path` relative to
    /// the maps directory.
    pub fn from_tsx(path: &Path, source: impl Into<String>) -> Result<Self, CodecError> {
        let summary = load_tileset_summary(path)?;
        Ok(Self {
            name: summary.name,
            source: source.into(),
            tile_count: summary.tile_count,
        })
    }

    /// Whether `gid` falls in the range of this tileset bound at `first_gid`.
    #[inline]
    pub fn contains(&self, first_gid: u32, gid: u32) -> bool {
        gid >= first_gid && gid - first_gid < self.tile_count
    }
}
