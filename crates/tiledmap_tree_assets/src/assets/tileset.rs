/// The parts of a `.tsx` tileset that matter for GID allocation.
///
/// Produced by [`crate::loaders::tileset::load_tileset_summary`] from a
/// `tiled::Tileset`; image data and per-tile metadata are not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilesetSummary {
    pub name: String,

    /// Number of tiles, and therefore the size of the GID range it occupies
    pub tile_count: u32,

    /// Tile size in pixels (width, height)
    pub tile_size: (u32, u32),

    /// Grid dimensions in tiles (columns, rows); `(0, 0)` for image collections
    pub grid_size: (u32, u32),
}

impl TilesetSummary {
    /// Check if this is an image collection tileset (vs. texture atlas)
    #[inline]
    pub fn is_image_collection(&self) -> bool {
        self.grid_size == (0, 0)
    }
}
