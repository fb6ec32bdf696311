use std::path::Path;

use tracing::debug;

use crate::assets::tileset::TilesetSummary;
use crate::error::CodecError;
use crate::paths::require_file;

/// Load a `.tsx` tileset with the `tiled` crate and keep what GID allocation needs.
///
/// # Errors
/// * [`CodecError::InvalidPath`] if `path` is not an existing file
/// * [`CodecError::Tileset`] if `tiled` cannot parse it
pub fn load_tileset_summary(path: &Path) -> Result<TilesetSummary, CodecError> {
    require_file(path)?;

    let mut loader = tiled::Loader::new();
    let tileset = loader.load_tsx_tileset(path)?;

    debug!(
        "Loaded tileset '{}' from {} ({} tiles)",
        tileset.name,
        path.display(),
        tileset.tilecount
    );

    Ok(TilesetSummary {
        name: tileset.name.clone(),
        tile_count: tileset.tilecount,
        tile_size: (tileset.tile_width, tileset.tile_height),
        grid_size: calculate_grid_size(&tileset),
    })
}

/// Grid size (columns, rows) of a texture atlas; `(0, 0)` for image collections.
fn calculate_grid_size(tileset: &tiled::Tileset) -> (u32, u32) {
    if tileset.columns > 0 {
        let rows = tileset.tilecount.div_ceil(tileset.columns);
        (tileset.columns, rows)
    } else {
        (0, 0)
    }
}
