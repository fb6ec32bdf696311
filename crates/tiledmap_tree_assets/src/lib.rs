//! # `tiledmap_tree_assets`
//!
//! File layer of `tiledmap_tree`. Reads and writes the on-disk pieces of a map tree
//! without knowing anything about the tree itself:
//!
//! - **Map files** (`0001.tmx`, ...): one TMX document per map, see [`loaders::map`]
//! - **Hierarchy descriptor** (`maps.xml`): which map ids nest under which, see [`loaders::hierarchy`]
//! - **Tilesets** (`.tsx`): summaries loaded through the `tiled` crate, see [`loaders::tileset`]
//! - **Tile data**: csv/base64 payload encoding behind the [`TileDataCodec`] trait
//!
//! Layer 2 (`tiledmap_tree_core`) turns these documents into live `Map` entities.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use tiledmap_tree_assets::prelude::*;
//!
//! let roots = read_hierarchy(Path::new("maps/maps.xml"))?;
//! for root in &roots {
//!     let path = Path::new("maps").join(map_file_name(root.id, DEFAULT_MAP_EXTENSION));
//!     let document = read_map_document(&path, &DefaultTileDataCodec)?;
//!     println!("{}: {}x{}", root.id, document.width, document.height);
//! }
//! # Ok::<(), CodecError>(())
//! ```

pub mod assets;
pub mod error;
pub mod loaders;
pub mod paths;
pub mod tile_data;

pub use error::{CodecError, PathError};
pub use tile_data::{DefaultTileDataCodec, LayerFormat, TileCompression, TileDataCodec, TileEncoding};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::assets::{
        hierarchy::HierarchyNode,
        map::{LayerDocument, MapDocument, ObjectDocument, Properties, TilesetBinding},
        tileset::TilesetSummary,
    };
    pub use crate::error::{CodecError, PathError};
    pub use crate::loaders::{
        hierarchy::{read_hierarchy, write_hierarchy},
        map::{read_map_document, write_map_document},
        tileset::load_tileset_summary,
    };
    pub use crate::paths::{DEFAULT_MAP_EXTENSION, map_file_name, map_id_from_path};
    pub use crate::tile_data::{
        DefaultTileDataCodec, LayerFormat, TileCompression, TileDataCodec, TileEncoding,
    };
}
