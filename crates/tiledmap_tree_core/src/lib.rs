//! # `tiledmap_tree_core`
//!
//! Map tree backbone for `tiledmap_tree`. Turns the documents read by
//! `tiledmap_tree_assets` into live, observable [`Map`](map::Map) entities
//! organized in a parent/child forest, and writes them back.
//!
//! ## Architecture
//!
//! Layer 2 (this crate) sits on top of:
//! - **Layer 1** (`tiledmap_tree_assets`): map files, hierarchy descriptor, tile data codecs
//!
//! ## What Layer 2 Provides
//!
//! 1. **Map entities**: properties, grid size, layers, tilesets and placed objects
//! 2. **Tree surgery**: [`Map::set_parent`](map::Map::set_parent) with mount/unmount,
//!    keeping both sides of every link in step and rejecting cycles
//! 3. **Allocation**: per-map object ids (thread-safe) and tileset GID ranges
//! 4. **Events**: synchronous, filterable notifications for every mutation
//! 5. **Persistence**: [`MapTreeService`](tree::MapTreeService) loads and saves whole
//!    trees, refusing to write a forest with duplicate map ids
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tiledmap_tree_core::prelude::*;
//!
//! let service = MapTreeService::default();
//!
//! let world = Map::new(1);
//! let town = Map::new(2);
//! town.mount(&world)?;
//! town.add_tileset(TilesetRef::new("town", "../tilesets/town.tsx", 256), None);
//!
//! let maps = Path::new("assets/maps");
//! service.save_tree(maps, &maps.join("maps.xml"), &[world])?;
//!
//! let roots = service.load_tree(maps, &maps.join("maps.xml"))?;
//! assert_eq!(roots[0].children()[0].id(), 2);
//! # Ok::<(), TreeError>(())
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod layer;
pub mod map;
pub mod map_file;
pub mod project;
pub mod tileset;
pub mod tree;

pub mod prelude {
    //! Common imports for `tiledmap_tree_core` users.

    pub use crate::config::{MapDefaults, MapTreeConfig};
    pub use crate::error::{MapError, TreeError};
    pub use crate::events::{
        MapEvent, MapEventKind, ObserverId, ProjectEvent, ProjectEventKind, TaggedEvent,
    };
    pub use crate::ids::{ObjectIdAllocator, TilesetGidAllocator};
    pub use crate::layer::{Layer, MapObject, ObjectLayer, TileLayer};
    pub use crate::map::Map;
    pub use crate::map_file::MapFileCodec;
    pub use crate::project::MapProject;
    pub use crate::tileset::TilesetRef;
    pub use crate::tree::{MapTreeService, all_maps, find_map, next_free_id, validate};
}

// Re-export the main types at crate root for convenience
pub use config::MapTreeConfig;
pub use error::{MapError, TreeError};
pub use map::Map;
pub use project::MapProject;
pub use tree::MapTreeService;
