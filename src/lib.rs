//! # tiledmap_tree
//!
//! Hierarchical trees of Tiled maps.
//!
//! The TMX format has no notion of one map nesting inside another. This crate keeps
//! each map in its own `0001.tmx`-style file and records the nesting in a separate
//! hierarchy descriptor (`maps.xml`), keeping the two consistent on load and save.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tiledmap_tree::prelude::*;
//!
//! let mut project = MapProject::open("my_game")?;
//! project.load()?;
//!
//! let world = project.roots()[0].clone();
//! let dungeon = project.new_map(Some(&world))?;
//! dungeon.set_name("Dungeon");
//! let objects = dungeon.add_object_layer("Objects");
//! dungeon.add_object(objects, MapObject::at(64.0, 96.0).named("Entrance"))?;
//!
//! project.save()?;
//! # Ok::<(), TreeError>(())
//! ```
//!
//! ## Architecture
//!
//! This crate is organized into 2 layers:
//!
//! - **Layer 1** ([`assets`]): Pure file I/O for map files, the hierarchy descriptor,
//!   tile data payloads and `.tsx` tilesets
//! - **Layer 2** ([`core`]): Map entities, tree surgery with events, id allocation,
//!   and whole-tree persistence
//!
//! ## Using Individual Crates
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tiledmap_tree_assets::loaders::hierarchy::read_hierarchy;
//!
//! let records = read_hierarchy(Path::new("assets/maps/maps.xml"))?;
//! # Ok::<(), tiledmap_tree_assets::CodecError>(())
//! ```

// Re-export sub-crates for advanced usage
pub use tiledmap_tree_assets as assets;
pub use tiledmap_tree_core as core;

/// The `tiled` crate used to read `.tsx` tilesets.
pub use tiled;

/// Unified prelude for `tiledmap_tree`
///
/// This module re-exports the most commonly used types from both sub-crates
/// for convenient access.
pub mod prelude {
    pub use crate::assets::prelude::*;
    pub use crate::core::prelude::*;
}
