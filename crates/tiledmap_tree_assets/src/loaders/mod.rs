//! Readers and writers for the files that make up a map tree.
//!
//! Map files and the hierarchy descriptor are parsed with `quick-xml`;
//! external `.tsx` tilesets go through the `tiled` crate.

pub mod hierarchy;
pub mod map;
pub mod tileset;

pub(crate) mod xml;
