//! Integration tests for `tiledmap_tree_core`.
//!
//! Organized as a single test binary:
//! - tree: saving and loading whole forests through `MapTreeService`
//! - surgery: mounting, unmounting and the events they emit
//! - allocation: object ids and tileset GIDs across threads and files

mod allocation;
mod helpers;
mod surgery;
mod tree;
