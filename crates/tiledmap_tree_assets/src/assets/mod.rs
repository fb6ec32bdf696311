//! Plain data read from and written to map tree files.

pub mod hierarchy;
pub mod map;
pub mod tileset;
