use std::path::PathBuf;

use thiserror::Error;
use tiledmap_tree_assets::{CodecError, PathError};

/// Rejected edits to a single map or its place in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("Layer {layer} of map {map} is not an object container")]
    NotObjectContainer { map: u32, layer: usize },

    #[error("Map {map} has no layer {index} (it has {len})")]
    LayerOutOfRange { map: u32, index: usize, len: usize },

    #[error("Map {map} cannot be mounted under {parent}: it is that map or one of its ancestors")]
    CyclicParent { map: u32, parent: u32 },

    #[error("Map {map} has used every object id")]
    ObjectIdsExhausted { map: u32 },

    #[error("Every map id is in use")]
    MapIdsExhausted,
}

/// Failures loading or saving a whole map tree.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Duplicate map id {0} in the map tree")]
    DuplicateMapId(u32),

    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl TreeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TreeError::Io {
            path: path.into(),
            source,
        }
    }
}
