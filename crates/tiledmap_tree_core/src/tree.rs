//! Loading and saving whole map trees.
//!
//! A tree on disk is a maps directory holding one file per map plus a
//! hierarchy descriptor recording which map nests under which. Saving is
//! all-or-nothing with respect to validation: a forest with a duplicated map id
//! is rejected before anything is written. After validation the directory is
//! wiped and rewritten; an I/O failure part way through leaves it partially
//! written.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tiledmap_tree_assets::assets::hierarchy::HierarchyNode;
use tiledmap_tree_assets::loaders::hierarchy::{read_hierarchy, write_hierarchy};
use tiledmap_tree_assets::paths::require_directory;
use tracing::{debug, info, trace, warn};

use crate::config::MapTreeConfig;
use crate::error::TreeError;
use crate::map::Map;
use crate::map_file::MapFileCodec;

#[derive(Debug, Default)]
pub struct MapTreeService {
    codec: MapFileCodec,
}

impl MapTreeService {
    pub fn new(config: &MapTreeConfig) -> Self {
        Self::with_codec(MapFileCodec::new(config))
    }

    pub fn with_codec(codec: MapFileCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &MapFileCodec {
        &self.codec
    }

    /// Load every map named by the hierarchy descriptor and rebuild the tree shape.
    ///
    /// Returns the root maps in descriptor order, with their subtrees mounted.
    ///
    /// # Errors
    /// * [`TreeError::InvalidPath`] if `maps_directory` does not exist
    /// * [`TreeError::Codec`] if the descriptor or a map file is missing or malformed
    pub fn load_tree(
        &self,
        maps_directory: &Path,
        hierarchy_path: &Path,
    ) -> Result<Vec<Map>, TreeError> {
        require_directory(maps_directory)?;
        info!(
            "Loading map tree from {} ({})",
            maps_directory.display(),
            hierarchy_path.display()
        );

        let records = read_hierarchy(hierarchy_path)?;
        let mut listed = HashSet::new();
        for id in records.iter().flat_map(HierarchyNode::ids) {
            if !listed.insert(id) {
                // Loaded anyway; the next save refuses until it is fixed
                warn!(
                    "Hierarchy {} lists map {id} more than once",
                    hierarchy_path.display()
                );
            }
        }

        let mut roots = Vec::with_capacity(records.len());
        for record in &records {
            roots.push(self.load_record(maps_directory, record, None)?);
        }

        info!(
            "Loaded map tree: {} roots, {} maps",
            roots.len(),
            all_maps(&roots).count()
        );
        Ok(roots)
    }

    fn load_record(
        &self,
        maps_directory: &Path,
        record: &HierarchyNode,
        parent: Option<&Map>,
    ) -> Result<Map, TreeError> {
        let path = self.codec.path_for(maps_directory, record.id);
        let map = self.codec.decode(&path)?;
        map.set_parent(parent)?;
        for child in &record.children {
            self.load_record(maps_directory, child, Some(&map))?;
        }
        Ok(map)
    }

    /// Validate, then replace the contents of `maps_directory` with `roots`.
    ///
    /// 1. Walk every tree and fail on the first map id seen twice; nothing is
    ///    touched on disk in that case.
    /// 2. Remove everything in `maps_directory`.
    /// 3. Write the hierarchy descriptor to `hierarchy_path`.
    /// 4. Write every map file.
    ///
    /// # Errors
    /// * [`TreeError::DuplicateMapId`] from validation
    /// * [`TreeError::InvalidPath`] if `maps_directory` does not exist
    /// * [`TreeError::Io`] / [`TreeError::Codec`] while writing
    pub fn save_tree(
        &self,
        maps_directory: &Path,
        hierarchy_path: &Path,
        roots: &[Map],
    ) -> Result<(), TreeError> {
        validate(roots)?;
        require_directory(maps_directory)?;
        info!(
            "Saving map tree to {} ({} roots)",
            maps_directory.display(),
            roots.len()
        );

        clear_directory(maps_directory)?;
        write_hierarchy(&hierarchy_of(roots), hierarchy_path)?;

        let mut written = 0usize;
        for map in all_maps(roots) {
            let path = self.codec.encode(&map, maps_directory)?;
            trace!("Wrote map {} to {}", map.id(), path.display());
            written += 1;
        }

        info!("Saved map tree: {written} maps");
        Ok(())
    }
}

/// Fail with [`TreeError::DuplicateMapId`] on the first id met twice in a
/// depth-first walk of `roots`.
pub fn validate(roots: &[Map]) -> Result<(), TreeError> {
    let mut seen = HashSet::new();
    for map in all_maps(roots) {
        if !seen.insert(map.id()) {
            warn!("Map tree has duplicate map id {}", map.id());
            return Err(TreeError::DuplicateMapId(map.id()));
        }
    }
    Ok(())
}

/// Every map of the forest, each tree in pre-order.
pub fn all_maps(roots: &[Map]) -> impl Iterator<Item = Map> + '_ {
    roots.iter().flat_map(|root| root.descendants(true))
}

/// First map with `id`, searching tree by tree in pre-order.
pub fn find_map(roots: &[Map], id: u32) -> Option<Map> {
    all_maps(roots).find(|map| map.id() == id)
}

/// One past the highest map id in the forest; 1 for an empty forest.
/// `None` when the highest id is `u32::MAX`.
pub fn next_free_id(roots: &[Map]) -> Option<u32> {
    all_maps(roots)
        .map(|map| map.id())
        .max()
        .unwrap_or(0)
        .checked_add(1)
}

/// The descriptor records for the current shape of `roots`.
pub fn hierarchy_of(roots: &[Map]) -> Vec<HierarchyNode> {
    roots.iter().map(hierarchy_node).collect()
}

fn hierarchy_node(map: &Map) -> HierarchyNode {
    HierarchyNode::with_children(
        map.id(),
        map.children().iter().map(hierarchy_node).collect(),
    )
}

fn clear_directory(directory: &Path) -> Result<(), TreeError> {
    let entries = fs::read_dir(directory).map_err(|e| TreeError::io(directory, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| TreeError::io(directory, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| TreeError::io(&path, e))?;
        let removed = if file_type.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| TreeError::io(&path, e))?;
    }
    debug!("Cleared {}", directory.display());
    Ok(())
}
