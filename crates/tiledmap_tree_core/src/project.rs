//! The project side of a map tree: where the files live and which maps are roots.
//!
//! # Example
//!
//! ```rust,no_run
//! use tiledmap_tree_core::prelude::*;
//!
//! let mut project = MapProject::open("my_game")?;
//! let world = project.new_map(None)?;
//! world.set_name("Overworld");
//! let town = project.new_map(Some(&world))?;
//! town.set_name("Town");
//! project.save()?;
//! # Ok::<(), TreeError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::MapTreeConfig;
use crate::error::{MapError, TreeError};
use crate::events::{ObserverId, Observers, ProjectEvent, ProjectEventKind};
use crate::map::Map;
use crate::tree::{MapTreeService, find_map, next_free_id};

/// Name of the optional config file in a project root.
pub const CONFIG_FILE_NAME: &str = "tiledmap_tree.json";

/// Owner of a project's root maps.
///
/// Holds the roots, supplies the maps directory and hierarchy path to the
/// [`MapTreeService`], and emits [`ProjectEvent`]s when the root list changes.
#[derive(Debug)]
pub struct MapProject {
    root: PathBuf,
    config: MapTreeConfig,
    service: MapTreeService,
    roots: Vec<Map>,
    observers: Observers<ProjectEvent>,
}

impl MapProject {
    /// An empty project rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, config: MapTreeConfig) -> Self {
        let service = MapTreeService::new(&config);
        Self {
            root: root.into(),
            config,
            service,
            roots: Vec::new(),
            observers: Observers::new(),
        }
    }

    /// A project rooted at `root`, configured from its `tiledmap_tree.json` if
    /// there is one. Maps are not loaded; call [`load`](Self::load).
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, TreeError> {
        let root = root.into();
        let config_path = root.join(CONFIG_FILE_NAME);
        let config = if config_path.is_file() {
            MapTreeConfig::from_json_file(&config_path)?
        } else {
            debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, root.display());
            MapTreeConfig::default()
        };
        Ok(Self::new(root, config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &MapTreeConfig {
        &self.config
    }

    pub fn service(&self) -> &MapTreeService {
        &self.service
    }

    pub fn maps_directory(&self) -> PathBuf {
        self.root.join(&self.config.maps_directory)
    }

    pub fn hierarchy_path(&self) -> PathBuf {
        self.maps_directory().join(&self.config.hierarchy_file)
    }

    pub fn roots(&self) -> &[Map] {
        &self.roots
    }

    pub fn find_map(&self, id: u32) -> Option<Map> {
        find_map(&self.roots, id)
    }

    /// Adopt `map` as a root, unmounting it first if it has a parent.
    ///
    /// Emits `RootMapAdded`. Adding a map that already is one of the roots does nothing.
    pub fn add_root_map(&mut self, map: Map) {
        if self.roots.contains(&map) {
            return;
        }
        if !map.is_root() {
            map.unmount();
        }
        self.roots.push(map.clone());
        self.observers.emit(&ProjectEvent::RootMapAdded { map });
    }

    /// Drop the root map with `id` from the project, returning it with its subtree.
    ///
    /// Emits `RootMapRemoved`.
    pub fn remove_root_map(&mut self, id: u32) -> Option<Map> {
        let index = self.roots.iter().position(|map| map.id() == id)?;
        let map = self.roots.remove(index);
        self.observers
            .emit(&ProjectEvent::RootMapRemoved { map: map.clone() });
        Some(map)
    }

    /// Create a map with the next free id, mounted under `parent` or added as a root.
    ///
    /// # Errors
    /// * [`MapError::MapIdsExhausted`] if the highest id in the project is `u32::MAX`
    pub fn new_map(&mut self, parent: Option<&Map>) -> Result<Map, MapError> {
        let id = next_free_id(&self.roots).ok_or(MapError::MapIdsExhausted)?;
        let map = Map::with_defaults(id, self.config.map_defaults());
        match parent {
            Some(parent) => map.mount(parent)?,
            None => self.add_root_map(map.clone()),
        }
        debug!("Created map {id}");
        Ok(map)
    }

    /// Write the whole tree, creating the maps directory if needed.
    pub fn save(&self) -> Result<(), TreeError> {
        let maps_directory = self.maps_directory();
        fs::create_dir_all(&maps_directory).map_err(|e| TreeError::io(&maps_directory, e))?;
        self.service
            .save_tree(&maps_directory, &self.hierarchy_path(), &self.roots)
    }

    /// Replace the roots with the tree stored on disk.
    ///
    /// Emits `RootMapRemoved` for each current root, then `RootMapAdded` for
    /// each loaded one. On error the current roots are kept.
    pub fn load(&mut self) -> Result<(), TreeError> {
        let loaded = self
            .service
            .load_tree(&self.maps_directory(), &self.hierarchy_path())?;

        for map in std::mem::take(&mut self.roots) {
            self.observers.emit(&ProjectEvent::RootMapRemoved { map });
        }
        for map in loaded {
            self.add_root_map(map);
        }
        info!(
            "Project {} loaded with {} root maps",
            self.root.display(),
            self.roots.len()
        );
        Ok(())
    }

    pub fn subscribe(&self, callback: impl FnMut(&ProjectEvent) + 'static) -> ObserverId {
        self.observers.subscribe(callback)
    }

    pub fn subscribe_to(
        &self,
        kind: ProjectEventKind,
        callback: impl FnMut(&ProjectEvent) + 'static,
    ) -> ObserverId {
        self.observers.subscribe_to(kind, callback)
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }
}
