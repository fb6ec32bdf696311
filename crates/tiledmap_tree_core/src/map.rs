//! The map entity and its place in the map tree.
//!
//! A [`Map`] is a cheap, clonable handle: clones refer to the same map. Parents
//! own their children; a child only holds a weak link back to its parent, so
//! dropping the last handle to a root drops its whole subtree.
//!
//! [`Map::set_parent`] is the only way to change the tree shape. It keeps both
//! sides of the parent/child link in step and notifies the old parent, the new
//! parent and the map itself.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tiledmap_tree_assets::LayerFormat;
use tiledmap_tree_assets::assets::map::Properties;
use tiledmap_tree_assets::paths::format_map_id;
use tracing::{debug, warn};

use crate::config::MapDefaults;
use crate::error::MapError;
use crate::events::{MapEvent, MapEventKind, ObserverId, Observers};
use crate::ids::{ObjectIdAllocator, TilesetGidAllocator};
use crate::layer::{Layer, MapObject, ObjectLayer, TileLayer};
use crate::tileset::TilesetRef;

/// Property holding a map's display name.
pub const NAME_PROPERTY: &str = "name";

/// Name given to the tile layer of a new map.
pub const DEFAULT_LAYER_NAME: &str = "Tile Layer 1";

/// Handle to one map of the tree.
#[derive(Clone)]
pub struct Map(Rc<MapNode>);

struct MapNode {
    id: u32,
    parent: RefCell<Weak<MapNode>>,
    children: RefCell<Vec<Map>>,
    state: RefCell<MapState>,
    object_ids: ObjectIdAllocator,
    observers: Observers<MapEvent>,
}

/// Map content, everything but identity and tree links.
#[derive(Debug, Clone)]
pub(crate) struct MapState {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) tile_width: u32,
    pub(crate) tile_height: u32,
    /// Format given to tile layers added without one
    pub(crate) layer_format: LayerFormat,
    pub(crate) properties: Properties,
    pub(crate) layers: Vec<Layer>,
    /// `(first_gid, tileset)` in binding order
    pub(crate) tilesets: Vec<(u32, TilesetRef)>,
    pub(crate) gids: TilesetGidAllocator,
}

impl Map {
    /// A fresh map with the built-in defaults: 20x15 tiles of 32x32 pixels and one
    /// empty tile layer.
    ///
    /// Map ids are positive; uniqueness across a tree is checked when it is saved.
    pub fn new(id: u32) -> Self {
        Self::with_defaults(id, MapDefaults::default())
    }

    /// A fresh map sized and formatted from project settings.
    pub fn with_defaults(id: u32, defaults: MapDefaults) -> Self {
        debug_assert!(id > 0, "map ids are positive");
        let layer = TileLayer::new(DEFAULT_LAYER_NAME, defaults.width, defaults.height)
            .with_format(defaults.layer_format);
        let state = MapState {
            width: defaults.width,
            height: defaults.height,
            tile_width: defaults.tile_width,
            tile_height: defaults.tile_height,
            layer_format: defaults.layer_format,
            properties: Properties::new(),
            layers: vec![Layer::Tiles(layer)],
            tilesets: Vec::new(),
            gids: TilesetGidAllocator::new(),
        };
        Self::from_state(id, state, ObjectIdAllocator::new())
    }

    /// A root map built from existing content, emitting nothing.
    pub(crate) fn from_state(id: u32, state: MapState, object_ids: ObjectIdAllocator) -> Self {
        Map(Rc::new(MapNode {
            id,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            state: RefCell::new(state),
            object_ids,
            observers: Observers::new(),
        }))
    }

    pub(crate) fn state(&self) -> Ref<'_, MapState> {
        self.0.state.borrow()
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.0.id
    }

    fn emit(&self, event: MapEvent) {
        self.0.observers.emit(&event);
    }

    // Tree shape

    pub fn parent(&self) -> Option<Map> {
        self.0.parent.borrow().upgrade().map(Map)
    }

    /// Direct children, in the order they were mounted.
    pub fn children(&self) -> Vec<Map> {
        self.0.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn has_children(&self) -> bool {
        self.child_count() > 0
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    /// Move this map (and its subtree) under `new_parent`, or make it a root with `None`.
    ///
    /// Removes the map from its old parent's children, adds it to the new
    /// parent's children and updates its own parent link. Once the tree is
    /// consistent again, `ChildRemoved` is emitted on the old parent,
    /// `ChildAdded` on the new one and `ParentChanged` on this map.
    ///
    /// # Errors
    /// [`MapError::CyclicParent`] if `new_parent` is this map or one of its
    /// descendants. The tree is left untouched.
    pub fn set_parent(&self, new_parent: Option<&Map>) -> Result<(), MapError> {
        if let Some(parent) = new_parent
            && (parent == self || self.is_ancestor_of(parent))
        {
            warn!(
                "Refusing to mount map {} under its own descendant {}",
                self.id(),
                parent.id()
            );
            return Err(MapError::CyclicParent {
                map: self.id(),
                parent: parent.id(),
            });
        }

        let old_parent = self.parent();
        if let Some(old) = &old_parent {
            old.0.children.borrow_mut().retain(|child| child != self);
        }
        if let Some(new) = new_parent {
            new.0.children.borrow_mut().push(self.clone());
        }
        *self.0.parent.borrow_mut() = new_parent.map(|p| Rc::downgrade(&p.0)).unwrap_or_default();

        debug!(
            "Map {} moved from {:?} to {:?}",
            self.id(),
            old_parent.as_ref().map(Map::id),
            new_parent.map(Map::id)
        );

        if let Some(old) = old_parent {
            old.emit(MapEvent::ChildRemoved {
                old_child: self.clone(),
            });
        }
        if let Some(new) = new_parent {
            new.emit(MapEvent::ChildAdded {
                new_child: self.clone(),
            });
        }
        self.emit(MapEvent::ParentChanged {
            new_parent: new_parent.cloned(),
        });
        Ok(())
    }

    /// Attach under `parent`; same as `set_parent(Some(parent))`.
    pub fn mount(&self, parent: &Map) -> Result<(), MapError> {
        self.set_parent(Some(parent))
    }

    /// Detach from the parent, keeping the subtree below this map intact.
    pub fn unmount(&self) {
        // Clearing the parent cannot form a cycle
        let _ = self.set_parent(None);
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: self.parent(),
        }
    }

    /// Topmost ancestor, or this map if it is a root.
    pub fn root(&self) -> Map {
        self.ancestors().last().unwrap_or_else(|| self.clone())
    }

    /// Number of ancestors; 0 for a root.
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// Whether this map sits somewhere above `other`.
    pub fn is_ancestor_of(&self, other: &Map) -> bool {
        other.ancestors().any(|ancestor| &ancestor == self)
    }

    /// Pre-order depth-first walk of the subtree, optionally starting with this map.
    ///
    /// Children are read as the walk reaches them. Call again to restart.
    pub fn descendants(&self, include_self: bool) -> Descendants {
        let stack = if include_self {
            vec![self.clone()]
        } else {
            self.0.children.borrow().iter().rev().cloned().collect()
        };
        Descendants { stack }
    }

    // Properties

    pub fn property(&self, key: &str) -> Option<String> {
        self.state().properties.get(key).cloned()
    }

    pub fn properties(&self) -> Properties {
        self.state().properties.clone()
    }

    /// Set a property and emit `PropertyChanged`.
    pub fn set_property(&self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        self.0
            .state
            .borrow_mut()
            .properties
            .insert(key.clone(), value.clone());
        self.emit(MapEvent::PropertyChanged {
            property: key,
            new_value: value,
        });
    }

    pub fn name(&self) -> Option<String> {
        self.property(NAME_PROPERTY)
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.set_property(NAME_PROPERTY, name);
    }

    /// The name, or `Map 0001` style when none is set.
    pub fn display_name(&self) -> String {
        self.name()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Map {}", format_map_id(self.id())))
    }

    // Grid

    pub fn width(&self) -> u32 {
        self.state().width
    }

    pub fn height(&self) -> u32 {
        self.state().height
    }

    pub fn tile_width(&self) -> u32 {
        self.state().tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.state().tile_height
    }

    pub fn set_width(&self, width: u32) {
        let height = self.height();
        self.resize(width, height);
    }

    pub fn set_height(&self, height: u32) {
        let width = self.width();
        self.resize(width, height);
    }

    /// Change the grid size and emit `SizeChanged`. Existing tile layers keep
    /// their payloads and dimensions.
    pub fn resize(&self, width: u32, height: u32) {
        {
            let mut state = self.0.state.borrow_mut();
            state.width = width;
            state.height = height;
        }
        self.emit(MapEvent::SizeChanged { width, height });
    }

    /// Format given to tile layers added without one.
    pub fn layer_format(&self) -> LayerFormat {
        self.state().layer_format
    }

    pub fn set_layer_format(&self, format: LayerFormat) {
        self.0.state.borrow_mut().layer_format = format;
    }

    // Tilesets

    /// Bind a tileset and emit `TilesetAdded`. Returns its first GID.
    ///
    /// Without `gid` the tileset goes at the allocator frontier, which then moves
    /// past its tiles. An explicit `gid` is recorded as given: it is not checked
    /// against other bindings and does not move the frontier.
    pub fn add_tileset(&self, tileset: TilesetRef, gid: Option<u32>) -> u32 {
        let first_gid = {
            let mut state = self.0.state.borrow_mut();
            let first_gid = match gid {
                Some(gid) => gid,
                None => {
                    let next = state.gids.next();
                    state.gids.advance(tileset.tile_count);
                    next
                }
            };
            state.tilesets.push((first_gid, tileset.clone()));
            first_gid
        };
        debug!(
            "Map {}: tileset '{}' bound at gid {first_gid}",
            self.id(),
            tileset.name
        );
        self.emit(MapEvent::TilesetAdded {
            gid: first_gid,
            tileset,
        });
        first_gid
    }

    /// `(first_gid, tileset)` pairs in binding order.
    pub fn tilesets(&self) -> Vec<(u32, TilesetRef)> {
        self.state().tilesets.clone()
    }

    /// GID the next automatic binding will start at.
    pub fn next_gid(&self) -> u32 {
        self.state().gids.next()
    }

    /// The binding whose range holds `gid`. Where hand-placed ranges overlap,
    /// the one with the highest first GID wins.
    pub fn tileset_for_gid(&self, gid: u32) -> Option<(u32, TilesetRef)> {
        self.state()
            .tilesets
            .iter()
            .filter(|(first_gid, tileset)| tileset.contains(*first_gid, gid))
            .max_by_key(|(first_gid, _)| *first_gid)
            .cloned()
    }

    // Layers

    /// Append a layer and emit `LayerAdded`. Returns its index.
    ///
    /// A tile layer without a format takes the map's [`layer_format`](Self::layer_format).
    pub fn add_layer(&self, mut layer: Layer) -> usize {
        let index = {
            let mut state = self.0.state.borrow_mut();
            if let Layer::Tiles(tiles) = &mut layer
                && tiles.format.is_none()
            {
                tiles.format = Some(state.layer_format);
            }
            state.layers.push(layer.clone());
            state.layers.len() - 1
        };
        self.emit(MapEvent::LayerAdded { index, layer });
        index
    }

    /// Append an empty tile layer the size of the map.
    pub fn add_tile_layer(&self, name: impl Into<String>) -> usize {
        let (width, height) = (self.width(), self.height());
        self.add_layer(Layer::Tiles(TileLayer::new(name, width, height)))
    }

    pub fn add_object_layer(&self, name: impl Into<String>) -> usize {
        self.add_layer(Layer::Objects(ObjectLayer::new(name)))
    }

    pub fn layer(&self, index: usize) -> Option<Layer> {
        self.state().layers.get(index).cloned()
    }

    /// First layer called `name`, with its index.
    pub fn layer_by_name(&self, name: &str) -> Option<(usize, Layer)> {
        self.state()
            .layers
            .iter()
            .enumerate()
            .find(|(_, layer)| layer.name() == name)
            .map(|(index, layer)| (index, layer.clone()))
    }

    pub fn layers(&self) -> Vec<Layer> {
        self.state().layers.clone()
    }

    pub fn layer_count(&self) -> usize {
        self.state().layers.len()
    }

    // Objects

    /// Place `object` on the object layer at `layer` and emit `ObjectAdded`.
    ///
    /// An object with id 0 gets the next id of this map; an explicit id is kept
    /// and later allocations skip past it. An empty name becomes `Object 0001`
    /// style. Returns the object as stored.
    ///
    /// # Errors
    /// * [`MapError::LayerOutOfRange`] if there is no layer at `layer`
    /// * [`MapError::NotObjectContainer`] if that layer holds tiles
    /// * [`MapError::ObjectIdsExhausted`] if the object needs an id and none is left
    pub fn add_object(&self, layer: usize, mut object: MapObject) -> Result<MapObject, MapError> {
        {
            let mut state = self.0.state.borrow_mut();
            let len = state.layers.len();
            let Some(target) = state.layers.get_mut(layer) else {
                return Err(MapError::LayerOutOfRange {
                    map: self.id(),
                    index: layer,
                    len,
                });
            };
            let Layer::Objects(container) = target else {
                return Err(MapError::NotObjectContainer {
                    map: self.id(),
                    layer,
                });
            };

            if object.id == 0 {
                object.id = self
                    .0
                    .object_ids
                    .next()
                    .ok_or(MapError::ObjectIdsExhausted { map: self.id() })?;
            } else {
                self.0.object_ids.observe(object.id);
            }
            if object.name.is_empty() {
                object.name = format!("Object {}", format_map_id(object.id));
            }
            container.objects.push(object.clone());
        }

        self.emit(MapEvent::ObjectAdded {
            layer,
            object: object.clone(),
        });
        Ok(object)
    }

    /// Every object of every object layer, bottom layer first.
    pub fn objects(&self) -> Vec<MapObject> {
        self.state()
            .layers
            .iter()
            .filter_map(Layer::as_objects)
            .flat_map(|layer| layer.objects.iter().cloned())
            .collect()
    }

    pub fn object(&self, id: u32) -> Option<MapObject> {
        self.state()
            .layers
            .iter()
            .filter_map(Layer::as_objects)
            .find_map(|layer| layer.object(id).cloned())
    }

    /// This map's object id counter; clones share it and may be used from other threads.
    pub fn object_ids(&self) -> ObjectIdAllocator {
        self.0.object_ids.clone()
    }

    // Observers

    pub fn subscribe(&self, callback: impl FnMut(&MapEvent) + 'static) -> ObserverId {
        self.0.observers.subscribe(callback)
    }

    pub fn subscribe_to(
        &self,
        kind: MapEventKind,
        callback: impl FnMut(&MapEvent) + 'static,
    ) -> ObserverId {
        self.0.observers.subscribe_to(kind, callback)
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.0.observers.unsubscribe(id)
    }
}

/// Handles are equal when they refer to the same map, not when ids match.
impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Map {}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children: Vec<u32> = self
            .0
            .children
            .try_borrow()
            .map(|children| children.iter().map(Map::id).collect())
            .unwrap_or_default();
        f.debug_struct("Map")
            .field("id", &self.id())
            .field("parent", &self.parent().as_ref().map(Map::id))
            .field("children", &children)
            .finish_non_exhaustive()
    }
}

/// Iterator over a map's ancestors, nearest first.
#[derive(Debug, Clone)]
pub struct Ancestors {
    next: Option<Map>,
}

impl Iterator for Ancestors {
    type Item = Map;

    fn next(&mut self) -> Option<Map> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}

/// Lazy pre-order walk of a subtree, see [`Map::descendants`].
#[derive(Debug, Clone)]
pub struct Descendants {
    stack: Vec<Map>,
}

impl Iterator for Descendants {
    type Item = Map;

    fn next(&mut self) -> Option<Map> {
        let map = self.stack.pop()?;
        self.stack
            .extend(map.0.children.borrow().iter().rev().cloned());
        Some(map)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use tiledmap_tree_assets::{TileCompression, TileEncoding};

    use super::*;

    fn record(map: &Map) -> Rc<RefCell<Vec<MapEventKind>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        map.subscribe(move |event| l.borrow_mut().push(crate::events::TaggedEvent::kind(event)));
        log
    }

    fn ids(maps: impl IntoIterator<Item = Map>) -> Vec<u32> {
        maps.into_iter().map(|m| m.id()).collect()
    }

    #[test]
    fn test_new_map_defaults() {
        let map = Map::new(1);
        assert_eq!((map.width(), map.height()), (20, 15));
        assert_eq!((map.tile_width(), map.tile_height()), (32, 32));
        assert_eq!(map.layer_count(), 1);

        let layer = map.layer(0).unwrap();
        let tiles = layer.as_tiles().unwrap();
        assert_eq!(tiles.tiles.len(), 300);
        assert_eq!(tiles.format, Some(LayerFormat::default()));
        assert!(map.is_root());
        assert_eq!(map.next_gid(), 1);
    }

    #[test]
    fn test_reparenting_is_symmetric() {
        let a = Map::new(1);
        let b = Map::new(2);
        let a_log = record(&a);
        let b_log = record(&b);

        b.set_parent(Some(&a)).unwrap();

        assert_eq!(a.children(), vec![b.clone()]);
        assert_eq!(b.parent(), Some(a.clone()));
        assert_eq!(*a_log.borrow(), vec![MapEventKind::ChildAdded]);
        assert_eq!(*b_log.borrow(), vec![MapEventKind::ParentChanged]);
    }

    #[test]
    fn test_moving_between_parents() {
        let a = Map::new(1);
        let c = Map::new(3);
        let b = Map::new(2);
        b.mount(&a).unwrap();

        let a_log = record(&a);
        let c_log = record(&c);
        let seen_parent = Rc::new(RefCell::new(None));
        let seen = seen_parent.clone();
        b.subscribe_to(MapEventKind::ParentChanged, move |event| {
            if let MapEvent::ParentChanged { new_parent } = event {
                *seen.borrow_mut() = new_parent.as_ref().map(Map::id);
            }
        });

        b.mount(&c).unwrap();

        assert!(a.children().is_empty());
        assert_eq!(c.children(), vec![b.clone()]);
        assert_eq!(*a_log.borrow(), vec![MapEventKind::ChildRemoved]);
        assert_eq!(*c_log.borrow(), vec![MapEventKind::ChildAdded]);
        assert_eq!(*seen_parent.borrow(), Some(3));
    }

    #[test]
    fn test_observers_see_a_consistent_tree() {
        let a = Map::new(1);
        let b = Map::new(2);
        let consistent = Rc::new(RefCell::new(false));
        let flag = consistent.clone();
        a.subscribe_to(MapEventKind::ChildAdded, move |event| {
            if let MapEvent::ChildAdded { new_child } = event {
                *flag.borrow_mut() = new_child.parent().map(|p| p.id()) == Some(1);
            }
        });
        b.mount(&a).unwrap();
        assert!(*consistent.borrow());
    }

    #[test]
    fn test_unmount_keeps_subtree() {
        let root = Map::new(1);
        let branch = Map::new(2);
        let leaf = Map::new(3);
        branch.mount(&root).unwrap();
        leaf.mount(&branch).unwrap();

        branch.unmount();

        assert!(root.children().is_empty());
        assert!(branch.is_root());
        assert_eq!(branch.children(), vec![leaf.clone()]);
        assert_eq!(leaf.root(), branch);
    }

    #[test]
    fn test_cycles_are_rejected() {
        let a = Map::new(1);
        let b = Map::new(2);
        let c = Map::new(3);
        b.mount(&a).unwrap();
        c.mount(&b).unwrap();
        let a_log = record(&a);

        assert_eq!(
            a.mount(&c),
            Err(MapError::CyclicParent { map: 1, parent: 3 })
        );
        assert_eq!(a.mount(&a), Err(MapError::CyclicParent { map: 1, parent: 1 }));
        assert!(a.is_root());
        assert_eq!(c.parent(), Some(b.clone()));
        assert!(a_log.borrow().is_empty());
    }

    #[test]
    fn test_navigation() {
        let a = Map::new(1);
        let b = Map::new(2);
        let c = Map::new(3);
        b.mount(&a).unwrap();
        c.mount(&b).unwrap();

        assert_eq!(ids(c.ancestors()), vec![2, 1]);
        assert_eq!(c.root(), a);
        assert_eq!(c.depth(), 2);
        assert!(a.is_ancestor_of(&c));
        assert!(!c.is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&a));
        assert_eq!(a.child_count(), 1);
        assert!(!c.has_children());
    }

    #[test]
    fn test_descendants_pre_order() {
        let m1 = Map::new(1);
        let m2 = Map::new(2);
        let m3 = Map::new(3);
        let m4 = Map::new(4);
        let m5 = Map::new(5);
        m2.mount(&m1).unwrap();
        m3.mount(&m2).unwrap();
        m4.mount(&m2).unwrap();
        m5.mount(&m1).unwrap();

        assert_eq!(ids(m1.descendants(true)), vec![1, 2, 3, 4, 5]);
        assert_eq!(ids(m1.descendants(false)), vec![2, 3, 4, 5]);
        assert_eq!(ids(m4.descendants(true)), vec![4]);
        assert!(m4.descendants(false).next().is_none());

        // Restartable: a clone or a fresh call walks again from the top
        let walk = m1.descendants(true);
        assert_eq!(ids(walk.clone()), ids(walk));
    }

    #[test]
    fn test_descendants_are_lazy() {
        let m1 = Map::new(1);
        let m2 = Map::new(2);
        m2.mount(&m1).unwrap();

        let mut walk = m1.descendants(true);
        assert_eq!(walk.next().map(|m| m.id()), Some(1));
        // Mounted after the walk started but before it reached m2
        Map::new(3).mount(&m2).unwrap();
        assert_eq!(ids(walk), vec![2, 3]);
    }

    #[test]
    fn test_properties_and_names() {
        let map = Map::new(7);
        let log = record(&map);

        assert_eq!(map.display_name(), "Map 0007");
        map.set_name("Harbour");
        map.set_property("music", "sea.ogg");

        assert_eq!(map.name().as_deref(), Some("Harbour"));
        assert_eq!(map.display_name(), "Harbour");
        assert_eq!(map.property("music").as_deref(), Some("sea.ogg"));
        assert_eq!(map.properties().len(), 2);
        assert_eq!(
            *log.borrow(),
            vec![MapEventKind::PropertyChanged, MapEventKind::PropertyChanged]
        );
    }

    #[test]
    fn test_resize_keeps_layer_payloads() {
        let map = Map::new(1);
        let sizes = Rc::new(RefCell::new(Vec::new()));
        let s = sizes.clone();
        map.subscribe_to(MapEventKind::SizeChanged, move |event| {
            if let MapEvent::SizeChanged { width, height } = event {
                s.borrow_mut().push((*width, *height));
            }
        });

        map.set_width(30);
        map.set_height(10);

        assert_eq!(*sizes.borrow(), vec![(30, 15), (30, 10)]);
        let layer = map.layer(0).unwrap();
        let tiles = layer.as_tiles().unwrap();
        assert_eq!((tiles.width, tiles.height), (20, 15));
        assert_eq!(tiles.tiles.len(), 300);

        map.add_tile_layer("Detail");
        let detail = map.layer(1).unwrap();
        assert_eq!(detail.as_tiles().unwrap().tiles.len(), 300);
    }

    #[test]
    fn test_tileset_gids_advance_by_tile_count() {
        let map = Map::new(1);
        let gids = Rc::new(RefCell::new(Vec::new()));
        let g = gids.clone();
        map.subscribe_to(MapEventKind::TilesetAdded, move |event| {
            if let MapEvent::TilesetAdded { gid, .. } = event {
                g.borrow_mut().push(*gid);
            }
        });

        let grass = TilesetRef::new("grass", "grass.tsx", 144);
        assert_eq!(map.add_tileset(grass.clone(), None), 1);
        assert_eq!(map.next_gid(), 145);
        assert_eq!(map.add_tileset(grass, None), 145);
        assert_eq!(map.next_gid(), 289);
        assert_eq!(*gids.borrow(), vec![1, 145]);

        assert_eq!(map.tileset_for_gid(144).map(|(gid, _)| gid), Some(1));
        assert_eq!(map.tileset_for_gid(145).map(|(gid, _)| gid), Some(145));
        assert!(map.tileset_for_gid(289).is_none());
        assert!(map.tileset_for_gid(0).is_none());
    }

    #[test]
    fn test_manual_gid_leaves_frontier() {
        // Known gap: a hand-placed binding does not reserve its range
        let map = Map::new(1);
        assert_eq!(map.add_tileset(TilesetRef::new("water", "water.tsx", 16), Some(1)), 1);
        assert_eq!(map.next_gid(), 1);

        let overlapping = map.add_tileset(TilesetRef::new("grass", "grass.tsx", 144), None);
        assert_eq!(overlapping, 1);
        assert_eq!(map.tilesets().len(), 2);
        assert_eq!(map.next_gid(), 145);
    }

    #[test]
    fn test_layer_format_default_applies_to_new_tile_layers() {
        let map = Map::new(1);
        let zlib = LayerFormat {
            encoding: TileEncoding::Base64,
            compression: TileCompression::Zlib,
        };
        map.set_layer_format(LayerFormat::CSV);

        let plain = map.add_tile_layer("Plain");
        let explicit = map.add_layer(Layer::Tiles(TileLayer::new("Packed", 2, 2).with_format(zlib)));

        assert_eq!(map.layer(plain).unwrap().as_tiles().unwrap().format, Some(LayerFormat::CSV));
        assert_eq!(map.layer(explicit).unwrap().as_tiles().unwrap().format, Some(zlib));
        assert_eq!(map.layer_by_name("Packed").map(|(i, _)| i), Some(explicit));
    }

    #[test]
    fn test_add_object() {
        let map = Map::new(1);
        let objects = map.add_object_layer("Events");
        let log = record(&map);

        let door = map
            .add_object(objects, MapObject::at(16.0, 32.0).with_property("kind", "door"))
            .unwrap();
        assert_eq!(door.id, 1);
        assert_eq!(door.name, "Object 0001");

        let chest = map.add_object(objects, MapObject::at(0.0, 0.0).named("Chest")).unwrap();
        assert_eq!(chest.id, 2);
        assert_eq!(chest.name, "Chest");

        let fixed = map
            .add_object(objects, MapObject { id: 10, ..Default::default() })
            .unwrap();
        assert_eq!(fixed.id, 10);
        assert_eq!(map.add_object(objects, MapObject::default()).unwrap().id, 11);

        assert_eq!(map.objects().len(), 4);
        assert_eq!(map.object(2).map(|o| o.name), Some("Chest".to_string()));
        assert_eq!(log.borrow().len(), 4);
        assert!(log.borrow().iter().all(|k| *k == MapEventKind::ObjectAdded));
    }

    #[test]
    fn test_add_object_after_the_last_id() {
        let map = Map::new(4);
        let objects = map.add_object_layer("Events");
        map.add_object(objects, MapObject { id: u32::MAX, ..Default::default() })
            .unwrap();

        assert_eq!(
            map.add_object(objects, MapObject::default()),
            Err(MapError::ObjectIdsExhausted { map: 4 })
        );
        // Explicit ids still go in
        assert_eq!(
            map.add_object(objects, MapObject { id: 7, ..Default::default() }).map(|o| o.id),
            Ok(7)
        );
        assert_eq!(map.objects().len(), 2);
    }

    #[test]
    fn test_add_object_to_wrong_layer() {
        let map = Map::new(3);
        assert_eq!(
            map.add_object(0, MapObject::default()),
            Err(MapError::NotObjectContainer { map: 3, layer: 0 })
        );
        assert_eq!(
            map.add_object(5, MapObject::default()),
            Err(MapError::LayerOutOfRange {
                map: 3,
                index: 5,
                len: 1
            })
        );
        // Nothing was allocated for the failed attempts
        assert_eq!(map.object_ids().last(), 0);
    }
}
