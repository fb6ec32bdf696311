//! Change notifications for maps and projects.
//!
//! Every [`Map`] owns an [`Observers`] registry. Mutations emit a [`MapEvent`]
//! which is delivered synchronously, in registration order, to each observer
//! whose filter accepts it. Projects do the same with [`ProjectEvent`].
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use tiledmap_tree_core::prelude::*;
//!
//! let map = Map::new(1);
//! let resized = Rc::new(Cell::new(0));
//!
//! let counter = resized.clone();
//! map.subscribe_to(MapEventKind::SizeChanged, move |event| {
//!     if let MapEvent::SizeChanged { width, .. } = event {
//!         counter.set(*width);
//!     }
//! });
//!
//! map.set_width(40);
//! assert_eq!(resized.get(), 40);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

use crate::layer::{Layer, MapObject};
use crate::map::Map;
use crate::tileset::TilesetRef;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// An event type with a fieldless tag observers can filter on.
pub trait TaggedEvent {
    type Kind: Copy + Eq + fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

/// Fired by a [`Map`] on its own observers.
#[derive(Debug, Clone)]
pub enum MapEvent {
    /// The map was mounted under `new_parent`, or unmounted when `None`.
    ParentChanged { new_parent: Option<Map> },
    /// `new_child` now lists this map as its parent.
    ChildAdded { new_child: Map },
    /// `old_child` no longer lists this map as its parent.
    ChildRemoved { old_child: Map },
    PropertyChanged { property: String, new_value: String },
    /// Grid dimensions changed. Tile layer payloads are left as they were.
    SizeChanged { width: u32, height: u32 },
    /// A tileset was bound with its first tile at `gid`.
    TilesetAdded { gid: u32, tileset: TilesetRef },
    /// `layer` was appended at `index`.
    LayerAdded { index: usize, layer: Layer },
    /// `object` was placed on the object layer at `layer`.
    ObjectAdded { layer: usize, object: MapObject },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEventKind {
    ParentChanged,
    ChildAdded,
    ChildRemoved,
    PropertyChanged,
    SizeChanged,
    TilesetAdded,
    LayerAdded,
    ObjectAdded,
}

impl TaggedEvent for MapEvent {
    type Kind = MapEventKind;

    fn kind(&self) -> MapEventKind {
        match self {
            MapEvent::ParentChanged { .. } => MapEventKind::ParentChanged,
            MapEvent::ChildAdded { .. } => MapEventKind::ChildAdded,
            MapEvent::ChildRemoved { .. } => MapEventKind::ChildRemoved,
            MapEvent::PropertyChanged { .. } => MapEventKind::PropertyChanged,
            MapEvent::SizeChanged { .. } => MapEventKind::SizeChanged,
            MapEvent::TilesetAdded { .. } => MapEventKind::TilesetAdded,
            MapEvent::LayerAdded { .. } => MapEventKind::LayerAdded,
            MapEvent::ObjectAdded { .. } => MapEventKind::ObjectAdded,
        }
    }
}

/// Fired by a [`MapProject`](crate::project::MapProject) when its list of root maps changes.
///
/// These are distinct from the per-map parent/child events: unmounting a map
/// emits `ParentChanged` on the map, and only becomes a `RootMapAdded` once the
/// project adopts it.
#[derive(Debug, Clone)]
pub enum ProjectEvent {
    RootMapAdded { map: Map },
    RootMapRemoved { map: Map },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectEventKind {
    RootMapAdded,
    RootMapRemoved,
}

impl TaggedEvent for ProjectEvent {
    type Kind = ProjectEventKind;

    fn kind(&self) -> ProjectEventKind {
        match self {
            ProjectEvent::RootMapAdded { .. } => ProjectEventKind::RootMapAdded,
            ProjectEvent::RootMapRemoved { .. } => ProjectEventKind::RootMapRemoved,
        }
    }
}

type Callback<E> = Box<dyn FnMut(&E)>;

struct Entry<E: TaggedEvent> {
    id: ObserverId,
    filter: Option<E::Kind>,
    callback: Callback<E>,
}

struct Registry<E: TaggedEvent> {
    next_id: u64,
    entries: Vec<Entry<E>>,
    /// Ids of entries taken out for a dispatch in progress
    in_flight: Vec<ObserverId>,
    /// In-flight ids unsubscribed during that dispatch
    removed: Vec<ObserverId>,
    dispatching: bool,
    /// Events emitted by callbacks, delivered once the current one is done
    pending: VecDeque<E>,
}

/// Synchronous observer registry.
///
/// Observers may subscribe, unsubscribe and emit from inside a callback.
/// Observers added during a dispatch first hear the next event; one removed
/// during a dispatch hears nothing more, including the rest of the current one.
/// An event emitted from a callback is queued and delivered to every observer
/// right after the current event, before the outer `emit` returns.
pub struct Observers<E: TaggedEvent> {
    registry: RefCell<Registry<E>>,
}

impl<E: TaggedEvent> Default for Observers<E> {
    fn default() -> Self {
        Self {
            registry: RefCell::new(Registry {
                next_id: 0,
                entries: Vec::new(),
                in_flight: Vec::new(),
                removed: Vec::new(),
                dispatching: false,
                pending: VecDeque::new(),
            }),
        }
    }
}

impl<E: TaggedEvent> Observers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe every event.
    pub fn subscribe(&self, callback: impl FnMut(&E) + 'static) -> ObserverId {
        self.register(None, Box::new(callback))
    }

    /// Observe only events of `kind`.
    pub fn subscribe_to(&self, kind: E::Kind, callback: impl FnMut(&E) + 'static) -> ObserverId {
        self.register(Some(kind), Box::new(callback))
    }

    fn register(&self, filter: Option<E::Kind>, callback: Callback<E>) -> ObserverId {
        let mut registry = self.registry.borrow_mut();
        let id = ObserverId(registry.next_id);
        registry.next_id += 1;
        registry.entries.push(Entry {
            id,
            filter,
            callback,
        });
        id
    }

    /// Remove an observer. Returns `false` if `id` was not registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut registry = self.registry.borrow_mut();
        if let Some(index) = registry.entries.iter().position(|e| e.id == id) {
            registry.entries.remove(index);
            return true;
        }
        if registry.in_flight.contains(&id) && !registry.removed.contains(&id) {
            registry.removed.push(id);
            return true;
        }
        false
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        let registry = self.registry.borrow();
        registry.entries.len() + registry.in_flight.len() - registry.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every accepting observer, in registration order.
    ///
    /// Called from inside a callback, the event waits until the event being
    /// delivered has reached every observer.
    pub fn emit(&self, event: &E)
    where
        E: Clone,
    {
        {
            let mut registry = self.registry.borrow_mut();
            if registry.dispatching {
                registry.pending.push_back(event.clone());
                return;
            }
            registry.dispatching = true;
        }

        self.dispatch(event);
        loop {
            let mut registry = self.registry.borrow_mut();
            let Some(next) = registry.pending.pop_front() else {
                registry.dispatching = false;
                break;
            };
            drop(registry);
            self.dispatch(&next);
        }
    }

    fn dispatch(&self, event: &E) {
        let mut dispatching = {
            let mut registry = self.registry.borrow_mut();
            let entries = std::mem::take(&mut registry.entries);
            registry.in_flight.extend(entries.iter().map(|e| e.id));
            entries
        };

        let kind = event.kind();
        for entry in &mut dispatching {
            if self.registry.borrow().removed.contains(&entry.id) {
                continue;
            }
            if entry.filter.is_none_or(|filter| filter == kind) {
                (entry.callback)(event);
            }
        }

        let mut registry = self.registry.borrow_mut();
        let registry = &mut *registry;
        registry.in_flight.retain(|id| !dispatching.iter().any(|e| e.id == *id));
        dispatching.retain(|e| {
            if let Some(index) = registry.removed.iter().position(|id| *id == e.id) {
                registry.removed.swap_remove(index);
                false
            } else {
                true
            }
        });
        // Entries registered during the dispatch come after the dispatched ones
        dispatching.append(&mut registry.entries);
        registry.entries = dispatching;
    }
}

impl<E: TaggedEvent> fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers").field("len", &self.len()).finish()
    }
}
