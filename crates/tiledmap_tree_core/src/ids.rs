//! Per-map id allocation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::trace;

/// Source of object ids for one map.
///
/// Holds the last id handed out. Clones share the same counter, so a clone can
/// be moved to another thread and every caller still gets a distinct id.
#[derive(Debug, Clone, Default)]
pub struct ObjectIdAllocator {
    last: Arc<AtomicU32>,
}

impl ObjectIdAllocator {
    /// A counter for a fresh map: the first id will be 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// A counter resuming after `last`, typically the highest object id in a loaded map.
    pub fn starting_after(last: u32) -> Self {
        Self {
            last: Arc::new(AtomicU32::new(last)),
        }
    }

    /// Take the next id, or `None` once `u32::MAX` has been used.
    pub fn next(&self) -> Option<u32> {
        let last = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| last.checked_add(1))
            .ok()?;
        let id = last + 1;
        trace!("Allocated object id {id}");
        Some(id)
    }

    /// The last id handed out (or observed), 0 if none.
    pub fn last(&self) -> u32 {
        self.last.load(Ordering::Acquire)
    }

    /// Record an id that was assigned by hand so later allocations skip past it.
    pub fn observe(&self, id: u32) {
        self.last.fetch_max(id, Ordering::AcqRel);
    }
}

/// Next free tileset GID for one map.
///
/// Starts at 1. Binding a tileset with `n` tiles at the frontier advances it by `n`.
/// Bindings at a caller-chosen GID leave the frontier where it was, so a later
/// automatic binding can overlap them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilesetGidAllocator {
    next: u32,
}

impl Default for TilesetGidAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl TilesetGidAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the frontier from existing `(first_gid, tile_count)` bindings:
    /// just past the end of the highest range.
    pub fn from_ranges(ranges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let next = ranges
            .into_iter()
            .map(|(first_gid, tile_count)| first_gid.saturating_add(tile_count))
            .max()
            .unwrap_or(1)
            .max(1);
        Self { next }
    }

    /// The GID the next automatic binding will start at.
    pub fn next(&self) -> u32 {
        self.next
    }

    /// Move the frontier past a tileset of `tile_count` tiles.
    pub fn advance(&mut self, tile_count: u32) {
        self.next = self.next.saturating_add(tile_count);
    }
}
