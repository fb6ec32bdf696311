use std::collections::HashSet;
use std::thread;

use tiledmap_tree_core::prelude::*;

use crate::helpers::init_tracing;

#[test]
fn test_concurrent_object_ids() {
    init_tracing();
    let map = Map::new(1);
    let layer = map.add_object_layer("Objects");
    map.add_object(layer, MapObject::default()).unwrap();

    // The map itself stays on this thread; only its id counter is shared
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ids = map.object_ids();
            thread::spawn(move || (0..250).map(|_| ids.next().unwrap()).collect::<Vec<_>>())
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id), "duplicate object id {id}");
        }
    }
    assert_eq!(seen.len(), 1000);
    assert_eq!(seen.iter().min(), Some(&2));
    assert_eq!(seen.iter().max(), Some(&1001));

    let next = map.add_object(layer, MapObject::default()).unwrap();
    assert_eq!(next.id, 1002);
}

#[test]
fn test_tileset_gids_for_fresh_map() {
    init_tracing();
    let map = Map::new(1);
    let grass = TilesetRef::new("grass", "../tilesets/grass.tsx", 144);

    map.add_tileset(grass.clone(), None);
    assert_eq!(map.next_gid(), 145);
    map.add_tileset(grass, None);
    assert_eq!(map.next_gid(), 289);
}

#[test]
fn test_manual_gid_is_a_known_gap() {
    // A binding at a chosen GID does not move the frontier, so the next
    // automatic binding lands on top of it. Kept as is; see DESIGN.md.
    init_tracing();
    let map = Map::new(1);
    map.add_tileset(TilesetRef::new("props", "props.tsx", 64), Some(1));
    let auto = map.add_tileset(TilesetRef::new("grass", "grass.tsx", 144), None);

    assert_eq!(auto, 1);
    let starts: Vec<u32> = map.tilesets().iter().map(|(gid, _)| *gid).collect();
    assert_eq!(starts, vec![1, 1]);
}
