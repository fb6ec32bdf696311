use std::fs;

use tiledmap_tree_assets::CodecError;
use tiledmap_tree_core::prelude::*;

use crate::helpers::{Workspace, ids};

/// map1 -> map2 -> {map3, map4}
fn chain() -> Vec<Map> {
    let m1 = Map::new(1);
    let m2 = Map::new(2);
    let m3 = Map::new(3);
    let m4 = Map::new(4);
    m2.mount(&m1).unwrap();
    m3.mount(&m2).unwrap();
    m4.mount(&m2).unwrap();
    vec![m1]
}

#[test]
fn test_chain_scenario() {
    let ws = Workspace::new();
    let service = MapTreeService::default();

    service.save_tree(&ws.maps(), &ws.hierarchy(), &chain()).unwrap();
    let roots = service.load_tree(&ws.maps(), &ws.hierarchy()).unwrap();

    assert_eq!(roots.len(), 1);
    let children = roots[0].children();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].child_count(), 2);
    assert_eq!(ids(roots[0].descendants(true)), vec![1, 2, 3, 4]);
}

#[test]
fn test_round_trip_keeps_ids_properties_and_shape() {
    let ws = Workspace::new();
    let service = MapTreeService::default();

    let world = Map::new(1);
    world.set_name("World");
    world.set_property("music", "overworld.ogg");
    let cave = Map::new(10000);
    cave.set_name("Cave");
    cave.mount(&world).unwrap();
    let island = Map::new(42);
    island.set_property("weather", "rain");
    island.resize(64, 48);

    service
        .save_tree(&ws.maps(), &ws.hierarchy(), &[world.clone(), island.clone()])
        .unwrap();

    let names: Vec<String> = ws.snapshot().into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["0001.tmx", "0042.tmx", "10000.tmx", "maps.xml"]);

    let roots = service.load_tree(&ws.maps(), &ws.hierarchy()).unwrap();
    assert_eq!(ids(roots.clone()), vec![1, 42]);

    let before: Vec<Map> = all_maps(&[world, island]).collect();
    let after: Vec<Map> = all_maps(&roots).collect();
    assert_eq!(ids(before.clone()), ids(after.clone()));
    for (old, new) in before.iter().zip(&after) {
        assert_eq!(old.properties(), new.properties(), "map {}", old.id());
        assert_eq!(old.parent().map(|p| p.id()), new.parent().map(|p| p.id()));
        assert_eq!((old.width(), old.height()), (new.width(), new.height()));
    }
}

#[test]
fn test_duplicate_id_leaves_directory_untouched() {
    let ws = Workspace::new();
    let service = MapTreeService::default();

    service.save_tree(&ws.maps(), &ws.hierarchy(), &chain()).unwrap();
    let before = ws.snapshot();

    let roots = service.load_tree(&ws.maps(), &ws.hierarchy()).unwrap();
    let impostor = Map::new(3);
    impostor.set_name("Impostor");
    impostor.mount(&roots[0]).unwrap();
    roots[0].set_name("Changed");

    let err = service
        .save_tree(&ws.maps(), &ws.hierarchy(), &roots)
        .unwrap_err();
    assert!(matches!(err, TreeError::DuplicateMapId(3)));
    assert_eq!(ws.snapshot(), before);
}

#[test]
fn test_save_wipes_removed_maps() {
    let ws = Workspace::new();
    let service = MapTreeService::default();

    let roots = chain();
    service.save_tree(&ws.maps(), &ws.hierarchy(), &roots).unwrap();
    fs::write(ws.maps().join("notes.txt"), "stale").unwrap();

    // Drop map 4 from the tree
    let m4 = find_map(&roots, 4).unwrap();
    m4.unmount();
    service.save_tree(&ws.maps(), &ws.hierarchy(), &roots).unwrap();

    let names: Vec<String> = ws.snapshot().into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["0001.tmx", "0002.tmx", "0003.tmx", "maps.xml"]);
}

#[test]
fn test_empty_forest() {
    let ws = Workspace::new();
    let service = MapTreeService::default();

    service.save_tree(&ws.maps(), &ws.hierarchy(), &[]).unwrap();
    assert!(service.load_tree(&ws.maps(), &ws.hierarchy()).unwrap().is_empty());
}

#[test]
fn test_missing_map_file() {
    let ws = Workspace::new();
    let service = MapTreeService::default();

    service.save_tree(&ws.maps(), &ws.hierarchy(), &chain()).unwrap();
    fs::remove_file(ws.maps().join("0003.tmx")).unwrap();

    let err = service.load_tree(&ws.maps(), &ws.hierarchy()).unwrap_err();
    assert!(matches!(err, TreeError::Codec(CodecError::InvalidPath(_))));
}

#[test]
fn test_malformed_hierarchy_reports_line() {
    let ws = Workspace::new();
    fs::write(
        ws.hierarchy(),
        "<?xml version=\"1.0\"?>\n<maps>\n <map id=\"1\">\n  <map id=\"x\"/>\n </map>\n</maps>\n",
    )
    .unwrap();

    let err = MapTreeService::default()
        .load_tree(&ws.maps(), &ws.hierarchy())
        .unwrap_err();
    match err {
        TreeError::Codec(codec @ CodecError::Parse { .. }) => assert_eq!(codec.line(), Some(4)),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_loaded_maps_resume_allocation() {
    let ws = Workspace::new();
    let service = MapTreeService::default();

    let map = Map::new(1);
    let layer = map.add_object_layer("Events");
    for _ in 0..3 {
        map.add_object(layer, MapObject::at(0.0, 0.0)).unwrap();
    }
    map.add_tileset(TilesetRef::new("grass", "grass.tsx", 144), None);
    service.save_tree(&ws.maps(), &ws.hierarchy(), &[map]).unwrap();

    let roots = service.load_tree(&ws.maps(), &ws.hierarchy()).unwrap();
    let loaded = &roots[0];
    let object = loaded.add_object(layer, MapObject::at(1.0, 1.0)).unwrap();
    assert_eq!(object.id, 4);
    assert_eq!(object.name, "Object 0004");
    assert_eq!(
        loaded.add_tileset(TilesetRef::new("water", "water.tsx", 16), None),
        145
    );
}

#[test]
fn test_round_trip_keeps_whitespace_in_property_values() {
    let ws = Workspace::new();
    let service = MapTreeService::default();

    let map = Map::new(1);
    map.set_property("notes", "line one\nline two\n");
    map.set_property("indent", "\n  x");
    map.set_property("tabbed", "\tcol\t");
    service
        .save_tree(&ws.maps(), &ws.hierarchy(), &[map.clone()])
        .unwrap();

    let roots = service.load_tree(&ws.maps(), &ws.hierarchy()).unwrap();
    assert_eq!(roots[0].properties(), map.properties());
}
