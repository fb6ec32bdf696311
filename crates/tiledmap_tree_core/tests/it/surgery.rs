use std::cell::RefCell;
use std::rc::Rc;

use tiledmap_tree_core::prelude::*;

use crate::helpers::{ids, init_tracing, record};

#[test]
fn test_reparenting_symmetry() {
    init_tracing();
    let a = Map::new(1);
    let b = Map::new(2);
    let a_events = record(&a);
    let b_events = record(&b);

    b.set_parent(Some(&a)).unwrap();

    assert!(a.children().contains(&b));
    assert_eq!(b.parent(), Some(a.clone()));
    assert_eq!(
        a_events
            .borrow()
            .iter()
            .filter(|k| **k == MapEventKind::ChildAdded)
            .count(),
        1
    );
    assert_eq!(
        b_events
            .borrow()
            .iter()
            .filter(|k| **k == MapEventKind::ParentChanged)
            .count(),
        1
    );
}

#[test]
fn test_unmount_keeps_subtree_intact() {
    init_tracing();
    let root = Map::new(1);
    let branch = Map::new(2);
    let leaf_a = Map::new(3);
    let leaf_b = Map::new(4);
    branch.mount(&root).unwrap();
    leaf_a.mount(&branch).unwrap();
    leaf_b.mount(&branch).unwrap();

    let root_events = record(&root);
    let branch_events = record(&branch);
    branch.unmount();

    assert!(!root.has_children());
    assert_eq!(ids(root.descendants(true)), vec![1]);
    assert_eq!(ids(branch.descendants(true)), vec![2, 3, 4]);
    assert_eq!(*root_events.borrow(), vec![MapEventKind::ChildRemoved]);
    assert_eq!(*branch_events.borrow(), vec![MapEventKind::ParentChanged]);

    // Re-attach somewhere else
    let other = Map::new(5);
    branch.mount(&other).unwrap();
    assert_eq!(ids(other.descendants(false)), vec![2, 3, 4]);
    assert_eq!(leaf_b.root(), other);
}

#[test]
fn test_project_tracks_unmounted_subtree() {
    init_tracing();
    let mut project = MapProject::new("unused", MapTreeConfig::default());
    let added = Rc::new(RefCell::new(Vec::new()));
    let a = added.clone();
    project.subscribe_to(ProjectEventKind::RootMapAdded, move |event| {
        if let ProjectEvent::RootMapAdded { map } = event {
            a.borrow_mut().push(map.id());
        }
    });

    let world = project.new_map(None).unwrap();
    let town = project.new_map(Some(&world)).unwrap();
    project.new_map(Some(&town)).unwrap();

    // Map ids stay unique while part of the forest
    assert_eq!(ids(all_maps(project.roots())), vec![1, 2, 3]);

    project.add_root_map(town.clone());
    assert_eq!(ids(project.roots().iter().cloned()), vec![1, 2]);
    assert_eq!(ids(town.descendants(true)), vec![2, 3]);
    assert_eq!(*added.borrow(), vec![1, 2]);
    assert!(validate(project.roots()).is_ok());
}

#[test]
fn test_observer_can_inspect_the_tree() {
    init_tracing();
    let a = Map::new(1);
    let b = Map::new(2);
    let c = Map::new(3);
    b.mount(&a).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    c.subscribe_to(MapEventKind::ParentChanged, move |event| {
        if let MapEvent::ParentChanged {
            new_parent: Some(parent),
        } = event
        {
            s.borrow_mut().push(ids(parent.root().descendants(true)));
        }
    });

    c.mount(&b).unwrap();
    assert_eq!(*seen.borrow(), vec![vec![1, 2, 3]]);
}

#[test]
fn test_observer_reacting_with_a_mutation_is_heard() {
    init_tracing();
    let world = Map::new(1);
    let town = Map::new(2);
    let events = record(&town);

    let this = town.clone();
    town.subscribe_to(MapEventKind::ParentChanged, move |event| {
        if let MapEvent::ParentChanged {
            new_parent: Some(parent),
        } = event
        {
            this.set_property("region", parent.display_name());
        }
    });

    town.mount(&world).unwrap();

    assert_eq!(
        *events.borrow(),
        vec![MapEventKind::ParentChanged, MapEventKind::PropertyChanged]
    );
    assert_eq!(town.property("region").as_deref(), Some("Map 0001"));
}
