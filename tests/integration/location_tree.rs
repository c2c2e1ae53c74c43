//! Location tree collision detection and cascading removal

use tracker::diagnostics::RecordingSink;
use tracker::event::LocationContext;
use tracker::location_tree::LocationTree;

#[test]
fn test_identical_paths_report_each_new_collider_once() {
    let sink = RecordingSink::shared();
    let mut tree = LocationTree::new(sink.clone());
    let root = LocationContext::content("root");
    tree.add(&root, None);

    let first = LocationContext::content("oops");
    assert!(tree.add(&first, Some(&root)).is_empty());

    let second = LocationContext::content("oops");
    assert_eq!(tree.add(&second, Some(&root)), vec![second.instance_id]);
    assert_eq!(sink.errors().len(), 1);
    assert!(sink.errors()[0].contains("ContentContext:root / ContentContext:oops"));

    let third = LocationContext::content("oops");
    tree.add(&third, Some(&root));
    assert_eq!(sink.errors().len(), 2);

    let fourth = LocationContext::content("oops");
    let collisions = tree.add(&fourth, Some(&root));
    assert_eq!(sink.errors().len(), 3);
    assert_eq!(
        collisions,
        vec![second.instance_id, third.instance_id, fourth.instance_id]
    );
}

#[test]
fn test_descendants_of_colliding_node_stay_silent() {
    let sink = RecordingSink::shared();
    let mut tree = LocationTree::new(sink.clone());
    let root = LocationContext::root_location("home");
    let original = LocationContext::overlay("modal");
    let duplicate = LocationContext::overlay("modal");
    tree.add(&root, None);
    tree.add(&original, Some(&root));
    tree.add(&LocationContext::pressable("close"), Some(&original));
    tree.add(&duplicate, Some(&root));
    assert_eq!(sink.errors().len(), 1);

    // Same path as the original's child, but under the colliding node.
    let collisions = tree.add(&LocationContext::pressable("close"), Some(&duplicate));
    assert_eq!(collisions, vec![duplicate.instance_id]);
    assert_eq!(sink.errors().len(), 1);
}

#[test]
fn test_removing_interior_node_cascades() {
    let sink = RecordingSink::shared();
    let mut tree = LocationTree::new(sink);
    let root = LocationContext::root_location("home");
    let nav = LocationContext::navigation("nav");
    tree.add(&root, None);
    tree.add(&nav, Some(&root));
    tree.add(&LocationContext::pressable("button"), Some(&nav));
    assert_eq!(tree.len(), 3);

    assert_eq!(tree.remove(&nav), 2);
    assert_eq!(tree.len(), 1);
    assert!(tree.children(&root).is_empty());
}

#[test]
fn test_pruning_two_branches_of_nine_node_tree() {
    let sink = RecordingSink::shared();
    let mut tree = LocationTree::new(sink.clone());

    let home = LocationContext::root_location("home");
    let header = LocationContext::navigation("header");
    let logo = LocationContext::link("logo", "/");
    let sidebar = LocationContext::expandable("sidebar");
    let main = LocationContext::content("main");
    let nav = LocationContext::navigation("nav");
    let button = LocationContext::pressable("button");
    let footer = LocationContext::content("footer");
    let links = LocationContext::navigation("links");

    tree.add(&home, None);
    tree.add(&header, Some(&home));
    tree.add(&logo, Some(&header));
    tree.add(&sidebar, Some(&home));
    tree.add(&main, Some(&home));
    tree.add(&nav, Some(&main));
    tree.add(&button, Some(&nav));
    tree.add(&footer, Some(&home));
    tree.add(&links, Some(&footer));
    assert_eq!(tree.len(), 9);

    assert_eq!(tree.remove(&footer), 2);
    assert_eq!(tree.remove(&main), 3);

    let survivors: Vec<&str> = tree.nodes().map(|n| n.id.as_str()).collect();
    assert_eq!(survivors, vec!["home", "header", "logo", "sidebar"]);
    assert!(sink.errors().is_empty());
}

#[test]
fn test_removed_collider_can_be_mounted_again_cleanly() {
    let sink = RecordingSink::shared();
    let mut tree = LocationTree::new(sink.clone());
    let root = LocationContext::root_location("home");
    let first = LocationContext::content("list");
    let second = LocationContext::content("list");
    tree.add(&root, None);
    tree.add(&first, Some(&root));
    tree.add(&second, Some(&root));
    assert_eq!(sink.errors().len(), 1);

    tree.remove(&second);
    assert!(tree.validate().is_empty());

    // The remount is a new instance, so it is reported again.
    let remount = LocationContext::content("list");
    assert_eq!(tree.add(&remount, Some(&root)), vec![remount.instance_id]);
    assert_eq!(sink.errors().len(), 2);
}
