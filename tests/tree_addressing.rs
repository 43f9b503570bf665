//! Path addressing, values and structural invariants across whole trees

mod common;

use common::builders::{nested_tree, shadowed_tree, TypeBuilder};
use widgets_rs::{ErrorKind, NodeBuilder, Propagate, Value, ValueTree};

#[test]
fn test_get_at_every_depth() {
    let registry = common::registry();
    let tree = nested_tree(&registry);

    assert_eq!(tree.get(&["a"], "value").unwrap(), Value::from("foo"));
    assert_eq!(tree.get(&["mid", "b"], "value").unwrap(), Value::from("bar"));
    assert_eq!(
        tree.get(&["mid", "deep", "c"], "value").unwrap(),
        Value::from("baz")
    );
    assert_eq!(tree.get(&[], "id").unwrap(), Value::from("top"));
    assert_eq!(tree.get(&["mid", "deep"], "label").unwrap(), Value::from("Deep"));
}

#[test]
fn test_path_to_root() {
    let registry = common::registry();
    let tree = nested_tree(&registry);

    let c = tree.resolve(&["mid", "deep", "c"]).unwrap();
    assert_eq!(tree.path_to_root(c).unwrap(), vec!["c", "deep", "mid", "top"]);
    assert_eq!(tree.root_of(c).unwrap(), tree.root());
    assert_eq!(tree.key(c).unwrap(), "c_deep_mid_top_0");
}

#[test]
fn test_missing_segment_and_attribute() {
    let registry = common::registry();
    let tree = nested_tree(&registry);

    // No backtracking: "c" is not a direct child of "mid"
    let err = tree.get(&["mid", "c"], "value").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NodeExecution);

    let err = tree.get(&["a"], "colour").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NodeExecution);
}

#[test]
fn test_nested_values() {
    let registry = common::registry();
    let tree = nested_tree(&registry);

    let values = tree.all_values(&[], false).unwrap();
    assert_eq!(values.leaf(&["a"]), Some(&Value::from("foo")));
    assert_eq!(values.leaf(&["mid", "deep", "c"]), Some(&Value::from("baz")));

    let flat = tree.all_values(&[], true).unwrap();
    let keys: Vec<_> = flat.as_branch().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["a", "b", "c"]);

    let sub = tree.all_values(&["mid"], false).unwrap();
    assert_eq!(sub.leaf(&["b"]), Some(&Value::from("bar")));
    assert_eq!(
        tree.all_values(&["a"], true).unwrap(),
        ValueTree::Leaf(Value::from("foo"))
    );
}

#[test]
fn test_flatten_rejects_shadowed_ids() {
    let registry = common::registry();
    let tree = shadowed_tree(&registry);

    let err = tree.all_values(&[], true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NodeExecution);

    let nested = tree.all_values(&[], false).unwrap();
    assert_eq!(nested.leaf(&["left", "x"]), Some(&Value::Int(1)));
    assert_eq!(nested.leaf(&["right", "x"]), Some(&Value::Int(2)));
}

#[test]
fn test_duplicate_siblings_rejected_at_any_depth() {
    let registry = common::registry();
    let err = NodeBuilder::resource("top")
        .child(
            NodeBuilder::resource("mid").child(
                NodeBuilder::resource("deep")
                    .child(NodeBuilder::resource("twin"))
                    .child(NodeBuilder::resource("twin")),
            ),
        )
        .build(&registry)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_set_without_propagation() {
    let registry = common::registry();
    let mut tree = nested_tree(&registry);

    tree.set(&["mid", "b"], "value", Value::Int(3), Propagate::No)
        .unwrap();
    tree.set(&["mid", "b"], "unit", Value::from("cm"), Propagate::No)
        .unwrap();
    assert_eq!(tree.get(&["mid", "b"], "value").unwrap(), Value::Int(3));
    assert_eq!(tree.get(&["mid", "b"], "unit").unwrap(), Value::from("cm"));

    let err = tree
        .set(&["mid"], "id", Value::from("other"), Propagate::No)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_find_and_type_checks() {
    let registry = common::registry();
    let tree = shadowed_tree(&registry);

    assert_eq!(tree.find("x").len(), 2);
    assert!(tree.find("nothing").is_empty());

    let x = tree.resolve(&["left", "x"]).unwrap();
    assert!(tree.assert_is_a(x, "Resource", true, true).is_ok());
    let err = tree.assert_is_a(x, "SubResource", true, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_removed_handles_are_stale() {
    let registry = common::registry();
    let mut tree = nested_tree(&registry);
    let root = tree.root();
    let a = tree.resolve(&["a"]).unwrap();

    tree.remove(root, 0).unwrap();
    assert!(tree.get_node(a).is_none());

    let err = tree.set_on(a, "value", Value::Int(9), Propagate::No).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NodeExecution);
    assert!(tree.get_from(a, &[], "value").is_err());
    assert!(tree.path_to_root(a).is_err());
    assert!(tree.run_node(a).is_err());

    // The freed slot is reused, but the old handle still does not resolve
    let added = tree.append(root).unwrap();
    assert_eq!(added.index(), a.index());
    assert_ne!(added, a);
    assert!(tree.get_node(a).is_none());
    assert_eq!(tree.path_to_root(added).unwrap(), vec!["elem_0", "top"]);
}

#[test]
fn test_removed_slots_are_reused() {
    let registry = common::registry();
    let mut tree = NodeBuilder::resource("top").build(&registry).unwrap();
    let root = tree.root();

    for _ in 0..1000 {
        tree.append(root).unwrap();
        tree.remove(root, 0).unwrap();
    }
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.slots(), 2);

    // Copies hold only live nodes
    tree.append(root).unwrap();
    tree.append(root).unwrap();
    tree.remove(root, 0).unwrap();
    let copy = tree.subtree(root);
    assert_eq!(copy.len(), 2);
    assert_eq!(copy.slots(), 2);
}

#[test]
fn test_bump_revision_changes_key() {
    let registry = common::registry();
    let mut tree = nested_tree(&registry);
    let b = tree.resolve(&["mid", "b"]).unwrap();

    let before = tree.key(b).unwrap();
    assert_eq!(before, "b_mid_top_0");
    assert_eq!(tree.bump_revision(b).unwrap(), 1);
    let after = tree.key(b).unwrap();
    assert_eq!(after, "b_mid_top_1");
    assert_ne!(before, after);

    // Only the bumped node gets a new key
    let a = tree.resolve(&["a"]).unwrap();
    assert_eq!(tree.key(a).unwrap(), "a_top_0");
    assert_eq!(tree.get(&["mid", "b"], "value").unwrap(), Value::from("bar"));
}

#[test]
fn test_failing_teardown_keeps_child() {
    let registry = common::registry();
    TypeBuilder::new("Stubborn")
        .script(r#"fn teardown() { throw "still in use"; }"#)
        .register(&registry);
    TypeBuilder::new("Tidy")
        .script("fn teardown() { this.stopped = true; }")
        .register(&registry);

    let mut tree = NodeBuilder::resource("top")
        .child(
            NodeBuilder::new("Stubborn")
                .id("s")
                .child(NodeBuilder::new("Tidy").id("inner")),
        )
        .build(&registry)
        .unwrap();
    let before = tree.clone();
    let root = tree.root();

    let err = tree.remove(root, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Script);

    assert_eq!(tree, before);
    assert_eq!(tree.node(root).child_count(), 1);
    assert!(tree.get(&["s", "inner"], "stopped").is_err());
    let inner = tree.resolve(&["s", "inner"]).unwrap();
    assert_eq!(tree.path_to_root(inner).unwrap(), vec!["inner", "s", "top"]);
}
