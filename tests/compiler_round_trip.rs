//! Generated programs rebuild the trees they were rendered from

mod common;

use common::builders::{chain_tree, nested_tree, TypeBuilder};
use common::round_trip;
use widgets_rs::scripting::builtins;
use widgets_rs::{builtin, Cell, ErrorKind, NodeBuilder, SourceCompiler, Table, Value};

#[test]
fn test_plain_tree_round_trip() {
    let registry = common::registry();
    let tree = nested_tree(&registry);

    let rebuilt = round_trip(&tree);
    assert_eq!(
        rebuilt.all_values(&[], false).unwrap(),
        tree.all_values(&[], false).unwrap()
    );
    assert_eq!(rebuilt, tree);
}

#[test]
fn test_shared_supertype_emitted_once_first() {
    let registry = common::registry();
    TypeBuilder::new("Base")
        .param("scale")
        .default("scale", 2)
        .script("fn run_self() { this.value = this.scale * 10; }")
        .register(&registry);
    TypeBuilder::new("Derived")
        .parent("Base")
        .default("scale", 3)
        .register(&registry);

    let tree = NodeBuilder::resource("top")
        .child(NodeBuilder::new("Derived").id("d").value(1))
        .child(NodeBuilder::new("Base").id("b").value(2))
        .build(&registry)
        .unwrap();

    let program = SourceCompiler::default().render_program(&tree).unwrap();
    assert_eq!(program.matches(r#""name": "Base""#).count(), 1);
    assert_eq!(program.matches(r#""name": "Derived""#).count(), 1);
    let base = program.find(r#""name": "Base""#).unwrap();
    let derived = program.find(r#""name": "Derived""#).unwrap();
    assert!(base < derived);

    let mut rebuilt = round_trip(&tree);
    assert_eq!(
        rebuilt.all_values(&[], false).unwrap(),
        tree.all_values(&[], false).unwrap()
    );

    // Hooks survive the trip
    rebuilt.run().unwrap();
    assert_eq!(rebuilt.get(&["d"], "value").unwrap(), Value::Int(30));
    assert_eq!(rebuilt.get(&["b"], "value").unwrap(), Value::Int(20));
}

#[test]
fn test_mutated_tree_round_trip() {
    let registry = common::registry();
    TypeBuilder::new("Counter")
        .script(builtins::COUNT_RUNS)
        .register(&registry);

    let mut tree = NodeBuilder::new(builtin::REPLICATOR)
        .id("rows")
        .attr("child_type", "Counter")
        .child(NodeBuilder::new("Counter").id("elem_0").value(0.5))
        .build(&registry)
        .unwrap();
    let root = tree.root();
    tree.append(root).unwrap();
    tree.duplicate(root, 0).unwrap();
    tree.remove(root, 1).unwrap();
    tree.set(&["elem_1"], "value", Value::Float(1e-7), widgets_rs::Propagate::Yes)
        .unwrap();

    let rebuilt = round_trip(&tree);
    let ids: Vec<_> = rebuilt.node(rebuilt.root()).child_ids().collect();
    assert_eq!(ids, vec!["elem_0", "elem_1"]);
    assert_eq!(
        rebuilt.all_values(&[], false).unwrap(),
        tree.all_values(&[], false).unwrap()
    );
    assert_eq!(
        rebuilt.get(&[], "child_type").unwrap(),
        Value::from("Counter")
    );
}

#[test]
fn test_table_round_trip() {
    let registry = common::registry();
    let table = Table::from_columns([
        ("name", vec![Cell::from("Zoë"), Cell::from("東京"), Cell::Null]),
        ("count", vec![Cell::Int(1), Cell::Int(-2), Cell::Int(3)]),
        ("ratio", vec![Cell::Float(0.5), Cell::Float(2.0), Cell::Bool(true)]),
    ])
    .unwrap();

    let tree = NodeBuilder::resource("top")
        .child(
            NodeBuilder::new(builtin::TABLE)
                .id("data")
                .value(table.clone())
                .attr("sep", ";"),
        )
        .build(&registry)
        .unwrap();

    let rebuilt = round_trip(&tree);
    assert_eq!(rebuilt.get(&["data"], "value").unwrap(), Value::Table(table));
    assert_eq!(rebuilt.get(&["data"], "sep").unwrap(), Value::from(";"));
}

#[test]
fn test_large_table_is_compressed() {
    let registry = common::registry();
    let cells: Vec<Cell> = (0..500).map(|i| Cell::Int(i % 7)).collect();
    let table = Table::from_columns([("repeating", cells)]).unwrap();
    let tree = NodeBuilder::new(builtin::TABLE)
        .id("big")
        .value(table.clone())
        .build(&registry)
        .unwrap();

    let program = SourceCompiler::default().render_program(&tree).unwrap();
    assert!(!program.contains("repeating"));
    let rebuilt = round_trip(&tree);
    assert_eq!(rebuilt.get(&[], "value").unwrap(), Value::Table(table));
}

#[test]
fn test_selector_options_round_trip() {
    let registry = common::registry();
    TypeBuilder::new("Choice")
        .script(builtins::SHOUT)
        .register(&registry);

    let option = |id: &str, label: &str| {
        NodeBuilder::new("Choice")
            .id(id)
            .label(label)
            .value(id)
            .build(&registry)
            .map(Value::from)
            .unwrap()
    };
    let tree = NodeBuilder::new(builtin::SELECTOR)
        .id("size")
        .value("Large")
        .attr(
            "options",
            Value::List(vec![option("s", "Small"), option("l", "Large")]),
        )
        .build(&registry)
        .unwrap();

    let program = SourceCompiler::default().render_program(&tree).unwrap();
    assert!(program.contains(r#""name": "Choice""#));

    let rebuilt = round_trip(&tree);
    assert_eq!(rebuilt.get(&[], "value").unwrap(), Value::from("Large"));
    let options = rebuilt.get(&[], "options").unwrap();
    let options = options.as_list().unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(
        options[1].as_node().unwrap().get(&[], "value").unwrap(),
        Value::from("L")
    );
}

#[test]
fn test_value_hooks_report_the_same_after_the_trip() {
    let registry = common::registry();
    TypeBuilder::new("Loud")
        .script(builtins::SHOUT)
        .register(&registry);
    let tree = NodeBuilder::resource("top")
        .child(NodeBuilder::new("Loud").id("greeting").value("hello"))
        .build(&registry)
        .unwrap();

    let rebuilt = round_trip(&tree);
    assert_eq!(
        rebuilt.all_values(&[], false).unwrap(),
        tree.all_values(&[], false).unwrap()
    );
    assert_eq!(
        rebuilt.node(rebuilt.resolve(&["greeting"]).unwrap()).value(),
        &Value::from("hello")
    );
}

#[test]
fn test_unrenderable_values() {
    let registry = common::registry();
    let tree = NodeBuilder::resource("top")
        .value(f64::NAN)
        .build(&registry)
        .unwrap();
    let err = SourceCompiler::default().render_program(&tree).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compiler);

    let table = Table::from_columns([("x", vec![Cell::Int(1)])]).unwrap();
    let tree = NodeBuilder::resource("top")
        .value(table)
        .build(&registry)
        .unwrap();
    let err = SourceCompiler::default().render_program(&tree).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compiler);

    // Non-finite cells have no encoded form, even inside a structured value
    let table = Table::from_columns([("x", vec![Cell::Float(f64::INFINITY), Cell::Float(1.5)])])
        .unwrap();
    let tree = NodeBuilder::new(builtin::TABLE)
        .id("data")
        .value(table)
        .build(&registry)
        .unwrap();
    let err = SourceCompiler::default().render_program(&tree).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compiler);
}

#[test]
fn test_deep_tree_round_trip() {
    let registry = common::registry();
    for depth in [8, 16] {
        let tree = chain_tree(&registry, depth);
        let path: Vec<String> = (1..=depth).map(|level| format!("level_{}", level)).collect();
        let path: Vec<&str> = path.iter().map(String::as_str).collect();

        let rebuilt = round_trip(&tree);
        assert_eq!(rebuilt, tree);
        assert_eq!(rebuilt.get(&path, "value").unwrap(), Value::Int(depth as i64));
    }
}
