//! Property tests for the value codec and program round trips

mod common;

use proptest::prelude::*;
use std::collections::BTreeMap;
use widgets_rs::codec::{compress, decode_structured, decompress, encode_structured, quote};
use widgets_rs::{Cell, NodeBuilder, Table, Value};

fn cell_strategy() -> impl Strategy<Value = Cell> {
    prop_oneof![
        Just(Cell::Null),
        any::<bool>().prop_map(Cell::Bool),
        any::<i64>().prop_map(Cell::Int),
        (-1e9f64..1e9).prop_map(Cell::Float),
        "\\PC{0,12}".prop_map(Cell::Text),
    ]
}

fn table_strategy() -> impl Strategy<Value = Table> {
    (0usize..6)
        .prop_flat_map(|rows| {
            prop::collection::btree_map(
                "[a-z]{1,8}",
                prop::collection::vec(cell_strategy(), rows),
                0..4,
            )
        })
        .prop_map(|columns: BTreeMap<String, Vec<Cell>>| {
            Table::from_columns(columns).expect("columns have equal length")
        })
}

/// Read a generated string literal back the way a program would
fn eval_literal(literal: &str) -> String {
    rhai::Engine::new()
        .eval::<String>(literal)
        .unwrap_or_else(|e| panic!("{} should evaluate: {}", literal, e))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn compress_round_trip(text in any::<String>()) {
        prop_assert_eq!(decompress(&compress(&text).unwrap()).unwrap(), text);
    }

    #[test]
    fn quoted_text_reads_back(text in any::<String>()) {
        prop_assert_eq!(eval_literal(&quote(&text)), text);
    }

    #[test]
    fn structured_round_trip(table in table_strategy()) {
        let literal = encode_structured(&table).unwrap();
        let text = eval_literal(&literal);
        prop_assert_eq!(decode_structured(&Value::String(text)).unwrap(), table);
    }

    #[test]
    fn flat_tree_round_trip(
        leaves in prop::collection::btree_map(
            "[a-z][a-z0-9_]{0,6}",
            prop_oneof![
                (-1_000_000_000_000i64..1_000_000_000_000).prop_map(Value::Int),
                (-1e6f64..1e6).prop_map(Value::Float),
                "[a-zA-Z0-9 _\"\\\\éü]{0,10}".prop_map(Value::String),
                Just(Value::Null),
            ],
            1..6,
        )
    ) {
        let registry = common::registry();
        let tree = NodeBuilder::resource("top")
            .children(leaves.iter().map(|(id, v)| NodeBuilder::resource(id.as_str()).value(v.clone())))
            .build(&registry)
            .unwrap();

        let rebuilt = common::round_trip(&tree);
        prop_assert_eq!(
            rebuilt.all_values(&[], true).unwrap(),
            tree.all_values(&[], true).unwrap()
        );
    }
}

#[test]
fn test_empty_inputs() {
    assert_eq!(decompress(&compress("").unwrap()).unwrap(), "");
    let empty = Table::new();
    let text = eval_literal(&encode_structured(&empty).unwrap());
    assert_eq!(decode_structured(&Value::String(text)).unwrap(), empty);
}
