//! Core data types for widgets-rs
//!
//! # Main Types
//!
//! - [`Value`] - The closed set of values a resource attribute can hold
//! - [`Table`] - Column-oriented tabular data (the structured value)
//! - [`Cell`] - A single table cell
//! - [`ValueTree`] - The nested result of `all_values`, mirroring tree shape
//!
//! Every [`Value`] variant has a literal form in generated programs, so any
//! attribute that can be stored can also be rendered back to source.

use crate::error::{Result, WidgetError};
use crate::resource::ResourceTree;
use indexmap::IndexMap;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// An attribute value held by a resource node
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Table(Table),
    /// A detached resource subtree (children lists, selector options)
    Node(Box<ResourceTree>),
}

impl Value {
    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Table(_) => "table",
            Value::Node(_) => "resource",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&ResourceTree> {
        match self {
            Value::Node(v) => Some(v),
            _ => None,
        }
    }

    /// True if this value is a node or a list that (recursively) contains one
    pub fn contains_node(&self) -> bool {
        match self {
            Value::Node(_) => true,
            Value::List(items) => items.iter().any(Value::contains_node),
            _ => false,
        }
    }

    /// Visit every node held by this value, descending into lists
    pub fn for_each_node<'a>(&'a self, f: &mut dyn FnMut(&'a ResourceTree)) {
        match self {
            Value::Node(tree) => f(tree),
            Value::List(items) => {
                for item in items {
                    item.for_each_node(f);
                }
            }
            _ => {}
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Table> for Value {
    fn from(v: Table) -> Self {
        Value::Table(v)
    }
}

impl From<ResourceTree> for Value {
    fn from(v: ResourceTree) -> Self {
        Value::Node(Box::new(v))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Table(t) => write!(f, "<table {}x{}>", t.rows(), t.width()),
            Value::Node(tree) => write!(f, "<resource {}>", tree.id(tree.root())),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::String(v) => serializer.serialize_str(v),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Table(t) => t.serialize(serializer),
            Value::Node(tree) => tree
                .all_values(&[], false)
                .map_err(S::Error::custom)?
                .serialize(serializer),
        }
    }
}

/// A single cell of a [`Table`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Cell::Bool(v)
    }
}

impl TryFrom<&Value> for Cell {
    type Error = WidgetError;

    fn try_from(value: &Value) -> Result<Self> {
        Ok(match value {
            Value::Null => Cell::Null,
            Value::Bool(v) => Cell::Bool(*v),
            Value::Int(v) => Cell::Int(*v),
            Value::Float(v) => Cell::Float(*v),
            Value::String(v) => Cell::Text(v.clone()),
            other => {
                return Err(WidgetError::Configuration(format!(
                    "Table cells must be scalars, not {}",
                    other.type_name()
                )))
            }
        })
    }
}

impl From<&Cell> for Value {
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Null => Value::Null,
            Cell::Bool(v) => Value::Bool(*v),
            Cell::Int(v) => Value::Int(*v),
            Cell::Float(v) => Value::Float(*v),
            Cell::Text(v) => Value::String(v.clone()),
        }
    }
}

type Columns = IndexMap<String, Vec<Cell>>;

/// Column-oriented table. Every column holds the same number of cells.
///
/// The canonical serialized form is `{"column": [cells...], ...}` in
/// column order.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "Columns")]
pub struct Table {
    columns: Columns,
}

impl Table {
    /// An empty table with no columns
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from ordered columns, rejecting ragged input
    pub fn from_columns<I, K>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Vec<Cell>)>,
        K: Into<String>,
    {
        let mut out = Columns::new();
        for (name, cells) in columns {
            let name = name.into();
            if out.contains_key(&name) {
                return Err(WidgetError::Configuration(format!(
                    "Table columns must be unique (repeated: {})",
                    name
                )));
            }
            out.insert(name, cells);
        }
        Self::try_from(out)
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.columns.values().next().map(Vec::len).unwrap_or(0)
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Cell])> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Cell at (`column`, `row`)
    pub fn cell(&self, column: &str, row: usize) -> Option<&Cell> {
        self.columns.get(column).and_then(|c| c.get(row))
    }
}

impl TryFrom<Columns> for Table {
    type Error = WidgetError;

    fn try_from(columns: Columns) -> Result<Self> {
        let mut lengths = columns.iter().map(|(name, cells)| (name, cells.len()));
        if let Some((first_name, expected)) = lengths.next() {
            for (name, len) in lengths {
                if len != expected {
                    return Err(WidgetError::Configuration(format!(
                        "Table columns must have equal length ({} has {}, {} has {})",
                        first_name, expected, name, len
                    )));
                }
            }
        }
        Ok(Self { columns })
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, cells) in &self.columns {
            map.serialize_entry(name, cells)?;
        }
        map.end()
    }
}

/// Nested values of a subtree, keyed by child id
#[derive(Debug, Clone, PartialEq)]
pub enum ValueTree {
    Leaf(Value),
    Branch(IndexMap<String, ValueTree>),
}

impl ValueTree {
    /// Follow a path of ids down through branches
    pub fn get(&self, path: &[&str]) -> Option<&ValueTree> {
        let mut current = self;
        for segment in path {
            match current {
                ValueTree::Branch(map) => current = map.get(*segment)?,
                ValueTree::Leaf(_) => return None,
            }
        }
        Some(current)
    }

    /// The leaf value at `path`, if the path ends on a leaf
    pub fn leaf(&self, path: &[&str]) -> Option<&Value> {
        match self.get(path)? {
            ValueTree::Leaf(v) => Some(v),
            ValueTree::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&IndexMap<String, ValueTree>> {
        match self {
            ValueTree::Branch(map) => Some(map),
            ValueTree::Leaf(_) => None,
        }
    }
}

impl Serialize for ValueTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ValueTree::Leaf(v) => v.serialize(serializer),
            ValueTree::Branch(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_from_columns() {
        let table = Table::from_columns([
            ("name", vec![Cell::from("a"), Cell::from("b")]),
            ("count", vec![Cell::from(1), Cell::from(2)]),
        ])
        .unwrap();

        assert_eq!(table.rows(), 2);
        assert_eq!(table.width(), 2);
        assert_eq!(table.cell("count", 1), Some(&Cell::Int(2)));
        let names: Vec<_> = table.columns().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["name", "count"]);
    }

    #[test]
    fn test_ragged_table_rejected() {
        let err = Table::from_columns([
            ("a", vec![Cell::from(1)]),
            ("b", vec![Cell::from(1), Cell::from(2)]),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_cell_json_shapes() {
        let table = Table::from_columns([(
            "mixed",
            vec![
                Cell::Null,
                Cell::Bool(true),
                Cell::Int(3),
                Cell::Float(2.5),
                Cell::from("x"),
            ],
        )])
        .unwrap();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"mixed":[null,true,3,2.5,"x"]}"#);

        let parsed: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_ragged_json_rejected() {
        let parsed: std::result::Result<Table, _> = serde_json::from_str(r#"{"a":[1],"b":[]}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_value_tree_lookup() {
        let mut inner = IndexMap::new();
        inner.insert("c".to_string(), ValueTree::Leaf(Value::from("baz")));
        let mut outer = IndexMap::new();
        outer.insert("deep".to_string(), ValueTree::Branch(inner));

        let tree = ValueTree::Branch(outer);
        assert_eq!(tree.leaf(&["deep", "c"]), Some(&Value::from("baz")));
        assert!(tree.leaf(&["deep"]).is_none());
        assert!(tree.get(&["missing"]).is_none());
    }

    #[test]
    fn test_contains_node_only_for_nodes() {
        let list = Value::List(vec![Value::Int(1), Value::List(vec![Value::Null])]);
        assert!(!list.contains_node());
        assert_eq!(list.to_string(), "[1, [null]]");
    }
}
