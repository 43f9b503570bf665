//! Conversion between [`Value`] and Rhai [`Dynamic`]
//!
//! Tables and resource subtrees cross into scripts as custom types, so an
//! attribute a hook never touches converts back to an equal value.

use crate::error::{Result, WidgetError};
use crate::resource::ResourceTree;
use crate::types::{Cell, Table, Value};
use rhai::{Array, Dynamic, Map};

/// Convert a value into its script representation
pub fn to_dynamic(value: &Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(v) => Dynamic::from_bool(*v),
        Value::Int(v) => Dynamic::from_int(*v),
        Value::Float(v) => Dynamic::from_float(*v),
        Value::String(v) => Dynamic::from(v.clone()),
        Value::List(items) => Dynamic::from_array(items.iter().map(to_dynamic).collect()),
        Value::Table(table) => Dynamic::from(table.clone()),
        Value::Node(tree) => Dynamic::from(tree.as_ref().clone()),
    }
}

/// Convert a script value back into a [`Value`]
///
/// Object maps are read as column-oriented tables (`#{ "col": [..] }`).
pub fn from_dynamic(value: Dynamic) -> Result<Value> {
    if value.is_unit() {
        return Ok(Value::Null);
    }
    if let Ok(v) = value.as_bool() {
        return Ok(Value::Bool(v));
    }
    if let Ok(v) = value.as_int() {
        return Ok(Value::Int(v));
    }
    if let Ok(v) = value.as_float() {
        return Ok(Value::Float(v));
    }
    if let Ok(v) = value.as_char() {
        return Ok(Value::String(v.to_string()));
    }
    if value.is_string() {
        return value.into_string().map(Value::String).map_err(unsupported);
    }
    if value.is_array() {
        let items = value.into_array().map_err(unsupported)?;
        return items
            .into_iter()
            .map(from_dynamic)
            .collect::<Result<Vec<_>>>()
            .map(Value::List);
    }
    if value.is::<Table>() {
        return value
            .try_cast::<Table>()
            .map(Value::Table)
            .ok_or_else(|| unsupported("table"));
    }
    if value.is::<ResourceTree>() {
        return value
            .try_cast::<ResourceTree>()
            .map(Value::from)
            .ok_or_else(|| unsupported("resource"));
    }
    if value.is_map() {
        let map = value.try_cast::<Map>().ok_or_else(|| unsupported("map"))?;
        return map_to_table(map).map(Value::Table);
    }
    Err(unsupported(value.type_name()))
}

/// Convert a table into an object map of column arrays
pub fn table_to_map(table: &Table) -> Map {
    table
        .columns()
        .map(|(name, cells)| {
            let column: Array = cells.iter().map(|c| to_dynamic(&Value::from(c))).collect();
            (name.into(), Dynamic::from_array(column))
        })
        .collect()
}

fn map_to_table(map: Map) -> Result<Table> {
    let mut columns = Vec::with_capacity(map.len());
    for (name, column) in map {
        let items = column.into_array().map_err(|t| {
            WidgetError::Configuration(format!(
                "Table column {} must be an array, found {}",
                name, t
            ))
        })?;
        let cells = items
            .into_iter()
            .map(|item| from_dynamic(item).and_then(|v| Cell::try_from(&v)))
            .collect::<Result<Vec<_>>>()?;
        columns.push((name.to_string(), cells));
    }
    Table::from_columns(columns)
}

fn unsupported(type_name: &str) -> WidgetError {
    WidgetError::Configuration(format!(
        "Script value of type {} cannot be stored on a resource",
        type_name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_round_trip() {
        for value in [
            Value::Null,
            Value::Bool(true),
            Value::Int(-7),
            Value::Float(1.5),
            Value::from("text"),
            Value::List(vec![Value::Int(1), Value::from("a")]),
        ] {
            assert_eq!(from_dynamic(to_dynamic(&value)).unwrap(), value);
        }
    }

    #[test]
    fn test_table_keeps_column_order() {
        let table = Table::from_columns([
            ("zeta", vec![Cell::from(1)]),
            ("alpha", vec![Cell::from(2)]),
        ])
        .unwrap();
        let back = from_dynamic(to_dynamic(&Value::Table(table.clone()))).unwrap();
        assert_eq!(back, Value::Table(table));
    }

    #[test]
    fn test_map_becomes_table() {
        let mut map = Map::new();
        map.insert(
            "n".into(),
            Dynamic::from_array(vec![Dynamic::from_int(1), Dynamic::from_int(2)]),
        );
        let value = from_dynamic(Dynamic::from_map(map)).unwrap();
        let table = value.as_table().unwrap();
        assert_eq!(table.rows(), 2);
        assert_eq!(table.cell("n", 1), Some(&Cell::Int(2)));
    }

    #[test]
    fn test_map_with_scalar_column_rejected() {
        let mut map = Map::new();
        map.insert("n".into(), Dynamic::from_int(1));
        assert!(from_dynamic(Dynamic::from_map(map)).is_err());
    }

    #[test]
    fn test_table_to_map() {
        let table = Table::from_columns([("c", vec![Cell::from("x")])]).unwrap();
        let map = table_to_map(&table);
        assert_eq!(map.len(), 1);
        assert!(map["c"].is_array());
    }
}
