//! The literal grammar of generated programs.

use super::SourceCompiler;
use crate::codec;
use crate::error::{Result, WidgetError};
use crate::resource::ResourceType;
use crate::types::Value;

impl SourceCompiler {
    /// Render `value` as a Rhai literal
    ///
    /// `depth` is the nesting level of the line the literal starts on. Nodes
    /// and lists of nodes span several lines indented from there; everything
    /// else is a single token or an inline list.
    pub fn render_literal(&self, kind: &ResourceType, value: &Value, depth: usize) -> Result<String> {
        match value {
            Value::Null => Ok("()".to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            // The lexer reads the magnitude before negating it
            Value::Int(i64::MIN) => Ok(format!("({} - 1)", i64::MIN + 1)),
            Value::Int(i) => Ok(i.to_string()),
            Value::Float(f) => render_float(*f),
            Value::String(s) => Ok(codec::quote(s)),
            Value::List(items) if items.is_empty() => Ok("[]".to_string()),
            Value::List(items) if value.contains_node() => {
                let pad = self.pad(depth + 1);
                let rendered = items
                    .iter()
                    .map(|item| {
                        self.render_literal(kind, item, depth + 1)
                            .map(|text| format!("{}{}", pad, text))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("[\n{}\n{}]", rendered.join(",\n"), self.pad(depth)))
            }
            Value::List(items) => {
                let rendered = items
                    .iter()
                    .map(|item| self.render_literal(kind, item, depth))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("[{}]", rendered.join(", ")))
            }
            Value::Node(tree) => self.construction_at(tree, tree.root(), depth),
            Value::Table(table) if kind.is_structured() => codec::encode_structured(table),
            Value::Table(_) => Err(WidgetError::Compiler(format!(
                "Cannot render a table literal for {}, which has no structured value codec",
                kind.name()
            ))),
        }
    }
}

/// A float that Rhai reads back as a float: always with a decimal point
fn render_float(f: f64) -> Result<String> {
    if !f.is_finite() {
        return Err(WidgetError::Compiler(format!(
            "Cannot render non-finite float {}",
            f
        )));
    }
    let text = format!("{:?}", f);
    if text.contains('.') {
        return Ok(text);
    }
    match text.find('e') {
        Some(ix) => Ok(format!("{}.0{}", &text[..ix], &text[ix..])),
        None => Ok(format!("{}.0", text)),
    }
}
