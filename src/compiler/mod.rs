//! Source compiler: turning a live tree back into a program
//!
//! A generated program is a Rhai script with two kinds of statement:
//!
//! ```text
//! // header comment
//!
//! register_type(#{ "name": "Base", "parent": "Resource", ... });
//! register_type(#{ "name": "Derived", "parent": "Base", ... });
//!
//! new_node("Derived", #{
//!     "id": "top",
//!     "value": 3,
//!     "children": [ new_node(...), ... ],
//!     ...
//! })
//! ```
//!
//! The final expression is the root construction, so evaluating the script
//! yields the tree. Every custom type the tree needs is registered first,
//! supertypes before subtypes, and each exactly once.
//!
//! # Modules
//!
//! - [`literal`] - the value literal grammar
//! - [`dependencies`] - gathering and ordering type definitions

pub mod dependencies;
pub mod literal;

use crate::codec;
use crate::config::CompilerSettings;
use crate::error::{Result, ResultExt, WidgetError};
use crate::resource::{NodeId, ResourceTree, ResourceType};

/// Renders trees and types as program text
#[derive(Debug, Clone)]
pub struct SourceCompiler {
    indent: usize,
    reserved_delimiters: Vec<char>,
    header: String,
}

impl SourceCompiler {
    pub fn new(settings: &CompilerSettings) -> Self {
        Self {
            indent: settings.indent,
            reserved_delimiters: settings.reserved_delimiters.clone(),
            header: settings.header.clone(),
        }
    }

    fn pad(&self, depth: usize) -> String {
        " ".repeat(self.indent * depth)
    }

    /// The `new_node(..)` expression that rebuilds `node` and its subtree
    ///
    /// Each parameter of the type's signature is read through the attribute
    /// path, so a parameter the node cannot resolve is a node execution
    /// error.
    pub fn render_construction(&self, tree: &ResourceTree, node: NodeId) -> Result<String> {
        self.construction_at(tree, node, 0)
    }

    pub(crate) fn construction_at(&self, tree: &ResourceTree, node: NodeId, depth: usize) -> Result<String> {
        let kind = tree.kind(node);
        let inner = depth + 1;

        let mut fields = Vec::new();
        for param in kind.signature() {
            let value = tree.get_attr(node, &param)?;
            let literal = self
                .render_literal(kind, &value, inner)
                .with_context(|| format!("Failed to render {} of {}", param, tree.id(node)))?;
            fields.push(format!(
                "{}{}: {}",
                self.pad(inner),
                codec::quote(&param),
                literal
            ));
        }

        Ok(format!(
            "new_node({}, #{{\n{}\n{}}})",
            codec::quote(kind.name()),
            fields.join(",\n"),
            self.pad(depth)
        ))
    }

    /// The `register_type(..)` statement that defines a custom type
    ///
    /// Only what the type declares itself is rendered. Inherited params,
    /// defaults and hooks come from the parent's own statement.
    pub fn render_type_body(&self, kind: &ResourceType) -> Result<String> {
        let parent = match kind.parent() {
            Some(parent) if !kind.is_builtin() => parent,
            _ => {
                return Err(WidgetError::Compiler(format!(
                    "{} is a built-in resource type and has no definition to render",
                    kind.name()
                )))
            }
        };

        let params = kind
            .params()
            .iter()
            .map(|p| codec::quote(p))
            .collect::<Vec<_>>()
            .join(", ");

        let defaults = if kind.defaults().is_empty() {
            "#{}".to_string()
        } else {
            let entries = kind
                .defaults()
                .iter()
                .map(|(attr, value)| {
                    self.render_literal(kind, value, 2)
                        .map(|literal| format!("{}{}: {}", self.pad(2), codec::quote(attr), literal))
                })
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Failed to render defaults of {}", kind.name()))?;
            format!("#{{\n{}\n{}}}", entries.join(",\n"), self.pad(1))
        };

        let script = match kind.script() {
            Some(source) => codec::quote(source),
            None => "()".to_string(),
        };

        let pad = self.pad(1);
        let body = format!(
            "register_type(#{{\n\
             {pad}\"name\": {name},\n\
             {pad}\"parent\": {parent},\n\
             {pad}\"params\": [{params}],\n\
             {pad}\"defaults\": {defaults},\n\
             {pad}\"script\": {script}\n\
             }});",
            pad = pad,
            name = codec::quote(kind.name()),
            parent = codec::quote(parent.name()),
            params = params,
            defaults = defaults,
            script = script,
        );
        self.check_reserved(&body)
            .with_context(|| format!("Failed to render type {}", kind.name()))?;
        Ok(body)
    }

    /// A self-contained program that rebuilds `tree`
    pub fn render_program(&self, tree: &ResourceTree) -> Result<String> {
        let root = tree.root();
        let types = self.gather_dependencies(tree, root)?;
        let construction = self.render_construction(tree, root)?;

        let mut out = String::new();
        for line in self.header.lines() {
            out.push_str(format!("// {}", line).trim_end());
            out.push('\n');
        }
        out.push('\n');
        for body in &types {
            out.push_str(body);
            out.push_str("\n\n");
        }
        out.push_str(&construction);
        out.push('\n');

        self.check_reserved(&out)?;
        tracing::debug!(
            "Rendered program for {} with {} custom types",
            tree.id(root),
            types.len()
        );
        Ok(out)
    }

    fn check_reserved(&self, text: &str) -> Result<()> {
        match text.chars().find(|c| self.reserved_delimiters.contains(c)) {
            Some(c) => Err(WidgetError::Compiler(format!(
                "Generated source must not contain the reserved delimiter {:?}",
                c
            ))),
            None => Ok(()),
        }
    }
}

impl Default for SourceCompiler {
    fn default() -> Self {
        Self::new(&CompilerSettings::default())
    }
}
