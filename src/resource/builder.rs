//! Builder for constructing resource trees from Rust.

use crate::error::Result;
use crate::resource::{builtin, Args, ResourceTree, TypeRegistry};
use crate::types::Value;
use std::sync::Arc;

/// Builder for a resource and its children.
///
/// ```ignore
/// let tree = NodeBuilder::resource("top")
///     .child(NodeBuilder::resource("a").value("foo"))
///     .build(&registry)?;
/// ```
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    type_name: String,
    args: Args,
    children: Vec<NodeBuilder>,
}

impl NodeBuilder {
    /// A node of `type_name` with no arguments yet
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            args: Args::new(),
            children: Vec::new(),
        }
    }

    /// A plain `Resource` with the given id
    pub fn resource(id: impl Into<String>) -> Self {
        Self::new(builtin::RESOURCE).id(id)
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", Value::String(id.into()))
    }

    pub fn value(self, value: impl Into<Value>) -> Self {
        self.attr("value", value)
    }

    pub fn label(self, label: impl Into<String>) -> Self {
        self.attr("label", Value::String(label.into()))
    }

    pub fn help(self, help: impl Into<String>) -> Self {
        self.attr("help", Value::String(help.into()))
    }

    /// Any other constructor argument
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, child: NodeBuilder) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = NodeBuilder>) -> Self {
        self.children.extend(children);
        self
    }

    /// Construct the tree, children first
    pub fn build(self, registry: &Arc<TypeRegistry>) -> Result<ResourceTree> {
        let mut args = self.args;
        if !self.children.is_empty() {
            let children = self
                .children
                .into_iter()
                .map(|c| c.build(registry).map(Value::from))
                .collect::<Result<Vec<_>>>()?;
            args.insert("children".to_string(), Value::List(children));
        }
        ResourceTree::construct(registry, &self.type_name, args)
    }
}
