//! A single node stored in a [`ResourceTree`](super::ResourceTree).

use crate::resource::{NodeId, ResourceType};
use crate::types::Value;
use indexmap::IndexMap;
use std::sync::Arc;

/// One resource: identity, value, display metadata, open attributes and
/// links into the arena.
#[derive(Debug, Clone)]
pub struct ResourceNode {
    pub(crate) kind: Arc<ResourceType>,
    /// Addressing key, unique among siblings.
    pub(crate) id: String,
    pub(crate) value: Value,
    pub(crate) label: String,
    pub(crate) help: Option<String>,
    /// Instance attributes beyond value/label/help.
    pub(crate) attrs: IndexMap<String, Value>,
    /// Parent node (NodeId::INVALID for the root).
    pub(crate) parent: NodeId,
    /// Children in list order, keyed by id.
    pub(crate) children: IndexMap<String, NodeId>,
    /// UI revision counter, part of the widget key.
    pub(crate) revision: u32,
    /// Bumped each time the slot is reused.
    pub(crate) generation: u32,
    /// Set once the node has been detached, until the slot is reused.
    pub(crate) removed: bool,
}

impl ResourceNode {
    pub(crate) fn new(
        kind: Arc<ResourceType>,
        id: String,
        value: Value,
        label: String,
        help: Option<String>,
        attrs: IndexMap<String, Value>,
    ) -> Self {
        Self {
            kind,
            id,
            value,
            label,
            help,
            attrs,
            parent: NodeId::INVALID,
            children: IndexMap::new(),
            revision: 0,
            generation: 0,
            removed: false,
        }
    }

    pub fn kind(&self) -> &Arc<ResourceType> {
        &self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The stored value, without the `get_value` hook
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Instance attributes
    pub fn attrs(&self) -> &IndexMap<String, Value> {
        &self.attrs
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent.is_valid().then_some(self.parent)
    }

    /// Child handles in list order
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.values().copied()
    }

    /// Child ids in list order
    pub fn child_ids(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn child(&self, id: &str) -> Option<NodeId> {
        self.children.get(id).copied()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

/// Default label for an id: each run of letters starts upper-case and
/// continues lower-case
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("resource"), "Resource");
        assert_eq!(title_case("my_widget"), "My_Widget");
        assert_eq!(title_case("elem_0"), "Elem_0");
        assert_eq!(title_case("hELLO wORLD"), "Hello World");
        assert_eq!(title_case("a1b"), "A1B");
        assert_eq!(title_case(""), "");
    }
}
