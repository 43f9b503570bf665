//! Gathering the custom type definitions a tree needs.
//!
//! Types are collected in walk order into an insertion-ordered map. A type
//! seen again moves to the end. Emission is the reverse, so a parent, which
//! is always visited after the type that names it, comes out first.

use super::SourceCompiler;
use crate::error::Result;
use crate::resource::{NodeId, ResourceTree, ResourceType};
use crate::types::Value;
use indexmap::IndexMap;

/// Type name to rendered `register_type` statement, in walk order
type Gathered = IndexMap<String, String>;

impl SourceCompiler {
    /// Every custom type definition `node` needs, supertypes first
    pub fn gather_dependencies(&self, tree: &ResourceTree, node: NodeId) -> Result<Vec<String>> {
        let gathered = self.gather(tree, node)?;
        Ok(gathered.into_values().rev().collect())
    }

    /// Names of the custom types `node` needs, in emission order
    pub fn custom_types(&self, tree: &ResourceTree, node: NodeId) -> Result<Vec<String>> {
        let gathered = self.gather(tree, node)?;
        Ok(gathered.into_keys().rev().collect())
    }

    fn gather(&self, tree: &ResourceTree, node: NodeId) -> Result<Gathered> {
        let mut gathered = Gathered::new();
        self.gather_node(tree, node, &mut gathered)?;
        Ok(gathered)
    }

    fn gather_node(&self, tree: &ResourceTree, node: NodeId, gathered: &mut Gathered) -> Result<()> {
        self.gather_type(tree.kind(node), gathered)?;

        for child in tree.children(node) {
            self.gather_node(tree, child, gathered)?;
        }

        let n = tree.node(node);
        let held = std::iter::once(n.value()).chain(n.attrs().values());
        self.gather_values(held, gathered)
    }

    fn gather_type(&self, kind: &ResourceType, gathered: &mut Gathered) -> Result<()> {
        if kind.is_builtin() {
            return Ok(());
        }

        match gathered.shift_remove(kind.name()) {
            Some(body) => {
                gathered.insert(kind.name().to_string(), body);
            }
            None => {
                let body = self.render_type_body(kind)?;
                gathered.insert(kind.name().to_string(), body);
            }
        }

        if let Some(parent) = kind.parent() {
            self.gather_type(parent, gathered)?;
        }

        // Node-valued defaults are constructed while the type registers
        self.gather_values(kind.defaults().values(), gathered)
    }

    fn gather_values<'a>(
        &self,
        values: impl Iterator<Item = &'a Value>,
        gathered: &mut Gathered,
    ) -> Result<()> {
        let mut subtrees = Vec::new();
        for value in values {
            value.for_each_node(&mut |t| subtrees.push(t));
        }
        for subtree in subtrees {
            self.gather_node(subtree, subtree.root(), gathered)?;
        }
        Ok(())
    }
}
