//! Structural mutation: creating, removing and copying children.
//!
//! New children come from the parent's `new_child` hook. The default builds
//! a node of the parent's `child_type` (or `Resource`) with a fresh
//! `elem_<n>` id.

use crate::error::{Result, WidgetError};
use crate::resource::{builtin, Args, Hook, HookKind, NodeId, ResourceTree};
use crate::types::Value;

impl ResourceTree {
    /// First `elem_<n>` id, counting up from 0, not used by a child of `parent`
    pub fn next_child_id(&self, parent: NodeId) -> String {
        let node = self.node(parent);
        (0..)
            .map(|i| format!("elem_{}", i))
            .find(|id| node.child(id).is_none())
            .unwrap_or_default()
    }

    /// Build (but do not attach) a new child for `parent`
    pub fn new_child(&self, parent: NodeId) -> Result<ResourceTree> {
        self.check_live(parent)?;
        let id = self.next_child_id(parent);
        match self.kind(parent).hook(HookKind::NewChild) {
            Some(Hook::Script(script)) => {
                let mut args = self.call_new_child_script(parent, &script, &id)?;
                let type_name = match args.shift_remove("type") {
                    Some(Value::String(name)) => name,
                    Some(other) => {
                        return Err(WidgetError::Configuration(format!(
                            "new_child of {} returned a {} type name",
                            self.id(parent),
                            other.type_name()
                        )))
                    }
                    None => self.child_type(parent),
                };
                if args.get("id").map_or(true, Value::is_null) {
                    args.insert("id".to_string(), Value::String(id));
                }
                ResourceTree::construct(self.registry(), &type_name, args)
            }
            Some(Hook::Native(hooks)) => match hooks.new_child {
                Some(f) => f(self, parent, &id),
                None => native_new_child(self, parent, &id),
            },
            None => native_new_child(self, parent, &id),
        }
    }

    fn child_type(&self, parent: NodeId) -> String {
        match self.try_attr(parent, "child_type") {
            Some(Value::String(name)) => name,
            _ => builtin::RESOURCE.to_string(),
        }
    }

    /// Add a new child at the end
    pub fn append(&mut self, parent: NodeId) -> Result<NodeId> {
        let child = self.new_child(parent)?;
        self.attach(parent, child, None)
    }

    /// Add a new child at `ix`
    pub fn insert(&mut self, parent: NodeId, ix: usize) -> Result<NodeId> {
        self.check_index(parent, ix, true)?;
        let child = self.new_child(parent)?;
        self.attach(parent, child, Some(ix))
    }

    /// Remove the child at `ix`, returning it as a detached tree
    ///
    /// The removed subtree is torn down first, children before parents.
    /// Teardown runs on the detached copy, so a failing hook leaves this
    /// tree untouched. Handles into the removed subtree become stale.
    pub fn remove(&mut self, parent: NodeId, ix: usize) -> Result<ResourceTree> {
        self.check_index(parent, ix, false)?;
        let child = self.children(parent)[ix];

        let mut detached = self.subtree(child);
        let detached_root = detached.root();
        detached.teardown(detached_root)?;
        self.mark_removed(child);
        self.node_mut(parent).children.shift_remove_index(ix);

        tracing::debug!(
            "Removed {} from {} at {}",
            detached.id(detached.root()),
            self.id(parent),
            ix
        );
        Ok(detached)
    }

    /// Deep-copy the child at `ix` under a fresh id, directly after it
    pub fn duplicate(&mut self, parent: NodeId, ix: usize) -> Result<NodeId> {
        self.check_index(parent, ix, false)?;
        let child = self.children(parent)[ix];

        let mut copy = self.subtree(child);
        let root = copy.root();
        copy.node_mut(root).id = self.next_child_id(parent);
        self.attach(parent, copy, Some(ix + 1))
    }

    /// Attach an existing tree under `parent`, at `ix` or at the end
    pub fn attach(&mut self, parent: NodeId, subtree: ResourceTree, ix: Option<usize>) -> Result<NodeId> {
        match ix {
            Some(ix) => self.check_index(parent, ix, true)?,
            None => self.check_live(parent)?,
        }
        let id = subtree.id(subtree.root()).to_string();
        let attached = self.graft(parent, subtree, ix)?;
        tracing::debug!("Attached {} to {}", id, self.id(parent));
        Ok(attached)
    }

    fn check_index(&self, parent: NodeId, ix: usize, allow_end: bool) -> Result<()> {
        self.check_live(parent)?;
        let len = self.node(parent).child_count();
        let ok = if allow_end { ix <= len } else { ix < len };
        if ok {
            Ok(())
        } else {
            Err(WidgetError::NodeExecution(format!(
                "Index {} out of range for {} ({} children)",
                ix,
                self.id(parent),
                len
            )))
        }
    }
}

/// Default `new_child`: a node of the parent's `child_type`
pub(crate) fn native_new_child(tree: &ResourceTree, parent: NodeId, id: &str) -> Result<ResourceTree> {
    let type_name = tree.child_type(parent);
    let args = Args::from([("id".to_string(), Value::from(id))]);
    ResourceTree::construct(tree.registry(), &type_name, args)
}
