//! Arena storage for a tree of resources.
//!
//! Nodes live in a flat `Vec` indexed by [`NodeId`]. Parent links are plain
//! ids, and each node keeps its children in an ordered map keyed by child id,
//! so list order and sibling uniqueness are one structure.
//!
//! ```text
//! top                 NodeId(0)
//! +-- a               NodeId(1)
//! +-- mid             NodeId(2)
//!     +-- b           NodeId(3)
//!     +-- deep        NodeId(4)
//!         +-- c       NodeId(5)
//! ```
//!
//! Removing a child frees the slots of its subtree for reuse. A reused slot
//! carries a new generation, so a stale `NodeId` is rejected rather than
//! aliasing the newer node.

use crate::error::{Result, WidgetError};
use crate::resource::{title_case, NodeId, ResourceNode, ResourceType, TypeRegistry};
use crate::types::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Constructor arguments, by parameter name
pub type Args = IndexMap<String, Value>;

/// A tree of resources built against one [`TypeRegistry`].
#[derive(Clone)]
pub struct ResourceTree {
    registry: Arc<TypeRegistry>,
    nodes: Vec<ResourceNode>,
    /// Slots freed by removal, reused before the arena grows
    free: Vec<u32>,
    root: NodeId,
}

impl ResourceTree {
    /// Construct a node of `type_name` from constructor arguments
    ///
    /// Missing arguments fall back to the type's class defaults; an absent
    /// label derives from the id. `children` must be a list of resources
    /// with unique ids.
    pub fn construct(registry: &Arc<TypeRegistry>, type_name: &str, mut args: Args) -> Result<Self> {
        let kind = registry.resolve(type_name)?;

        let id = match take(&mut args, "id") {
            Some(v) => v,
            None => kind.default("id").cloned().unwrap_or_default(),
        };
        let id = match id {
            Value::String(s) if !s.is_empty() => s,
            _ => {
                return Err(WidgetError::Configuration(format!(
                    "Must provide id for resource ({})",
                    type_name
                )))
            }
        };

        let value = match take(&mut args, "value") {
            Some(v) => v,
            None => kind.default("value").cloned().unwrap_or_default(),
        };

        let label = match take(&mut args, "label").or_else(|| non_null(kind.default("label"))) {
            Some(v) => text_attr(&id, "label", v)?,
            None => title_case(&id),
        };

        let help = match take(&mut args, "help").or_else(|| non_null(kind.default("help"))) {
            Some(v) => Some(text_attr(&id, "help", v)?),
            None => None,
        };

        let children = match args.shift_remove("children") {
            Some(Value::List(items)) if !items.is_empty() => items,
            None | Some(Value::Null) | Some(Value::List(_)) => match kind.default("children") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::List(items)) => items.clone(),
                Some(other) => return Err(children_not_list(&id, other)),
            },
            Some(other) => return Err(children_not_list(&id, &other)),
        };

        let node = ResourceNode::new(kind.clone(), id, value, label, help, args);
        let mut tree = Self {
            registry: registry.clone(),
            nodes: vec![node],
            free: Vec::new(),
            root: NodeId::new(0, 0),
        };

        let root = tree.root;
        for child in children {
            match child {
                Value::Node(subtree) => {
                    tree.graft(root, *subtree, None)?;
                }
                other => {
                    return Err(WidgetError::Configuration(format!(
                        "Child elements must all be resources ({})",
                        other.type_name()
                    )))
                }
            }
        }

        if let Some(init) = kind.native_init() {
            init(&mut tree, root)?;
        }

        tracing::debug!(
            "Constructed {} '{}' with {} children",
            type_name,
            tree.id(root),
            tree.node(root).child_count()
        );
        Ok(tree)
    }

    /// Construct a node from defaults alone
    pub fn instantiate(registry: &Arc<TypeRegistry>, type_name: &str) -> Result<Self> {
        Self::construct(registry, type_name, Args::new())
    }

    /// Copy `subtree` under `parent`, at `ix` or at the end
    pub(crate) fn graft(
        &mut self,
        parent: NodeId,
        subtree: ResourceTree,
        ix: Option<usize>,
    ) -> Result<NodeId> {
        let child_id = subtree.id(subtree.root).to_string();
        let siblings = &self.nodes[parent.index()].children;
        if siblings.contains_key(&child_id) {
            return Err(WidgetError::Configuration(format!(
                "Resource ids must be unique (repeated: {})",
                child_id
            )));
        }
        let ix = ix.unwrap_or(siblings.len());

        let new_root = subtree.copy_nodes(subtree.root, self, parent);
        self.nodes[parent.index()]
            .children
            .shift_insert(ix, child_id, new_root);
        Ok(new_root)
    }

    /// Store `node` in a free slot, or at the end of the arena
    fn alloc(&mut self, mut node: ResourceNode) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                let generation = self.nodes[slot as usize].generation.wrapping_add(1);
                node.generation = generation;
                self.nodes[slot as usize] = node;
                NodeId::new(slot, generation)
            }
            None => {
                let slot = self.nodes.len() as u32;
                self.nodes.push(node);
                NodeId::new(slot, 0)
            }
        }
    }

    /// Copy the subtree at `from` into `dest`, returning its new id there
    fn copy_nodes(&self, from: NodeId, dest: &mut ResourceTree, parent: NodeId) -> NodeId {
        let src = &self.nodes[from.index()];

        let mut node = ResourceNode::new(
            src.kind.clone(),
            src.id.clone(),
            src.value.clone(),
            src.label.clone(),
            src.help.clone(),
            src.attrs.clone(),
        );
        node.parent = parent;
        node.revision = src.revision;
        let new_id = dest.alloc(node);

        for (child_id, &child) in &src.children {
            let copied = self.copy_nodes(child, dest, new_id);
            dest.nodes[new_id.index()]
                .children
                .insert(child_id.clone(), copied);
        }
        new_id
    }

    /// A detached deep copy of the subtree rooted at `node`
    pub fn subtree(&self, node: NodeId) -> ResourceTree {
        let mut out = ResourceTree {
            registry: self.registry.clone(),
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId::INVALID,
        };
        out.root = self.copy_nodes(node, &mut out, NodeId::INVALID);
        out
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by NodeId (O(1) array index).
    #[inline]
    pub fn node(&self, node: NodeId) -> &ResourceNode {
        &self.nodes[node.index()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, node: NodeId) -> &mut ResourceNode {
        &mut self.nodes[node.index()]
    }

    /// Get a live node, if `node` names one
    pub fn get_node(&self, node: NodeId) -> Option<&ResourceNode> {
        if !node.is_valid() {
            return None;
        }
        self.nodes
            .get(node.index())
            .filter(|n| !n.removed && n.generation == node.generation())
    }

    /// Fail unless `node` is a live node of this tree
    pub fn check_live(&self, node: NodeId) -> Result<()> {
        match self.get_node(node) {
            Some(_) => Ok(()),
            None => Err(WidgetError::NodeExecution(format!(
                "{} is not a live resource of {}",
                node,
                self.id(self.root)
            ))),
        }
    }

    pub fn id(&self, node: NodeId) -> &str {
        &self.nodes[node.index()].id
    }

    pub fn kind(&self, node: NodeId) -> &Arc<ResourceType> {
        &self.nodes[node.index()].kind
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].parent()
    }

    /// Child handles of `node` in list order
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes[node.index()].children().collect()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Number of arena slots, live or free
    pub fn slots(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always has its root
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `node` and every descendant, pre-order
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            out.push(current);
            let children = &self.nodes[current.index()].children;
            stack.extend(children.values().rev().copied());
        }
        out
    }

    /// Destroy the subtree at `node` and free its slots
    ///
    /// The caller unlinks `node` from its parent's child list.
    pub(crate) fn mark_removed(&mut self, node: NodeId) {
        for n in self.descendants(node) {
            let slot = &mut self.nodes[n.index()];
            slot.removed = true;
            slot.parent = NodeId::INVALID;
            slot.children.clear();
            slot.attrs.clear();
            slot.value = Value::Null;
            self.free.push(n.index() as u32);
        }
    }

    fn node_eq(&self, a: NodeId, other: &ResourceTree, b: NodeId) -> bool {
        let x = &self.nodes[a.index()];
        let y = &other.nodes[b.index()];
        x.kind.name() == y.kind.name()
            && x.id == y.id
            && x.value == y.value
            && x.label == y.label
            && x.help == y.help
            && x.attrs == y.attrs
            && x.children.len() == y.children.len()
            && x
                .children
                .iter()
                .zip(y.children.iter())
                .all(|((ka, &ca), (kb, &cb))| ka == kb && self.node_eq(ca, other, cb))
    }
}

/// Structural equality: same types, ids, values, metadata and children
impl PartialEq for ResourceTree {
    fn eq(&self, other: &Self) -> bool {
        self.node_eq(self.root, other, other.root)
    }
}

struct NodeView<'a> {
    tree: &'a ResourceTree,
    node: NodeId,
}

impl fmt::Debug for NodeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.tree.node(self.node);
        let mut s = f.debug_struct(node.kind.name());
        s.field("id", &node.id).field("value", &node.value);
        if !node.attrs.is_empty() {
            s.field("attrs", &node.attrs);
        }
        if !node.children.is_empty() {
            let children: Vec<NodeView<'_>> = node
                .children()
                .map(|c| NodeView {
                    tree: self.tree,
                    node: c,
                })
                .collect();
            s.field("children", &children);
        }
        s.finish()
    }
}

impl fmt::Debug for ResourceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        NodeView {
            tree: self,
            node: self.root,
        }
        .fmt(f)
    }
}

/// Remove an argument, treating an explicit null as absent
fn take(args: &mut Args, name: &str) -> Option<Value> {
    args.shift_remove(name).filter(|v| !v.is_null())
}

fn non_null(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

fn text_attr(id: &str, attr: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(WidgetError::Configuration(format!(
            "{} of {} must be a string, not {}",
            attr,
            id,
            other.type_name()
        ))),
    }
}

fn children_not_list(id: &str, value: &Value) -> WidgetError {
    WidgetError::Configuration(format!(
        "children of {} must be a list, not {}",
        id,
        value.type_name()
    ))
}
