//! Path-based access to attributes across a tree.
//!
//! A path is a list of child ids. Each segment must name a direct child of
//! the node reached so far; there is no backtracking, and sibling ids are
//! unique, so a path resolves to at most one node.

use crate::codec;
use crate::error::{Result, WidgetError};
use crate::resource::kind::{check_selection, option_labels};
use crate::resource::{builtin, Hook, HookKind, NodeId, ResourceTree};
use crate::types::{Value, ValueTree};
use indexmap::IndexMap;

/// Whether `set` re-runs the target's own behavior after assigning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagate {
    Yes,
    No,
}

impl ResourceTree {
    /// Resolve a path from the root
    pub fn resolve(&self, path: &[&str]) -> Result<NodeId> {
        self.resolve_from(self.root(), path)
    }

    /// Resolve a path from `node`
    pub fn resolve_from(&self, node: NodeId, path: &[&str]) -> Result<NodeId> {
        self.check_live(node)?;
        let mut current = node;
        for segment in path {
            current = self.node(current).child(segment).ok_or_else(|| {
                WidgetError::NodeExecution(format!(
                    "No child resource exists within {}: {}",
                    self.id(current),
                    segment
                ))
            })?;
        }
        Ok(current)
    }

    /// Get an attribute of the node at `path` from the root
    pub fn get(&self, path: &[&str], attr: &str) -> Result<Value> {
        self.get_from(self.root(), path, attr)
    }

    /// Get an attribute of the node at `path` from `node`
    ///
    /// `"value"` goes through the `get_value` hook.
    pub fn get_from(&self, node: NodeId, path: &[&str], attr: &str) -> Result<Value> {
        let target = self.resolve_from(node, path)?;
        if attr == "value" {
            self.get_value(target)
        } else {
            self.get_attr(target, attr)
        }
    }

    /// The value reported for `node`
    pub fn get_value(&self, node: NodeId) -> Result<Value> {
        self.check_live(node)?;
        match self.kind(node).hook(HookKind::GetValue) {
            Some(Hook::Native(hooks)) => match hooks.get_value {
                Some(f) => f(self, node),
                None => Ok(self.node(node).value().clone()),
            },
            Some(Hook::Script(script)) => self.call_value_script(node, &script),
            None => Ok(self.node(node).value().clone()),
        }
    }

    /// An attribute of `node`, failing if it does not exist
    pub fn get_attr(&self, node: NodeId, attr: &str) -> Result<Value> {
        self.check_live(node)?;
        self.try_attr(node, attr).ok_or_else(|| {
            WidgetError::NodeExecution(format!(
                "Attribute does not exist {} for {}",
                attr,
                self.id(node)
            ))
        })
    }

    /// An attribute of `node`: instance attribute, then class default
    ///
    /// `id`, `value`, `label`, `help` and `children` always exist on the
    /// instance. `children` is reported as detached copies.
    pub fn try_attr(&self, node: NodeId, attr: &str) -> Option<Value> {
        let n = self.node(node);
        match attr {
            "id" => Some(Value::from(n.id())),
            "value" => Some(n.value().clone()),
            "label" => Some(Value::from(n.label())),
            "help" => Some(n.help().map(Value::from).unwrap_or_default()),
            "children" => Some(Value::List(
                n.children().map(|c| Value::from(self.subtree(c))).collect(),
            )),
            _ => n
                .attrs()
                .get(attr)
                .or_else(|| n.kind().default(attr))
                .cloned(),
        }
    }

    /// Assign an attribute without running anything
    pub fn assign(&mut self, node: NodeId, attr: &str, value: Value) -> Result<()> {
        self.check_live(node)?;
        tracing::debug!("Assigning {} on {}", attr, self.id(node));

        match attr {
            "id" | "children" => Err(WidgetError::Configuration(format!(
                "{} of {} cannot be assigned; use structural mutation instead",
                attr,
                self.id(node)
            ))),
            "value" => {
                let value = if self.kind(node).is_structured() {
                    Value::Table(codec::decode_structured(&value)?)
                } else {
                    value
                };
                if self.kind(node).is_a(builtin::SELECTOR) {
                    let labels = option_labels(self.id(node), self.try_attr(node, "options").as_ref())?;
                    check_selection(self.id(node), &labels, &value)?;
                }
                self.node_mut(node).value = value;
                Ok(())
            }
            "label" => match value {
                Value::String(s) => {
                    self.node_mut(node).label = s;
                    Ok(())
                }
                other => Err(self.not_text(node, attr, &other)),
            },
            "help" => match value {
                Value::Null => {
                    self.node_mut(node).help = None;
                    Ok(())
                }
                Value::String(s) => {
                    self.node_mut(node).help = Some(s);
                    Ok(())
                }
                other => Err(self.not_text(node, attr, &other)),
            },
            _ => {
                if attr == "options" && self.kind(node).is_a(builtin::SELECTOR) {
                    let labels = option_labels(self.id(node), Some(&value))?;
                    check_selection(self.id(node), &labels, self.node(node).value())?;
                }
                self.node_mut(node).attrs.insert(attr.to_string(), value);
                Ok(())
            }
        }
    }

    /// A Selector's options and the position of the selected one
    pub(crate) fn selection(&self, node: NodeId) -> Option<(Vec<Value>, usize)> {
        if !self.kind(node).is_a(builtin::SELECTOR) {
            return None;
        }
        let Value::String(selected) = self.node(node).value() else {
            return None;
        };
        let Some(Value::List(options)) = self.try_attr(node, "options") else {
            return None;
        };
        let ix = options.iter().position(|option| {
            option
                .as_node()
                .is_some_and(|t| t.node(t.root()).label() == selected.as_str())
        })?;
        Some((options, ix))
    }

    fn not_text(&self, node: NodeId, attr: &str, value: &Value) -> WidgetError {
        WidgetError::Configuration(format!(
            "{} of {} must be a string, not {}",
            attr,
            self.id(node),
            value.type_name()
        ))
    }

    /// Run the own-behavior hook of `node` once
    pub fn trigger(&mut self, node: NodeId) -> Result<()> {
        self.check_live(node)?;
        self.run_hook(node, HookKind::RunSelf)
    }

    /// Set an attribute of the node at `path` from the root
    pub fn set(&mut self, path: &[&str], attr: &str, value: Value, propagate: Propagate) -> Result<()> {
        let target = self.resolve(path)?;
        self.set_on(target, attr, value, propagate)
    }

    /// Assign, then trigger when propagating. The triggered run completes
    /// before this returns.
    pub fn set_on(&mut self, node: NodeId, attr: &str, value: Value, propagate: Propagate) -> Result<()> {
        self.assign(node, attr, value)?;
        if propagate == Propagate::Yes {
            self.trigger(node)?;
        }
        Ok(())
    }

    /// Set on the first ancestor of `node` that is not a `SubResource`
    pub fn set_top(&mut self, node: NodeId, attr: &str, value: Value, propagate: Propagate) -> Result<()> {
        self.check_live(node)?;
        let mut target = self.parent(node).ok_or_else(|| {
            WidgetError::NodeExecution(format!("{} has no parent to set", self.id(node)))
        })?;
        while self.kind(target).is_a(builtin::SUB_RESOURCE) {
            target = self.parent(target).ok_or_else(|| {
                WidgetError::NodeExecution(format!(
                    "No resource above {} that is not a SubResource",
                    self.id(node)
                ))
            })?;
        }
        self.set_on(target, attr, value, propagate)
    }

    /// Values of every descendant of the node at `path`, mirroring tree shape
    ///
    /// A node without children reports its own value, and a Selector reports
    /// the values of its selected option. With `flatten`, the
    /// nested result collapses into one id to value map, which fails if two
    /// leaves share an id.
    pub fn all_values(&self, path: &[&str], flatten: bool) -> Result<ValueTree> {
        self.all_values_from(self.root(), path, flatten)
    }

    pub fn all_values_from(&self, node: NodeId, path: &[&str], flatten: bool) -> Result<ValueTree> {
        let target = self.resolve_from(node, path)?;
        let values = self.values_of(target)?;
        match values {
            ValueTree::Branch(map) if flatten => {
                let mut out = IndexMap::new();
                flatten_into(map, &mut out)?;
                Ok(ValueTree::Branch(out))
            }
            other => Ok(other),
        }
    }

    fn values_of(&self, node: NodeId) -> Result<ValueTree> {
        if let Some((options, ix)) = self.selection(node) {
            if let Some(option) = options[ix].as_node() {
                return option.values_of(option.root());
            }
        }
        let n = self.node(node);
        if n.child_count() == 0 {
            return self.get_value(node).map(ValueTree::Leaf);
        }
        let mut map = IndexMap::with_capacity(n.child_count());
        for (id, child) in n.child_ids().zip(n.children()) {
            map.insert(id.to_string(), self.values_of(child)?);
        }
        Ok(ValueTree::Branch(map))
    }

    /// The topmost ancestor of `node`
    pub fn root_of(&self, node: NodeId) -> Result<NodeId> {
        self.check_live(node)?;
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        Ok(current)
    }

    /// Ids from `node` up to the root, `node` first
    pub fn path_to_root(&self, node: NodeId) -> Result<Vec<String>> {
        self.check_live(node)?;
        let mut path = vec![self.id(node).to_string()];
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            path.push(self.id(parent).to_string());
            current = parent;
        }
        Ok(path)
    }

    /// Position of `node` among its siblings
    pub fn index_in_parent(&self, node: NodeId) -> Result<usize> {
        self.check_live(node)?;
        let parent = self.parent(node).ok_or_else(|| {
            WidgetError::NodeExecution(format!(
                "Cannot get index of {}: it is not a child",
                self.id(node)
            ))
        })?;
        self.node(parent)
            .children
            .get_index_of(self.id(node))
            .ok_or_else(|| {
                WidgetError::NodeExecution(format!(
                    "{} is not attached to {}",
                    self.id(node),
                    self.id(parent)
                ))
            })
    }

    /// Every node with `id`, pre-order from the root, the root included
    pub fn find(&self, id: &str) -> Vec<NodeId> {
        self.find_from(self.root(), id)
    }

    ///
    /// A stale `node` finds nothing.
    pub fn find_from(&self, node: NodeId, id: &str) -> Vec<NodeId> {
        if self.get_node(node).is_none() {
            return Vec::new();
        }
        self.descendants(node)
            .into_iter()
            .filter(|n| self.id(*n) == id)
            .collect()
    }

    /// Check that `node` is (or, with `expect == false`, is not) a
    /// `type_name`, optionally for every ancestor as well
    pub fn assert_is_a(
        &self,
        node: NodeId,
        type_name: &str,
        expect: bool,
        include_ancestors: bool,
    ) -> Result<()> {
        self.check_live(node)?;
        let mut current = Some(node);
        while let Some(n) = current {
            let is_a = self.kind(n).is_a(type_name);
            if is_a != expect {
                let verb = if expect { "is not" } else { "is" };
                return Err(WidgetError::Configuration(format!(
                    "{} {} an instance of {}",
                    self.id(n),
                    verb,
                    type_name
                )));
            }
            current = if include_ancestors { self.parent(n) } else { None };
        }
        Ok(())
    }

    /// Stable widget key for a rendering layer: the path to the root joined
    /// by `_`, then the revision
    pub fn key(&self, node: NodeId) -> Result<String> {
        let path = self.path_to_root(node)?;
        Ok(format!("{}_{}", path.join("_"), self.node(node).revision()))
    }

    /// Force a new widget key for `node`
    pub fn bump_revision(&mut self, node: NodeId) -> Result<u32> {
        self.check_live(node)?;
        let n = self.node_mut(node);
        n.revision += 1;
        Ok(n.revision)
    }
}

fn flatten_into(values: IndexMap<String, ValueTree>, out: &mut IndexMap<String, ValueTree>) -> Result<()> {
    for (id, value) in values {
        match value {
            ValueTree::Branch(map) => flatten_into(map, out)?,
            leaf => {
                if out.contains_key(&id) {
                    return Err(WidgetError::NodeExecution(format!(
                        "Cannot flatten, duplicate id found: {}",
                        id
                    )));
                }
                out.insert(id, leaf);
            }
        }
    }
    Ok(())
}
