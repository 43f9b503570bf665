//! The lifecycle runner and hook dispatch.
//!
//! Every node runs the same fixed sequence, top-down and depth-first on the
//! calling thread:
//!
//! 1. `prepare` on the node
//! 2. the full sequence on each child, in list order, then on the selected
//!    option of a Selector
//! 3. `run_self` on the node
//!
//! Types override the hooks, never the sequence.

use crate::error::{Result, WidgetError};
use crate::resource::{Args, Hook, HookKind, NodeId, ResourceTree};
use crate::scripting::{from_dynamic, to_dynamic, CompiledHooks};
use crate::types::Value;
use indexmap::IndexMap;
use rhai::{Dynamic, Map};

impl ResourceTree {
    /// Run the whole tree
    pub fn run(&mut self) -> Result<()> {
        self.run_node(self.root())
    }

    /// Run `node` and its subtree
    pub fn run_node(&mut self, node: NodeId) -> Result<()> {
        self.check_live(node)?;
        self.run_hook(node, HookKind::Prepare)?;
        for child in self.children(node) {
            self.run_node(child)?;
        }
        self.run_selected_option(node)?;
        self.run_hook(node, HookKind::RunSelf)
    }

    /// Run only the selected option of a Selector, keeping its results
    fn run_selected_option(&mut self, node: NodeId) -> Result<()> {
        let Some((mut options, ix)) = self.selection(node) else {
            return Ok(());
        };
        if let Value::Node(option) = &mut options[ix] {
            option.run()?;
        }
        self.node_mut(node)
            .attrs
            .insert("options".to_string(), Value::List(options));
        Ok(())
    }

    /// Run the teardown hook over a subtree, children before their parent
    pub(crate) fn teardown(&mut self, node: NodeId) -> Result<()> {
        for child in self.children(node) {
            self.teardown(child)?;
        }
        self.run_hook(node, HookKind::Teardown)
    }

    /// Run one lifecycle hook on `node`; no-op when the type does not define it
    pub(crate) fn run_hook(&mut self, node: NodeId, kind: HookKind) -> Result<()> {
        let hook = self.kind(node).hook(kind);
        match hook {
            Some(Hook::Native(hooks)) => {
                let f = match kind {
                    HookKind::Prepare => hooks.prepare,
                    HookKind::RunSelf => hooks.run_self,
                    HookKind::Teardown => hooks.teardown,
                    HookKind::GetValue | HookKind::NewChild => None,
                };
                match f {
                    Some(f) => f(self, node),
                    None => Ok(()),
                }
            }
            Some(Hook::Script(script)) => self.call_lifecycle_script(node, &script, kind),
            None => Ok(()),
        }
    }

    /// The `this` map for a script hook, and the attribute values it was
    /// built from
    fn script_this(&self, node: NodeId) -> Result<(Dynamic, IndexMap<String, Value>)> {
        let n = self.node(node);

        let mut before = n.kind().resolved_defaults();
        before.shift_remove("id");
        before.shift_remove("children");
        for (k, v) in n.attrs() {
            before.insert(k.clone(), v.clone());
        }
        before.insert("value".to_string(), n.value().clone());
        before.insert("label".to_string(), Value::from(n.label()));
        before.insert(
            "help".to_string(),
            n.help().map(Value::from).unwrap_or_default(),
        );

        let mut children = Map::new();
        for (id, child) in n.child_ids().zip(n.children()) {
            children.insert(id.into(), to_dynamic(&self.get_value(child)?));
        }

        let mut this: Map = before
            .iter()
            .map(|(k, v)| (k.as_str().into(), to_dynamic(v)))
            .collect();
        this.insert("id".into(), Dynamic::from(n.id().to_string()));
        this.insert("children".into(), Dynamic::from_map(children));

        Ok((Dynamic::from_map(this), before))
    }

    fn call_lifecycle_script(
        &mut self,
        node: NodeId,
        script: &CompiledHooks,
        kind: HookKind,
    ) -> Result<()> {
        let (mut this, before) = self.script_this(node)?;
        let registry = self.registry().clone();
        registry.engine().call_hook(script, kind, &mut this, ())?;

        let after = this.try_cast::<Map>().ok_or_else(|| {
            WidgetError::Script(format!(
                "{} hook of {} replaced this with a non-map value",
                kind,
                self.id(node)
            ))
        })?;

        for (attr, value) in after {
            let attr = attr.to_string();
            if attr == "id" || attr == "children" {
                continue;
            }
            let value = from_dynamic(value)?;
            if before.get(&attr) != Some(&value) {
                self.assign(node, &attr, value)?;
            }
        }
        Ok(())
    }

    pub(crate) fn call_value_script(&self, node: NodeId, script: &CompiledHooks) -> Result<Value> {
        let (mut this, _) = self.script_this(node)?;
        let result = self
            .registry()
            .engine()
            .call_hook(script, HookKind::GetValue, &mut this, ())?;
        from_dynamic(result)
    }

    /// Constructor arguments returned by a `new_child` script hook
    pub(crate) fn call_new_child_script(
        &self,
        parent: NodeId,
        script: &CompiledHooks,
        id: &str,
    ) -> Result<Args> {
        let (mut this, _) = self.script_this(parent)?;
        let result = self.registry().engine().call_hook(
            script,
            HookKind::NewChild,
            &mut this,
            (id.to_string(),),
        )?;

        if result.is_unit() {
            return Ok(Args::new());
        }
        let map = result.try_cast::<Map>().ok_or_else(|| {
            WidgetError::Script(format!(
                "new_child hook of {} must return an object map",
                self.id(parent)
            ))
        })?;

        let mut args = Args::new();
        for (k, v) in map {
            args.insert(k.to_string(), from_dynamic(v)?);
        }
        Ok(args)
    }
}
