//! Resource types and the registry that resolves them.
//!
//! A `ResourceType` is a named behavior bundle: a construction signature,
//! class-level attribute defaults and zero or more hooks. Types form a single
//! inheritance chain that is resolved once, when the type is registered.
//!
//! Built-in types are provided by every registry. Custom types are declared
//! with a [`TypeDefinition`] and carry their hooks as Rhai source, which is
//! what lets the compiler re-emit them.

use crate::codec;
use crate::config::ScriptLimits;
use crate::error::{Result, WidgetError};
use crate::resource::{mutation, NodeId, ResourceTree};
use crate::scripting::{CompiledHooks, ScriptEngine};
use crate::types::{Table, Value};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// Parameters every type accepts, in signature order
pub const BASE_PARAMS: [&str; 5] = ["id", "value", "children", "label", "help"];

/// Names of the built-in types
pub mod builtin {
    pub const RESOURCE: &str = "Resource";
    pub const SUB_RESOURCE: &str = "SubResource";
    pub const REPLICATOR: &str = "Replicator";
    pub const TABLE: &str = "Table";
    pub const SELECTOR: &str = "Selector";
}

/// Overridable lifecycle and value hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Setup before any child runs.
    Prepare,
    /// Own behavior after every child has run.
    RunSelf,
    /// Cleanup when the node is removed.
    Teardown,
    /// Computes the value reported by `get`.
    GetValue,
    /// Builds a new child for structural mutation.
    NewChild,
}

impl HookKind {
    /// Get all hook kinds.
    pub fn all() -> &'static [HookKind] {
        &[
            HookKind::Prepare,
            HookKind::RunSelf,
            HookKind::Teardown,
            HookKind::GetValue,
            HookKind::NewChild,
        ]
    }

    /// The script function name of this hook.
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::Prepare => "prepare",
            HookKind::RunSelf => "run_self",
            HookKind::Teardown => "teardown",
            HookKind::GetValue => "get_value",
            HookKind::NewChild => "new_child",
        }
    }

    pub fn from_name(name: &str) -> Option<HookKind> {
        Self::all().iter().copied().find(|k| k.as_str() == name)
    }

    /// Number of parameters the script function takes.
    pub fn arity(&self) -> usize {
        match self {
            HookKind::NewChild => 1,
            _ => 0,
        }
    }
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub type LifecycleFn = fn(&mut ResourceTree, NodeId) -> Result<()>;
pub type GetValueFn = fn(&ResourceTree, NodeId) -> Result<Value>;
pub type NewChildFn = fn(&ResourceTree, NodeId, &str) -> Result<ResourceTree>;

/// Hooks implemented in Rust. Only built-in types carry these.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeHooks {
    pub prepare: Option<LifecycleFn>,
    pub run_self: Option<LifecycleFn>,
    pub teardown: Option<LifecycleFn>,
    pub get_value: Option<GetValueFn>,
    pub new_child: Option<NewChildFn>,
    /// Validation and normalization right after construction
    pub init: Option<LifecycleFn>,
}

impl NativeHooks {
    pub fn defines(&self, kind: HookKind) -> bool {
        match kind {
            HookKind::Prepare => self.prepare.is_some(),
            HookKind::RunSelf => self.run_self.is_some(),
            HookKind::Teardown => self.teardown.is_some(),
            HookKind::GetValue => self.get_value.is_some(),
            HookKind::NewChild => self.new_child.is_some(),
        }
    }
}

/// The implementation chosen for a hook on a type.
#[derive(Debug, Clone)]
pub enum Hook {
    Native(NativeHooks),
    Script(Arc<CompiledHooks>),
}

/// Declarative description of a custom type.
///
/// This is both what `register_type` accepts and what the compiler emits, so
/// a registered type can always be written back out.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: String,
    pub parent: String,
    /// Parameters declared directly on this type
    pub params: Vec<String>,
    /// Class-level attribute defaults declared directly on this type
    pub defaults: IndexMap<String, Value>,
    /// Rhai source of the hooks defined directly on this type
    pub script: Option<String>,
}

impl TypeDefinition {
    /// A new definition deriving from `Resource`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: builtin::RESOURCE.to_string(),
            params: Vec::new(),
            defaults: IndexMap::new(),
            script: None,
        }
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = parent.into();
        self
    }

    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(name.into());
        self
    }

    pub fn default(mut self, attr: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(attr.into(), value.into());
        self
    }

    pub fn script(mut self, source: impl Into<String>) -> Self {
        self.script = Some(source.into());
        self
    }
}

/// A registered, resolved resource type.
pub struct ResourceType {
    name: String,
    parent: Option<Arc<ResourceType>>,
    builtin: bool,
    params: Vec<String>,
    defaults: IndexMap<String, Value>,
    script: Option<Arc<CompiledHooks>>,
    native: NativeHooks,
    structured_value: bool,
}

impl ResourceType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<ResourceType>> {
        self.parent.as_ref()
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    /// Parameters declared directly on this type
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Defaults declared directly on this type
    pub fn defaults(&self) -> &IndexMap<String, Value> {
        &self.defaults
    }

    /// Compiled hooks declared directly on this type
    pub fn hooks(&self) -> Option<&Arc<CompiledHooks>> {
        self.script.as_ref()
    }

    /// Hook source declared directly on this type
    pub fn script(&self) -> Option<&str> {
        self.script.as_ref().map(|s| s.source())
    }

    /// This type followed by its ancestors, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = &ResourceType> {
        std::iter::successors(Some(self), |t| t.parent.as_deref())
    }

    /// Full construction signature: inherited params first, each name once
    pub fn signature(&self) -> Vec<String> {
        let chain: Vec<&ResourceType> = self.ancestors().collect();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for ty in chain.into_iter().rev() {
            for p in &ty.params {
                if seen.insert(p.as_str()) {
                    out.push(p.clone());
                }
            }
        }
        out
    }

    /// Class-level default for `attr`, nearest declaration first
    pub fn default(&self, attr: &str) -> Option<&Value> {
        self.ancestors().find_map(|t| t.defaults.get(attr))
    }

    /// Every default visible on this type, nearest declaration winning
    pub fn resolved_defaults(&self) -> IndexMap<String, Value> {
        let chain: Vec<&ResourceType> = self.ancestors().collect();
        let mut out = IndexMap::new();
        for ty in chain.into_iter().rev() {
            for (k, v) in &ty.defaults {
                out.insert(k.clone(), v.clone());
            }
        }
        out
    }

    /// True if this type is `name` or derives from it
    pub fn is_a(&self, name: &str) -> bool {
        self.ancestors().any(|t| t.name == name)
    }

    /// True if values of this type go through the structured codec
    pub fn is_structured(&self) -> bool {
        self.ancestors().any(|t| t.structured_value)
    }

    /// The nearest implementation of `kind` in the chain
    pub fn hook(&self, kind: HookKind) -> Option<Hook> {
        for ty in self.ancestors() {
            if ty.native.defines(kind) {
                return Some(Hook::Native(ty.native));
            }
            if let Some(script) = &ty.script {
                if script.defines(kind) {
                    return Some(Hook::Script(script.clone()));
                }
            }
        }
        None
    }

    pub(crate) fn native_init(&self) -> Option<LifecycleFn> {
        self.ancestors().find_map(|t| t.native.init)
    }

    /// The definition this type was registered from
    pub fn definition(&self) -> TypeDefinition {
        TypeDefinition {
            name: self.name.clone(),
            parent: self
                .parent
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            params: self.params.clone(),
            defaults: self.defaults.clone(),
            script: self.script().map(str::to_string),
        }
    }
}

impl std::fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceType")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.as_str()))
            .field("builtin", &self.builtin)
            .field("params", &self.params)
            .finish()
    }
}

/// All types known to one environment
///
/// Every tree keeps a handle to the registry it was built from, so hooks and
/// structural mutation can construct new nodes.
pub struct TypeRegistry {
    types: RwLock<IndexMap<String, Arc<ResourceType>>>,
    engine: ScriptEngine,
}

impl TypeRegistry {
    /// A registry holding the built-in types
    pub fn new(limits: ScriptLimits) -> Self {
        let registry = Self {
            types: RwLock::new(IndexMap::new()),
            engine: ScriptEngine::new(limits),
        };
        registry.install_builtins();
        registry
    }

    /// A shared registry holding the built-in types
    pub fn with_builtins(limits: ScriptLimits) -> Arc<Self> {
        Arc::new(Self::new(limits))
    }

    fn install_builtins(&self) {
        let Ok(mut types) = self.types.write() else {
            return;
        };

        let resource = Arc::new(ResourceType {
            name: builtin::RESOURCE.to_string(),
            parent: None,
            builtin: true,
            params: BASE_PARAMS.iter().map(|p| p.to_string()).collect(),
            defaults: IndexMap::from([("id".to_string(), Value::from("resource"))]),
            script: None,
            native: NativeHooks {
                new_child: Some(mutation::native_new_child),
                ..NativeHooks::default()
            },
            structured_value: false,
        });

        let derived = |name: &str,
                       params: &[&str],
                       defaults: Vec<(&str, Value)>,
                       native: NativeHooks,
                       structured_value: bool| {
            Arc::new(ResourceType {
                name: name.to_string(),
                parent: Some(resource.clone()),
                builtin: true,
                params: params.iter().map(|p| p.to_string()).collect(),
                defaults: defaults
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                script: None,
                native,
                structured_value,
            })
        };

        let builtins = [
            derived(
                builtin::SUB_RESOURCE,
                &[],
                vec![],
                NativeHooks::default(),
                false,
            ),
            derived(
                builtin::REPLICATOR,
                &["child_type"],
                vec![("child_type", Value::from(builtin::RESOURCE))],
                NativeHooks::default(),
                false,
            ),
            derived(
                builtin::TABLE,
                &["sep"],
                vec![("value", Value::Table(Table::new())), ("sep", Value::from(","))],
                NativeHooks {
                    init: Some(init_table),
                    ..NativeHooks::default()
                },
                true,
            ),
            derived(
                builtin::SELECTOR,
                &["options"],
                vec![],
                NativeHooks {
                    init: Some(init_selector),
                    ..NativeHooks::default()
                },
                false,
            ),
        ];

        types.insert(resource.name.clone(), resource.clone());
        for ty in builtins {
            types.insert(ty.name.clone(), ty);
        }
    }

    /// Register a custom type
    ///
    /// Re-registering an identical definition returns the existing type, so
    /// a program may be evaluated twice against one registry.
    pub fn register(&self, mut def: TypeDefinition) -> Result<Arc<ResourceType>> {
        if def.name.is_empty() {
            return Err(WidgetError::Configuration(
                "Resource type name must not be empty".to_string(),
            ));
        }

        let mut types = self.types.write().map_err(|e| {
            WidgetError::Configuration(format!("Failed to acquire registry lock: {}", e))
        })?;

        // A structured default arrives as its encoded literal from generated programs
        if types.get(&def.parent).is_some_and(|p| p.is_structured()) {
            if let Some(value) = def.defaults.get_mut("value") {
                if !matches!(value, Value::Table(_)) {
                    *value = Value::Table(codec::decode_structured(value)?);
                }
            }
        }

        if let Some(existing) = types.get(&def.name) {
            if existing.builtin {
                return Err(WidgetError::Configuration(format!(
                    "{} is a built-in resource type and cannot be redefined",
                    def.name
                )));
            }
            if existing.definition() == def {
                return Ok(existing.clone());
            }
            return Err(WidgetError::Configuration(format!(
                "Resource type {} is already registered with a different definition",
                def.name
            )));
        }

        let parent = types.get(&def.parent).cloned().ok_or_else(|| {
            WidgetError::Configuration(format!(
                "Unknown parent type {} for {}",
                def.parent, def.name
            ))
        })?;

        let script = match def.script.as_deref() {
            Some(source) if !source.trim().is_empty() => {
                Some(self.engine.compile(&def.name, source)?)
            }
            _ => None,
        };

        let ty = Arc::new(ResourceType {
            name: def.name.clone(),
            parent: Some(parent),
            builtin: false,
            params: def.params,
            defaults: def.defaults,
            script,
            native: NativeHooks::default(),
            structured_value: false,
        });

        tracing::debug!(
            "Registered resource type {} (parent {})",
            ty.name,
            def.parent
        );
        types.insert(def.name, ty.clone());
        Ok(ty)
    }

    /// Look up a type by name
    pub fn get(&self, name: &str) -> Option<Arc<ResourceType>> {
        self.types.read().ok()?.get(name).cloned()
    }

    /// Look up a type by name, failing at the collaborator boundary
    pub fn resolve(&self, name: &str) -> Result<Arc<ResourceType>> {
        self.get(name)
            .ok_or_else(|| WidgetError::Collaborator(format!("Unknown resource type: {}", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered type names, built-ins first
    pub fn names(&self) -> Vec<String> {
        self.types
            .read()
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// The engine hooks run on
    pub fn engine(&self) -> &ScriptEngine {
        &self.engine
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new(ScriptLimits::default())
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.names())
            .finish()
    }
}

/// Decode whatever a table was constructed with
fn init_table(tree: &mut ResourceTree, node: NodeId) -> Result<()> {
    let decoded = codec::decode_structured(tree.node(node).value())?;
    tree.node_mut(node).value = Value::Table(decoded);
    Ok(())
}

/// Options must be resources with unique labels; the value names one of them
fn init_selector(tree: &mut ResourceTree, node: NodeId) -> Result<()> {
    let id = tree.id(node).to_string();
    let labels = option_labels(&id, tree.try_attr(node, "options").as_ref())?;

    if tree.node(node).value().is_null() {
        // option_labels never returns an empty list
        let first = labels.first().cloned().unwrap_or_default();
        tree.node_mut(node).value = Value::String(first);
        return Ok(());
    }
    check_selection(&id, &labels, tree.node(node).value())
}

/// Labels of a Selector's options, which must be a non-empty list of
/// resources with unique labels
pub(crate) fn option_labels(id: &str, options: Option<&Value>) -> Result<Vec<String>> {
    let options = options.ok_or_else(|| {
        WidgetError::Configuration(format!("Selector {} requires options", id))
    })?;

    let items = options.as_list().ok_or_else(|| {
        WidgetError::Configuration(format!(
            "Selector {} options must be a list, not {}",
            id,
            options.type_name()
        ))
    })?;

    let mut labels = Vec::with_capacity(items.len());
    for item in items {
        let option = item.as_node().ok_or_else(|| {
            WidgetError::Configuration(format!(
                "Selector {} options must all be resources ({})",
                id,
                item.type_name()
            ))
        })?;
        let label = option.node(option.root()).label().to_string();
        if labels.contains(&label) {
            return Err(WidgetError::Configuration(format!(
                "Selector option labels must be unique (repeated: {})",
                label
            )));
        }
        labels.push(label);
    }

    if labels.is_empty() {
        return Err(WidgetError::Configuration(format!(
            "Selector {} requires at least one option",
            id
        )));
    }
    Ok(labels)
}

/// A Selector value must be the label of one of its options
pub(crate) fn check_selection(id: &str, labels: &[String], value: &Value) -> Result<()> {
    match value {
        Value::String(selected) if labels.contains(selected) => Ok(()),
        other => Err(WidgetError::Configuration(format!(
            "Selector {} value {} is not one of its options",
            id, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_builtins_present() {
        let registry = TypeRegistry::default();
        for name in [
            builtin::RESOURCE,
            builtin::SUB_RESOURCE,
            builtin::REPLICATOR,
            builtin::TABLE,
            builtin::SELECTOR,
        ] {
            assert!(registry.get(name).unwrap().is_builtin(), "{}", name);
        }
    }

    #[test]
    fn test_signature_dedups_inherited_params() {
        let registry = TypeRegistry::default();
        registry
            .register(TypeDefinition::new("Base").param("scale").param("value"))
            .unwrap();
        let child = registry
            .register(
                TypeDefinition::new("Child")
                    .parent("Base")
                    .param("offset")
                    .param("scale"),
            )
            .unwrap();

        assert_eq!(
            child.signature(),
            vec!["id", "value", "children", "label", "help", "scale", "offset"]
        );
    }

    #[test]
    fn test_defaults_nearest_first() {
        let registry = TypeRegistry::default();
        registry
            .register(TypeDefinition::new("Base").default("color", "red"))
            .unwrap();
        let child = registry
            .register(TypeDefinition::new("Child").parent("Base").default("color", "blue"))
            .unwrap();

        assert_eq!(child.default("color"), Some(&Value::from("blue")));
        assert_eq!(child.default("id"), Some(&Value::from("resource")));
        assert_eq!(child.resolved_defaults()["color"], Value::from("blue"));
        assert!(child.is_a("Base"));
        assert!(child.is_a(builtin::RESOURCE));
        assert!(!child.is_a(builtin::TABLE));
    }

    #[test]
    fn test_hook_resolution_prefers_nearest() {
        let registry = TypeRegistry::default();
        registry
            .register(TypeDefinition::new("Base").script("fn run_self() { 1 } fn prepare() { 2 }"))
            .unwrap();
        let child = registry
            .register(
                TypeDefinition::new("Child")
                    .parent("Base")
                    .script("fn run_self() { 3 }"),
            )
            .unwrap();

        match child.hook(HookKind::RunSelf) {
            Some(Hook::Script(s)) => assert_eq!(s.name(), "Child"),
            other => panic!("unexpected hook {:?}", other),
        }
        match child.hook(HookKind::Prepare) {
            Some(Hook::Script(s)) => assert_eq!(s.name(), "Base"),
            other => panic!("unexpected hook {:?}", other),
        }
        assert!(matches!(child.hook(HookKind::NewChild), Some(Hook::Native(_))));
        assert!(child.hook(HookKind::Teardown).is_none());
    }

    #[test]
    fn test_registration_errors() {
        let registry = TypeRegistry::default();

        let err = registry
            .register(TypeDefinition::new("Orphan").parent("Missing"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = registry
            .register(TypeDefinition::new(builtin::TABLE))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = registry
            .register(TypeDefinition::new("Broken").script("fn run_self( {"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!registry.contains("Broken"));
    }

    #[test]
    fn test_reregistration() {
        let registry = TypeRegistry::default();
        let def = TypeDefinition::new("Thing").default("size", 3);

        let first = registry.register(def.clone()).unwrap();
        let second = registry.register(def).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let err = registry
            .register(TypeDefinition::new("Thing").default("size", 4))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_unknown_type_is_collaborator_error() {
        let registry = TypeRegistry::default();
        assert_eq!(
            registry.resolve("Nope").unwrap_err().kind(),
            ErrorKind::Collaborator
        );
    }

    #[test]
    fn test_table_is_structured() {
        let registry = TypeRegistry::default();
        let table = registry.register(TypeDefinition::new("Sheet").parent(builtin::TABLE)).unwrap();
        assert!(table.is_structured());
        assert_eq!(
            table.signature(),
            vec!["id", "value", "children", "label", "help", "sep"]
        );
    }
}
