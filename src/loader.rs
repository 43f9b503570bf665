//! Loading generated programs
//!
//! A [`ProgramLoader`] is a fresh environment: a registry holding only the
//! built-in types and a Rhai engine with two extra functions.
//!
//! - `register_type(#{ name, parent, params, defaults, script })`
//! - `new_node(type_name, #{ param: value, .. })`
//!
//! Evaluating a program registers its types and returns the tree built by
//! its final expression.

use crate::config::Settings;
use crate::error::{Result, WidgetError};
use crate::resource::{Args, ResourceTree, TypeDefinition, TypeRegistry};
use crate::scripting::{from_dynamic, ScriptEngine};
use indexmap::IndexMap;
use rhai::{Dynamic, Engine, EvalAltResult, Map, Position};
use std::path::Path;
use std::sync::Arc;

/// Evaluates generated programs in their own environment
pub struct ProgramLoader {
    registry: Arc<TypeRegistry>,
    engine: Engine,
}

impl ProgramLoader {
    pub fn new(settings: &Settings) -> Self {
        let registry = TypeRegistry::with_builtins(settings.scripting);

        let mut engine = Engine::new();
        ScriptEngine::configure_engine(&mut engine, &settings.scripting);
        let depth = settings.scripting.max_program_depth;
        engine.set_max_expr_depths(depth, depth);

        let types = registry.clone();
        engine.register_fn(
            "register_type",
            move |map: Map| -> std::result::Result<(), Box<EvalAltResult>> {
                let def = definition_from_map(map).map_err(raise)?;
                types.register(def).map(|_| ()).map_err(raise)
            },
        );

        let nodes = registry.clone();
        engine.register_fn(
            "new_node",
            move |type_name: &str, map: Map| -> std::result::Result<ResourceTree, Box<EvalAltResult>> {
                let mut args = Args::new();
                for (k, v) in map {
                    args.insert(k.to_string(), from_dynamic(v).map_err(raise)?);
                }
                ResourceTree::construct(&nodes, type_name, args).map_err(raise)
            },
        );

        Self { registry, engine }
    }

    /// The registry programs are evaluated against
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Evaluate a program and return the tree its final expression builds
    pub fn evaluate(&self, source: &str) -> Result<ResourceTree> {
        let result = self
            .engine
            .eval::<Dynamic>(source)
            .map_err(|err| recover(*err))?;

        if !result.is::<ResourceTree>() {
            return Err(WidgetError::Collaborator(format!(
                "Program must end with a resource, not {}",
                result.type_name()
            )));
        }
        let tree = result.try_cast::<ResourceTree>().ok_or_else(|| {
            WidgetError::Collaborator("Program result could not be read as a resource".to_string())
        })?;

        tracing::debug!(
            "Loaded {} with {} nodes",
            tree.id(tree.root()),
            tree.len()
        );
        Ok(tree)
    }

    /// Read and evaluate a program file
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ResourceTree> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            WidgetError::Collaborator(format!("Failed to read program {}: {}", path.display(), e))
        })?;
        tracing::info!("Loading program {}", path.display());
        self.evaluate(&source)
    }

    /// Build an instance of a registered type from its defaults alone
    pub fn instantiate(&self, type_name: &str) -> Result<ResourceTree> {
        ResourceTree::instantiate(&self.registry, type_name)
            .map_err(|e| e.with_context(format!("Failed to instantiate {}", type_name)))
    }
}

impl Default for ProgramLoader {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl std::fmt::Debug for ProgramLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramLoader")
            .field("registry", &self.registry)
            .finish()
    }
}

fn definition_from_map(mut map: Map) -> Result<TypeDefinition> {
    let name = match map.remove("name").map(Dynamic::into_string) {
        Some(Ok(name)) => name,
        _ => {
            return Err(WidgetError::Configuration(
                "register_type requires a string name".to_string(),
            ))
        }
    };

    let mut def = TypeDefinition::new(name.as_str());

    match map.remove("parent") {
        None => {}
        Some(parent) if parent.is_unit() => {}
        Some(parent) => match parent.into_string() {
            Ok(parent) => def = def.parent(parent),
            Err(found) => return Err(bad_field(&name, "parent", found)),
        },
    }

    if let Some(params) = map.remove("params") {
        let params = params
            .into_array()
            .map_err(|found| bad_field(&name, "params", found))?;
        for param in params {
            let param = param
                .into_string()
                .map_err(|found| bad_field(&name, "params", found))?;
            def = def.param(param);
        }
    }

    if let Some(defaults) = map.remove("defaults") {
        let defaults = defaults
            .try_cast::<Map>()
            .ok_or_else(|| bad_field(&name, "defaults", "non-map"))?;
        let mut resolved = IndexMap::new();
        for (attr, value) in defaults {
            resolved.insert(attr.to_string(), from_dynamic(value)?);
        }
        for (attr, value) in resolved {
            def = def.default(attr, value);
        }
    }

    match map.remove("script") {
        None => {}
        Some(script) if script.is_unit() => {}
        Some(script) => match script.into_string() {
            Ok(script) => def = def.script(script),
            Err(found) => return Err(bad_field(&name, "script", found)),
        },
    }

    if let Some(extra) = map.keys().next() {
        return Err(WidgetError::Configuration(format!(
            "Unknown field {} in definition of {}",
            extra, name
        )));
    }
    Ok(def)
}

fn bad_field(name: &str, field: &str, found: &str) -> WidgetError {
    WidgetError::Configuration(format!(
        "Field {} in definition of {} has the wrong type ({})",
        field, name, found
    ))
}

/// Carry a library error through Rhai
fn raise(err: WidgetError) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(
        Dynamic::from(Arc::new(err)),
        Position::NONE,
    ))
}

/// The library error a failed evaluation carried, or a load error
fn recover(err: EvalAltResult) -> WidgetError {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _)
        | EvalAltResult::ErrorInModule(_, inner, _) => recover(*inner),
        EvalAltResult::ErrorRuntime(payload, _) if payload.is::<Arc<WidgetError>>() => {
            match payload.try_cast::<Arc<WidgetError>>().map(Arc::try_unwrap) {
                Some(Ok(inner)) => inner.with_context("Failed to load program"),
                Some(Err(shared)) => {
                    WidgetError::Collaborator(format!("Failed to load program: {}", shared))
                }
                None => WidgetError::Collaborator("Failed to load program".to_string()),
            }
        }
        other => WidgetError::Collaborator(format!("Failed to evaluate program: {}", other)),
    }
}
