//! Rhai Script Engine Implementation
//!
//! This module provides the engine that compiles and runs type hook scripts.
//!
//! ## Script Functions
//!
//! Besides the Rhai standard library, hooks can use:
//! - `title_case(text)` - the default label derivation for an id
//! - `print(..)` / `debug(..)` - forwarded to `tracing`
//!
//! Tables appear as a `Table` type with `rows`, `width`, `columns()` and
//! `table["column"]`. Resource subtrees (children, selector options) appear
//! as a `ResourceTree` type with `id`, `value` and `label` getters.

use crate::config::ScriptLimits;
use crate::error::{Result, ResultExt, WidgetError};
use crate::resource::{title_case, HookKind, ResourceTree};
use crate::scripting::{convert, CompiledHooks, ScriptCache};
use crate::types::Table;
use rhai::{CallFnOptions, Dynamic, Engine, FuncArgs, ImmutableString, Scope};
use std::sync::{Arc, RwLock};

/// The script engine used to run resource hooks
pub struct ScriptEngine {
    /// The Rhai engine instance
    engine: Engine,
    /// Cache of compiled scripts
    cache: RwLock<ScriptCache>,
    /// Limits the engine was configured with
    limits: ScriptLimits,
}

impl ScriptEngine {
    /// Create a new script engine with the given limits
    pub fn new(limits: ScriptLimits) -> Self {
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine, &limits);

        Self {
            engine,
            cache: RwLock::new(ScriptCache::new()),
            limits,
        }
    }

    /// Configure a Rhai engine with safety limits and resource types
    ///
    /// The program loader configures its own engine through this as well,
    /// so hooks and programs see the same types and limits.
    pub fn configure_engine(engine: &mut Engine, limits: &ScriptLimits) {
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_expr_depth);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_operations(limits.max_operations);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);

        engine.on_print(|text| tracing::info!(target: "widgets_rs::script", "{}", text));
        engine.on_debug(|text, source, pos| {
            tracing::debug!(target: "widgets_rs::script", ?source, %pos, "{}", text)
        });

        engine.register_fn("title_case", |text: &str| title_case(text));

        // ===== Tables =====

        engine
            .register_type_with_name::<Table>("Table")
            .register_get("rows", |t: &mut Table| t.rows() as i64)
            .register_get("width", |t: &mut Table| t.width() as i64)
            .register_fn("columns", |t: &mut Table| -> rhai::Array {
                t.columns().map(|(name, _)| Dynamic::from(name.to_string())).collect()
            })
            .register_fn("to_map", |t: &mut Table| convert::table_to_map(t))
            .register_indexer_get(|t: &mut Table, column: ImmutableString| -> Dynamic {
                match t.column(column.as_str()) {
                    Some(cells) => Dynamic::from_array(
                        cells
                            .iter()
                            .map(|c| convert::to_dynamic(&c.into()))
                            .collect(),
                    ),
                    None => Dynamic::UNIT,
                }
            });

        // ===== Resource subtrees =====

        engine
            .register_type_with_name::<ResourceTree>("ResourceTree")
            .register_get("id", |t: &mut ResourceTree| t.id(t.root()).to_string())
            .register_get("label", |t: &mut ResourceTree| {
                t.node(t.root()).label().to_string()
            })
            .register_get("value", |t: &mut ResourceTree| {
                convert::to_dynamic(t.node(t.root()).value())
            })
            .register_get("type_name", |t: &mut ResourceTree| {
                t.node(t.root()).kind().name().to_string()
            });
    }

    /// Compile a type script and cache it
    pub fn compile(&self, name: &str, source: &str) -> Result<Arc<CompiledHooks>> {
        let mut cache = self
            .cache
            .write()
            .map_err(|e| WidgetError::Script(format!("Failed to acquire cache lock: {}", e)))?;

        cache.get_or_compile(&self.engine, name, source)
    }

    /// Call a hook with `this` bound to `this`
    ///
    /// The script AST is not evaluated first, so top-level statements in a
    /// type script never run.
    pub fn call_hook(
        &self,
        hooks: &CompiledHooks,
        kind: HookKind,
        this: &mut Dynamic,
        args: impl FuncArgs,
    ) -> Result<Dynamic> {
        tracing::trace!("Running {} hook of {}", kind, hooks.name());

        let options = CallFnOptions::new()
            .eval_ast(false)
            .rewind_scope(true)
            .bind_this_ptr(this);
        let mut scope = Scope::new();

        self.engine
            .call_fn_with_options::<Dynamic>(
                options,
                &mut scope,
                hooks.ast(),
                kind.as_str(),
                args,
            )
            .with_context(|| format!("{} hook of {} failed", kind, hooks.name()))
    }

    /// Get a reference to the underlying Rhai engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Limits the engine was configured with
    pub fn limits(&self) -> &ScriptLimits {
        &self.limits
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new(ScriptLimits::default())
    }
}

impl std::fmt::Debug for ScriptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptEngine")
            .field("cache_size", &self.cache.read().map(|c| c.len()).ok())
            .field("limits", &self.limits)
            .finish()
    }
}
