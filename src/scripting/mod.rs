//! Rhai scripting for resource hooks
//!
//! Custom resource types carry their behavior as Rhai source. Because the
//! behavior is source text to begin with, a generated program can embed it
//! verbatim and a fresh environment can compile it again.
//!
//! ## Hooks
//!
//! A type script may define any of these functions:
//!
//! - `fn prepare()` - runs before any child of the node runs
//! - `fn run_self()` - runs after every child has run
//! - `fn teardown()` - runs when the node is removed from its parent
//! - `fn get_value()` - computes the value returned by `get(.., "value")`
//! - `fn new_child(id)` - returns an object map of constructor arguments for
//!   a child created by `append`/`insert`, with an optional `"type"` key
//!
//! Other functions are allowed and may be called from the hooks.
//!
//! ## `this`
//!
//! Inside a hook, `this` is an object map holding the node's resolved
//! attributes (instance attributes over class defaults), its `id`, `value`,
//! `label` and `help`, and a `children` map from child id to child value.
//! Assignments to `this` are written back to the node when a lifecycle hook
//! returns. `id` and `children` are read-only.
//!
//! ## Example
//!
//! ```rhai
//! fn run_self() {
//!     this.total = 0;
//!     for v in this.children.values() {
//!         this.total += v;
//!     }
//! }
//! ```

mod convert;
mod engine;

pub use convert::{from_dynamic, to_dynamic};
pub use engine::ScriptEngine;

use crate::error::{Result, WidgetError};
use crate::resource::HookKind;
use rhai::{Engine, AST};
use std::collections::HashMap;
use std::sync::Arc;

/// A compiled type script and the hooks it defines
#[derive(Clone)]
pub struct CompiledHooks {
    /// The compiled AST
    ast: AST,
    /// The original source code
    source: String,
    /// Name of the type the script belongs to
    name: String,
    /// Hooks defined by the script, in declaration order
    hooks: Vec<HookKind>,
}

impl CompiledHooks {
    /// Get the source code of this script
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Get the name of the owning type
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hooks the script defines
    pub fn hooks(&self) -> &[HookKind] {
        &self.hooks
    }

    /// True if the script defines `kind`
    pub fn defines(&self, kind: HookKind) -> bool {
        self.hooks.contains(&kind)
    }

    pub(crate) fn ast(&self) -> &AST {
        &self.ast
    }
}

impl std::fmt::Debug for CompiledHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledHooks")
            .field("name", &self.name)
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Cache for compiled scripts to avoid recompilation
#[derive(Default)]
pub struct ScriptCache {
    /// Map from (type name, script source) to compiled hooks
    cache: HashMap<(String, String), Arc<CompiledHooks>>,
}

impl ScriptCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Number of cached scripts
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Get cached hooks or compile and cache them
    ///
    /// Scripts are keyed by owning type and source, so errors and traces
    /// always name the type that is running.
    pub fn get_or_compile(
        &mut self,
        engine: &Engine,
        name: &str,
        source: &str,
    ) -> Result<Arc<CompiledHooks>> {
        let key = (name.to_string(), source.to_string());
        if let Some(hooks) = self.cache.get(&key) {
            return Ok(hooks.clone());
        }

        let ast = engine.compile(source).map_err(|e| {
            WidgetError::Configuration(format!("Hook script for {} does not compile: {}", name, e))
        })?;

        let mut hooks = Vec::new();
        for f in ast.iter_functions() {
            let Some(kind) = HookKind::from_name(f.name) else {
                continue;
            };
            if f.params.len() != kind.arity() {
                return Err(WidgetError::Configuration(format!(
                    "Hook {} of {} must take {} parameter(s), found {}",
                    kind,
                    name,
                    kind.arity(),
                    f.params.len()
                )));
            }
            if !hooks.contains(&kind) {
                hooks.push(kind);
            }
        }

        let compiled = Arc::new(CompiledHooks {
            ast,
            source: source.to_string(),
            name: name.to_string(),
            hooks,
        });

        self.cache.insert(key, compiled.clone());
        Ok(compiled)
    }
}

/// Ready-made hook scripts for common resource behaviors
pub mod builtins {
    /// Counts how many times the node has run
    pub const COUNT_RUNS: &str = r#"
fn run_self() {
    this.runs = if this.runs == () { 1 } else { this.runs + 1 };
}
"#;

    /// Sums the numeric values of all children into `value`
    pub const SUM_CHILDREN: &str = r#"
fn run_self() {
    let total = 0;
    for v in this.children.values() {
        total += v;
    }
    this.value = total;
}
"#;

    /// Reports the value as an upper-case string
    pub const SHOUT: &str = r#"
fn get_value() {
    if this.value == () { () } else { this.value.to_string().to_upper() }
}
"#;

    /// Numbers new children by their position in the parent
    pub const NUMBERED_CHILDREN: &str = r#"
fn new_child(id) {
    #{ "value": this.children.len(), "label": "Item " + this.children.len() }
}
"#;

    /// List of all built-in hook scripts with names
    pub fn all() -> Vec<(&'static str, &'static str)> {
        vec![
            ("Count runs", COUNT_RUNS),
            ("Sum children", SUM_CHILDREN),
            ("Shout", SHOUT),
            ("Numbered children", NUMBERED_CHILDREN),
        ]
    }
}
