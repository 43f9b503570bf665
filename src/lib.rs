//! # widgets-rs: Live Resource Trees
//!
//! A tree of named, stateful resource nodes that can be read and mutated by
//! path, executed through a fixed lifecycle, and at any moment turned back
//! into a self-contained program that rebuilds it.
//!
//! ## Architecture
//!
//! - **Resource**: arena-backed trees, types with hooks, path addressing
//!   and structural mutation
//! - **Scripting**: Rhai hooks for custom types, compiled once per source
//! - **Compiler**: renders a tree and the custom types it needs as a Rhai
//!   program
//! - **Loader**: evaluates such a program in a fresh environment
//! - **Codec**: compact literals for structured values
//!
//! ## Configuration
//!
//! Settings are read from `settings.toml` in the platform config directory
//! under `widgets-rs`:
//!
//! - **Linux**: `~/.config/widgets-rs/`
//! - **macOS**: `~/Library/Application Support/widgets-rs/`
//! - **Windows**: `%APPDATA%\widgets-rs\`
//!
//! ## Example
//!
//! ```ignore
//! use widgets_rs::{NodeBuilder, ProgramLoader, Propagate, SourceCompiler, TypeRegistry, Value};
//!
//! let registry = TypeRegistry::with_builtins(Default::default());
//! let mut tree = NodeBuilder::resource("top")
//!     .child(NodeBuilder::resource("a").value("foo"))
//!     .build(&registry)?;
//!
//! tree.set(&["a"], "value", Value::from("bar"), Propagate::Yes)?;
//!
//! let program = SourceCompiler::default().render_program(&tree)?;
//! let rebuilt = ProgramLoader::default().evaluate(&program)?;
//! assert_eq!(rebuilt.all_values(&[], false)?, tree.all_values(&[], false)?);
//! ```

pub mod codec;
pub mod compiler;
pub mod config;
pub mod error;
pub mod loader;
pub mod resource;
pub mod scripting;
pub mod types;

// Re-export commonly used types
pub use compiler::SourceCompiler;
pub use config::{CompilerSettings, ScriptLimits, Settings};
pub use error::{ErrorKind, Result, ResultExt, WidgetError};
pub use loader::ProgramLoader;
pub use resource::{
    builtin, HookKind, NodeBuilder, NodeId, Propagate, ResourceTree, ResourceType, TypeDefinition,
    TypeRegistry,
};
pub use scripting::ScriptEngine;
pub use types::{Cell, Table, Value, ValueTree};
