//! Resource trees
//!
//! A resource is a named, stateful node: an id unique among its siblings, a
//! value, display metadata, open-ended attributes and ordered children. Each
//! resource has a type that supplies defaults and hooks.
//!
//! ## Architecture
//!
//! ```text
//! TypeRegistry ──> ResourceType ──> ResourceType (parent) ──> ... Resource
//!      │
//!      └── ScriptEngine (compiled hook scripts)
//!
//! ResourceTree
//!   nodes: Vec<ResourceNode>   (indexed by NodeId)
//!   root:  NodeId
//! ```
//!
//! ## Modules
//!
//! - [`id`] - arena handles
//! - [`kind`] - types, hooks and the registry
//! - [`node`] - a single stored node
//! - [`tree`] - arena storage and construction
//! - [`addressing`] - path-based get/set and tree utilities
//! - [`mutation`] - append, insert, remove, duplicate, attach
//! - [`lifecycle`] - the prepare / children / run_self runner
//! - [`builder`] - building trees from Rust

pub mod addressing;
pub mod builder;
pub mod id;
pub mod kind;
pub mod lifecycle;
pub mod mutation;
pub mod node;
pub mod tree;

pub use addressing::Propagate;
pub use builder::NodeBuilder;
pub use id::NodeId;
pub use kind::{
    builtin, GetValueFn, Hook, HookKind, LifecycleFn, NativeHooks, NewChildFn, ResourceType,
    TypeDefinition, TypeRegistry, BASE_PARAMS,
};
pub use node::{title_case, ResourceNode};
pub use tree::{Args, ResourceTree};
