//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use std::sync::Arc;
use widgets_rs::{ProgramLoader, ResourceTree, SourceCompiler, TypeRegistry};

/// A registry with only the built-in types
pub fn registry() -> Arc<TypeRegistry> {
    TypeRegistry::with_builtins(Default::default())
}

/// Render `tree` as a program and evaluate it in a fresh environment
pub fn round_trip(tree: &ResourceTree) -> ResourceTree {
    let program = SourceCompiler::default()
        .render_program(tree)
        .expect("tree should render");
    ProgramLoader::default()
        .evaluate(&program)
        .unwrap_or_else(|e| panic!("program should load: {}\n{}", e, program))
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
