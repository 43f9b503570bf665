//! Test data builders for creating test trees

use std::sync::Arc;
use widgets_rs::{NodeBuilder, ResourceTree, TypeDefinition, TypeRegistry, Value};

/// `top -> {a: "foo", mid -> {b: "bar", deep -> {c: "baz"}}}`
pub fn nested_tree(registry: &Arc<TypeRegistry>) -> ResourceTree {
    NodeBuilder::resource("top")
        .child(NodeBuilder::resource("a").value("foo"))
        .child(
            NodeBuilder::resource("mid")
                .child(NodeBuilder::resource("b").value("bar"))
                .child(
                    NodeBuilder::resource("deep").child(NodeBuilder::resource("c").value("baz")),
                ),
        )
        .build(registry)
        .expect("nested tree should build")
}

/// Two leaves named `x` under different parents
pub fn shadowed_tree(registry: &Arc<TypeRegistry>) -> ResourceTree {
    NodeBuilder::resource("top")
        .child(NodeBuilder::resource("left").child(NodeBuilder::resource("x").value(1)))
        .child(NodeBuilder::resource("right").child(NodeBuilder::resource("x").value(2)))
        .build(registry)
        .expect("shadowed tree should build")
}

/// Builder for custom type definitions
pub struct TypeBuilder {
    def: TypeDefinition,
}

impl TypeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            def: TypeDefinition::new(name),
        }
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.def = self.def.parent(parent);
        self
    }

    pub fn param(mut self, name: &str) -> Self {
        self.def = self.def.param(name);
        self
    }

    pub fn default(mut self, attr: &str, value: impl Into<Value>) -> Self {
        self.def = self.def.default(attr, value);
        self
    }

    pub fn script(mut self, source: &str) -> Self {
        self.def = self.def.script(source);
        self
    }

    pub fn register(self, registry: &TypeRegistry) {
        registry.register(self.def).expect("type should register");
    }
}

/// `depth` nested resources, `level_0 -> level_1 -> ...`, ending in a leaf
/// holding `depth`
pub fn chain_tree(registry: &Arc<TypeRegistry>, depth: usize) -> ResourceTree {
    let mut node = NodeBuilder::resource(format!("level_{}", depth)).value(depth as i64);
    for level in (0..depth).rev() {
        node = NodeBuilder::resource(format!("level_{}", level)).child(node);
    }
    node.build(registry).expect("chain tree should build")
}
