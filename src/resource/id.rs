//! Identity type for resource tree nodes.
//!
//! A `NodeId` is an arena handle into a `ResourceTree`'s node storage, not
//! the node's string `id`: the same string id may appear under different
//! parents, while a `NodeId` is unique within one tree.
//!
//! Slots freed by `remove` are reused. Each reuse bumps the slot's
//! generation, so a handle kept from before the removal no longer matches
//! and is reported as stale instead of aliasing the newer node.

use std::fmt;

/// Slot index plus the generation the slot had when the handle was issued.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct NodeId {
    slot: u32,
    generation: u32,
}

impl NodeId {
    pub const INVALID: NodeId = NodeId {
        slot: u32::MAX,
        generation: 0,
    };

    #[inline]
    pub(crate) const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.slot != u32::MAX
    }

    #[inline]
    pub fn index(self) -> usize {
        self.slot as usize
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            write!(f, "NodeId(INVALID)")
        } else if self.generation == 0 {
            write!(f, "NodeId({})", self.slot)
        } else {
            write!(f, "NodeId({}v{})", self.slot, self.generation)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
