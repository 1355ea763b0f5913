//! Slots
//!
//! Slots are the cells an operator instance reads from and writes to.
//!
//! # Kinds
//!
//! ## Output slots
//!
//! A [`Slot`] caches the last value its operator computed together with a
//! [`DirtyFlag`]. Reading a dirty slot runs the operator; reading a clean slot
//! returns the cache.
//!
//! ## Input slots
//!
//! An [`InputSlot`] either forwards the value of the output it is connected to
//! or, when unconnected, yields its local default. Connected inputs keep no
//! cache of their own.
//!
//! ## Multi-input slots
//!
//! A [`MultiInputSlot`] is an ordered list of input slots feeding one
//! aggregating operator (sums, color lists). Children are addressed by a
//! [`ChildId`] that stays stable when the list is reordered.
//!
//! # Invalidation
//!
//! Invalidation is pushed downstream eagerly when a parameter or connection
//! changes; recomputation is pulled lazily when somebody reads a value.

mod dirty;
mod handle;
mod input;
mod multi_input;
mod output;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::InstanceId;

pub use dirty::{DirtyFlag, DirtyState};
pub use handle::{InputRef, MultiInputRef, OutputRef};
pub use input::InputSlot;
pub use multi_input::MultiInputSlot;
pub use output::Slot;

/// Position of a slot within its operator's declaration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotIndex(pub u16);

impl SlotIndex {
    pub fn as_usize(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one child of a multi-input slot.
///
/// Allocated per multi-input and never reused, so it survives reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChildId(pub u32);

/// Graph-wide address of a slot.
///
/// `child` is set only when addressing one input inside a multi-input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId {
    pub instance: InstanceId,
    pub index: SlotIndex,
    pub child: Option<ChildId>,
}

impl SlotId {
    pub const fn new(instance: InstanceId, index: SlotIndex) -> Self {
        Self {
            instance,
            index,
            child: None,
        }
    }

    /// Address a child of this (multi-input) slot.
    pub const fn with_child(self, child: ChildId) -> Self {
        Self {
            instance: self.instance,
            index: self.index,
            child: Some(child),
        }
    }

    /// The declared slot this id belongs to, without any child part.
    pub const fn declared(self) -> Self {
        Self::new(self.instance, self.index)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.child {
            Some(child) => write!(f, "{}.{}#{}", self.instance, self.index, child.0),
            None => write!(f, "{}.{}", self.instance, self.index),
        }
    }
}

/// Storage for one declared slot of an instance.
#[derive(Debug, Clone)]
pub enum InstanceSlot {
    Output(Slot),
    Input(InputSlot),
    MultiInput(MultiInputSlot),
}

impl InstanceSlot {
    pub fn as_output(&self) -> Option<&Slot> {
        match self {
            InstanceSlot::Output(slot) => Some(slot),
            _ => None,
        }
    }

    pub fn as_output_mut(&mut self) -> Option<&mut Slot> {
        match self {
            InstanceSlot::Output(slot) => Some(slot),
            _ => None,
        }
    }

    pub fn as_input(&self) -> Option<&InputSlot> {
        match self {
            InstanceSlot::Input(slot) => Some(slot),
            _ => None,
        }
    }

    pub fn as_multi_input(&self) -> Option<&MultiInputSlot> {
        match self {
            InstanceSlot::MultiInput(slot) => Some(slot),
            _ => None,
        }
    }

    pub fn as_multi_input_mut(&mut self) -> Option<&mut MultiInputSlot> {
        match self {
            InstanceSlot::MultiInput(slot) => Some(slot),
            _ => None,
        }
    }

    /// Resolve an input, either this slot itself or one of its children.
    pub fn input(&self, child: Option<ChildId>) -> Option<&InputSlot> {
        match (self, child) {
            (InstanceSlot::Input(slot), None) => Some(slot),
            (InstanceSlot::MultiInput(multi), Some(child)) => multi.child(child),
            _ => None,
        }
    }

    pub fn input_mut(&mut self, child: Option<ChildId>) -> Option<&mut InputSlot> {
        match (self, child) {
            (InstanceSlot::Input(slot), None) => Some(slot),
            (InstanceSlot::MultiInput(multi), Some(child)) => multi.child_mut(child),
            _ => None,
        }
    }
}
