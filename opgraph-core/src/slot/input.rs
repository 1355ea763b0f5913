//! Input slots.
//!
//! The upstream connection of an input is held by the graph's connection
//! manager and addressed by [`SlotId`](super::SlotId), so an input never keeps
//! its source alive. What the input itself owns is the local default that is
//! used whenever it is unconnected.

use crate::graph::PassId;
use crate::value::{Value, ValueType};

use super::dirty::DirtyFlag;

/// An operator input.
#[derive(Debug, Clone)]
pub struct InputSlot {
    value_type: ValueType,
    local_default: Value,
    dirty: DirtyFlag,
}

impl InputSlot {
    /// A new input seeded with `default`. The slot's type is the default's type.
    pub fn new(default: Value) -> Self {
        Self {
            value_type: default.value_type(),
            local_default: default,
            dirty: DirtyFlag::dirty(),
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn local_default(&self) -> &Value {
        &self.local_default
    }

    /// Own staleness. For connected inputs the graph consults the upstream
    /// output instead.
    pub fn dirty(&self) -> &DirtyFlag {
        &self.dirty
    }

    /// Replace the local default. Returns the rejected value on a type mismatch.
    pub(crate) fn set_local_default(&mut self, value: Value) -> Result<(), Value> {
        if value.value_type() != self.value_type {
            return Err(value);
        }
        self.local_default = value;
        self.dirty.invalidate();
        Ok(())
    }

    pub(crate) fn invalidate(&mut self) {
        self.dirty.invalidate();
    }

    pub(crate) fn mark_clean(&mut self, pass: PassId) {
        self.dirty.mark_clean(pass);
    }
}
