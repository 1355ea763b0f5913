//! Output slots: a cached value plus a dirty flag.

use crate::graph::PassId;
use crate::value::{Value, ValueType};

use super::dirty::DirtyFlag;

/// An operator output.
///
/// The value is written only by the owning instance's operator (through the
/// graph's evaluation loop); everybody else gets clones of the cache.
#[derive(Debug, Clone)]
pub struct Slot {
    value_type: ValueType,
    value: Value,
    dirty: DirtyFlag,
    always_recompute: bool,
    compute_count: u64,
}

impl Slot {
    /// A new output seeded with the zero value of its type.
    ///
    /// Outputs start dirty so the first read computes them.
    pub fn new(value_type: ValueType, always_recompute: bool) -> Self {
        Self::seeded(Value::default_for(value_type), always_recompute)
    }

    /// A new output whose cache holds `value` until the first compute.
    pub fn seeded(value: Value, always_recompute: bool) -> Self {
        Self {
            value_type: value.value_type(),
            value,
            dirty: DirtyFlag::dirty(),
            always_recompute,
            compute_count: 0,
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// The cached value, whatever its freshness.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn dirty(&self) -> &DirtyFlag {
        &self.dirty
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    pub fn is_clean(&self) -> bool {
        self.dirty.is_clean()
    }

    /// Live sources (clocks, input devices) are invalidated at the start of
    /// every pass.
    pub fn always_recompute(&self) -> bool {
        self.always_recompute
    }

    /// How many times a compute result was stored into this slot.
    pub fn compute_count(&self) -> u64 {
        self.compute_count
    }

    pub fn invalidate(&mut self) {
        self.dirty.invalidate();
    }

    /// Store a freshly computed value.
    pub(crate) fn store(&mut self, value: Value, pass: PassId) {
        debug_assert_eq!(value.value_type(), self.value_type);
        self.value = value;
        self.compute_count += 1;
        self.dirty.mark_clean(pass);
    }

    /// Keep the previous value after a failed compute.
    pub(crate) fn retain(&mut self, pass: PassId) {
        self.dirty.mark_clean(pass);
    }
}
