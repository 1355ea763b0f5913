//! Static slot declarations for operator types.

use std::borrow::{Borrow, Cow};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::slot::SlotIndex;
use crate::value::{Value, ValueType};

use super::Operator;

/// Stable identifier of an operator type, e.g. `"math.sum"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorTypeId(Cow<'static, str>);

impl OperatorTypeId {
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for OperatorTypeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperatorTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a declared slot is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// An output computed by the operator. `always_recompute` marks live
    /// sources that must refresh every pass.
    Output { always_recompute: bool },
    Input,
    MultiInput,
}

/// One row of an operator type's declaration table.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotDeclaration {
    pub name: &'static str,
    pub kind: SlotKind,
    pub value_type: ValueType,
    /// Local default for inputs, per-child default for multi-inputs, initial
    /// cache for outputs.
    pub default: Value,
}

impl SlotDeclaration {
    pub fn output(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            kind: SlotKind::Output {
                always_recompute: false,
            },
            value_type,
            default: Value::default_for(value_type),
        }
    }

    /// An output refreshed at the start of every evaluation pass.
    pub fn live_output(name: &'static str, value_type: ValueType) -> Self {
        Self {
            kind: SlotKind::Output {
                always_recompute: true,
            },
            ..Self::output(name, value_type)
        }
    }

    pub fn input(name: &'static str, default: impl Into<Value>) -> Self {
        let default = default.into();
        Self {
            name,
            kind: SlotKind::Input,
            value_type: default.value_type(),
            default,
        }
    }

    pub fn multi_input(name: &'static str, child_default: impl Into<Value>) -> Self {
        let default = child_default.into();
        Self {
            name,
            kind: SlotKind::MultiInput,
            value_type: default.value_type(),
            default,
        }
    }

    /// Replace the declared default. For outputs this is the cached value
    /// seen before the first compute.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    pub fn is_output(&self) -> bool {
        matches!(self.kind, SlotKind::Output { .. })
    }
}

/// Everything the graph needs to instantiate one operator type.
#[derive(Clone)]
pub struct OperatorDefinition {
    type_id: OperatorTypeId,
    name: &'static str,
    slots: Vec<SlotDeclaration>,
    operator: Arc<dyn Operator>,
}

impl OperatorDefinition {
    pub fn new(type_id: &'static str, name: &'static str, operator: impl Operator + 'static) -> Self {
        Self::from_shared(OperatorTypeId::from_static(type_id), name, Arc::new(operator))
    }

    pub fn from_shared(
        type_id: OperatorTypeId,
        name: &'static str,
        operator: Arc<dyn Operator>,
    ) -> Self {
        Self {
            type_id,
            name,
            slots: Vec::new(),
            operator,
        }
    }

    /// Append a declaration. Slot indices follow declaration order.
    pub fn with_slot(mut self, slot: SlotDeclaration) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn type_id(&self) -> &OperatorTypeId {
        &self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn slots(&self) -> &[SlotDeclaration] {
        &self.slots
    }

    pub fn slot(&self, index: SlotIndex) -> Option<&SlotDeclaration> {
        self.slots.get(index.as_usize())
    }

    pub fn slot_index(&self, name: &str) -> Option<SlotIndex> {
        self.slots
            .iter()
            .position(|slot| slot.name == name)
            .and_then(|i| u16::try_from(i).ok())
            .map(SlotIndex)
    }

    pub fn operator(&self) -> &Arc<dyn Operator> {
        &self.operator
    }

    /// Two definitions with the same layout can be swapped under live
    /// instances.
    pub fn same_layout(&self, other: &OperatorDefinition) -> bool {
        self.slots.len() == other.slots.len()
            && self
                .slots
                .iter()
                .zip(&other.slots)
                .all(|(a, b)| a.name == b.name && a.kind == b.kind && a.value_type == b.value_type)
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.slots.len() > usize::from(u16::MAX) {
            return Err(RegistryError::TooManySlots(self.type_id.clone()));
        }

        let mut seen = HashSet::new();
        for slot in &self.slots {
            if !seen.insert(slot.name) {
                return Err(RegistryError::DuplicateSlot {
                    type_id: self.type_id.clone(),
                    slot: slot.name,
                });
            }
            if slot.default.value_type() != slot.value_type {
                return Err(RegistryError::DefaultTypeMismatch {
                    type_id: self.type_id.clone(),
                    slot: slot.name,
                    declared: slot.value_type,
                    found: slot.default.value_type(),
                });
            }
        }

        if !self.slots.iter().any(SlotDeclaration::is_output) {
            return Err(RegistryError::NoOutputs(self.type_id.clone()));
        }
        Ok(())
    }
}

impl fmt::Debug for OperatorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorDefinition")
            .field("type_id", &self.type_id)
            .field("name", &self.name)
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}
