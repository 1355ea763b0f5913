//! Operator Registry
//!
//! The registry maps operator type ids to their definitions: the static slot
//! declaration table and the [`Operator`] that computes the outputs.
//!
//! # Lookup
//!
//! Instances are created by type id, so a graph can be rebuilt from a list of
//! `(instance_id, type_id)` pairs without knowing the concrete Rust types.
//! Definitions are shared behind `Arc`; every instance of a type points at the
//! same operator.

mod declaration;

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{OperatorError, RegistryError};
use crate::graph::{EvalScope, InstanceId};
use crate::slot::SlotIndex;
use crate::value::Value;

pub use declaration::{OperatorDefinition, OperatorTypeId, SlotDeclaration, SlotKind};

/// Compute logic shared by all instances of one operator type.
///
/// `compute` must be a function of the instance's inputs (read through the
/// scope) and the evaluation context; operators carry no per-instance state.
pub trait Operator: Send + Sync {
    /// Produce the value for one output slot.
    fn compute(&self, output: SlotIndex, scope: &mut EvalScope<'_>) -> Result<Value, OperatorError>;

    /// Called when an instance is removed from its graph, after its
    /// connections have been severed.
    fn dispose(&self, _instance: InstanceId) {}
}

/// Operator definitions indexed by type id.
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    definitions: IndexMap<OperatorTypeId, Arc<OperatorDefinition>>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition after validating its declarations.
    pub fn register(&mut self, definition: OperatorDefinition) -> Result<(), RegistryError> {
        definition.validate()?;
        if self.definitions.contains_key(definition.type_id()) {
            return Err(RegistryError::DuplicateType(definition.type_id().clone()));
        }
        debug!(type_id = %definition.type_id(), "registered operator type");
        self.definitions
            .insert(definition.type_id().clone(), Arc::new(definition));
        Ok(())
    }

    /// Register or replace a definition. Used when reloading operator code.
    pub fn replace(&mut self, definition: OperatorDefinition) -> Result<(), RegistryError> {
        definition.validate()?;
        self.definitions
            .insert(definition.type_id().clone(), Arc::new(definition));
        Ok(())
    }

    pub fn remove(&mut self, type_id: &str) -> Option<Arc<OperatorDefinition>> {
        self.definitions.shift_remove(type_id)
    }

    pub fn get(&self, type_id: &str) -> Option<&Arc<OperatorDefinition>> {
        self.definitions.get(type_id)
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.definitions.contains_key(type_id)
    }

    /// Definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<OperatorDefinition>> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
