//! Operator Graph
//!
//! The graph owns operator instances and the connections between their slots,
//! and evaluates output slots on demand.
//!
//! # Overview
//!
//! - Nodes are [`Instance`]s, created from an operator type in the registry.
//! - Edges are [`Connection`]s from an output slot to an input slot.
//!
//! # Push, then Pull
//!
//! Edits push staleness downstream immediately: changing a local default,
//! connecting, disconnecting or resizing a multi-input marks the owning
//! instance's outputs dirty, and every output transitively reading from them.
//! Nothing is recomputed at that point.
//!
//! Reads pull: [`Graph::get_value`] walks upstream depth-first, computing
//! dirty outputs and returning clean caches untouched. An output computed
//! once in a pass is clean for the rest of that pass, so shared upstream
//! nodes run once no matter how many paths reach them.
//!
//! # Threading
//!
//! All mutation and evaluation goes through `&mut Graph`. The borrow checker
//! is what keeps edits from interleaving with a pass; there are no locks.

mod connection;
mod context;
mod evaluate;
mod instance;
mod snapshot;

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::config::GraphConfig;
use crate::error::{ConfigError, GraphError};
use crate::registry::{OperatorRegistry, OperatorTypeId};
use crate::slot::{InputSlot, InstanceSlot, MultiInputSlot, SlotId};
use crate::value::Value;

pub use connection::{Connection, ConnectionManager};
pub use context::{EvalFrame, EvalStats, EvaluationContext, PassId};
pub use evaluate::EvalScope;
pub use instance::{Instance, InstanceId, InstanceState};
pub use snapshot::{
    ConnectionRecord, DefaultRecord, InstanceRecord, MultiInputRecord, SlotPath, TopologySnapshot,
};

/// A graph of operator instances.
pub struct Graph {
    registry: Arc<OperatorRegistry>,
    config: GraphConfig,
    instances: IndexMap<InstanceId, Instance>,
    connections: ConnectionManager,

    /// Always-recompute outputs, invalidated at the start of every pass.
    live_outputs: IndexSet<SlotId>,

    next_instance: u64,
    last_pass: Option<PassId>,
}

impl Graph {
    /// An empty graph with default configuration.
    pub fn new(registry: Arc<OperatorRegistry>) -> Self {
        Self {
            registry,
            config: GraphConfig::default(),
            instances: IndexMap::new(),
            connections: ConnectionManager::new(),
            live_outputs: IndexSet::new(),
            next_instance: 1,
            last_pass: None,
        }
    }

    pub fn with_config(registry: Arc<OperatorRegistry>, config: GraphConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(registry)
        })
    }

    pub fn registry(&self) -> &Arc<OperatorRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Instances
    // ------------------------------------------------------------------------

    /// Create an instance of a registered operator type.
    pub fn add_instance(&mut self, type_id: &str) -> Result<InstanceId, GraphError> {
        let id = InstanceId::from(self.next_instance);
        self.add_instance_with_id(id, type_id)
    }

    /// Create an instance with a caller-chosen id, e.g. when replaying a
    /// saved topology.
    pub fn add_instance_with_id(&mut self, id: InstanceId, type_id: &str) -> Result<InstanceId, GraphError> {
        if self.instances.contains_key(&id) {
            return Err(GraphError::DuplicateInstance(id));
        }
        let definition = self
            .registry
            .get(type_id)
            .cloned()
            .ok_or_else(|| GraphError::UnresolvedInstanceType {
                instance: Some(id),
                type_id: OperatorTypeId::new(type_id),
            })?;

        let mut instance = Instance::construct(id, definition);
        instance.activate();
        self.live_outputs.extend(instance.live_output_ids());
        self.instances.insert(id, instance);
        self.next_instance = self.next_instance.max(id.raw() + 1);

        debug!(instance = %id, type_id, "added instance");
        Ok(id)
    }

    /// Remove an instance.
    ///
    /// Every connection into or out of the instance is severed first, and
    /// the inputs it fed fall back to their defaults. The operator's disposal
    /// hook runs last. The disposed instance is returned.
    pub fn remove_instance(&mut self, id: InstanceId) -> Result<Instance, GraphError> {
        if !self.instances.contains_key(&id) {
            return Err(GraphError::InstanceNotFound(id));
        }

        let mut downstream = Vec::new();
        for connection in self.connections.edges_of(id) {
            self.connections.remove(connection.target);
            if connection.target.instance != id {
                downstream.push(connection.target);
            }
        }

        let mut instance = self
            .instances
            .shift_remove(&id)
            .ok_or(GraphError::InstanceNotFound(id))?;
        self.live_outputs.retain(|slot| slot.instance != id);

        for target in downstream {
            self.invalidate_input(target);
        }

        if let Some(operator) = instance.operator() {
            operator.dispose(id);
        }
        instance.dispose();

        debug!(instance = %id, type_id = %instance.type_id(), "removed instance");
        Ok(instance)
    }

    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    /// Instances in creation order.
    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.values()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Look up a slot by its declared name.
    pub fn slot_id(&self, instance: InstanceId, name: &str) -> Result<SlotId, GraphError> {
        let inst = self
            .instances
            .get(&instance)
            .ok_or(GraphError::InstanceNotFound(instance))?;
        inst.slot_index(name)
            .map(|index| SlotId::new(instance, index))
            .ok_or_else(|| GraphError::UnknownSlotName {
                instance,
                name: name.to_string(),
            })
    }

    // ------------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------------

    /// Set the local default of an input (or multi-input child).
    ///
    /// When the input is unconnected this changes its value, so everything
    /// downstream of the owning instance goes stale.
    pub fn set_local_default(&mut self, slot: SlotId, value: impl Into<Value>) -> Result<(), GraphError> {
        let value = value.into();
        let input = self.input_slot_mut(slot)?;
        let expected = input.value_type();
        input
            .set_local_default(value)
            .map_err(|rejected| GraphError::ValueTypeMismatch {
                slot,
                expected,
                found: rejected.value_type(),
            })?;

        if !self.connections.is_connected(slot) {
            self.invalidate_input(slot);
        }
        Ok(())
    }

    pub fn local_default(&self, slot: SlotId) -> Result<&Value, GraphError> {
        Ok(self.input_slot(slot)?.local_default())
    }

    // ------------------------------------------------------------------------
    // Multi-inputs
    // ------------------------------------------------------------------------

    /// Append an unconnected child to a multi-input.
    ///
    /// Returns the child's position and slot id.
    pub fn add_input(&mut self, multi: SlotId) -> Result<(usize, SlotId), GraphError> {
        let (index, child) = self.multi_input_slot_mut(multi)?.add_input();
        self.invalidate_owner(multi.instance);
        Ok((index, multi.declared().with_child(child)))
    }

    /// Remove the child at `index`, severing its connection.
    ///
    /// Returns the removed child's slot id.
    pub fn remove_input(&mut self, multi: SlotId, index: usize) -> Result<SlotId, GraphError> {
        let len = self.multi_input_slot(multi)?.len();
        let child = self
            .multi_input_slot(multi)?
            .child_at(index)
            .ok_or(GraphError::InputIndexOutOfRange { slot: multi, index, len })?;
        let child_slot = multi.declared().with_child(child);

        self.connections.remove(child_slot);
        self.multi_input_slot_mut(multi)?.remove_input(index);
        self.invalidate_owner(multi.instance);
        Ok(child_slot)
    }

    /// Move the child at `from` to position `to`.
    pub fn reorder_input(&mut self, multi: SlotId, from: usize, to: usize) -> Result<(), GraphError> {
        let slot = self.multi_input_slot_mut(multi)?;
        let len = slot.len();
        if !slot.reorder(from, to) {
            let index = if from >= len { from } else { to };
            return Err(GraphError::InputIndexOutOfRange { slot: multi, index, len });
        }
        self.invalidate_owner(multi.instance);
        Ok(())
    }

    /// The children of a multi-input in current order.
    pub fn collected_inputs(&self, multi: SlotId) -> Result<Vec<SlotId>, GraphError> {
        let slot = self.multi_input_slot(multi)?;
        Ok(slot
            .child_ids()
            .map(|child| multi.declared().with_child(child))
            .collect())
    }

    // ------------------------------------------------------------------------
    // Invalidation
    // ------------------------------------------------------------------------

    /// Mark a slot stale and push that downstream.
    ///
    /// For an output, the output and everything reading from it. For an
    /// input, the owning instance's outputs and everything downstream.
    pub fn invalidate(&mut self, slot: SlotId) -> Result<(), GraphError> {
        let is_multi_parent = match self.instance_slot(slot)? {
            InstanceSlot::Output(_) if slot.child.is_none() => {
                self.propagate_dirty([slot]);
                return Ok(());
            }
            InstanceSlot::Output(_) => return Err(GraphError::SlotNotFound(slot)),
            InstanceSlot::MultiInput(_) => slot.child.is_none(),
            InstanceSlot::Input(_) => false,
        };

        if is_multi_parent {
            self.multi_input_slot_mut(slot)?.invalidate();
            self.invalidate_owner(slot.instance);
        } else {
            self.input_slot(slot)?;
            self.invalidate_input(slot);
        }
        Ok(())
    }

    /// Whether reading `slot` would recompute anything.
    ///
    /// Connected inputs mirror their source; a multi-input is dirty if it or
    /// any of its children is.
    pub fn is_dirty(&self, slot: SlotId) -> Result<bool, GraphError> {
        match self.instance_slot(slot)? {
            InstanceSlot::Output(output) => Ok(output.is_dirty()),
            InstanceSlot::MultiInput(multi) if slot.child.is_none() => {
                if multi.dirty().is_dirty() {
                    return Ok(true);
                }
                for child in multi.child_ids() {
                    if self.is_dirty(slot.with_child(child))? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => match self.connections.source_of(slot) {
                Some(source) => self.is_dirty(source),
                None => Ok(self.input_slot(slot)?.dirty().is_dirty()),
            },
        }
    }

    /// Mark an input dirty and push staleness from its owner.
    fn invalidate_input(&mut self, target: SlotId) {
        if let Ok(input) = self.input_slot_mut(target) {
            input.invalidate();
        }
        self.invalidate_owner(target.instance);
    }

    fn invalidate_owner(&mut self, instance: InstanceId) {
        let outputs: Vec<SlotId> = match self.instances.get(&instance) {
            Some(inst) => inst.output_ids().collect(),
            None => return,
        };
        self.propagate_dirty(outputs);
    }

    /// Breadth-first dirty marking from a set of outputs.
    ///
    /// Returns the number of outputs marked.
    fn propagate_dirty(&mut self, seeds: impl IntoIterator<Item = SlotId>) -> usize {
        let mut queue: VecDeque<SlotId> = seeds.into_iter().collect();
        let mut visited = HashSet::new();
        let mut marked = 0;

        while let Some(output) = queue.pop_front() {
            if !visited.insert(output) {
                continue;
            }
            if let Some(slot) = self
                .instances
                .get_mut(&output.instance)
                .and_then(|inst| inst.output_mut(output.index))
            {
                slot.invalidate();
                marked += 1;
            }

            let targets: SmallVec<[SlotId; 4]> =
                SmallVec::from_slice(self.connections.targets_of(output));
            for target in targets {
                let Some(inst) = self.instances.get_mut(&target.instance) else {
                    continue;
                };
                if let Some(input) = inst.input_mut(target.index, target.child) {
                    input.invalidate();
                }
                queue.extend(inst.output_ids());
            }
        }
        marked
    }

    // ------------------------------------------------------------------------
    // Operator reload
    // ------------------------------------------------------------------------

    /// Swap in a new registry, rebinding every instance to its type's new
    /// definition.
    ///
    /// Instances whose type disappeared, or whose slot layout changed, become
    /// unresolved: they keep their cached outputs and skip compute until a
    /// later reload brings the type back. Those instances are reported as
    /// errors. Rebound instances are invalidated so the new code runs.
    pub fn reload_registry(&mut self, registry: Arc<OperatorRegistry>) -> Vec<GraphError> {
        let mut errors = Vec::new();
        let mut rebound = Vec::new();

        for instance in self.instances.values_mut() {
            let id = instance.id();
            match registry.get(instance.type_id().as_str()) {
                Some(definition) if definition.same_layout(instance.definition()) => {
                    instance.rebind(Arc::clone(definition));
                    rebound.push(id);
                }
                Some(_) => {
                    warn!(instance = %id, type_id = %instance.type_id(), "operator slot layout changed on reload");
                    instance.mark_unresolved();
                    errors.push(GraphError::IncompatibleRedefinition {
                        instance: id,
                        type_id: instance.type_id().clone(),
                    });
                }
                None => {
                    warn!(instance = %id, type_id = %instance.type_id(), "operator type missing after reload");
                    instance.mark_unresolved();
                    errors.push(GraphError::UnresolvedInstanceType {
                        instance: Some(id),
                        type_id: instance.type_id().clone(),
                    });
                }
            }
        }

        self.registry = registry;
        for id in rebound {
            self.invalidate_owner(id);
        }
        errors
    }

    // ------------------------------------------------------------------------
    // Slot lookup
    // ------------------------------------------------------------------------

    pub(crate) fn instance_slot(&self, slot: SlotId) -> Result<&InstanceSlot, GraphError> {
        self.instances
            .get(&slot.instance)
            .ok_or(GraphError::InstanceNotFound(slot.instance))?
            .slot(slot.index)
            .ok_or(GraphError::SlotNotFound(slot))
    }

    pub(crate) fn input_slot(&self, slot: SlotId) -> Result<&InputSlot, GraphError> {
        match self.instance_slot(slot)? {
            InstanceSlot::Output(_) => Err(GraphError::NotAnInput(slot)),
            InstanceSlot::MultiInput(_) if slot.child.is_none() => Err(GraphError::NotAnInput(slot)),
            other => other.input(slot.child).ok_or(GraphError::SlotNotFound(slot)),
        }
    }

    fn input_slot_mut(&mut self, slot: SlotId) -> Result<&mut InputSlot, GraphError> {
        self.input_slot(slot)?;
        self.instances
            .get_mut(&slot.instance)
            .and_then(|inst| inst.input_mut(slot.index, slot.child))
            .ok_or(GraphError::SlotNotFound(slot))
    }

    pub(crate) fn multi_input_slot(&self, slot: SlotId) -> Result<&MultiInputSlot, GraphError> {
        self.instance_slot(slot)?
            .as_multi_input()
            .ok_or(GraphError::NotAMultiInput(slot))
    }

    fn multi_input_slot_mut(&mut self, slot: SlotId) -> Result<&mut MultiInputSlot, GraphError> {
        self.multi_input_slot(slot)?;
        self.instances
            .get_mut(&slot.instance)
            .and_then(|inst| inst.multi_input_mut(slot.index))
            .ok_or(GraphError::NotAMultiInput(slot))
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("instances", &self.instances.len())
            .field("connections", &self.connections.len())
            .field("live_outputs", &self.live_outputs.len())
            .field("config", &self.config)
            .finish()
    }
}
