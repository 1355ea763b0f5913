//! Operator Instances
//!
//! An instance is one node of the graph: an operator type plus the slots that
//! type declares.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::registry::{Operator, OperatorDefinition, OperatorTypeId, SlotKind};
use crate::slot::{ChildId, InputSlot, InstanceSlot, MultiInputSlot, Slot, SlotId, SlotIndex};

/// Per-graph identifier of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for InstanceId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Slots initialized, not yet part of a graph.
    Constructed,

    /// Part of a graph; may be connected and evaluated.
    Active,

    /// Removed from its graph. All connections have been severed.
    Disposed,
}

/// A node in the operator graph.
#[derive(Debug, Clone)]
pub struct Instance {
    id: InstanceId,
    type_id: OperatorTypeId,
    state: InstanceState,
    definition: Arc<OperatorDefinition>,

    /// Cleared when the type disappears from the registry on reload.
    resolved: bool,

    slots: Vec<InstanceSlot>,
}

impl Instance {
    /// Build the slots declared by `definition`.
    pub(crate) fn construct(id: InstanceId, definition: Arc<OperatorDefinition>) -> Self {
        let slots = definition
            .slots()
            .iter()
            .map(|decl| match decl.kind {
                SlotKind::Output { always_recompute } => {
                    InstanceSlot::Output(Slot::seeded(decl.default.clone(), always_recompute))
                }
                SlotKind::Input => InstanceSlot::Input(InputSlot::new(decl.default.clone())),
                SlotKind::MultiInput => {
                    InstanceSlot::MultiInput(MultiInputSlot::new(decl.default.clone()))
                }
            })
            .collect();

        Self {
            id,
            type_id: definition.type_id().clone(),
            state: InstanceState::Constructed,
            definition,
            resolved: true,
            slots,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn type_id(&self) -> &OperatorTypeId {
        &self.type_id
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    pub fn definition(&self) -> &Arc<OperatorDefinition> {
        &self.definition
    }

    /// False once the operator type was dropped from the registry.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// The operator computing this instance's outputs, if still registered.
    pub fn operator(&self) -> Option<&Arc<dyn Operator>> {
        self.resolved.then(|| self.definition.operator())
    }

    pub(crate) fn activate(&mut self) {
        debug_assert_eq!(self.state, InstanceState::Constructed);
        self.state = InstanceState::Active;
    }

    pub(crate) fn dispose(&mut self) {
        self.state = InstanceState::Disposed;
    }

    pub(crate) fn rebind(&mut self, definition: Arc<OperatorDefinition>) {
        self.definition = definition;
        self.resolved = true;
    }

    pub(crate) fn mark_unresolved(&mut self) {
        self.resolved = false;
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: SlotIndex) -> Option<&InstanceSlot> {
        self.slots.get(index.as_usize())
    }

    pub(crate) fn slot_mut(&mut self, index: SlotIndex) -> Option<&mut InstanceSlot> {
        self.slots.get_mut(index.as_usize())
    }

    /// Slot index for a declared name.
    pub fn slot_index(&self, name: &str) -> Option<SlotIndex> {
        self.definition.slot_index(name)
    }

    pub fn slot_name(&self, index: SlotIndex) -> Option<&'static str> {
        self.definition.slot(index).map(|decl| decl.name)
    }

    /// Graph-wide id of a declared slot.
    pub fn slot_id(&self, index: SlotIndex) -> SlotId {
        SlotId::new(self.id, index)
    }

    fn indexed(&self) -> impl Iterator<Item = (SlotIndex, &InstanceSlot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| u16::try_from(i).ok().map(|i| (SlotIndex(i), slot)))
    }

    /// Ids of all output slots.
    pub fn output_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.indexed()
            .filter(|(_, slot)| slot.as_output().is_some())
            .map(|(index, _)| self.slot_id(index))
    }

    /// Ids of every input, with multi-input children expanded in order.
    pub fn input_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.indexed().flat_map(|(index, slot)| {
            let id = self.slot_id(index);
            let ids: Vec<SlotId> = match slot {
                InstanceSlot::Input(_) => vec![id],
                InstanceSlot::MultiInput(multi) => {
                    multi.child_ids().map(|child| id.with_child(child)).collect()
                }
                InstanceSlot::Output(_) => Vec::new(),
            };
            ids
        })
    }

    /// Ids of outputs flagged always-recompute.
    pub fn live_output_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.indexed()
            .filter(|(_, slot)| slot.as_output().is_some_and(Slot::always_recompute))
            .map(|(index, _)| self.slot_id(index))
    }

    pub fn output(&self, index: SlotIndex) -> Option<&Slot> {
        self.slot(index).and_then(InstanceSlot::as_output)
    }

    pub(crate) fn output_mut(&mut self, index: SlotIndex) -> Option<&mut Slot> {
        self.slot_mut(index).and_then(InstanceSlot::as_output_mut)
    }

    pub fn input(&self, index: SlotIndex, child: Option<ChildId>) -> Option<&InputSlot> {
        self.slot(index).and_then(|slot| slot.input(child))
    }

    pub(crate) fn input_mut(&mut self, index: SlotIndex, child: Option<ChildId>) -> Option<&mut InputSlot> {
        self.slot_mut(index).and_then(|slot| slot.input_mut(child))
    }

    pub fn multi_input(&self, index: SlotIndex) -> Option<&MultiInputSlot> {
        self.slot(index).and_then(InstanceSlot::as_multi_input)
    }

    pub(crate) fn multi_input_mut(&mut self, index: SlotIndex) -> Option<&mut MultiInputSlot> {
        self.slot_mut(index).and_then(InstanceSlot::as_multi_input_mut)
    }
}
