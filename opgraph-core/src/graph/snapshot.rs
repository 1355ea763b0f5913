//! Topology Snapshots
//!
//! A snapshot is the graph's editable state in plain data: which instances
//! exist, how many children each multi-input has, every local default and
//! every connection. Cached outputs are not part of it.
//!
//! Slots are addressed by name rather than index so a snapshot survives an
//! operator type adding slots between releases. Multi-input children are
//! addressed by position; child ids are runtime-only.
//!
//! Restoring replays the records through the ordinary editing calls, so a
//! snapshot that names an unknown type or a mistyped connection fails with
//! the same error an interactive edit would.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GraphError;
use crate::registry::{OperatorRegistry, OperatorTypeId};
use crate::slot::{InstanceSlot, SlotId, SlotIndex};
use crate::value::Value;

use super::{Graph, InstanceId};

/// A slot named by instance, declared slot name and optional child position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotPath {
    pub instance: InstanceId,
    pub slot: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<usize>,
}

impl SlotPath {
    pub fn new(instance: InstanceId, slot: impl Into<String>) -> Self {
        Self {
            instance,
            slot: slot.into(),
            child: None,
        }
    }

    pub fn child(mut self, position: usize) -> Self {
        self.child = Some(position);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: InstanceId,
    pub type_id: OperatorTypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiInputRecord {
    pub slot: SlotPath,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultRecord {
    pub slot: SlotPath,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub source: SlotPath,
    pub target: SlotPath,
}

/// The persistable shape of a graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub instances: Vec<InstanceRecord>,
    #[serde(default)]
    pub multi_inputs: Vec<MultiInputRecord>,
    #[serde(default)]
    pub defaults: Vec<DefaultRecord>,
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
}

impl Graph {
    /// Capture the current topology and local defaults.
    pub fn snapshot(&self) -> TopologySnapshot {
        let mut snapshot = TopologySnapshot::default();

        for instance in self.instances.values() {
            let id = instance.id();
            snapshot.instances.push(InstanceRecord {
                id,
                type_id: instance.type_id().clone(),
            });

            let indices = (0..instance.slot_count())
                .filter_map(|i| u16::try_from(i).ok())
                .map(SlotIndex);
            for index in indices {
                let (Some(name), Some(slot)) = (instance.slot_name(index), instance.slot(index)) else {
                    continue;
                };
                match slot {
                    InstanceSlot::Input(input) => snapshot.defaults.push(DefaultRecord {
                        slot: SlotPath::new(id, name),
                        value: input.local_default().clone(),
                    }),
                    InstanceSlot::MultiInput(multi) => {
                        snapshot.multi_inputs.push(MultiInputRecord {
                            slot: SlotPath::new(id, name),
                            len: multi.len(),
                        });
                        for (position, (_, child)) in multi.children().enumerate() {
                            snapshot.defaults.push(DefaultRecord {
                                slot: SlotPath::new(id, name).child(position),
                                value: child.local_default().clone(),
                            });
                        }
                    }
                    InstanceSlot::Output(_) => {}
                }
            }
        }

        for connection in self.connections.iter() {
            if let (Some(source), Some(target)) = (self.path_of(connection.source), self.path_of(connection.target)) {
                snapshot.connections.push(ConnectionRecord { source, target });
            }
        }

        snapshot
    }

    /// Replace this graph's topology with `snapshot`.
    ///
    /// The snapshot is replayed into a fresh graph sharing this graph's
    /// registry and configuration; only if every record applies is the
    /// current topology disposed and swapped out. On error the graph is left
    /// untouched.
    pub fn restore(&mut self, snapshot: &TopologySnapshot) -> Result<(), GraphError> {
        let mut restored = Graph {
            config: self.config.clone(),
            ..Graph::new(Arc::clone(&self.registry))
        };
        restored.replay(snapshot)?;

        let previous: Vec<InstanceId> = self.instances.keys().copied().collect();
        for id in previous {
            self.remove_instance(id)?;
        }
        *self = restored;

        debug!(
            instances = self.instances.len(),
            connections = self.connections.len(),
            "restored topology"
        );
        Ok(())
    }

    /// Build a graph from a snapshot with the default configuration.
    pub fn from_snapshot(
        registry: Arc<OperatorRegistry>,
        snapshot: &TopologySnapshot,
    ) -> Result<Graph, GraphError> {
        let mut graph = Graph::new(registry);
        graph.replay(snapshot)?;
        Ok(graph)
    }

    /// Resolve a path against the current topology.
    pub fn resolve_path(&self, path: &SlotPath) -> Result<SlotId, GraphError> {
        let slot = self.slot_id(path.instance, &path.slot)?;
        let Some(position) = path.child else {
            return Ok(slot);
        };

        let multi = self.multi_input_slot(slot)?;
        multi
            .child_at(position)
            .map(|child| slot.with_child(child))
            .ok_or(GraphError::InputIndexOutOfRange {
                slot,
                index: position,
                len: multi.len(),
            })
    }

    fn replay(&mut self, snapshot: &TopologySnapshot) -> Result<(), GraphError> {
        for record in &snapshot.instances {
            self.add_instance_with_id(record.id, record.type_id.as_str())?;
        }
        for record in &snapshot.multi_inputs {
            let multi = self.resolve_path(&record.slot)?;
            for _ in 0..record.len {
                self.add_input(multi)?;
            }
        }
        for record in &snapshot.defaults {
            let slot = self.resolve_path(&record.slot)?;
            self.set_local_default(slot, record.value.clone())?;
        }
        for record in &snapshot.connections {
            let source = self.resolve_path(&record.source)?;
            let target = self.resolve_path(&record.target)?;
            self.connect(source, target)?;
        }
        Ok(())
    }

    fn path_of(&self, slot: SlotId) -> Option<SlotPath> {
        let instance = self.instances.get(&slot.instance)?;
        let path = SlotPath::new(slot.instance, instance.slot_name(slot.index)?);
        match slot.child {
            None => Some(path),
            Some(child) => {
                let position = instance.multi_input(slot.index)?.position(child)?;
                Some(path.child(position))
            }
        }
    }
}
