//! Connection Manager
//!
//! Owns the directed edges from output slots to input slots.
//!
//! # Invariants
//!
//! - An input has at most one incoming connection.
//! - An output may fan out to any number of inputs.
//! - Source and target carry the same [`ValueType`].
//! - The instance graph induced by the edges is acyclic. Cycles are rejected
//!   eagerly when a connection is made, by checking whether the source's
//!   instance is reachable downstream of the target's instance.
//!
//! Both directions are indexed: `incoming` answers "where does this input read
//! from" during evaluation, `outgoing` answers "who must be invalidated" when
//! an output goes stale.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::GraphError;
use crate::slot::{InstanceSlot, SlotId};
use crate::value::ValueType;

use super::{Graph, InstanceId};

/// A directed edge from an output slot to an input slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    pub source: SlotId,
    pub target: SlotId,
}

/// Edge storage for a graph.
#[derive(Debug, Clone, Default)]
pub struct ConnectionManager {
    /// target -> source, in connection order.
    incoming: IndexMap<SlotId, SlotId>,

    /// source -> targets.
    outgoing: HashMap<SlotId, SmallVec<[SlotId; 4]>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The output feeding `target`, if connected.
    pub fn source_of(&self, target: SlotId) -> Option<SlotId> {
        self.incoming.get(&target).copied()
    }

    /// The inputs fed by `source`.
    pub fn targets_of(&self, source: SlotId) -> &[SlotId] {
        self.outgoing.get(&source).map_or(&[], |targets| targets.as_slice())
    }

    pub fn is_connected(&self, target: SlotId) -> bool {
        self.incoming.contains_key(&target)
    }

    /// All edges in the order they were made.
    pub fn iter(&self) -> impl Iterator<Item = Connection> + '_ {
        self.incoming
            .iter()
            .map(|(target, source)| Connection {
                source: *source,
                target: *target,
            })
    }

    pub fn len(&self) -> usize {
        self.incoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty()
    }

    /// Add an edge, replacing any existing edge into the same target.
    pub(crate) fn insert(&mut self, connection: Connection) -> Option<Connection> {
        let replaced = self.remove(connection.target);
        self.incoming.insert(connection.target, connection.source);
        self.outgoing
            .entry(connection.source)
            .or_default()
            .push(connection.target);
        replaced
    }

    /// Remove the edge into `target`.
    pub(crate) fn remove(&mut self, target: SlotId) -> Option<Connection> {
        let source = self.incoming.shift_remove(&target)?;
        if let Some(targets) = self.outgoing.get_mut(&source) {
            targets.retain(|t| *t != target);
            if targets.is_empty() {
                self.outgoing.remove(&source);
            }
        }
        Some(Connection { source, target })
    }

    /// Edges touching `instance`, in connection order.
    pub fn edges_of(&self, instance: InstanceId) -> Vec<Connection> {
        self.iter()
            .filter(|c| c.source.instance == instance || c.target.instance == instance)
            .collect()
    }
}

impl Graph {
    /// Connect an output to an input.
    ///
    /// The target may be a plain input or a child of a multi-input. An
    /// existing connection into the target is replaced. Fails without touching
    /// the graph on a type mismatch or if the edge would close a cycle.
    pub fn connect(&mut self, source: SlotId, target: SlotId) -> Result<Connection, GraphError> {
        let source_type = self.output_type(source)?;
        let target_type = self.input_slot(target)?.value_type();

        self.check_edge(source, source_type, target, target_type)?;

        let connection = Connection { source, target };
        if let Some(old) = self.connections.insert(connection) {
            debug!(source = %old.source, target = %old.target, "replaced connection");
        }
        debug!(%source, %target, "connected");

        self.invalidate_input(target);
        Ok(connection)
    }

    /// Append a new child to a multi-input and connect `source` to it.
    ///
    /// Returns the new child's slot id. Nothing is added if the connection
    /// would be rejected.
    pub fn connect_multi(&mut self, source: SlotId, multi: SlotId) -> Result<SlotId, GraphError> {
        let source_type = self.output_type(source)?;
        let target_type = self.multi_input_slot(multi)?.value_type();
        self.check_edge(source, source_type, multi, target_type)?;

        let (_, child) = self.add_input(multi)?;
        self.connect(source, child)?;
        Ok(child)
    }

    /// Remove the connection into `target`.
    ///
    /// The input falls back to its local default. Returns the removed edge,
    /// or `None` if the input was not connected.
    pub fn disconnect(&mut self, target: SlotId) -> Result<Option<Connection>, GraphError> {
        self.input_slot(target)?;

        let removed = self.connections.remove(target);
        if let Some(connection) = removed {
            debug!(source = %connection.source, %target, "disconnected");
            self.invalidate_input(target);
        }
        Ok(removed)
    }

    /// The connection manager, for enumerating edges.
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Whether `to` can be reached by following edges downstream from `from`.
    pub fn reaches(&self, from: InstanceId, to: InstanceId) -> bool {
        let mut stack = vec![from];
        let mut visited = HashSet::new();

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            let Some(instance) = self.instances.get(&current) else {
                continue;
            };
            for output in instance.output_ids() {
                stack.extend(
                    self.connections
                        .targets_of(output)
                        .iter()
                        .map(|target| target.instance),
                );
            }
        }
        false
    }

    fn check_edge(
        &self,
        source: SlotId,
        source_type: ValueType,
        target: SlotId,
        target_type: ValueType,
    ) -> Result<(), GraphError> {
        if source_type != target_type {
            return Err(GraphError::TypeMismatch {
                from: source,
                to: target,
                expected: target_type,
                found: source_type,
            });
        }
        if self.reaches(target.instance, source.instance) {
            return Err(GraphError::CycleDetected {
                path: vec![source, target],
            });
        }
        Ok(())
    }

    fn output_type(&self, slot: SlotId) -> Result<ValueType, GraphError> {
        if slot.child.is_some() {
            return Err(GraphError::NotAnOutput(slot));
        }
        match self.instance_slot(slot)? {
            InstanceSlot::Output(output) => Ok(output.value_type()),
            _ => Err(GraphError::NotAnOutput(slot)),
        }
    }
}
