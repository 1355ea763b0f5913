//! Pull Evaluation
//!
//! # Algorithm
//!
//! Reading an output slot:
//!
//! 1. If the slot is clean, return its cache.
//! 2. Otherwise push the slot onto the context's stack (failing on re-entry),
//!    run the operator, store the result and mark the slot clean.
//!
//! Reading an input slot returns the value of the connected output, or the
//! local default when unconnected.
//!
//! Live outputs (always-recompute) are invalidated once per pass, the first
//! time a context with a new pass id reaches the graph. Within a pass they
//! behave like any other output, so a clock read from ten places ticks once.
//!
//! # Faults
//!
//! An operator returning an error other than [`OperatorError::Upstream`] is
//! logged and the slot keeps its previous value, marked clean for the pass.
//! Structural errors (cycles, the depth limit) propagate to the caller.

use tracing::{trace, warn};

use crate::error::{GraphError, OperatorError};
use crate::slot::{InputRef, InstanceSlot, MultiInputRef, OutputRef, Slot, SlotId};
use crate::value::{SlotValue, Value};

use super::{EvaluationContext, Graph, InstanceId, PassId};

impl Graph {
    /// A fresh context using this graph's configured depth limit.
    pub fn context(&self, time: f64, frame: u64) -> EvaluationContext {
        EvaluationContext::new(time, frame).with_max_depth(self.config.max_recursion_depth)
    }

    /// Evaluate a slot within `ctx`.
    ///
    /// Output slots are recomputed if stale; input slots resolve to their
    /// source or local default.
    pub fn get_value(&mut self, ctx: &mut EvaluationContext, slot: SlotId) -> Result<Value, GraphError> {
        self.begin_pass(ctx.pass());
        self.pull(ctx, slot)
    }

    /// Typed [`Graph::get_value`].
    pub fn get<T: SlotValue>(&mut self, ctx: &mut EvaluationContext, slot: SlotId) -> Result<T, GraphError> {
        let value = self.get_value(ctx, slot)?;
        T::from_value(&value).ok_or(GraphError::ValueTypeMismatch {
            slot,
            expected: T::VALUE_TYPE,
            found: value.value_type(),
        })
    }

    /// Evaluate a typed output of an instance.
    pub fn output<T: SlotValue>(
        &mut self,
        ctx: &mut EvaluationContext,
        instance: InstanceId,
        output: OutputRef<T>,
    ) -> Result<T, GraphError> {
        self.get(ctx, output.of(instance))
    }

    fn begin_pass(&mut self, pass: PassId) {
        if self.last_pass == Some(pass) {
            return;
        }
        self.last_pass = Some(pass);

        if self.live_outputs.is_empty() {
            return;
        }
        let live: Vec<SlotId> = self.live_outputs.iter().copied().collect();
        let marked = self.propagate_dirty(live);
        trace!(pass = pass.raw(), marked, "invalidated live outputs");
    }

    pub(crate) fn pull(&mut self, ctx: &mut EvaluationContext, slot: SlotId) -> Result<Value, GraphError> {
        let is_output = match (self.instance_slot(slot)?, slot.child) {
            (InstanceSlot::Output(_), None) => true,
            (InstanceSlot::Output(_), Some(_)) => return Err(GraphError::SlotNotFound(slot)),
            (InstanceSlot::MultiInput(_), None) => return Err(GraphError::NotReadable(slot)),
            _ => false,
        };

        if is_output {
            self.pull_output(ctx, slot)
        } else {
            self.pull_input(ctx, slot)
        }
    }

    fn pull_input(&mut self, ctx: &mut EvaluationContext, slot: SlotId) -> Result<Value, GraphError> {
        let pass = ctx.pass();

        if let Some(source) = self.connections.source_of(slot) {
            let value = self.pull(ctx, source)?;
            self.input_slot_mut(slot)?.mark_clean(pass);
            return Ok(value);
        }

        let input = self.input_slot_mut(slot)?;
        input.mark_clean(pass);
        Ok(input.local_default().clone())
    }

    fn pull_output(&mut self, ctx: &mut EvaluationContext, slot: SlotId) -> Result<Value, GraphError> {
        let instance = self
            .instances
            .get(&slot.instance)
            .ok_or(GraphError::InstanceNotFound(slot.instance))?;
        let output = instance
            .output(slot.index)
            .ok_or(GraphError::NotAnOutput(slot))?;

        if output.is_clean() {
            ctx.record_cache_hit();
            if self.config.log_cache_hits {
                trace!(%slot, "cache hit");
            }
            return Ok(output.value().clone());
        }

        let expected = output.value_type();
        let type_id = instance.type_id().clone();
        let operator = instance.operator().cloned();

        let result = match operator {
            Some(operator) => {
                let mut frame = ctx.enter(slot)?;
                trace!(%slot, %type_id, depth = frame.depth(), "compute");
                frame.record_compute();
                let mut scope = EvalScope {
                    graph: self,
                    ctx: &mut *frame,
                    instance: slot.instance,
                };
                operator.compute(slot.index, &mut scope)
            }
            None => Err(OperatorError::failed(format!(
                "operator type `{type_id}` is not registered"
            ))),
        };

        let pass = ctx.pass();
        let fault = match result {
            Ok(value) if value.value_type() == expected => {
                self.output_slot_mut(slot)?.store(value.clone(), pass);
                return Ok(value);
            }
            Ok(value) => OperatorError::failed(format!(
                "produced {} for a {expected} output",
                value.value_type()
            )),
            Err(OperatorError::Upstream(err)) => return Err(*err),
            Err(err) => err,
        };

        warn!(%slot, %type_id, error = %fault, "compute failed, keeping previous value");
        ctx.record_fault();
        let output = self.output_slot_mut(slot)?;
        output.retain(pass);
        Ok(output.value().clone())
    }

    fn output_slot_mut(&mut self, slot: SlotId) -> Result<&mut Slot, GraphError> {
        self.instances
            .get_mut(&slot.instance)
            .ok_or(GraphError::InstanceNotFound(slot.instance))?
            .output_mut(slot.index)
            .ok_or(GraphError::NotAnOutput(slot))
    }
}

/// What an operator sees while computing: read access to its own inputs and
/// the evaluation context.
///
/// Reads go through the graph's pull machinery, so upstream outputs are
/// brought up to date on demand. There is no way to write to the graph from
/// here.
pub struct EvalScope<'a> {
    graph: &'a mut Graph,
    ctx: &'a mut EvaluationContext,
    instance: InstanceId,
}

impl EvalScope<'_> {
    /// The instance being computed.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn context(&self) -> &EvaluationContext {
        &*self.ctx
    }

    /// Time in seconds of the current pass.
    pub fn time(&self) -> f64 {
        self.ctx.time()
    }

    pub fn frame(&self) -> u64 {
        self.ctx.frame()
    }

    /// Read one of this instance's inputs.
    pub fn input<T: SlotValue>(&mut self, input: InputRef<T>) -> Result<T, OperatorError> {
        self.read(input.of(self.instance))
    }

    /// Read an input (or multi-input child) of this instance by id.
    pub fn read<T: SlotValue>(&mut self, slot: SlotId) -> Result<T, OperatorError> {
        if slot.instance != self.instance || self.graph.input_slot(slot).is_err() {
            return Err(OperatorError::failed(format!(
                "{slot} is not an input of {}",
                self.instance
            )));
        }

        let value = self.graph.pull(self.ctx, slot)?;
        T::from_value(&value).ok_or_else(|| OperatorError::InvalidInput {
            input: self.slot_name(slot),
            reason: format!("expected {}, got {}", T::VALUE_TYPE, value.value_type()),
        })
    }

    /// The children of one of this instance's multi-inputs, in current order.
    ///
    /// These are live slot ids; read each with [`EvalScope::read`].
    pub fn collected_inputs<T: SlotValue>(&mut self, multi: MultiInputRef<T>) -> Result<Vec<SlotId>, OperatorError> {
        let slot = multi.of(self.instance);
        let pass = self.ctx.pass();
        let multi_slot = self
            .graph
            .multi_input_slot_mut(slot)
            .map_err(|err| OperatorError::failed(err.to_string()))?;
        multi_slot.mark_clean(pass);
        Ok(multi_slot
            .child_ids()
            .map(|child| slot.with_child(child))
            .collect())
    }

    /// Read every child of a multi-input, in order.
    pub fn multi_input<T: SlotValue>(&mut self, multi: MultiInputRef<T>) -> Result<Vec<T>, OperatorError> {
        let children = self.collected_inputs(multi)?;
        children.into_iter().map(|child| self.read(child)).collect()
    }

    fn slot_name(&self, slot: SlotId) -> &'static str {
        self.graph
            .instance(slot.instance)
            .and_then(|instance| instance.slot_name(slot.index))
            .unwrap_or("?")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::GraphConfig;
    use crate::registry::{Operator, OperatorDefinition, OperatorRegistry, SlotDeclaration};
    use crate::slot::SlotIndex;
    use crate::value::ValueType;

    struct Half;

    impl Half {
        const IN: InputRef<f32> = InputRef::new(0);
        const OUT: OutputRef<f32> = OutputRef::new(1);
    }

    impl Operator for Half {
        fn compute(&self, _output: SlotIndex, scope: &mut EvalScope<'_>) -> Result<Value, OperatorError> {
            let value = scope.input(Self::IN)?;
            if value < 0.0 {
                return Err(OperatorError::InvalidInput {
                    input: "In",
                    reason: "negative".into(),
                });
            }
            Ok(Value::Float(value / 2.0))
        }
    }

    fn graph() -> Graph {
        let mut registry = OperatorRegistry::new();
        registry
            .register(
                OperatorDefinition::new("test.half", "Half", Half)
                    .with_slot(SlotDeclaration::input("In", 4.0_f32))
                    .with_slot(SlotDeclaration::output("Out", ValueType::Float)),
            )
            .unwrap();
        Graph::new(Arc::new(registry))
    }

    #[test]
    fn clean_output_is_served_from_cache() {
        let mut graph = graph();
        let half = graph.add_instance("test.half").unwrap();

        let mut ctx = graph.context(0.0, 0);
        assert_eq!(graph.output(&mut ctx, half, Half::OUT).unwrap(), 2.0);
        assert_eq!(graph.output(&mut ctx, half, Half::OUT).unwrap(), 2.0);

        let mut next = graph.context(0.0, 1);
        assert_eq!(graph.output(&mut next, half, Half::OUT).unwrap(), 2.0);

        assert_eq!(ctx.stats().computes, 1);
        assert_eq!(ctx.stats().cache_hits, 1);
        assert_eq!(next.stats().computes, 0);
        let out = graph.instance(half).and_then(|i| i.output(SlotIndex(1))).unwrap();
        assert_eq!(out.compute_count(), 1);
    }

    #[test]
    fn reading_an_input_returns_its_default() {
        let mut graph = graph();
        let half = graph.add_instance("test.half").unwrap();

        let mut ctx = graph.context(0.0, 0);
        assert_eq!(graph.get::<f32>(&mut ctx, Half::IN.of(half)).unwrap(), 4.0);
    }

    #[test]
    fn typed_read_checks_value_type() {
        let mut graph = graph();
        let half = graph.add_instance("test.half").unwrap();

        let mut ctx = graph.context(0.0, 0);
        let err = graph.get::<i32>(&mut ctx, Half::OUT.of(half)).unwrap_err();
        assert!(matches!(
            err,
            GraphError::ValueTypeMismatch {
                expected: ValueType::Int,
                found: ValueType::Float,
                ..
            }
        ));
    }

    #[test]
    fn failed_compute_keeps_previous_value() {
        let mut graph = graph();
        let half = graph.add_instance("test.half").unwrap();

        let mut ctx = graph.context(0.0, 0);
        assert_eq!(graph.output(&mut ctx, half, Half::OUT).unwrap(), 2.0);

        graph.set_local_default(Half::IN.of(half), -1.0_f32).unwrap();
        let mut ctx = graph.context(0.0, 1);
        assert_eq!(graph.output(&mut ctx, half, Half::OUT).unwrap(), 2.0);
        assert_eq!(ctx.stats().faults, 1);

        // The fault is not retried until something changes.
        assert!(!graph.is_dirty(Half::OUT.of(half)).unwrap());
    }

    #[test]
    fn depth_limit_aborts_the_read() {
        let mut graph = graph();
        let config = GraphConfig {
            max_recursion_depth: 2,
            ..GraphConfig::default()
        };
        graph = Graph::with_config(Arc::clone(graph.registry()), config).unwrap();

        let a = graph.add_instance("test.half").unwrap();
        let b = graph.add_instance("test.half").unwrap();
        let c = graph.add_instance("test.half").unwrap();
        graph.connect(Half::OUT.of(a), Half::IN.of(b)).unwrap();
        graph.connect(Half::OUT.of(b), Half::IN.of(c)).unwrap();

        let mut ctx = graph.context(0.0, 0);
        let err = graph.output(&mut ctx, c, Half::OUT).unwrap_err();
        assert!(matches!(err, GraphError::RecursionLimit { depth: 2, .. }));
        assert_eq!(ctx.depth(), 0);

        // The stale chain is still readable from the bottom up.
        let mut ctx = graph.context(0.0, 1);
        assert_eq!(graph.output(&mut ctx, b, Half::OUT).unwrap(), 1.0);
    }

    #[test]
    fn unresolved_instance_skips_compute() {
        let mut graph = graph();
        let half = graph.add_instance("test.half").unwrap();

        let mut ctx = graph.context(0.0, 0);
        graph.output(&mut ctx, half, Half::OUT).unwrap();

        let errors = graph.reload_registry(Arc::new(OperatorRegistry::new()));
        assert_eq!(errors.len(), 1);

        graph.invalidate(Half::OUT.of(half)).unwrap();
        let mut ctx = graph.context(0.0, 1);
        assert_eq!(graph.output(&mut ctx, half, Half::OUT).unwrap(), 2.0);
        assert_eq!(ctx.stats().computes, 0);
        assert_eq!(ctx.stats().faults, 1);
    }

    #[test]
    fn multi_input_parent_has_no_value() {
        let mut registry = OperatorRegistry::new();
        registry
            .register(
                OperatorDefinition::new("test.half", "Half", Half)
                    .with_slot(SlotDeclaration::input("In", 4.0_f32))
                    .with_slot(SlotDeclaration::output("Out", ValueType::Float))
                    .with_slot(SlotDeclaration::multi_input("Extra", 0.0_f32)),
            )
            .unwrap();
        let mut graph = Graph::new(Arc::new(registry));
        let half = graph.add_instance("test.half").unwrap();
        let extra = graph.slot_id(half, "Extra").unwrap();

        let mut ctx = graph.context(0.0, 0);
        assert_eq!(graph.get_value(&mut ctx, extra), Err(GraphError::NotReadable(extra)));

        let (_, child) = graph.add_input(extra).unwrap();
        assert_eq!(graph.get::<f32>(&mut ctx, child).unwrap(), 0.0);
    }
}
