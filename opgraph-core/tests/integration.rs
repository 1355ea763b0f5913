//! Integration Tests for Graph Evaluation
//!
//! These tests drive whole graphs through editing and evaluation and check
//! that caching, invalidation and topology rules hold together.

use std::sync::{Arc, Mutex};

use opgraph_core::config::DEFAULT_MAX_RECURSION_DEPTH;
use opgraph_core::graph::{EvalScope, Graph, InstanceId, TopologySnapshot};
use opgraph_core::operators::{self, Add, CollectFloats, CountList, FloatValue, Multiply, Sum, Time};
use opgraph_core::registry::{Operator, OperatorDefinition, OperatorRegistry, OperatorTypeId, SlotDeclaration};
use opgraph_core::slot::{InputRef, OutputRef, SlotId, SlotIndex};
use opgraph_core::{GraphConfig, GraphError, OperatorError, Value, ValueType};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Adds its two inputs and records which instance computed.
#[derive(Default)]
struct Recorder {
    log: Mutex<Vec<InstanceId>>,
    disposed: Mutex<Vec<InstanceId>>,
}

impl Recorder {
    const TYPE_ID: &'static str = "test.recorder";
    const A: InputRef<f32> = InputRef::new(0);
    const B: InputRef<f32> = InputRef::new(1);
    const OUT: OutputRef<f32> = OutputRef::new(2);

    fn definition(recorder: &Arc<Recorder>) -> OperatorDefinition {
        OperatorDefinition::from_shared(OperatorTypeId::from_static(Self::TYPE_ID), "Recorder", recorder.clone())
            .with_slot(SlotDeclaration::input("A", 0.0_f32))
            .with_slot(SlotDeclaration::input("B", 0.0_f32))
            .with_slot(SlotDeclaration::output("Out", ValueType::Float))
    }

    fn computed(&self) -> Vec<InstanceId> {
        self.log.lock().unwrap().clone()
    }

    fn count(&self, instance: InstanceId) -> usize {
        self.computed().iter().filter(|id| **id == instance).count()
    }

    fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

impl Operator for Recorder {
    fn compute(&self, _output: SlotIndex, scope: &mut EvalScope<'_>) -> Result<Value, OperatorError> {
        self.log.lock().unwrap().push(scope.instance());
        let a = scope.input(Self::A)?;
        let b = scope.input(Self::B)?;
        if a < 0.0 {
            return Err(OperatorError::failed("negative input"));
        }
        Ok(Value::Float(a + b))
    }

    fn dispose(&self, instance: InstanceId) {
        self.disposed.lock().unwrap().push(instance);
    }
}

fn setup() -> (Graph, Arc<Recorder>) {
    init_tracing();
    let recorder = Arc::new(Recorder::default());
    let mut registry = operators::builtin_registry().unwrap();
    registry.register(Recorder::definition(&recorder)).unwrap();
    (Graph::new(Arc::new(registry)), recorder)
}

fn constant(graph: &mut Graph, value: f32) -> InstanceId {
    let id = graph.add_instance(FloatValue::TYPE_ID).unwrap();
    graph.set_local_default(FloatValue::VALUE.of(id), value).unwrap();
    id
}

fn sum_compute_count(graph: &Graph, sum: InstanceId) -> u64 {
    graph
        .instance(sum)
        .and_then(|instance| instance.output(Sum::OUT.index()))
        .map(|slot| slot.compute_count())
        .unwrap()
}

/// Test that reading an output twice in a pass computes it once.
#[test]
fn repeated_reads_compute_once() {
    let (mut graph, recorder) = setup();
    let node = graph.add_instance(Recorder::TYPE_ID).unwrap();
    graph.set_local_default(Recorder::A.of(node), 1.5_f32).unwrap();

    let mut ctx = graph.context(0.0, 0);
    let first = graph.get_value(&mut ctx, Recorder::OUT.of(node)).unwrap();
    let second = graph.get_value(&mut ctx, Recorder::OUT.of(node)).unwrap();

    assert_eq!(first, second);
    assert_eq!(recorder.count(node), 1);

    // A new pass with nothing invalidated still hits the cache.
    let mut ctx = graph.context(0.0, 1);
    graph.get_value(&mut ctx, Recorder::OUT.of(node)).unwrap();
    assert_eq!(recorder.count(node), 1);
}

/// Test that a shared upstream in a diamond computes once per pass.
#[test]
fn diamond_computes_shared_upstream_once() {
    let (mut graph, recorder) = setup();
    let a = graph.add_instance(Recorder::TYPE_ID).unwrap();
    let b = graph.add_instance(Recorder::TYPE_ID).unwrap();
    let c = graph.add_instance(Recorder::TYPE_ID).unwrap();
    let d = graph.add_instance(Recorder::TYPE_ID).unwrap();

    graph.set_local_default(Recorder::A.of(a), 1.0_f32).unwrap();
    graph.connect(Recorder::OUT.of(a), Recorder::A.of(b)).unwrap();
    graph.connect(Recorder::OUT.of(a), Recorder::A.of(c)).unwrap();
    graph.connect(Recorder::OUT.of(b), Recorder::A.of(d)).unwrap();
    graph.connect(Recorder::OUT.of(c), Recorder::B.of(d)).unwrap();

    let mut ctx = graph.context(0.0, 0);
    assert_eq!(graph.output(&mut ctx, d, Recorder::OUT).unwrap(), 2.0);

    assert_eq!(recorder.count(a), 1);
    assert_eq!(recorder.count(b), 1);
    assert_eq!(recorder.count(c), 1);
    assert_eq!(recorder.count(d), 1);
    assert_eq!(ctx.stats().computes, 4);
    assert_eq!(ctx.stats().cache_hits, 1);
}

/// Test that invalidation marks dependents dirty and leaves the rest clean.
#[test]
fn invalidation_reaches_downstream_only() {
    let (mut graph, recorder) = setup();
    let root = graph.add_instance(Recorder::TYPE_ID).unwrap();
    let mid = graph.add_instance(Recorder::TYPE_ID).unwrap();
    let leaf = graph.add_instance(Recorder::TYPE_ID).unwrap();
    let other = graph.add_instance(Recorder::TYPE_ID).unwrap();
    graph.connect(Recorder::OUT.of(root), Recorder::A.of(mid)).unwrap();
    graph.connect(Recorder::OUT.of(mid), Recorder::A.of(leaf)).unwrap();

    let mut ctx = graph.context(0.0, 0);
    graph.output(&mut ctx, leaf, Recorder::OUT).unwrap();
    graph.output(&mut ctx, other, Recorder::OUT).unwrap();
    recorder.clear();

    graph.invalidate(Recorder::OUT.of(mid)).unwrap();
    assert!(graph.is_dirty(Recorder::OUT.of(leaf)).unwrap());
    assert!(!graph.is_dirty(Recorder::OUT.of(root)).unwrap());
    assert!(!graph.is_dirty(Recorder::OUT.of(other)).unwrap());

    let mut ctx = graph.context(0.0, 1);
    graph.output(&mut ctx, leaf, Recorder::OUT).unwrap();
    graph.output(&mut ctx, other, Recorder::OUT).unwrap();
    assert_eq!(recorder.computed(), vec![leaf, mid]);
}

/// Test that editing a local default recomputes downstream outputs.
#[test]
fn parameter_edit_invalidates_dependents() {
    let (mut graph, recorder) = setup();
    let root = graph.add_instance(Recorder::TYPE_ID).unwrap();
    let leaf = graph.add_instance(Recorder::TYPE_ID).unwrap();
    graph.connect(Recorder::OUT.of(root), Recorder::B.of(leaf)).unwrap();

    let mut ctx = graph.context(0.0, 0);
    assert_eq!(graph.output(&mut ctx, leaf, Recorder::OUT).unwrap(), 0.0);

    graph.set_local_default(Recorder::A.of(root), 4.0_f32).unwrap();
    let mut ctx = graph.context(0.0, 1);
    assert_eq!(graph.output(&mut ctx, leaf, Recorder::OUT).unwrap(), 4.0);
    assert_eq!(recorder.count(leaf), 2);
}

/// Test that connecting slots of different value types fails.
#[test]
fn mismatched_types_are_rejected() {
    let (mut graph, _) = setup();
    let time = graph.add_instance(Time::TYPE_ID).unwrap();
    let add = graph.add_instance(Add::TYPE_ID).unwrap();

    let err = graph.connect(Time::FRAME.of(time), Add::A.of(add)).unwrap_err();
    assert_eq!(
        err,
        GraphError::TypeMismatch {
            from: Time::FRAME.of(time),
            to: Add::A.of(add),
            expected: ValueType::Float,
            found: ValueType::Int,
        }
    );
    assert!(graph.connections().is_empty());
}

/// Test that edges closing a cycle are refused at connect time.
#[test]
fn cycles_are_rejected_at_connect() {
    let (mut graph, _) = setup();
    let a = graph.add_instance(Recorder::TYPE_ID).unwrap();
    let b = graph.add_instance(Recorder::TYPE_ID).unwrap();

    graph.connect(Recorder::OUT.of(a), Recorder::A.of(b)).unwrap();
    let err = graph.connect(Recorder::OUT.of(b), Recorder::A.of(a)).unwrap_err();
    assert!(matches!(err, GraphError::CycleDetected { .. }));

    let err = graph.connect(Recorder::OUT.of(a), Recorder::B.of(a)).unwrap_err();
    assert!(matches!(err, GraphError::CycleDetected { .. }));

    assert_eq!(graph.connections().len(), 1);
    let mut ctx = graph.context(0.0, 0);
    assert_eq!(graph.output(&mut ctx, b, Recorder::OUT).unwrap(), 0.0);
}

/// Test that multi-input children keep their order through add, remove and reorder.
#[test]
fn multi_input_keeps_order_across_edits() {
    let (mut graph, _) = setup();
    let sum = graph.add_instance(Sum::TYPE_ID).unwrap();
    let terms = Sum::TERMS.of(sum);

    let (_, x) = graph.add_input(terms).unwrap();
    let (_, y) = graph.add_input(terms).unwrap();
    let removed = graph.remove_input(terms, 0).unwrap();
    let (index, z) = graph.add_input(terms).unwrap();

    assert_eq!(removed, x);
    assert_eq!(index, 1);
    assert_eq!(graph.collected_inputs(terms).unwrap(), vec![y, z]);

    graph.reorder_input(terms, 1, 0).unwrap();
    assert_eq!(graph.collected_inputs(terms).unwrap(), vec![z, y]);

    let err = graph.remove_input(terms, 5).unwrap_err();
    assert!(matches!(err, GraphError::InputIndexOutOfRange { index: 5, len: 2, .. }));
}

/// Test that a disconnected input falls back to its local default.
#[test]
fn disconnect_restores_default() {
    let (mut graph, _) = setup();
    let five = constant(&mut graph, 5.0);
    let add = graph.add_instance(Add::TYPE_ID).unwrap();
    graph.connect(FloatValue::OUT.of(five), Add::A.of(add)).unwrap();

    let mut ctx = graph.context(0.0, 0);
    assert_eq!(graph.output(&mut ctx, add, Add::OUT).unwrap(), 5.0);

    let removed = graph.disconnect(Add::A.of(add)).unwrap();
    assert_eq!(removed.map(|c| c.source), Some(FloatValue::OUT.of(five)));

    let mut ctx = graph.context(0.0, 1);
    assert_eq!(graph.output(&mut ctx, add, Add::OUT).unwrap(), 0.0);
    assert_eq!(graph.disconnect(Add::A.of(add)).unwrap(), None);
}

/// Test that a sum tracks new connections and upstream edits.
#[test]
fn sum_follows_edits() {
    let (mut graph, _) = setup();
    let a = constant(&mut graph, 2.0);
    let sum = graph.add_instance(Sum::TYPE_ID).unwrap();
    let terms = Sum::TERMS.of(sum);
    let (_, b1) = graph.add_input(terms).unwrap();
    let (_, b2) = graph.add_input(terms).unwrap();
    graph.connect(FloatValue::OUT.of(a), b1).unwrap();

    let mut ctx = graph.context(0.0, 0);
    assert_eq!(graph.output(&mut ctx, sum, Sum::OUT).unwrap(), 2.0);
    let before = sum_compute_count(&graph, sum);

    let c = constant(&mut graph, 3.0);
    graph.connect(FloatValue::OUT.of(c), b2).unwrap();
    let mut ctx = graph.context(0.0, 1);
    assert_eq!(graph.output(&mut ctx, sum, Sum::OUT).unwrap(), 5.0);
    assert_eq!(sum_compute_count(&graph, sum), before + 1);

    graph.set_local_default(FloatValue::VALUE.of(a), 10.0_f32).unwrap();
    let mut ctx = graph.context(0.0, 2);
    assert_eq!(graph.output(&mut ctx, sum, Sum::OUT).unwrap(), 13.0);
}

/// Test that a failing operator keeps its last value without breaking the pass.
#[test]
fn failing_compute_is_contained() {
    let (mut graph, recorder) = setup();
    let bad = graph.add_instance(Recorder::TYPE_ID).unwrap();
    let downstream = graph.add_instance(Recorder::TYPE_ID).unwrap();
    let other = graph.add_instance(Recorder::TYPE_ID).unwrap();
    graph.set_local_default(Recorder::A.of(bad), 3.0_f32).unwrap();
    graph.connect(Recorder::OUT.of(bad), Recorder::A.of(downstream)).unwrap();

    let mut ctx = graph.context(0.0, 0);
    assert_eq!(graph.output(&mut ctx, downstream, Recorder::OUT).unwrap(), 3.0);

    graph.set_local_default(Recorder::A.of(bad), -1.0_f32).unwrap();
    graph.set_local_default(Recorder::B.of(other), 7.0_f32).unwrap();

    let mut ctx = graph.context(0.0, 1);
    assert_eq!(graph.output(&mut ctx, downstream, Recorder::OUT).unwrap(), 3.0);
    assert_eq!(graph.output(&mut ctx, other, Recorder::OUT).unwrap(), 7.0);
    assert_eq!(ctx.stats().faults, 1);

    // Not retried until an input changes.
    recorder.clear();
    let mut ctx = graph.context(0.0, 2);
    graph.output(&mut ctx, downstream, Recorder::OUT).unwrap();
    assert!(recorder.computed().is_empty());

    graph.set_local_default(Recorder::A.of(bad), 2.0_f32).unwrap();
    let mut ctx = graph.context(0.0, 3);
    assert_eq!(graph.output(&mut ctx, downstream, Recorder::OUT).unwrap(), 2.0);
}

/// Test that live outputs recompute once per pass.
#[test]
fn live_outputs_refresh_once_per_pass() {
    let (mut graph, _) = setup();
    let time = graph.add_instance(Time::TYPE_ID).unwrap();
    let scale = graph.add_instance(Multiply::TYPE_ID).unwrap();
    let total = graph.add_instance(Sum::TYPE_ID).unwrap();
    graph.connect(Time::SECONDS.of(time), Multiply::A.of(scale)).unwrap();
    graph.set_local_default(Multiply::B.of(scale), 2.0_f32).unwrap();
    graph.connect_multi(Multiply::OUT.of(scale), Sum::TERMS.of(total)).unwrap();
    graph.connect_multi(Time::SECONDS.of(time), Sum::TERMS.of(total)).unwrap();

    let mut ctx = graph.context(1.0, 60);
    assert_eq!(graph.output(&mut ctx, total, Sum::OUT).unwrap(), 3.0);
    assert_eq!(ctx.stats().computes, 3);

    let mut ctx = graph.context(2.0, 120);
    assert_eq!(graph.output(&mut ctx, total, Sum::OUT).unwrap(), 6.0);
    assert_eq!(graph.output(&mut ctx, scale, Multiply::OUT).unwrap(), 4.0);
    assert_eq!(ctx.stats().computes, 3);
}

/// Test that removing an instance disposes it and drops its edges.
#[test]
fn removing_an_instance_severs_its_edges() {
    let (mut graph, recorder) = setup();
    let source = graph.add_instance(Recorder::TYPE_ID).unwrap();
    let sink = graph.add_instance(Recorder::TYPE_ID).unwrap();
    graph.set_local_default(Recorder::A.of(source), 6.0_f32).unwrap();
    graph.set_local_default(Recorder::A.of(sink), 1.0_f32).unwrap();
    graph.connect(Recorder::OUT.of(source), Recorder::B.of(sink)).unwrap();

    let mut ctx = graph.context(0.0, 0);
    assert_eq!(graph.output(&mut ctx, sink, Recorder::OUT).unwrap(), 7.0);

    let removed = graph.remove_instance(source).unwrap();
    assert_eq!(removed.state(), opgraph_core::graph::InstanceState::Disposed);
    assert!(graph.connections().is_empty());
    assert_eq!(*recorder.disposed.lock().unwrap(), vec![source]);

    let mut ctx = graph.context(0.0, 1);
    assert_eq!(graph.output(&mut ctx, sink, Recorder::OUT).unwrap(), 1.0);
    assert!(matches!(
        graph.get_value(&mut ctx, Recorder::OUT.of(source)),
        Err(GraphError::InstanceNotFound(_))
    ));
}

/// Test that a snapshot survives JSON and rebuilds an equivalent graph.
#[test]
fn snapshot_restores_into_new_graph() {
    let (mut graph, _) = setup();
    let a = constant(&mut graph, 2.0);
    let c = constant(&mut graph, 3.0);
    let sum = graph.add_instance(Sum::TYPE_ID).unwrap();
    let collect = graph.add_instance(CollectFloats::TYPE_ID).unwrap();
    graph.connect_multi(FloatValue::OUT.of(a), Sum::TERMS.of(sum)).unwrap();
    graph.connect_multi(FloatValue::OUT.of(c), Sum::TERMS.of(sum)).unwrap();
    graph.connect_multi(Sum::OUT.of(sum), CollectFloats::VALUES.of(collect)).unwrap();
    graph.add_input(CollectFloats::VALUES.of(collect)).unwrap();

    let snapshot = graph.snapshot();
    let json = serde_json::to_string_pretty(&snapshot).unwrap();
    let parsed: TopologySnapshot = serde_json::from_str(&json).unwrap();

    let mut restored = Graph::from_snapshot(Arc::clone(graph.registry()), &parsed).unwrap();
    let mut ctx = restored.context(0.0, 0);
    let list = restored.output(&mut ctx, collect, CollectFloats::OUT).unwrap();
    assert_eq!(&list[..], &[5.0, 0.0]);

    // New instances continue after the restored ids.
    let next = restored.add_instance(FloatValue::TYPE_ID).unwrap();
    assert!(next > collect);
}

/// Test that reloading the registry rebinds matching types and unresolves missing ones.
#[test]
fn reload_rebinds_or_unresolves() {
    let (mut graph, recorder) = setup();
    let node = graph.add_instance(Recorder::TYPE_ID).unwrap();
    let add = graph.add_instance(Add::TYPE_ID).unwrap();
    graph.set_local_default(Recorder::A.of(node), 2.0_f32).unwrap();
    graph.set_local_default(Add::A.of(add), 1.0_f32).unwrap();

    let mut ctx = graph.context(0.0, 0);
    assert_eq!(graph.output(&mut ctx, node, Recorder::OUT).unwrap(), 2.0);
    assert_eq!(graph.output(&mut ctx, add, Add::OUT).unwrap(), 1.0);

    // Reload with the recorder type replaced by a different operator of the same
    // layout, and math.add dropped.
    struct Doubler;
    impl Operator for Doubler {
        fn compute(&self, _output: SlotIndex, scope: &mut EvalScope<'_>) -> Result<Value, OperatorError> {
            Ok(Value::Float(scope.input(Recorder::A)? * 2.0))
        }
    }
    let mut registry = OperatorRegistry::new();
    registry
        .register(
            OperatorDefinition::new(Recorder::TYPE_ID, "Recorder", Doubler)
                .with_slot(SlotDeclaration::input("A", 0.0_f32))
                .with_slot(SlotDeclaration::input("B", 0.0_f32))
                .with_slot(SlotDeclaration::output("Out", ValueType::Float)),
        )
        .unwrap();

    let errors = graph.reload_registry(Arc::new(registry));
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        GraphError::UnresolvedInstanceType { instance: Some(id), .. } if *id == add
    ));

    recorder.clear();
    let mut ctx = graph.context(0.0, 1);
    assert_eq!(graph.output(&mut ctx, node, Recorder::OUT).unwrap(), 4.0);
    assert!(recorder.computed().is_empty());

    graph.set_local_default(Add::A.of(add), 9.0_f32).unwrap();
    assert_eq!(graph.output(&mut ctx, add, Add::OUT).unwrap(), 1.0);
    assert!(!graph.instance(add).unwrap().is_resolved());
}

/// Test that adding an unregistered type fails without adding an instance.
#[test]
fn unknown_type_is_reported() {
    let (mut graph, _) = setup();
    let err = graph.add_instance("does.not.exist").unwrap_err();
    assert!(matches!(err, GraphError::UnresolvedInstanceType { .. }));
    assert_eq!(graph.instance_count(), 0);
}

/// Test that a configured depth bound aborts deeper reads.
#[test]
fn config_limits_evaluation_depth() {
    init_tracing();
    let config = GraphConfig::from_json_str(r#"{ "max_recursion_depth": 3 }"#).unwrap();
    let registry = Arc::new(operators::builtin_registry().unwrap());
    let mut graph = Graph::with_config(registry, config).unwrap();

    let first = constant(&mut graph, 1.0);
    let mut previous = FloatValue::OUT.of(first);
    for _ in 0..3 {
        let add = graph.add_instance(Add::TYPE_ID).unwrap();
        graph.connect(previous, Add::A.of(add)).unwrap();
        previous = Add::OUT.of(add);
    }

    let mut ctx = graph.context(0.0, 0);
    let err = graph.get_value(&mut ctx, previous).unwrap_err();
    assert!(matches!(err, GraphError::RecursionLimit { depth: 3, .. }));
}

fn add_chain(graph: &mut Graph, len: usize) -> SlotId {
    let first = constant(graph, 1.0);
    let mut previous = FloatValue::OUT.of(first);
    for _ in 0..len {
        let add = graph.add_instance(Add::TYPE_ID).unwrap();
        graph.connect(previous, Add::A.of(add)).unwrap();
        previous = Add::OUT.of(add);
    }
    previous
}

/// Test that the default depth bound stops a chain one node too deep.
#[test]
fn default_depth_limit_stops_deep_chains() {
    let (mut graph, _) = setup();
    let last = add_chain(&mut graph, DEFAULT_MAX_RECURSION_DEPTH + 1);

    let mut ctx = graph.context(0.0, 0);
    let err = graph.get_value(&mut ctx, last).unwrap_err();
    assert!(matches!(
        err,
        GraphError::RecursionLimit { depth, .. } if depth == DEFAULT_MAX_RECURSION_DEPTH
    ));
}

/// Test that the longest chain the default bound allows evaluates.
#[test]
fn chain_within_default_depth_evaluates() {
    let (mut graph, _) = setup();
    // The constant's output takes one frame of the stack.
    let last = add_chain(&mut graph, DEFAULT_MAX_RECURSION_DEPTH - 1);

    let mut ctx = graph.context(0.0, 0);
    assert_eq!(graph.get::<f32>(&mut ctx, last).unwrap(), 1.0);
}

/// Test that consumers of one list output share the same snapshot in a pass.
#[test]
fn fanned_out_list_is_shared_within_a_pass() {
    let (mut graph, _) = setup();
    let a = constant(&mut graph, 1.0);
    let b = constant(&mut graph, 2.0);
    let collect = graph.add_instance(CollectFloats::TYPE_ID).unwrap();
    graph.connect_multi(FloatValue::OUT.of(a), CollectFloats::VALUES.of(collect)).unwrap();
    graph.connect_multi(FloatValue::OUT.of(b), CollectFloats::VALUES.of(collect)).unwrap();

    let left = graph.add_instance(CountList::TYPE_ID).unwrap();
    let right = graph.add_instance(CountList::TYPE_ID).unwrap();
    graph.connect(CollectFloats::OUT.of(collect), CountList::LIST.of(left)).unwrap();
    graph.connect(CollectFloats::OUT.of(collect), CountList::LIST.of(right)).unwrap();

    let mut ctx = graph.context(0.0, 0);
    assert_eq!(graph.output(&mut ctx, left, CountList::OUT).unwrap(), 2);
    assert_eq!(graph.output(&mut ctx, right, CountList::OUT).unwrap(), 2);

    let seen_left: Arc<[f32]> = graph.get(&mut ctx, CountList::LIST.of(left)).unwrap();
    let seen_right: Arc<[f32]> = graph.get(&mut ctx, CountList::LIST.of(right)).unwrap();
    assert_eq!(&seen_left[..], &[1.0, 2.0]);
    assert!(Arc::ptr_eq(&seen_left, &seen_right));
    assert_eq!(ctx.stats().computes, 5);
}
