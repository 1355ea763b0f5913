//! Opgraph Core
//!
//! This crate provides the evaluation core for node-based visual programming:
//! a graph of typed operators that is re-evaluated every frame.
//! It implements:
//!
//! - Typed output, input and multi-input slots
//! - An operator registry with static slot declarations
//! - Push invalidation and pull evaluation with per-pass memoization
//! - Eager cycle rejection and a recursion guard during evaluation
//! - Topology snapshots for persistence layers
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value`: Runtime value tags and the typed `SlotValue` mapping
//! - `slot`: Slot state, dirty flags and typed slot handles
//! - `registry`: Operator trait, slot declarations and type lookup
//! - `graph`: Instances, connections, evaluation and snapshots
//! - `operators`: A small set of stock operators
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use opgraph_core::graph::Graph;
//! use opgraph_core::operators::{self, FloatValue, Sum};
//!
//! let mut graph = Graph::new(Arc::new(operators::builtin_registry().unwrap()));
//!
//! let a = graph.add_instance(FloatValue::TYPE_ID).unwrap();
//! let sum = graph.add_instance(Sum::TYPE_ID).unwrap();
//! graph.set_local_default(FloatValue::VALUE.of(a), 2.0_f32).unwrap();
//! graph.connect_multi(FloatValue::OUT.of(a), Sum::TERMS.of(sum)).unwrap();
//!
//! let mut ctx = graph.context(0.0, 0);
//! assert_eq!(graph.output(&mut ctx, sum, Sum::OUT).unwrap(), 2.0);
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod operators;
pub mod registry;
pub mod slot;
pub mod value;

pub use config::GraphConfig;
pub use error::{ConfigError, GraphError, OperatorError, RegistryError};
pub use graph::{EvalScope, EvaluationContext, Graph, InstanceId, TopologySnapshot};
pub use registry::{Operator, OperatorDefinition, OperatorRegistry, SlotDeclaration};
pub use slot::{InputRef, MultiInputRef, OutputRef, SlotId};
pub use value::{Color, SlotValue, Value, ValueType};
