//! Error types.

use std::fmt::Write as _;

use crate::graph::InstanceId;
use crate::registry::OperatorTypeId;
use crate::slot::SlotId;
use crate::value::ValueType;

/// Errors raised by graph edits and evaluation.
///
/// Edits that fail leave the graph exactly as it was.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// A connection between slots of different value types.
    #[error("cannot connect {from} to {to}: expected {expected}, found {found}")]
    TypeMismatch {
        from: SlotId,
        to: SlotId,
        expected: ValueType,
        found: ValueType,
    },

    /// A value of the wrong type written to or read from a slot.
    #[error("slot {slot} holds {expected}, got {found}")]
    ValueTypeMismatch {
        slot: SlotId,
        expected: ValueType,
        found: ValueType,
    },

    /// A connection would close a loop, or evaluation re-entered a slot.
    #[error("cycle detected: {}", format_path(.path))]
    CycleDetected { path: Vec<SlotId> },

    /// Evaluation went deeper than the configured recursion limit.
    #[error("recursion limit of {depth} reached while evaluating {slot}")]
    RecursionLimit { slot: SlotId, depth: usize },

    /// The operator type is not (or no longer) registered.
    #[error("operator type `{type_id}` is not registered")]
    UnresolvedInstanceType {
        instance: Option<InstanceId>,
        type_id: OperatorTypeId,
    },

    /// The operator type was re-registered with a different slot layout.
    #[error("operator type `{type_id}` of instance {instance} changed its slot declarations")]
    IncompatibleRedefinition {
        instance: InstanceId,
        type_id: OperatorTypeId,
    },

    #[error("instance {0} not found")]
    InstanceNotFound(InstanceId),

    #[error("instance {0} already exists")]
    DuplicateInstance(InstanceId),

    #[error("slot {0} not found")]
    SlotNotFound(SlotId),

    #[error("instance {instance} has no slot named `{name}`")]
    UnknownSlotName { instance: InstanceId, name: String },

    #[error("slot {0} is not an output")]
    NotAnOutput(SlotId),

    #[error("slot {0} is not an input")]
    NotAnInput(SlotId),

    #[error("slot {0} is not a multi-input")]
    NotAMultiInput(SlotId),

    /// A multi-input has no value of its own; read its children.
    #[error("slot {0} has no single value")]
    NotReadable(SlotId),

    /// Multi-input multiplexers address children by position.
    #[error("index {index} out of range for {slot} with {len} inputs")]
    InputIndexOutOfRange { slot: SlotId, index: usize, len: usize },
}

fn format_path(path: &[SlotId]) -> String {
    let mut out = String::new();
    for (i, slot) in path.iter().enumerate() {
        if i > 0 {
            out.push_str(" -> ");
        }
        let _ = write!(out, "{slot}");
    }
    out
}

/// Faults raised by an operator's compute.
///
/// Everything except [`OperatorError::Upstream`] is contained to the failing
/// slot: it is logged and the slot keeps its previous value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OperatorError {
    /// A structural error while pulling an input. Aborts the pass for the
    /// requesting slot.
    #[error(transparent)]
    Upstream(Box<GraphError>),

    #[error("input `{input}` is invalid: {reason}")]
    InvalidInput { input: &'static str, reason: String },

    #[error("{0}")]
    Failed(String),
}

impl OperatorError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl From<GraphError> for OperatorError {
    fn from(err: GraphError) -> Self {
        Self::Upstream(Box::new(err))
    }
}

/// Errors raised while registering operator types.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("operator type `{0}` is already registered")]
    DuplicateType(OperatorTypeId),

    #[error("operator type `{type_id}` declares slot `{slot}` twice")]
    DuplicateSlot {
        type_id: OperatorTypeId,
        slot: &'static str,
    },

    #[error("slot `{slot}` of `{type_id}` is declared {declared} but its default is {found}")]
    DefaultTypeMismatch {
        type_id: OperatorTypeId,
        slot: &'static str,
        declared: ValueType,
        found: ValueType,
    },

    #[error("operator type `{0}` declares no outputs")]
    NoOutputs(OperatorTypeId),

    #[error("operator type `{0}` declares too many slots")]
    TooManySlots(OperatorTypeId),
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
