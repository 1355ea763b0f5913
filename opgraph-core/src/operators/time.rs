//! Clock source.

use crate::error::OperatorError;
use crate::graph::EvalScope;
use crate::registry::{Operator, OperatorDefinition, SlotDeclaration};
use crate::slot::{OutputRef, SlotIndex};
use crate::value::{Value, ValueType};

/// The evaluation context's time and frame.
///
/// Both outputs are live: they refresh once per pass even though the
/// operator has no inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Time;

impl Time {
    pub const TYPE_ID: &'static str = "time.now";
    pub const SECONDS: OutputRef<f32> = OutputRef::new(0);
    pub const FRAME: OutputRef<i32> = OutputRef::new(1);

    pub fn definition() -> OperatorDefinition {
        OperatorDefinition::new(Self::TYPE_ID, "Time", Self)
            .with_slot(SlotDeclaration::live_output("Seconds", ValueType::Float))
            .with_slot(SlotDeclaration::live_output("Frame", ValueType::Int))
    }
}

impl Operator for Time {
    fn compute(&self, output: SlotIndex, scope: &mut EvalScope<'_>) -> Result<Value, OperatorError> {
        if output == Self::FRAME.index() {
            // Saturates after ~400 days at 60 fps.
            let frame = i32::try_from(scope.frame()).unwrap_or(i32::MAX);
            return Ok(Value::Int(frame));
        }
        Ok(Value::Float(scope.time() as f32))
    }
}
