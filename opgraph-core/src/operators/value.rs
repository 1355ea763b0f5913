//! Constant sources.

use crate::error::OperatorError;
use crate::graph::EvalScope;
use crate::registry::{Operator, OperatorDefinition, SlotDeclaration};
use crate::slot::{InputRef, OutputRef, SlotIndex};
use crate::value::{Color, Value, ValueType};

/// Outputs its `Value` parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatValue;

impl FloatValue {
    pub const TYPE_ID: &'static str = "value.float";
    pub const VALUE: InputRef<f32> = InputRef::new(0);
    pub const OUT: OutputRef<f32> = OutputRef::new(1);

    pub fn definition() -> OperatorDefinition {
        OperatorDefinition::new(Self::TYPE_ID, "Float", Self)
            .with_slot(SlotDeclaration::input("Value", 0.0_f32))
            .with_slot(SlotDeclaration::output("Out", ValueType::Float))
    }
}

impl Operator for FloatValue {
    fn compute(&self, _output: SlotIndex, scope: &mut EvalScope<'_>) -> Result<Value, OperatorError> {
        Ok(Value::Float(scope.input(Self::VALUE)?))
    }
}

/// Outputs its `Color` parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorValue;

impl ColorValue {
    pub const TYPE_ID: &'static str = "value.color";
    pub const VALUE: InputRef<Color> = InputRef::new(0);
    pub const OUT: OutputRef<Color> = OutputRef::new(1);

    pub fn definition() -> OperatorDefinition {
        OperatorDefinition::new(Self::TYPE_ID, "Color", Self)
            .with_slot(SlotDeclaration::input("Color", Color::WHITE))
            .with_slot(SlotDeclaration::output("Out", ValueType::Color))
    }
}

impl Operator for ColorValue {
    fn compute(&self, _output: SlotIndex, scope: &mut EvalScope<'_>) -> Result<Value, OperatorError> {
        Ok(Value::Color(scope.input(Self::VALUE)?))
    }
}
