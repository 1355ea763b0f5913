//! Arithmetic on floats.

use crate::error::OperatorError;
use crate::graph::EvalScope;
use crate::registry::{Operator, OperatorDefinition, SlotDeclaration};
use crate::slot::{InputRef, MultiInputRef, OutputRef, SlotIndex};
use crate::value::{Value, ValueType};

#[derive(Debug, Clone, Copy, Default)]
pub struct Add;

impl Add {
    pub const TYPE_ID: &'static str = "math.add";
    pub const A: InputRef<f32> = InputRef::new(0);
    pub const B: InputRef<f32> = InputRef::new(1);
    pub const OUT: OutputRef<f32> = OutputRef::new(2);

    pub fn definition() -> OperatorDefinition {
        OperatorDefinition::new(Self::TYPE_ID, "Add", Self)
            .with_slot(SlotDeclaration::input("A", 0.0_f32))
            .with_slot(SlotDeclaration::input("B", 0.0_f32))
            .with_slot(SlotDeclaration::output("Out", ValueType::Float))
    }
}

impl Operator for Add {
    fn compute(&self, _output: SlotIndex, scope: &mut EvalScope<'_>) -> Result<Value, OperatorError> {
        let a = scope.input(Self::A)?;
        let b = scope.input(Self::B)?;
        Ok(Value::Float(a + b))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Multiply;

impl Multiply {
    pub const TYPE_ID: &'static str = "math.multiply";
    pub const A: InputRef<f32> = InputRef::new(0);
    pub const B: InputRef<f32> = InputRef::new(1);
    pub const OUT: OutputRef<f32> = OutputRef::new(2);

    pub fn definition() -> OperatorDefinition {
        OperatorDefinition::new(Self::TYPE_ID, "Multiply", Self)
            .with_slot(SlotDeclaration::input("A", 1.0_f32))
            .with_slot(SlotDeclaration::input("B", 1.0_f32))
            .with_slot(SlotDeclaration::output("Out", ValueType::Float))
    }
}

impl Operator for Multiply {
    fn compute(&self, _output: SlotIndex, scope: &mut EvalScope<'_>) -> Result<Value, OperatorError> {
        let a = scope.input(Self::A)?;
        let b = scope.input(Self::B)?;
        Ok(Value::Float(a * b))
    }
}

/// Sums any number of float terms. An empty sum is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

impl Sum {
    pub const TYPE_ID: &'static str = "math.sum";
    pub const TERMS: MultiInputRef<f32> = MultiInputRef::new(0);
    pub const OUT: OutputRef<f32> = OutputRef::new(1);

    pub fn definition() -> OperatorDefinition {
        OperatorDefinition::new(Self::TYPE_ID, "Sum", Self)
            .with_slot(SlotDeclaration::multi_input("Terms", 0.0_f32))
            .with_slot(SlotDeclaration::output("Out", ValueType::Float))
    }
}

impl Operator for Sum {
    fn compute(&self, _output: SlotIndex, scope: &mut EvalScope<'_>) -> Result<Value, OperatorError> {
        let terms = scope.multi_input(Self::TERMS)?;
        Ok(Value::Float(terms.iter().sum()))
    }
}
