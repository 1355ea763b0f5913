//! List builders.

use std::sync::Arc;

use crate::error::OperatorError;
use crate::graph::EvalScope;
use crate::registry::{Operator, OperatorDefinition, SlotDeclaration};
use crate::slot::{InputRef, MultiInputRef, OutputRef, SlotIndex};
use crate::value::{Color, Value, ValueType};

/// Gathers its color inputs into a list, in input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectColors;

impl CollectColors {
    pub const TYPE_ID: &'static str = "collect.colors";
    pub const COLORS: MultiInputRef<Color> = MultiInputRef::new(0);
    pub const OUT: OutputRef<Arc<[Color]>> = OutputRef::new(1);

    pub fn definition() -> OperatorDefinition {
        OperatorDefinition::new(Self::TYPE_ID, "Collect Colors", Self)
            .with_slot(SlotDeclaration::multi_input("Colors", Color::WHITE))
            .with_slot(SlotDeclaration::output("Out", ValueType::ColorList))
    }
}

impl Operator for CollectColors {
    fn compute(&self, _output: SlotIndex, scope: &mut EvalScope<'_>) -> Result<Value, OperatorError> {
        let colors = scope.multi_input(Self::COLORS)?;
        Ok(Value::ColorList(colors.into()))
    }
}

/// Gathers its float inputs into a list, in input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectFloats;

impl CollectFloats {
    pub const TYPE_ID: &'static str = "collect.floats";
    pub const VALUES: MultiInputRef<f32> = MultiInputRef::new(0);
    pub const OUT: OutputRef<Arc<[f32]>> = OutputRef::new(1);

    pub fn definition() -> OperatorDefinition {
        OperatorDefinition::new(Self::TYPE_ID, "Collect Floats", Self)
            .with_slot(SlotDeclaration::multi_input("Values", 0.0_f32))
            .with_slot(SlotDeclaration::output("Out", ValueType::FloatList))
    }
}

impl Operator for CollectFloats {
    fn compute(&self, _output: SlotIndex, scope: &mut EvalScope<'_>) -> Result<Value, OperatorError> {
        let values = scope.multi_input(Self::VALUES)?;
        Ok(Value::FloatList(values.into()))
    }
}

/// Length of a float list.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountList;

impl CountList {
    pub const TYPE_ID: &'static str = "list.count";
    pub const LIST: InputRef<Arc<[f32]>> = InputRef::new(0);
    pub const OUT: OutputRef<i32> = OutputRef::new(1);

    pub fn definition() -> OperatorDefinition {
        OperatorDefinition::new(Self::TYPE_ID, "Count", Self)
            .with_slot(SlotDeclaration::input("List", Value::default_for(ValueType::FloatList)))
            .with_slot(SlotDeclaration::output("Count", ValueType::Int))
    }
}

impl Operator for CountList {
    fn compute(&self, _output: SlotIndex, scope: &mut EvalScope<'_>) -> Result<Value, OperatorError> {
        let list = scope.input(Self::LIST)?;
        let count = i32::try_from(list.len()).map_err(|_| OperatorError::InvalidInput {
            input: "List",
            reason: format!("{} items do not fit an Int", list.len()),
        })?;
        Ok(Value::Int(count))
    }
}
