//! Slot Values
//!
//! Every slot in the graph carries a [`Value`] tagged with a [`ValueType`].
//! Connections are only allowed between slots whose tags match exactly.
//!
//! # Shared Values
//!
//! List and text values are stored behind `Arc`. A cached value fanned out to
//! several consumers is the same allocation for all of them, and since the
//! contents are immutable no consumer can change what another one sees. A
//! compute that wants a different list builds a new one.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The type tag of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Float,
    Int,
    Bool,
    Text,
    Vec2,
    Vec3,
    Color,
    FloatList,
    ColorList,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Float => "float",
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::Text => "text",
            ValueType::Vec2 => "vec2",
            ValueType::Vec3 => "vec3",
            ValueType::Color => "color",
            ValueType::FloatList => "float list",
            ValueType::ColorList => "color list",
        };
        f.write_str(name)
    }
}

/// RGBA color with linear float channels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// A value held by a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Float(f32),
    Int(i32),
    Bool(bool),
    Text(Arc<str>),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Color(Color),
    FloatList(Arc<[f32]>),
    ColorList(Arc<[Color]>),
}

impl Value {
    /// The type tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Float(_) => ValueType::Float,
            Value::Int(_) => ValueType::Int,
            Value::Bool(_) => ValueType::Bool,
            Value::Text(_) => ValueType::Text,
            Value::Vec2(_) => ValueType::Vec2,
            Value::Vec3(_) => ValueType::Vec3,
            Value::Color(_) => ValueType::Color,
            Value::FloatList(_) => ValueType::FloatList,
            Value::ColorList(_) => ValueType::ColorList,
        }
    }

    /// The zero value for a type, used to seed outputs that were never computed.
    pub fn default_for(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Float => Value::Float(0.0),
            ValueType::Int => Value::Int(0),
            ValueType::Bool => Value::Bool(false),
            ValueType::Text => Value::Text(Arc::from("")),
            ValueType::Vec2 => Value::Vec2([0.0; 2]),
            ValueType::Vec3 => Value::Vec3([0.0; 3]),
            ValueType::Color => Value::Color(Color::default()),
            ValueType::FloatList => Value::FloatList(Arc::from(Vec::new())),
            ValueType::ColorList => Value::ColorList(Arc::from(Vec::new())),
        }
    }

    /// Typed view of this value.
    pub fn get<T: SlotValue>(&self) -> Option<T> {
        T::from_value(self)
    }
}

/// Rust types that can live in a slot.
///
/// Each implementor maps to exactly one [`ValueType`]; this is what makes the
/// typed slot handles (`InputRef<f32>` and friends) line up with the runtime
/// type tags checked by the connection manager.
pub trait SlotValue: Clone + 'static {
    /// The tag for slots holding this type.
    const VALUE_TYPE: ValueType;

    /// Wrap into a [`Value`].
    fn into_value(self) -> Value;

    /// Extract from a [`Value`], or `None` if the tag differs.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_slot_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl SlotValue for $ty {
                const VALUE_TYPE: ValueType = ValueType::$variant;

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(inner) => Some(inner.clone()),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_slot_value! {
    f32 => Float,
    i32 => Int,
    bool => Bool,
    Arc<str> => Text,
    [f32; 2] => Vec2,
    [f32; 3] => Vec3,
    Color => Color,
    Arc<[f32]> => FloatList,
    Arc<[Color]> => ColorList,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(Arc::from(value))
    }
}
