//! Stock Operators
//!
//! A handful of general-purpose operator types. Each one exposes its type id
//! and typed slot handles as associated constants, in declaration order:
//!
//! ```rust
//! use opgraph_core::operators::Add;
//! use opgraph_core::InstanceId;
//!
//! let add = InstanceId::from(1);
//! let out = Add::OUT.of(add);
//! assert_eq!(out.index, Add::OUT.index());
//! ```

mod collect;
mod math;
mod time;
mod value;

pub use collect::{CollectColors, CollectFloats, CountList};
pub use math::{Add, Multiply, Sum};
pub use time::Time;
pub use value::{ColorValue, FloatValue};

use crate::error::RegistryError;
use crate::registry::OperatorRegistry;

/// Register every stock operator type.
pub fn register_builtins(registry: &mut OperatorRegistry) -> Result<(), RegistryError> {
    registry.register(FloatValue::definition())?;
    registry.register(ColorValue::definition())?;
    registry.register(Add::definition())?;
    registry.register(Multiply::definition())?;
    registry.register(Sum::definition())?;
    registry.register(CollectColors::definition())?;
    registry.register(CollectFloats::definition())?;
    registry.register(CountList::definition())?;
    registry.register(Time::definition())?;
    Ok(())
}

/// A registry holding only the stock operators.
pub fn builtin_registry() -> Result<OperatorRegistry, RegistryError> {
    let mut registry = OperatorRegistry::new();
    register_builtins(&mut registry)?;
    Ok(registry)
}
