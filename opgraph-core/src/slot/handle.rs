//! Typed slot handles.
//!
//! Operators name their slots through these zero-sized handles, e.g.
//! `const A: InputRef<f32> = InputRef::new(0);`. The type parameter ties the
//! declared [`ValueType`](crate::value::ValueType) to the Rust type the
//! operator reads or writes.

use std::fmt;
use std::marker::PhantomData;

use crate::graph::InstanceId;

use super::{SlotId, SlotIndex};

macro_rules! slot_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<T> {
            index: SlotIndex,
            _marker: PhantomData<fn() -> T>,
        }

        impl<T> $name<T> {
            pub const fn new(index: u16) -> Self {
                Self {
                    index: SlotIndex(index),
                    _marker: PhantomData,
                }
            }

            pub const fn index(self) -> SlotIndex {
                self.index
            }

            /// The slot on a concrete instance.
            pub const fn of(self, instance: InstanceId) -> SlotId {
                SlotId::new(instance, self.index)
            }
        }

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $name<T> {}

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.index).finish()
            }
        }
    };
}

slot_handle! {
    /// Handle to an output slot holding `T`.
    OutputRef
}

slot_handle! {
    /// Handle to an input slot holding `T`.
    InputRef
}

slot_handle! {
    /// Handle to a multi-input slot whose children hold `T`.
    MultiInputRef
}
