//! [`Typed`](crate::info::Typed) implementations for leaf and container types,
//! and the cells used to store their type information.

// -----------------------------------------------------------------------------
// Modules

mod cell;
mod containers;
mod opaque;

// -----------------------------------------------------------------------------
// Exports

pub use cell::{GenericTypeInfoCell, NonGenericTypeInfoCell};
