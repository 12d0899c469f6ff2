//! Lazily resolved references and the collections they resolve against.

// -----------------------------------------------------------------------------
// Modules

mod bridge;
mod collection;
pub(crate) mod deferred;
mod projection;

// -----------------------------------------------------------------------------
// Exports

pub use bridge::{BoundCollection, CollectionBridge};
pub use collection::{Collection, CollectionHandle};
pub use deferred::DeferredRef;
pub use projection::Projection;
