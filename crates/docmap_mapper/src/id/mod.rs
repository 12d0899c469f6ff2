//! Conversion between native object ids and their text or byte representations.

// -----------------------------------------------------------------------------
// Modules

mod codec;

// -----------------------------------------------------------------------------
// Exports

pub use bson::oid::ObjectId;
pub use codec::{IdCodec, IdRepr, Identifier};
