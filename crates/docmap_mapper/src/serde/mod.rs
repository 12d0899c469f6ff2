//! Type-directed decoding and encoding of documents.
//!
//! # Decoding
//!
//! - [`DocumentDriver`] walks the [`TypeInfo`](crate::info::TypeInfo) of a
//!   document and pulls tokens from a [`TokenReader`](crate::stream::TokenReader).
//!   Members are dispatched by their resolved [`FieldBinding`]: identifier
//!   conversions and references are handled here, leaf values go through
//!   their serde implementations via [`ValueDeserializer`].
//! - References are built by [`decode_reference`], which needs a
//!   [`CollectionBridge`](crate::reference::CollectionBridge).
//!
//! # Encoding
//!
//! [`DocumentEncoder`] is the inverse: identity members are written as `_id`,
//! identifier conversions are reversed, and references become `{ $ref, $id }`.
//!
//! [`FieldBinding`]: crate::registry::FieldBinding

// -----------------------------------------------------------------------------
// Modules

mod de;
#[cfg(all(debug_assertions, feature = "debug"))]
mod info_stack;
mod ser;

// -----------------------------------------------------------------------------
// Internal

#[cfg(all(debug_assertions, feature = "debug"))]
use info_stack::TypeStack;

// -----------------------------------------------------------------------------
// Exports

pub use de::{DecodeContext, DocumentDriver, ScalarDeserializer, ValueDeserializer};
pub use de::{decode_reference, from_reader};
pub use ser::DocumentEncoder;
