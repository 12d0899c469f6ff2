//! Static type information for documents and their members.
//!
//! Every type that can appear inside a mapped document implements [`Typed`],
//! which hands out a `&'static` [`TypeInfo`] describing its shape. The driver
//! and the registry walk these descriptions instead of relying on per-type
//! generated decoding code.

// -----------------------------------------------------------------------------
// Modules

mod container_info;
mod document_info;
mod field_info;
mod markers;
mod opaque_info;
mod reference_info;
mod ty;
mod type_info;
mod typed;

// -----------------------------------------------------------------------------
// Internal

pub(crate) use ty::impl_type_fn;

// -----------------------------------------------------------------------------
// Exports

pub use container_info::{ListInfo, MapInfo, MapStorage, OptionInfo};
pub use document_info::DocumentInfo;
pub use field_info::NamedField;
pub use markers::{ID_WIRE_NAME, Markers};
pub use opaque_info::OpaqueInfo;
pub use reference_info::ReferenceInfo;
pub use ty::Type;
pub use type_info::TypeInfo;
pub use typed::Typed;
