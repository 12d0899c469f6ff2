//! Registration of document types and resolution of their member bindings.

// -----------------------------------------------------------------------------
// Modules

mod binding;
mod type_meta;
mod type_registry;

// -----------------------------------------------------------------------------
// Exports

pub use binding::{FieldBinding, FieldCodec, MemberKind, Nesting, ReferenceCodec, resolve_override};
pub use type_meta::TypeMeta;
pub use type_registry::{TypeRegistry, TypeRegistryArc};
