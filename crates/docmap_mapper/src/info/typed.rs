use core::any::Any;

use crate::info::TypeInfo;

// -----------------------------------------------------------------------------
// Typed

/// A static accessor to the shape of a mapped type.
///
/// Implemented by `#[derive(Document)]` for documents, by
/// [`impl_opaque!`](crate::impl_opaque) for leaf values, and by this crate
/// for `Option`, `Vec`, string-keyed maps and [`DeferredRef`].
///
/// Implementations store their [`TypeInfo`] in a
/// [`NonGenericTypeInfoCell`] or [`GenericTypeInfoCell`]:
///
/// ```
/// use docmap_mapper::impls::NonGenericTypeInfoCell;
/// use docmap_mapper::info::{OpaqueInfo, TypeInfo, Typed};
///
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct Celsius(f64);
///
/// impl Typed for Celsius {
///     fn type_info() -> &'static TypeInfo {
///         static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
///         CELL.get_or_init(|| TypeInfo::Opaque(OpaqueInfo::new::<Self>()))
///     }
/// }
///
/// assert!(Celsius::type_info().type_is::<Celsius>());
/// ```
///
/// [`DeferredRef`]: crate::reference::DeferredRef
/// [`NonGenericTypeInfoCell`]: crate::impls::NonGenericTypeInfoCell
/// [`GenericTypeInfoCell`]: crate::impls::GenericTypeInfoCell
pub trait Typed: Any + Send + Sync {
    /// Returns the static type information of `Self`.
    fn type_info() -> &'static TypeInfo;
}
