//! Containers for static storage of type information.
//!
//! A non-generic type keeps its [`TypeInfo`] in a [`NonGenericTypeInfoCell`],
//! which is a plain [`OnceLock`].
//!
//! Inside a generic `impl`, a `static` is shared by every instantiation, so
//! [`GenericTypeInfoCell`] keys its entries by [`TypeId`] behind a [`RwLock`].

use core::any::{Any, TypeId};
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::info::TypeInfo;
use crate::utils::TypeIdMap;

// -----------------------------------------------------------------------------
// NonGenericTypeInfoCell

/// Static storage of the [`TypeInfo`] of a non-generic type.
///
/// ```
/// use docmap_mapper::impls::NonGenericTypeInfoCell;
/// use docmap_mapper::info::{OpaqueInfo, TypeInfo, Typed};
///
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct Tag(String);
///
/// impl Typed for Tag {
///     fn type_info() -> &'static TypeInfo {
///         static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
///         CELL.get_or_init(|| TypeInfo::Opaque(OpaqueInfo::new::<Self>()))
///     }
/// }
///
/// assert_eq!(Tag::type_info().kind(), "opaque");
/// ```
pub struct NonGenericTypeInfoCell(OnceLock<TypeInfo>);

impl NonGenericTypeInfoCell {
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored info, initializing it with `f` on first access.
    #[inline]
    pub fn get_or_init<F>(&self, f: F) -> &TypeInfo
    where
        F: FnOnce() -> TypeInfo,
    {
        self.0.get_or_init(f)
    }
}

impl Default for NonGenericTypeInfoCell {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------
// GenericTypeInfoCell

/// Static storage of the [`TypeInfo`] of every instantiation of a generic type.
///
/// Entries are leaked on insertion and live for the rest of the process.
///
/// ```
/// use docmap_mapper::impls::GenericTypeInfoCell;
/// use docmap_mapper::info::{ListInfo, TypeInfo, Typed};
///
/// struct Batch<T>(Vec<T>);
///
/// impl<T: Typed> Typed for Batch<T> {
///     fn type_info() -> &'static TypeInfo {
///         static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
///         CELL.get_or_insert::<Self>(|| TypeInfo::List(ListInfo::new::<T>()))
///     }
/// }
///
/// let a = <Batch<u32>>::type_info();
/// let b = <Batch<String>>::type_info();
/// assert!(!core::ptr::eq(a, b));
/// assert!(core::ptr::eq(a, <Batch<u32>>::type_info()));
/// ```
pub struct GenericTypeInfoCell(RwLock<TypeIdMap<&'static TypeInfo>>);

impl GenericTypeInfoCell {
    #[inline]
    pub const fn new() -> Self {
        Self(RwLock::new(TypeIdMap::new()))
    }

    /// Returns the info stored for `G`, inserting the result of `f` on first access.
    #[inline(always)]
    pub fn get_or_insert<G: Any + ?Sized>(&self, f: impl FnOnce() -> TypeInfo) -> &TypeInfo {
        self.get_or_insert_by_type_id(TypeId::of::<G>(), f)
    }

    // Separate to reduce code compilation times
    #[inline(never)]
    fn get_or_insert_by_type_id(
        &self,
        type_id: TypeId,
        f: impl FnOnce() -> TypeInfo,
    ) -> &TypeInfo {
        match self.get_by_type_id(type_id) {
            Some(info) => info,
            None => self.insert_by_type_id(type_id, f()),
        }
    }

    #[inline(never)]
    fn get_by_type_id(&self, type_id: TypeId) -> Option<&TypeInfo> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .copied()
    }

    #[inline(never)]
    fn insert_by_type_id(&self, type_id: TypeId, value: TypeInfo) -> &TypeInfo {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(type_id, || Box::leak(Box::new(value)))
    }
}

impl Default for GenericTypeInfoCell {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
