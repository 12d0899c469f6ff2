use core::any::Any;
use core::fmt;
use std::sync::Arc;

use crate::Document;
use crate::error::DecodeError;
use crate::info::{DocumentInfo, Type, TypeInfo, Typed, impl_type_fn};
use crate::reference::{CollectionHandle, deferred};
use crate::registry::TypeRegistryArc;

type ConstructFn = fn(
    key: Box<dyn Any>,
    collection: Arc<dyn CollectionHandle>,
    registry: &TypeRegistryArc,
) -> Result<Box<dyn Any>, DecodeError>;

type UnboundFn = fn(key: Box<dyn Any>, collection: &str) -> Result<Box<dyn Any>, DecodeError>;

type PartsFn = for<'a> fn(&'a dyn Any) -> Option<(&'a str, &'a dyn Any)>;

// -----------------------------------------------------------------------------
// ReferenceInfo

/// Type information for a [`DeferredRef<T, K>`](crate::reference::DeferredRef).
///
/// Carries the target document type, the key type, and the constructor the
/// reference decoder uses once the key and the target collection are known.
pub struct ReferenceInfo {
    ty: Type,
    target_ty: Type,
    key_ty: Type,
    target: fn() -> &'static TypeInfo,
    key: fn() -> &'static TypeInfo,
    construct: ConstructFn,
    unbound: UnboundFn,
    parts: PartsFn,
}

impl ReferenceInfo {
    impl_type_fn!(ty);

    /// Creates the [`ReferenceInfo`] of `DeferredRef<T, K>`.
    pub fn new<T: Document, K: Typed>() -> Self {
        Self {
            ty: Type::of::<deferred::DeferredRef<T, K>>(),
            target_ty: Type::of::<T>(),
            key_ty: Type::of::<K>(),
            target: T::type_info,
            key: K::type_info,
            construct: deferred::construct::<T, K>,
            unbound: deferred::unbound::<T, K>,
            parts: deferred::parts::<T, K>,
        }
    }

    #[inline]
    pub fn target_ty(&self) -> &Type {
        &self.target_ty
    }

    #[inline]
    pub fn key_ty(&self) -> &Type {
        &self.key_ty
    }

    /// Returns the [`TypeInfo`] of the referenced document.
    #[inline]
    pub fn target_info(&self) -> &'static TypeInfo {
        (self.target)()
    }

    /// Returns the [`TypeInfo`] of the key.
    #[inline]
    pub fn key_info(&self) -> &'static TypeInfo {
        (self.key)()
    }

    /// Builds a bound reference from a boxed key.
    #[inline]
    pub fn construct(
        &self,
        key: Box<dyn Any>,
        collection: Arc<dyn CollectionHandle>,
        registry: &TypeRegistryArc,
    ) -> Result<Box<dyn Any>, DecodeError> {
        (self.construct)(key, collection, registry)
    }

    /// An unbound reference with an empty key into the target's declared collection.
    pub fn empty_value(&self) -> Option<Box<dyn Any>> {
        let key = self.key_info().empty_value()?;
        let collection = self
            .target_info()
            .as_document()
            .and_then(DocumentInfo::collection)
            .unwrap_or_default();
        (self.unbound)(key, collection).ok()
    }

    /// Returns the collection name and the key of a reference.
    #[inline]
    pub fn parts<'a>(&self, value: &'a dyn Any) -> Option<(&'a str, &'a dyn Any)> {
        (self.parts)(value)
    }
}

impl fmt::Debug for ReferenceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceInfo")
            .field("target", &self.target_ty)
            .field("key", &self.key_ty)
            .finish()
    }
}
