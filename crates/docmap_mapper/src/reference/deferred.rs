use core::any::{Any, type_name};
use core::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::Document;
use crate::error::{DecodeError, FetchError};
use crate::impls::GenericTypeInfoCell;
use crate::info::{ReferenceInfo, TypeInfo, Typed};
use crate::reference::{Collection, CollectionHandle, Projection};
use crate::registry::TypeRegistryArc;

enum FetchState<T> {
    Unfetched,
    Present(Arc<T>),
    Absent,
}

// -----------------------------------------------------------------------------
// DeferredRef

/// A reference to a document of type `T` with key `K`, resolved on first use.
///
/// The key and the target collection name are available without any I/O.
/// [`fetch`] performs at most one successful lookup per reference; the
/// result, including a confirmed absence, is cached. [`fetch_with`] always
/// queries the store and leaves the cache untouched.
///
/// A reference is safe to share between threads. Concurrent first fetches
/// are serialized, so the store sees one lookup.
///
/// [`fetch`]: DeferredRef::fetch
/// [`fetch_with`]: DeferredRef::fetch_with
pub struct DeferredRef<T, K> {
    id: K,
    collection_name: String,
    collection: Option<Collection<T, K>>,
    state: Mutex<FetchState<T>>,
}

impl<T: Document, K: Typed> DeferredRef<T, K> {
    /// Creates a reference resolved against `collection`.
    pub fn new(id: K, collection: Collection<T, K>) -> Self {
        Self {
            id,
            collection_name: collection.name().to_owned(),
            collection: Some(collection),
            state: Mutex::new(FetchState::Unfetched),
        }
    }

    /// Creates a reference that knows its target but cannot be fetched.
    pub fn unbound(id: K, collection_name: impl Into<String>) -> Self {
        Self {
            id,
            collection_name: collection_name.into(),
            collection: None,
            state: Mutex::new(FetchState::Unfetched),
        }
    }

    /// The key of the referenced document.
    #[inline]
    pub fn id(&self) -> &K {
        &self.id
    }

    /// The name of the collection the referenced document lives in.
    #[inline]
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    #[inline]
    pub fn collection(&self) -> Option<&Collection<T, K>> {
        self.collection.as_ref()
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.collection.is_some()
    }

    /// Returns `true` once a fetch has completed, whether or not a document was found.
    pub fn is_fetched(&self) -> bool {
        !matches!(*self.lock(), FetchState::Unfetched)
    }

    /// Returns the referenced document, querying the store on first use.
    ///
    /// A failed lookup is not cached; the next call tries again.
    pub fn fetch(&self) -> Result<Option<Arc<T>>, FetchError> {
        let collection = self.bound()?;
        let mut state = self.lock();
        match &*state {
            FetchState::Present(object) => {
                log::trace!("reference into `{}` served from cache", self.collection_name);
                return Ok(Some(object.clone()));
            }
            FetchState::Absent => return Ok(None),
            FetchState::Unfetched => {}
        }
        let found = collection.find_one_by_id(&self.id)?.map(Arc::new);
        *state = match &found {
            Some(object) => FetchState::Present(object.clone()),
            None => FetchState::Absent,
        };
        Ok(found)
    }

    /// Queries the store for the projected members of the referenced document.
    ///
    /// The result is never cached.
    pub fn fetch_with(&self, projection: &Projection) -> Result<Option<T>, FetchError> {
        self.bound()?.find_one_by_id_with(&self.id, projection)
    }

    fn bound(&self) -> Result<&Collection<T, K>, FetchError> {
        self.collection
            .as_ref()
            .ok_or_else(|| FetchError::Unbound(self.collection_name.clone()))
    }
}

impl<T, K> DeferredRef<T, K> {
    #[inline]
    fn lock(&self) -> std::sync::MutexGuard<'_, FetchState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Document, K: Typed + Clone> Clone for DeferredRef<T, K> {
    fn clone(&self) -> Self {
        let state = match &*self.lock() {
            FetchState::Unfetched => FetchState::Unfetched,
            FetchState::Present(object) => FetchState::Present(object.clone()),
            FetchState::Absent => FetchState::Absent,
        };
        Self {
            id: self.id.clone(),
            collection_name: self.collection_name.clone(),
            collection: self.collection.clone(),
            state: Mutex::new(state),
        }
    }
}

/// Two references are equal when they point at the same key in the same collection.
impl<T, K: PartialEq> PartialEq for DeferredRef<T, K> {
    fn eq(&self, other: &Self) -> bool {
        self.collection_name == other.collection_name && self.id == other.id
    }
}

impl<T, K: fmt::Debug> fmt::Debug for DeferredRef<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredRef")
            .field("collection", &self.collection_name)
            .field("id", &self.id)
            .field("bound", &self.collection.is_some())
            .finish()
    }
}

impl<T: Document, K: Typed> Typed for DeferredRef<T, K> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| TypeInfo::Reference(ReferenceInfo::new::<T, K>()))
    }
}

pub(crate) fn construct<T: Document, K: Typed>(
    key: Box<dyn Any>,
    collection: Arc<dyn CollectionHandle>,
    registry: &TypeRegistryArc,
) -> Result<Box<dyn Any>, DecodeError> {
    match key.downcast::<K>() {
        Ok(key) => Ok(Box::new(DeferredRef::new(
            *key,
            Collection::<T, K>::new(collection, registry.clone()),
        ))),
        Err(_) => Err(DecodeError::TypeMismatch(type_name::<K>())),
    }
}

pub(crate) fn unbound<T: Document, K: Typed>(
    key: Box<dyn Any>,
    collection: &str,
) -> Result<Box<dyn Any>, DecodeError> {
    match key.downcast::<K>() {
        Ok(key) => Ok(Box::new(DeferredRef::<T, K>::unbound(*key, collection))),
        Err(_) => Err(DecodeError::TypeMismatch(type_name::<K>())),
    }
}

pub(crate) fn parts<T: Document, K: Typed>(value: &dyn Any) -> Option<(&str, &dyn Any)> {
    value
        .downcast_ref::<DeferredRef<T, K>>()
        .map(|reference| (reference.collection_name(), &reference.id as &dyn Any))
}
