use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;

use bson::{Bson, Document as BsonDocument};

use crate::Document;
use crate::error::{FetchError, StoreError};
use crate::info::Typed;
use crate::reference::Projection;
use crate::registry::TypeRegistryArc;
use crate::serde::DocumentEncoder;
use crate::stream::{DecoderConfig, DocumentDecoder};

// -----------------------------------------------------------------------------
// CollectionHandle

/// A type-erased handle to a named collection of raw documents.
///
/// Backends implement this trait; typed access goes through [`Collection`].
pub trait CollectionHandle: Send + Sync {
    /// The name of the collection.
    fn name(&self) -> &str;

    /// Returns the document whose `_id` equals `id`, reduced by `projection`.
    fn find_one_by_id(
        &self,
        id: &Bson,
        projection: Option<&Projection>,
    ) -> Result<Option<BsonDocument>, StoreError>;

    /// Returns a handle to another collection of the same database.
    fn related(&self, name: &str) -> Arc<dyn CollectionHandle>;
}

// -----------------------------------------------------------------------------
// Collection

/// A typed view of a collection holding documents of type `T` with keys of type `K`.
///
/// Keys are encoded through the identity member of `T`, so a `String` key of
/// a type whose identity is marked `object_id` is sent to the store as a
/// native object id. Fetched documents are decoded through a pipeline bound
/// to this collection, so references inside them resolve as well.
pub struct Collection<T, K> {
    handle: Arc<dyn CollectionHandle>,
    registry: TypeRegistryArc,
    config: Arc<DecoderConfig>,
    _marker: PhantomData<fn() -> (T, K)>,
}

impl<T, K> Collection<T, K> {
    /// The underlying type-erased handle.
    #[inline]
    pub fn handle(&self) -> &Arc<dyn CollectionHandle> {
        &self.handle
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    #[inline]
    pub fn registry(&self) -> &TypeRegistryArc {
        &self.registry
    }
}

impl<T: Document, K: Typed> Collection<T, K> {
    pub fn new(handle: Arc<dyn CollectionHandle>, registry: TypeRegistryArc) -> Self {
        Self {
            handle,
            registry,
            config: Arc::default(),
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn with_config(mut self, config: Arc<DecoderConfig>) -> Self {
        self.config = config;
        self
    }

    /// A typed view of another collection of the same database.
    pub fn related<U: Document, J: Typed>(&self, name: &str) -> Collection<U, J> {
        Collection::new(self.handle.related(name), self.registry.clone())
            .with_config(self.config.clone())
    }

    /// A decoder bound to this collection.
    pub fn decoder(&self) -> DocumentDecoder<T> {
        DocumentDecoder::new(self.registry.clone())
            .with_collection(self.handle.clone())
            .with_config(self.config.clone())
    }

    /// Encodes a key the way the identity member of `T` is written.
    pub fn encode_key(&self, id: &K) -> Result<Bson, FetchError> {
        Ok(DocumentEncoder::new(&self.registry).encode_key::<T, K>(id)?)
    }

    /// Looks up the document with the given key.
    #[inline]
    pub fn find_one_by_id(&self, id: &K) -> Result<Option<T>, FetchError> {
        self.find(id, None)
    }

    /// Looks up the document with the given key, fetching only the projected members.
    ///
    /// Members left out by the projection take their empty value.
    #[inline]
    pub fn find_one_by_id_with(
        &self,
        id: &K,
        projection: &Projection,
    ) -> Result<Option<T>, FetchError> {
        self.find(id, Some(projection))
    }

    fn find(&self, id: &K, projection: Option<&Projection>) -> Result<Option<T>, FetchError> {
        let key = self.encode_key(id)?;
        log::debug!("fetching `{key}` from collection `{}`", self.name());
        let decoder = match projection {
            Some(_) => {
                let config = (*self.config).clone().with_fill_absent_members(true);
                self.decoder().with_config(Arc::new(config))
            }
            None => self.decoder(),
        };
        match self.handle.find_one_by_id(&key, projection)? {
            Some(document) => Ok(Some(decoder.decode_document(document)?.object)),
            None => {
                log::debug!("no document `{key}` in collection `{}`", self.name());
                Ok(None)
            }
        }
    }
}

impl<T, K> Clone for Collection<T, K> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            registry: self.registry.clone(),
            config: self.config.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, K> fmt::Debug for Collection<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.handle.name())
            .finish_non_exhaustive()
    }
}
