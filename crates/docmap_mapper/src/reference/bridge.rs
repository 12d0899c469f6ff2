use std::sync::Arc;

use crate::reference::{Collection, CollectionHandle};

// -----------------------------------------------------------------------------
// CollectionBridge

/// Gives reference decoders access to the collection a document is read from.
///
/// References found inside that document resolve against collections
/// obtained through [`CollectionHandle::related`] on the owning collection.
pub trait CollectionBridge {
    fn owning_collection(&self) -> Arc<dyn CollectionHandle>;
}

/// A [`CollectionBridge`] over a type-erased collection handle.
#[derive(Clone)]
pub struct BoundCollection(Arc<dyn CollectionHandle>);

impl BoundCollection {
    #[inline]
    pub fn new(collection: Arc<dyn CollectionHandle>) -> Self {
        Self(collection)
    }
}

impl CollectionBridge for BoundCollection {
    #[inline]
    fn owning_collection(&self) -> Arc<dyn CollectionHandle> {
        self.0.clone()
    }
}

impl<T, K> CollectionBridge for Collection<T, K> {
    #[inline]
    fn owning_collection(&self) -> Arc<dyn CollectionHandle> {
        self.handle().clone()
    }
}

impl core::fmt::Debug for BoundCollection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("BoundCollection").field(&self.0.name()).finish()
    }
}
