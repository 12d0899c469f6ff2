use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use bson::{Bson, Document as BsonDocument};

use crate::Document;
use crate::error::StoreError;
use crate::info::{ID_WIRE_NAME, Typed};
use crate::reference::{Collection, CollectionHandle, Projection};
use crate::registry::TypeRegistryArc;
use crate::utils::HashMap;

// -----------------------------------------------------------------------------
// MemoryStore

struct StoreInner {
    collections: RwLock<HashMap<String, Vec<BsonDocument>>>,
    lookups: AtomicUsize,
    unavailable: AtomicBool,
}

/// An in-process database of named collections.
///
/// Cloning is cheap and clones share the same data.
///
/// # Examples
///
/// ```
/// use docmap_mapper::bson::{Bson, doc};
/// use docmap_mapper::reference::CollectionHandle;
/// use docmap_mapper::store::MemoryStore;
///
/// let store = MemoryStore::new();
/// store.insert("users", doc! { "_id": 1, "name": "ada" }).unwrap();
///
/// let users = store.collection("users");
/// let found = users.find_one_by_id(&Bson::Int32(1), None).unwrap();
///
/// assert_eq!(found.unwrap().get_str("name").unwrap(), "ada");
/// assert_eq!(store.lookups(), 1);
/// ```
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl Default for MemoryStore {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                collections: RwLock::new(HashMap::default()),
                lookups: AtomicUsize::new(0),
                unavailable: AtomicBool::new(false),
            }),
        }
    }

    /// Stores a document, replacing any document with the same `_id`.
    ///
    /// # Errors
    ///
    /// If the document has no `_id`.
    pub fn insert(&self, collection: &str, document: BsonDocument) -> Result<(), StoreError> {
        let Some(id) = document.get(ID_WIRE_NAME).cloned() else {
            return Err(StoreError::new(format!(
                "document inserted into `{collection}` has no `{ID_WIRE_NAME}`"
            )));
        };

        let mut collections = self
            .inner
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let documents = collections.entry(collection.to_owned()).or_default();
        match documents
            .iter_mut()
            .find(|stored| stored.get(ID_WIRE_NAME) == Some(&id))
        {
            Some(stored) => *stored = document,
            None => documents.push(document),
        }
        Ok(())
    }

    /// The number of documents in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.inner
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// A handle to the named collection, which need not exist yet.
    pub fn collection(&self, name: &str) -> Arc<dyn CollectionHandle> {
        Arc::new(MemoryCollection {
            name: name.to_owned(),
            store: self.clone(),
        })
    }

    /// A typed view of the named collection.
    pub fn typed<T: Document, K: Typed>(
        &self,
        name: &str,
        registry: TypeRegistryArc,
    ) -> Collection<T, K> {
        Collection::new(self.collection(name), registry)
    }

    /// The number of lookups served so far, across all collections.
    #[inline]
    pub fn lookups(&self) -> usize {
        self.inner.lookups.load(Ordering::Relaxed)
    }

    /// Makes every following lookup fail until switched back.
    #[inline]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::Relaxed);
    }

    fn find(
        &self,
        collection: &str,
        id: &Bson,
        projection: Option<&Projection>,
    ) -> Result<Option<BsonDocument>, StoreError> {
        self.inner.lookups.fetch_add(1, Ordering::Relaxed);
        if self.inner.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::new("store is unavailable"));
        }

        let collections = self
            .inner
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let found = collections.get(collection).and_then(|documents| {
            documents
                .iter()
                .find(|stored| stored.get(ID_WIRE_NAME) == Some(id))
        });
        Ok(found.map(|document| match projection {
            Some(projection) => projection.apply(document),
            None => document.clone(),
        }))
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let collections = self
            .inner
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("MemoryStore")
            .field("collections", &collections.keys().collect::<Vec<_>>())
            .field("lookups", &self.lookups())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// MemoryCollection

/// A named collection of a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: String,
    store: MemoryStore,
}

impl MemoryCollection {
    #[inline]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

impl CollectionHandle for MemoryCollection {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    fn find_one_by_id(
        &self,
        id: &Bson,
        projection: Option<&Projection>,
    ) -> Result<Option<BsonDocument>, StoreError> {
        self.store.find(&self.name, id, projection)
    }

    #[inline]
    fn related(&self, name: &str) -> Arc<dyn CollectionHandle> {
        self.store.collection(name)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::MemoryStore;
    use crate::reference::Projection;

    #[test]
    fn insert_replaces_same_id() {
        let store = MemoryStore::new();
        store.insert("things", doc! { "_id": 1, "v": 1 }).unwrap();
        store.insert("things", doc! { "_id": 1, "v": 2 }).unwrap();
        store.insert("things", doc! { "_id": 2, "v": 3 }).unwrap();

        assert_eq!(store.len("things"), 2);
        let found = store
            .collection("things")
            .find_one_by_id(&1.into(), None)
            .unwrap()
            .unwrap();
        assert_eq!(found.get_i32("v").unwrap(), 2);
    }

    #[test]
    fn insert_requires_id() {
        let store = MemoryStore::new();
        assert!(store.insert("things", doc! { "v": 1 }).is_err());
        assert_eq!(store.len("things"), 0);
    }

    #[test]
    fn related_shares_data() {
        let store = MemoryStore::new();
        store.insert("b", doc! { "_id": "x" }).unwrap();

        let related = store.collection("a").related("b");
        assert_eq!(related.name(), "b");
        assert!(related.find_one_by_id(&"x".into(), None).unwrap().is_some());
        assert!(related.find_one_by_id(&"y".into(), None).unwrap().is_none());
        assert_eq!(store.lookups(), 2);
    }

    #[test]
    fn projection_is_applied() {
        let store = MemoryStore::new();
        store
            .insert("users", doc! { "_id": 1, "name": "ada", "email": "a@x" })
            .unwrap();

        let found = store
            .collection("users")
            .find_one_by_id(&1.into(), Some(&Projection::new().include("name")))
            .unwrap()
            .unwrap();
        assert_eq!(found, doc! { "_id": 1, "name": "ada" });
    }

    #[test]
    fn unavailable_store_fails() {
        let store = MemoryStore::new();
        store.insert("users", doc! { "_id": 1 }).unwrap();
        store.set_unavailable(true);
        assert!(store.collection("users").find_one_by_id(&1.into(), None).is_err());
        store.set_unavailable(false);
        assert!(store.collection("users").find_one_by_id(&1.into(), None).is_ok());
    }
}
