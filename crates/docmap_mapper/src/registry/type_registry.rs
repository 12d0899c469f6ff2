use core::any::TypeId;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::Document;
use crate::error::DecodeError;
use crate::info::{DocumentInfo, TypeInfo};
use crate::registry::TypeMeta;
use crate::utils::{FixedHashState, HashMap, HashSet, TypeIdMap};

// -----------------------------------------------------------------------------
// TypeRegistry

/// The process-wide store of resolved document bindings.
///
/// Registering a document resolves the bindings of its members and of every
/// document reachable from it, through nested documents, containers and
/// reference targets. Registration is all-or-nothing: if any reachable type
/// fails to resolve, nothing is inserted.
///
/// # Example
///
/// ```
/// use core::any::TypeId;
/// use docmap_mapper::{Document, reference::DeferredRef, registry::TypeRegistry};
///
/// #[derive(Document)]
/// #[document(collection = "authors")]
/// struct Author {
///     #[document(id, object_id)]
///     id: String,
/// }
///
/// #[derive(Document)]
/// struct Book {
///     #[document(object_id)]
///     author: DeferredRef<Author, String>,
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Book>().unwrap();
///
/// assert!(registry.contains(TypeId::of::<Author>()));
/// assert!(registry.get_with_collection("authors").is_some());
/// ```
pub struct TypeRegistry {
    type_meta_table: TypeIdMap<TypeMeta>,
    type_path_to_id: HashMap<&'static str, TypeId>,
    collection_to_id: HashMap<&'static str, TypeId>,
}

impl Default for TypeRegistry {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates an empty [`TypeRegistry`].
    #[inline]
    pub const fn new() -> Self {
        Self {
            type_meta_table: TypeIdMap::new(),
            type_path_to_id: HashMap::with_hasher(FixedHashState),
            collection_to_id: HashMap::with_hasher(FixedHashState),
        }
    }

    /// Registers `T` and every document reachable from it.
    #[inline]
    pub fn register<T: Document>(&mut self) -> Result<(), DecodeError> {
        self.register_info(T::document_info())
    }

    /// Registers the document described by `info` and every document reachable from it.
    pub fn register_info(&mut self, info: &'static DocumentInfo) -> Result<(), DecodeError> {
        if self.contains(info.type_id()) {
            return Ok(());
        }

        let mut pending = Vec::new();
        let mut seen = HashSet::with_hasher(FixedHashState);
        collect_documents(info, &mut pending, &mut seen, self);

        let mut metas = Vec::with_capacity(pending.len());
        for info in pending {
            match TypeMeta::new(info) {
                Ok(meta) => metas.push(meta),
                Err(err) => {
                    log::warn!("failed to register `{}`: {err}", info.type_path());
                    return Err(err);
                }
            }
        }

        for meta in metas {
            self.insert(meta);
        }
        Ok(())
    }

    fn insert(&mut self, meta: TypeMeta) {
        let info = meta.info();
        let type_id = info.type_id();
        self.type_meta_table.try_insert(type_id, || {
            log::trace!("registered document `{}`", info.type_path());
            meta
        });
        self.type_path_to_id.insert(info.type_path(), type_id);
        if let Some(collection) = info.collection()
            && let Some(previous) = self.collection_to_id.insert(collection, type_id)
            && previous != type_id
        {
            log::warn!(
                "collection `{collection}` is now mapped to `{}`",
                info.type_path()
            );
        }
    }

    /// Registers every document declared with `#[document(auto_register)]`.
    ///
    /// Returns `false` if the `auto_register` feature is disabled.
    #[inline]
    pub fn auto_register(&mut self) -> Result<bool, DecodeError> {
        register_submitted(self)
    }

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.type_meta_table.contains(&type_id)
    }

    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&TypeMeta> {
        self.type_meta_table.get(&type_id)
    }

    /// Returns the [`TypeMeta`] registered under the full type path.
    pub fn get_with_type_path(&self, type_path: &str) -> Option<&TypeMeta> {
        self.type_path_to_id
            .get(type_path)
            .and_then(|id| self.get(*id))
    }

    /// Returns the [`TypeMeta`] of the document declared with the given collection.
    pub fn get_with_collection(&self, collection: &str) -> Option<&TypeMeta> {
        self.collection_to_id
            .get(collection)
            .and_then(|id| self.get(*id))
    }

    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TypeMeta> {
        self.type_meta_table.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.type_meta_table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(feature = "auto_register")]
fn register_submitted(registry: &mut TypeRegistry) -> Result<bool, DecodeError> {
    crate::__macro_exports::auto_register::__register_types(registry)?;
    Ok(true)
}

#[cfg(not(feature = "auto_register"))]
fn register_submitted(_registry: &mut TypeRegistry) -> Result<bool, DecodeError> {
    Ok(false)
}

fn collect_documents(
    info: &'static DocumentInfo,
    out: &mut Vec<&'static DocumentInfo>,
    seen: &mut HashSet<TypeId>,
    registry: &TypeRegistry,
) {
    if registry.contains(info.type_id()) || !seen.insert(info.type_id()) {
        return;
    }
    out.push(info);
    for field in info.fields() {
        collect_from(field.type_info(), out, seen, registry);
    }
}

fn collect_from(
    info: &'static TypeInfo,
    out: &mut Vec<&'static DocumentInfo>,
    seen: &mut HashSet<TypeId>,
    registry: &TypeRegistry,
) {
    match info {
        TypeInfo::Opaque(_) => {}
        TypeInfo::Option(option) => collect_from(option.inner_info(), out, seen, registry),
        TypeInfo::List(list) => collect_from(list.item_info(), out, seen, registry),
        TypeInfo::Map(map) => collect_from(map.value_info(), out, seen, registry),
        TypeInfo::Reference(reference) => {
            collect_from(reference.target_info(), out, seen, registry);
        }
        TypeInfo::Document(document) => collect_documents(document, out, seen, registry),
    }
}

impl core::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.type_path_to_id.keys()).finish()
    }
}

// -----------------------------------------------------------------------------
// TypeRegistryArc

/// A shareable [`TypeRegistry`].
#[derive(Clone, Default)]
pub struct TypeRegistryArc {
    /// The wrapped [`TypeRegistry`].
    pub internal: Arc<RwLock<TypeRegistry>>,
}

impl TypeRegistryArc {
    #[inline]
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            internal: Arc::new(RwLock::new(registry)),
        }
    }

    /// Takes a read lock on the underlying [`TypeRegistry`].
    pub fn read(&self) -> RwLockReadGuard<'_, TypeRegistry> {
        self.internal.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a write lock on the underlying [`TypeRegistry`].
    pub fn write(&self) -> RwLockWriteGuard<'_, TypeRegistry> {
        self.internal
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `info` unless it already is.
    ///
    /// The read lock is tried first, so steady-state decoding never writes.
    pub fn ensure_registered(&self, info: &'static DocumentInfo) -> Result<(), DecodeError> {
        if self.read().contains(info.type_id()) {
            return Ok(());
        }
        self.write().register_info(info)
    }
}

impl core::fmt::Debug for TypeRegistryArc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&*self.read(), f)
    }
}
