use core::any::{Any, type_name};
use core::fmt;
use std::collections::{BTreeMap, HashMap};

use crate::error::DecodeError;
use crate::info::{Type, TypeInfo, Typed, impl_type_fn};

type InfoFn = fn() -> &'static TypeInfo;

// -----------------------------------------------------------------------------
// OptionInfo

/// Type information for `Option<T>`.
pub struct OptionInfo {
    ty: Type,
    inner: InfoFn,
    none: fn() -> Box<dyn Any>,
    some: fn(Box<dyn Any>) -> Result<Box<dyn Any>, DecodeError>,
    get: for<'a> fn(&'a dyn Any) -> Option<&'a dyn Any>,
}

impl OptionInfo {
    impl_type_fn!(ty);

    /// Creates the [`OptionInfo`] of `Option<T>`.
    pub fn new<T: Typed>() -> Self {
        Self {
            ty: Type::of::<Option<T>>(),
            inner: T::type_info,
            none: option_none::<T>,
            some: option_some::<T>,
            get: option_get::<T>,
        }
    }

    /// Returns the [`TypeInfo`] of the wrapped type.
    #[inline]
    pub fn inner_info(&self) -> &'static TypeInfo {
        (self.inner)()
    }

    /// Returns a boxed `None`.
    #[inline]
    pub fn none(&self) -> Box<dyn Any> {
        (self.none)()
    }

    /// Wraps a boxed `T` into a boxed `Some(T)`.
    #[inline]
    pub fn some(&self, value: Box<dyn Any>) -> Result<Box<dyn Any>, DecodeError> {
        (self.some)(value)
    }

    /// Returns the wrapped value of a `&Option<T>`, if any.
    #[inline]
    pub fn get<'a>(&self, value: &'a dyn Any) -> Option<&'a dyn Any> {
        (self.get)(value)
    }
}

fn option_none<T: Any>() -> Box<dyn Any> {
    Box::new(None::<T>)
}

fn option_some<T: Any>(value: Box<dyn Any>) -> Result<Box<dyn Any>, DecodeError> {
    match value.downcast::<T>() {
        Ok(value) => Ok(Box::new(Some(*value))),
        Err(_) => Err(DecodeError::TypeMismatch(type_name::<T>())),
    }
}

fn option_get<T: Any>(value: &dyn Any) -> Option<&dyn Any> {
    value
        .downcast_ref::<Option<T>>()
        .and_then(Option::as_ref)
        .map(|value| value as &dyn Any)
}

impl fmt::Debug for OptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionInfo").field("ty", &self.ty).finish()
    }
}

// -----------------------------------------------------------------------------
// ListInfo

/// Type information for `Vec<T>`.
pub struct ListInfo {
    ty: Type,
    item_ty: Type,
    item: InfoFn,
    from_items: fn(Vec<Box<dyn Any>>) -> Result<Box<dyn Any>, DecodeError>,
    items: for<'a> fn(&'a dyn Any) -> Vec<&'a dyn Any>,
}

impl ListInfo {
    impl_type_fn!(ty);

    /// Creates the [`ListInfo`] of `Vec<T>`.
    pub fn new<T: Typed>() -> Self {
        Self {
            ty: Type::of::<Vec<T>>(),
            item_ty: Type::of::<T>(),
            item: T::type_info,
            from_items: list_from_items::<T>,
            items: list_items::<T>,
        }
    }

    #[inline]
    pub fn item_ty(&self) -> &Type {
        &self.item_ty
    }

    #[inline]
    pub fn item_info(&self) -> &'static TypeInfo {
        (self.item)()
    }

    /// `Vec<u8>` is read and written as a binary value, not as an array.
    #[inline]
    pub fn is_byte_sequence(&self) -> bool {
        self.item_ty.is::<u8>()
    }

    /// Collects boxed items into a boxed `Vec<T>`.
    #[inline]
    pub fn from_items(&self, items: Vec<Box<dyn Any>>) -> Result<Box<dyn Any>, DecodeError> {
        (self.from_items)(items)
    }

    /// Borrows the items of a `&Vec<T>`.
    #[inline]
    pub fn items<'a>(&self, value: &'a dyn Any) -> Vec<&'a dyn Any> {
        (self.items)(value)
    }
}

fn list_from_items<T: Any>(items: Vec<Box<dyn Any>>) -> Result<Box<dyn Any>, DecodeError> {
    let mut list = Vec::<T>::with_capacity(items.len());
    for item in items {
        match item.downcast::<T>() {
            Ok(item) => list.push(*item),
            Err(_) => return Err(DecodeError::TypeMismatch(type_name::<T>())),
        }
    }
    Ok(Box::new(list))
}

fn list_items<T: Any>(value: &dyn Any) -> Vec<&dyn Any> {
    match value.downcast_ref::<Vec<T>>() {
        Some(list) => list.iter().map(|item| item as &dyn Any).collect(),
        None => Vec::new(),
    }
}

impl fmt::Debug for ListInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListInfo")
            .field("ty", &self.ty)
            .field("item", &self.item_ty)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// MapStorage

/// A map with `String` keys that can be used as a document member.
pub trait MapStorage: Any + Send + Sync {
    type Value: Typed;

    fn from_entries(entries: Vec<(String, Self::Value)>) -> Self;

    fn entries(&self) -> Vec<(&str, &Self::Value)>;
}

impl<V: Typed> MapStorage for HashMap<String, V> {
    type Value = V;

    fn from_entries(entries: Vec<(String, V)>) -> Self {
        entries.into_iter().collect()
    }

    fn entries(&self) -> Vec<(&str, &V)> {
        let mut entries: Vec<_> = self.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl<V: Typed> MapStorage for BTreeMap<String, V> {
    type Value = V;

    fn from_entries(entries: Vec<(String, V)>) -> Self {
        entries.into_iter().collect()
    }

    fn entries(&self) -> Vec<(&str, &V)> {
        self.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }
}

// -----------------------------------------------------------------------------
// MapInfo

/// Type information for a string-keyed map.
pub struct MapInfo {
    ty: Type,
    value_ty: Type,
    value: InfoFn,
    from_entries: fn(Vec<(String, Box<dyn Any>)>) -> Result<Box<dyn Any>, DecodeError>,
    entries: for<'a> fn(&'a dyn Any) -> Vec<(&'a str, &'a dyn Any)>,
}

impl MapInfo {
    impl_type_fn!(ty);

    /// Creates the [`MapInfo`] of `M`.
    pub fn new<M: MapStorage>() -> Self {
        Self {
            ty: Type::of::<M>(),
            value_ty: Type::of::<M::Value>(),
            value: <M::Value as Typed>::type_info,
            from_entries: map_from_entries::<M>,
            entries: map_entries::<M>,
        }
    }

    #[inline]
    pub fn value_ty(&self) -> &Type {
        &self.value_ty
    }

    #[inline]
    pub fn value_info(&self) -> &'static TypeInfo {
        (self.value)()
    }

    /// Collects boxed entries into a boxed map.
    #[inline]
    pub fn from_entries(
        &self,
        entries: Vec<(String, Box<dyn Any>)>,
    ) -> Result<Box<dyn Any>, DecodeError> {
        (self.from_entries)(entries)
    }

    /// Borrows the entries of a map, in a stable order.
    #[inline]
    pub fn entries<'a>(&self, value: &'a dyn Any) -> Vec<(&'a str, &'a dyn Any)> {
        (self.entries)(value)
    }
}

fn map_from_entries<M: MapStorage>(
    entries: Vec<(String, Box<dyn Any>)>,
) -> Result<Box<dyn Any>, DecodeError> {
    let mut typed = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        match value.downcast::<M::Value>() {
            Ok(value) => typed.push((key, *value)),
            Err(_) => return Err(DecodeError::TypeMismatch(type_name::<M::Value>())),
        }
    }
    Ok(Box::new(M::from_entries(typed)))
}

fn map_entries<M: MapStorage>(value: &dyn Any) -> Vec<(&str, &dyn Any)> {
    match value.downcast_ref::<M>() {
        Some(map) => map
            .entries()
            .into_iter()
            .map(|(key, value)| (key, value as &dyn Any))
            .collect(),
        None => Vec::new(),
    }
}

impl fmt::Debug for MapInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapInfo")
            .field("ty", &self.ty)
            .field("value", &self.value_ty)
            .finish()
    }
}
