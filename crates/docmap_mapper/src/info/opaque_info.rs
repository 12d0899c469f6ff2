use core::any::{Any, type_name};
use core::fmt;

use bson::Bson;
use serde_core::de::{DeserializeOwned, Deserializer, Error as _};
use serde_core::ser::Serialize;

use crate::error::EncodeError;
use crate::info::{Type, impl_type_fn};

type DeserializeFn =
    fn(&mut dyn erased_serde::Deserializer) -> Result<Box<dyn Any>, erased_serde::Error>;
type ToBsonFn = fn(&dyn Any) -> Result<Bson, EncodeError>;

// -----------------------------------------------------------------------------
// OpaqueInfo

/// Type information for a leaf value handled entirely by serde.
///
/// The concrete `Deserialize` implementation is stored behind an
/// [`erased_serde`] function pointer, so the driver can build a `T` from any
/// token source without knowing `T` at compile time.
pub struct OpaqueInfo {
    ty: Type,
    deserialize: DeserializeFn,
    to_bson: ToBsonFn,
    empty: Option<fn() -> Box<dyn Any>>,
}

impl OpaqueInfo {
    impl_type_fn!(ty);

    /// Creates the [`OpaqueInfo`] of `T`.
    pub fn new<T: Any + Serialize + DeserializeOwned>() -> Self {
        Self {
            ty: Type::of::<T>(),
            deserialize: deserialize_erased::<T>,
            to_bson: to_bson_erased::<T>,
            empty: None,
        }
    }

    /// Creates the [`OpaqueInfo`] of a `T` whose `Default` fills absent members.
    pub fn with_default<T: Any + Serialize + DeserializeOwned + Default>() -> Self {
        Self {
            empty: Some(empty_boxed::<T>),
            ..Self::new::<T>()
        }
    }

    #[inline]
    pub fn empty_value(&self) -> Option<Box<dyn Any>> {
        self.empty.map(|empty| empty())
    }

    /// Deserializes a boxed `T` from `deserializer`.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        &self,
        deserializer: D,
    ) -> Result<Box<dyn Any>, D::Error> {
        let mut erased = <dyn erased_serde::Deserializer>::erase(deserializer);
        (self.deserialize)(&mut erased).map_err(D::Error::custom)
    }

    /// Converts a `&T` behind `value` into a BSON value.
    #[inline]
    pub fn to_bson(&self, value: &dyn Any) -> Result<Bson, EncodeError> {
        (self.to_bson)(value)
    }
}

fn deserialize_erased<T: Any + DeserializeOwned>(
    deserializer: &mut dyn erased_serde::Deserializer,
) -> Result<Box<dyn Any>, erased_serde::Error> {
    Ok(Box::new(erased_serde::deserialize::<T>(deserializer)?))
}

fn empty_boxed<T: Any + Default>() -> Box<dyn Any> {
    Box::new(T::default())
}

fn to_bson_erased<T: Any + Serialize>(value: &dyn Any) -> Result<Bson, EncodeError> {
    match value.downcast_ref::<T>() {
        Some(value) => Ok(bson::to_bson(value)?),
        None => Err(EncodeError::TypeMismatch(type_name::<T>())),
    }
}

impl fmt::Debug for OpaqueInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueInfo").field("ty", &self.ty).finish()
    }
}
