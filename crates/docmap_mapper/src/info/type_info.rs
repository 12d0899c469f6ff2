use core::any::Any;
use core::fmt;

use crate::info::{DocumentInfo, ListInfo, MapInfo, OpaqueInfo, OptionInfo, ReferenceInfo, Type};

// -----------------------------------------------------------------------------
// TypeInfo

/// The shape of a mapped type.
///
/// - `Opaque`: a leaf value converted through serde.
/// - `Option`: a nullable wrapper, transparent to member markers.
/// - `List`: a sequence; `Vec<u8>` is treated as a byte sequence.
/// - `Map`: a string-keyed mapping.
/// - `Reference`: a [`DeferredRef`](crate::reference::DeferredRef) to another document.
/// - `Document`: a mapped document with named members.
pub enum TypeInfo {
    Opaque(OpaqueInfo),
    Option(OptionInfo),
    List(ListInfo),
    Map(MapInfo),
    Reference(ReferenceInfo),
    Document(DocumentInfo),
}

macro_rules! impl_cast_method {
    ($name:ident : $kind:ident => $info:ident) => {
        #[doc = concat!("Returns the inner [`", stringify!($info), "`] if this is a `", stringify!($kind), "`.")]
        #[inline]
        pub const fn $name(&self) -> Option<&$info> {
            match self {
                Self::$kind(info) => Some(info),
                _ => None,
            }
        }
    };
}

impl TypeInfo {
    impl_cast_method!(as_opaque: Opaque => OpaqueInfo);
    impl_cast_method!(as_option: Option => OptionInfo);
    impl_cast_method!(as_list: List => ListInfo);
    impl_cast_method!(as_map: Map => MapInfo);
    impl_cast_method!(as_reference: Reference => ReferenceInfo);
    impl_cast_method!(as_document: Document => DocumentInfo);

    /// Returns the underlying [`Type`].
    pub const fn ty(&self) -> &Type {
        match self {
            Self::Opaque(info) => info.ty(),
            Self::Option(info) => info.ty(),
            Self::List(info) => info.ty(),
            Self::Map(info) => info.ty(),
            Self::Reference(info) => info.ty(),
            Self::Document(info) => info.ty(),
        }
    }

    #[inline]
    pub const fn type_id(&self) -> core::any::TypeId {
        self.ty().id()
    }

    #[inline]
    pub const fn type_path(&self) -> &'static str {
        self.ty().path()
    }

    #[inline]
    pub fn type_is<T: core::any::Any>(&self) -> bool {
        self.ty().is::<T>()
    }

    /// A short name of the shape, used in diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Opaque(_) => "opaque",
            Self::Option(_) => "option",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Reference(_) => "reference",
            Self::Document(_) => "document",
        }
    }

    /// Returns `true` for a list of bytes.
    #[inline]
    pub fn is_byte_sequence(&self) -> bool {
        matches!(self, Self::List(list) if list.is_byte_sequence())
    }

    /// Returns `true` for a non-byte list or a map.
    #[inline]
    pub fn is_container(&self) -> bool {
        match self {
            Self::List(list) => !list.is_byte_sequence(),
            Self::Map(_) => true,
            _ => false,
        }
    }

    /// The value an absent member of this type takes when absent members are filled.
    ///
    /// Options are `None` and containers are empty. Leaves need a `Default`
    /// (see [`impl_opaque!`](crate::impl_opaque)). A reference gets an unbound
    /// reference with an empty key, and a document is built from the empty
    /// values of its members. Returns `None` where no such value exists.
    pub fn empty_value(&'static self) -> Option<Box<dyn Any>> {
        match self {
            Self::Opaque(info) => info.empty_value(),
            Self::Option(info) => Some(info.none()),
            Self::List(info) => info.from_items(Vec::new()).ok(),
            Self::Map(info) => info.from_entries(Vec::new()).ok(),
            Self::Reference(info) => info.empty_value(),
            Self::Document(info) => info.empty_value(),
        }
    }

    /// Strips one `Option` layer, reporting whether one was present.
    ///
    /// `Option<Option<T>>` only loses its outer layer.
    pub fn strip_option(&'static self) -> (&'static TypeInfo, bool) {
        match self {
            Self::Option(info) => (info.inner_info(), true),
            _ => (self, false),
        }
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opaque(info) => fmt::Debug::fmt(info, f),
            Self::Option(info) => fmt::Debug::fmt(info, f),
            Self::List(info) => fmt::Debug::fmt(info, f),
            Self::Map(info) => fmt::Debug::fmt(info, f),
            Self::Reference(info) => fmt::Debug::fmt(info, f),
            Self::Document(info) => fmt::Debug::fmt(info, f),
        }
    }
}
