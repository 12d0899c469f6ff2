use core::any::Any;

use crate::info::{ID_WIRE_NAME, Markers, Type, TypeInfo, Typed};

// -----------------------------------------------------------------------------
// NamedField

/// Information for a named document member.
///
/// # Examples
///
/// ```
/// use docmap_mapper::info::{Markers, NamedField};
///
/// let field = NamedField::new::<String>("id").with_markers(Markers::ID | Markers::OBJECT_ID);
///
/// assert_eq!(field.name(), "id");
/// assert_eq!(field.wire_name(), "_id");
/// assert!(field.type_is::<String>());
/// ```
#[derive(Clone, Debug)]
pub struct NamedField {
    ty: Type,
    name: &'static str,
    rename: Option<&'static str>,
    markers: Markers,
    // `TypeInfo` is created on first access; using a function pointer delays it.
    type_info: fn() -> &'static TypeInfo,
}

impl NamedField {
    /// Creates a new [`NamedField`] for the member `name` of type `T`.
    #[inline]
    pub fn new<T: Typed>(name: &'static str) -> Self {
        Self {
            ty: Type::of::<T>(),
            name,
            rename: None,
            markers: Markers::empty(),
            type_info: T::type_info,
        }
    }

    #[inline]
    pub const fn with_markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }

    #[inline]
    pub const fn with_rename(mut self, rename: &'static str) -> Self {
        self.rename = Some(rename);
        self
    }

    /// Returns the member name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub const fn rename(&self) -> Option<&'static str> {
        self.rename
    }

    /// The name the member is read from and written to.
    ///
    /// Identity members always use `_id`, ignoring any rename.
    #[inline]
    pub fn wire_name(&self) -> &'static str {
        if self.markers.contains(Markers::ID) {
            ID_WIRE_NAME
        } else {
            self.rename.unwrap_or(self.name)
        }
    }

    #[inline]
    pub const fn markers(&self) -> Markers {
        self.markers
    }

    #[inline]
    pub const fn has_marker(&self, marker: Markers) -> bool {
        self.markers.contains(marker)
    }

    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn type_is<T: Any>(&self) -> bool {
        self.ty.is::<T>()
    }

    /// Returns the member's [`TypeInfo`].
    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        (self.type_info)()
    }
}
