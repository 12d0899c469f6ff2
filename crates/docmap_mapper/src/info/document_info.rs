use core::any::Any;
use core::fmt;

use crate::Document;
use crate::error::DecodeError;
use crate::info::{Markers, NamedField, Type, impl_type_fn};
use crate::ops::DynamicDocument;

// -----------------------------------------------------------------------------
// DocumentInfo

/// Type information for a mapped document.
///
/// # Examples
///
/// ```
/// use docmap_mapper::{Document, info::Typed};
///
/// #[derive(Document)]
/// #[document(collection = "users")]
/// struct User {
///     #[document(id)]
///     id: String,
///     name: String,
/// }
///
/// let info = User::type_info().as_document().unwrap();
///
/// assert_eq!(info.collection(), Some("users"));
/// assert_eq!(info.field_len(), 2);
/// assert_eq!(info.field("name").unwrap().wire_name(), "name");
/// ```
pub struct DocumentInfo {
    ty: Type,
    collection: Option<&'static str>,
    fields: Box<[NamedField]>,
    from_dynamic: fn(DynamicDocument) -> Result<Box<dyn Any>, DecodeError>,
    field_at: for<'a> fn(&'a dyn Any, usize) -> Option<&'a dyn Any>,
}

impl DocumentInfo {
    impl_type_fn!(ty);

    /// Creates the [`DocumentInfo`] of `T` with the given members, in declaration order.
    pub fn new<T: Document>(fields: &[NamedField]) -> Self {
        Self {
            ty: Type::of::<T>(),
            collection: None,
            fields: fields.to_vec().into_boxed_slice(),
            from_dynamic: document_from_dynamic::<T>,
            field_at: document_field_at::<T>,
        }
    }

    #[inline]
    pub const fn with_collection(mut self, collection: &'static str) -> Self {
        self.collection = Some(collection);
        self
    }

    /// The default collection name declared on the type.
    #[inline]
    pub const fn collection(&self) -> Option<&'static str> {
        self.collection
    }

    #[inline]
    pub fn fields(&self) -> &[NamedField] {
        &self.fields
    }

    #[inline]
    pub fn field_len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn field_at(&self, index: usize) -> Option<&NamedField> {
        self.fields.get(index)
    }

    /// Returns the member with the given Rust name.
    pub fn field(&self, name: &str) -> Option<&NamedField> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Returns the identity member and its index.
    pub fn id_field(&self) -> Option<(usize, &NamedField)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, field)| field.has_marker(Markers::ID))
    }

    /// Builds a boxed document from decoded members.
    #[inline]
    pub fn build(&self, document: DynamicDocument) -> Result<Box<dyn Any>, DecodeError> {
        (self.from_dynamic)(document)
    }

    /// Builds a document whose members all take their empty value.
    ///
    /// `None` if some member has no empty value.
    pub fn empty_value(&'static self) -> Option<Box<dyn Any>> {
        let mut document = DynamicDocument::new(self);
        for (index, field) in self.fields.iter().enumerate() {
            document.insert_boxed(index, field.type_info().empty_value()?);
        }
        self.build(document).ok()
    }

    /// Borrows the member at `index` of a document value.
    #[inline]
    pub fn get_field<'a>(&self, value: &'a dyn Any, index: usize) -> Option<&'a dyn Any> {
        (self.field_at)(value, index)
    }
}

fn document_from_dynamic<T: Document>(
    document: DynamicDocument,
) -> Result<Box<dyn Any>, DecodeError> {
    Ok(Box::new(T::from_dynamic(document)?))
}

fn document_field_at<T: Document>(value: &dyn Any, index: usize) -> Option<&dyn Any> {
    value.downcast_ref::<T>()?.field_at(index)
}

impl fmt::Debug for DocumentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentInfo")
            .field("ty", &self.ty)
            .field("collection", &self.collection)
            .field("fields", &self.fields)
            .finish()
    }
}

