use core::any::Any;

use crate::error::DecodeError;
use crate::info::{DocumentInfo, TypeInfo, Typed};
use crate::ops::DynamicDocument;

// -----------------------------------------------------------------------------
// Document

/// A type mapped to a stored document.
///
/// Implemented by `#[derive(Document)]`; implementing it by hand is possible
/// but rarely needed.
pub trait Document: Typed + Sized {
    /// Assembles `Self` from decoded members.
    fn from_dynamic(document: DynamicDocument) -> Result<Self, DecodeError>;

    /// Borrows the member at `index`, in declaration order.
    fn field_at(&self, index: usize) -> Option<&dyn Any>;

    /// Returns the [`DocumentInfo`] of `Self`.
    ///
    /// # Panics
    ///
    /// If the [`TypeInfo`] of `Self` is not a document.
    fn document_info() -> &'static DocumentInfo {
        match Self::type_info() {
            TypeInfo::Document(info) => info,
            other => panic!(
                "`{}` implements `Document` but its type info is {}",
                other.type_path(),
                other.kind()
            ),
        }
    }
}
