use core::any::{Any, type_name};

use crate::error::DecodeError;
use crate::info::DocumentInfo;

// -----------------------------------------------------------------------------
// DynamicDocument

/// Decoded members of a document, indexed in declaration order.
///
/// The driver fills the slots while reading; `#[derive(Document)]` takes
/// them out again in [`Document::from_dynamic`](crate::Document::from_dynamic).
pub struct DynamicDocument {
    info: &'static DocumentInfo,
    values: Vec<Option<Box<dyn Any>>>,
}

impl DynamicDocument {
    pub fn new(info: &'static DocumentInfo) -> Self {
        Self {
            info,
            values: (0..info.field_len()).map(|_| None).collect(),
        }
    }

    #[inline]
    pub fn info(&self) -> &'static DocumentInfo {
        self.info
    }

    /// Stores the member at `index`, replacing an earlier value.
    ///
    /// Indices outside the document are ignored.
    pub fn insert_boxed(&mut self, index: usize, value: Box<dyn Any>) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = Some(value);
        }
    }

    #[inline]
    pub fn insert<T: Any>(&mut self, index: usize, value: T) {
        self.insert_boxed(index, Box::new(value));
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(Some(_)))
    }

    /// Takes the member at `index` out as a `T`.
    ///
    /// # Errors
    ///
    /// [`DecodeError::MissingField`] if the slot is empty, or
    /// [`DecodeError::TypeMismatch`] if it holds another type.
    pub fn take<T: Any>(&mut self, index: usize) -> Result<T, DecodeError> {
        let value = self.values.get_mut(index).and_then(Option::take);
        match value {
            Some(value) => match value.downcast::<T>() {
                Ok(value) => Ok(*value),
                Err(_) => Err(DecodeError::TypeMismatch(type_name::<T>())),
            },
            None => Err(DecodeError::MissingField {
                field: self.info.field_at(index).map_or("<unknown>", |field| field.name()),
                type_path: self.info.type_path(),
            }),
        }
    }
}

impl core::fmt::Debug for DynamicDocument {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DynamicDocument")
            .field("ty", self.info.ty())
            .field("filled", &self.values.iter().filter(|v| v.is_some()).count())
            .finish()
    }
}
