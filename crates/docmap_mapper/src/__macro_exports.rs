//! Items used by the code generated from `#[derive(Document)]`.

pub use crate::impls::NonGenericTypeInfoCell;
pub use crate::info::{DocumentInfo, Markers, NamedField, TypeInfo, Typed};
pub use crate::ops::DynamicDocument;
pub use crate::{Document, error::DecodeError};

/// Support for `#[document(auto_register)]`.
#[cfg(feature = "auto_register")]
pub mod auto_register {
    use crate::Document;
    use crate::error::DecodeError;
    use crate::registry::TypeRegistry;

    pub use inventory;

    /// A registration function submitted by the derive macro.
    pub struct __AutoRegisterFunc(pub fn(&mut TypeRegistry) -> Result<(), DecodeError>);

    inventory::collect!(__AutoRegisterFunc);

    #[inline]
    pub fn __register<T: Document>(registry: &mut TypeRegistry) -> Result<(), DecodeError> {
        registry.register::<T>()
    }

    /// Runs every submitted registration function.
    ///
    /// Stops at the first failure; earlier registrations are kept.
    pub fn __register_types(registry: &mut TypeRegistry) -> Result<(), DecodeError> {
        for func in inventory::iter::<__AutoRegisterFunc> {
            (func.0)(registry)?;
        }
        Ok(())
    }
}
