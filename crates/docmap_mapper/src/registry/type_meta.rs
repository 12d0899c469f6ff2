use core::any::TypeId;

use crate::error::DecodeError;
use crate::info::{DocumentInfo, Type};
use crate::registry::FieldBinding;
use crate::utils::{FixedHashState, HashMap};

// -----------------------------------------------------------------------------
// TypeMeta

/// The registered form of a document type: its info plus the resolved member bindings.
pub struct TypeMeta {
    info: &'static DocumentInfo,
    bindings: Box<[FieldBinding]>,
    wire_index: HashMap<&'static str, usize>,
}

impl TypeMeta {
    /// Resolves the bindings of every member of `info`.
    ///
    /// # Errors
    ///
    /// Fails if a member has an unsupported marker, or if two members share a wire name.
    pub fn new(info: &'static DocumentInfo) -> Result<Self, DecodeError> {
        let mut bindings = Vec::with_capacity(info.field_len());
        let mut wire_index = HashMap::with_capacity_and_hasher(info.field_len(), FixedHashState);

        for (index, field) in info.fields().iter().enumerate() {
            let binding = FieldBinding::resolve(index, field, info.type_path())?;
            if wire_index.insert(binding.wire_name(), index).is_some() {
                return Err(DecodeError::DuplicateWireName {
                    name: binding.wire_name(),
                    type_path: info.type_path(),
                });
            }
            bindings.push(binding);
        }

        Ok(Self {
            info,
            bindings: bindings.into_boxed_slice(),
            wire_index,
        })
    }

    #[inline]
    pub const fn info(&self) -> &'static DocumentInfo {
        self.info
    }

    #[inline]
    pub const fn ty(&self) -> &Type {
        self.info.ty()
    }

    #[inline]
    pub const fn type_id(&self) -> TypeId {
        self.info.type_id()
    }

    /// Bindings in declaration order.
    #[inline]
    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    #[inline]
    pub fn binding_at(&self, index: usize) -> Option<&FieldBinding> {
        self.bindings.get(index)
    }

    /// Returns the binding of the member read from `wire_name`.
    #[inline]
    pub fn binding_for_wire(&self, wire_name: &str) -> Option<&FieldBinding> {
        self.wire_index
            .get(wire_name)
            .and_then(|index| self.bindings.get(*index))
    }

    /// Returns the binding of the identity member.
    pub fn identity(&self) -> Option<&FieldBinding> {
        self.bindings.iter().find(|binding| binding.is_identity())
    }
}

impl core::fmt::Debug for TypeMeta {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeMeta")
            .field("ty", self.ty())
            .field("bindings", &self.bindings)
            .finish()
    }
}
