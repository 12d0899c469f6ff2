//! Derives how each document member is read and written from its declared markers.

use crate::error::DecodeError;
use crate::id::IdRepr;
use crate::info::{Markers, NamedField, ReferenceInfo, TypeInfo};

// -----------------------------------------------------------------------------
// MemberKind

/// The role of a member within its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// The document identity, written as `_id`.
    Identity,
    /// A reference to another document.
    Reference,
    /// Any other member.
    Plain,
}

// -----------------------------------------------------------------------------
// Nesting

/// Where an override applies relative to the member's declared type.
///
/// Only one level of nesting is ever looked through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nesting {
    /// The member value itself.
    Bare,
    /// Each item of a list member.
    Sequence,
    /// Each value of a map member.
    Mapping,
}

// -----------------------------------------------------------------------------
// FieldCodec

/// A reference codec: the reference shape plus the key conversion, if any.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceCodec {
    info: &'static ReferenceInfo,
    key: Option<IdRepr>,
}

impl ReferenceCodec {
    #[inline]
    pub const fn new(info: &'static ReferenceInfo, key: Option<IdRepr>) -> Self {
        Self { info, key }
    }

    #[inline]
    pub const fn info(&self) -> &'static ReferenceInfo {
        self.info
    }

    /// The identifier conversion applied to the key, or `None` for the key type's default path.
    #[inline]
    pub const fn key(&self) -> Option<IdRepr> {
        self.key
    }
}

/// The reader/writer pair selected for a member.
#[derive(Debug, Clone, Copy)]
pub enum FieldCodec {
    /// The member type's own decoding path.
    Default,
    /// An identifier conversion.
    Identifier(IdRepr),
    /// The reference decoder, with an optional key conversion.
    Reference(ReferenceCodec),
}

impl FieldCodec {
    /// Returns `None` for [`FieldCodec::Default`].
    #[inline]
    pub const fn as_override(&self) -> Option<&Self> {
        match self {
            Self::Default => None,
            _ => Some(self),
        }
    }

    /// Returns `true` if this codec reads and writes values of the given type directly.
    pub fn applies_to(&self, info: &TypeInfo) -> bool {
        match self {
            Self::Default => false,
            Self::Identifier(repr) => IdRepr::of(info) == Some(*repr),
            Self::Reference(codec) => info.type_id() == codec.info.type_id(),
        }
    }
}

// -----------------------------------------------------------------------------
// FieldBinding

/// The resolved wire behavior of one document member.
#[derive(Debug, Clone)]
pub struct FieldBinding {
    index: usize,
    name: &'static str,
    wire_name: &'static str,
    type_info: &'static TypeInfo,
    kind: MemberKind,
    codec: FieldCodec,
    nesting: Nesting,
    optional: bool,
}

impl FieldBinding {
    /// Resolves the binding of the member at `index` of `owner`.
    ///
    /// # Errors
    ///
    /// [`DecodeError::UnsupportedIdentifierType`] if the member is marked
    /// `object_id` and neither it nor its single level of list or map items
    /// has an identifier conversion.
    pub fn resolve(
        index: usize,
        field: &NamedField,
        owner: &'static str,
    ) -> Result<Self, DecodeError> {
        let info = field.type_info();
        let (inner, optional) = info.strip_option();

        let (codec, nesting) = if field.has_marker(Markers::OBJECT_ID) {
            match resolve_override(info) {
                Some(found) => found,
                None if is_nested_container(inner) => {
                    log::trace!(
                        "`{owner}::{}` is nested too deeply for an identifier override",
                        field.name()
                    );
                    (FieldCodec::Default, Nesting::Bare)
                }
                None => {
                    return Err(DecodeError::UnsupportedIdentifierType {
                        field: field.name(),
                        type_path: owner,
                    });
                }
            }
        } else {
            match resolve_override(info) {
                Some((FieldCodec::Reference(codec), nesting)) => (
                    FieldCodec::Reference(ReferenceCodec::new(codec.info, None)),
                    nesting,
                ),
                _ => (FieldCodec::Default, Nesting::Bare),
            }
        };

        let kind = if field.has_marker(Markers::ID) {
            MemberKind::Identity
        } else if matches!(codec, FieldCodec::Reference(_)) {
            MemberKind::Reference
        } else {
            MemberKind::Plain
        };

        Ok(Self {
            index,
            name: field.name(),
            wire_name: field.wire_name(),
            type_info: info,
            kind,
            codec,
            nesting,
            optional,
        })
    }

    /// Index of the member in declaration order.
    #[inline]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The Rust name of the member.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub const fn wire_name(&self) -> &'static str {
        self.wire_name
    }

    /// The declared type of the member.
    #[inline]
    pub const fn type_info(&self) -> &'static TypeInfo {
        self.type_info
    }

    #[inline]
    pub const fn kind(&self) -> MemberKind {
        self.kind
    }

    #[inline]
    pub const fn is_identity(&self) -> bool {
        matches!(self.kind, MemberKind::Identity)
    }

    #[inline]
    pub const fn codec(&self) -> &FieldCodec {
        &self.codec
    }

    #[inline]
    pub const fn nesting(&self) -> Nesting {
        self.nesting
    }

    /// Whether the member is declared as `Option<_>`.
    #[inline]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Finds the codec a marked member needs, looking through `Option` and one list or map level.
pub fn resolve_override(info: &'static TypeInfo) -> Option<(FieldCodec, Nesting)> {
    let (inner, _) = info.strip_option();
    if let Some(codec) = resolve_direct(inner) {
        return Some((codec, Nesting::Bare));
    }
    match inner {
        TypeInfo::List(list) if !list.is_byte_sequence() => {
            let (item, _) = list.item_info().strip_option();
            resolve_direct(item).map(|codec| (codec, Nesting::Sequence))
        }
        TypeInfo::Map(map) => {
            let (value, _) = map.value_info().strip_option();
            resolve_direct(value).map(|codec| (codec, Nesting::Mapping))
        }
        _ => None,
    }
}

fn resolve_direct(info: &'static TypeInfo) -> Option<FieldCodec> {
    match info {
        TypeInfo::Reference(reference) => Some(FieldCodec::Reference(ReferenceCodec::new(
            reference,
            IdRepr::of(reference.key_info()),
        ))),
        _ => IdRepr::of(info).map(FieldCodec::Identifier),
    }
}

fn is_nested_container(info: &'static TypeInfo) -> bool {
    match info {
        TypeInfo::List(list) if !list.is_byte_sequence() => {
            list.item_info().strip_option().0.is_container()
        }
        TypeInfo::Map(map) => map.value_info().strip_option().0.is_container(),
        _ => false,
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{FieldBinding, FieldCodec, MemberKind, Nesting};
    use crate::error::DecodeError;
    use crate::id::{IdRepr, ObjectId};
    use crate::info::{Markers, NamedField};

    fn bind(field: NamedField) -> Result<FieldBinding, DecodeError> {
        FieldBinding::resolve(0, &field, "Owner")
    }

    fn marked<T: crate::info::Typed>() -> Result<FieldBinding, DecodeError> {
        bind(NamedField::new::<T>("field").with_markers(Markers::OBJECT_ID))
    }

    #[test]
    fn identity_uses_id_wire_name() {
        let binding = bind(
            NamedField::new::<String>("key")
                .with_rename("ignored")
                .with_markers(Markers::ID | Markers::OBJECT_ID),
        )
        .unwrap();
        assert_eq!(binding.wire_name(), "_id");
        assert_eq!(binding.kind(), MemberKind::Identity);
        assert!(matches!(binding.codec(), FieldCodec::Identifier(IdRepr::Text)));
    }

    #[test]
    fn rename_applies_to_plain_members() {
        let binding = bind(NamedField::new::<i32>("count").with_rename("n")).unwrap();
        assert_eq!(binding.wire_name(), "n");
        assert!(matches!(binding.codec(), FieldCodec::Default));
    }

    #[test]
    fn option_is_transparent() {
        let binding = marked::<Option<Vec<u8>>>().unwrap();
        assert!(binding.is_optional());
        assert!(matches!(binding.codec(), FieldCodec::Identifier(IdRepr::Bytes)));
        assert_eq!(binding.nesting(), Nesting::Bare);
    }

    #[test]
    fn one_level_of_items_is_looked_through() {
        let list = marked::<Vec<String>>().unwrap();
        assert_eq!(list.nesting(), Nesting::Sequence);
        assert!(matches!(list.codec(), FieldCodec::Identifier(IdRepr::Text)));

        let map = marked::<HashMap<String, Option<String>>>().unwrap();
        assert_eq!(map.nesting(), Nesting::Mapping);
    }

    #[test]
    fn nested_containers_get_no_override() {
        let binding = marked::<Vec<Vec<String>>>().unwrap();
        assert!(matches!(binding.codec(), FieldCodec::Default));
    }

    #[test]
    fn native_ids_need_no_conversion_but_are_accepted() {
        let binding = marked::<ObjectId>().unwrap();
        assert!(matches!(binding.codec(), FieldCodec::Identifier(IdRepr::Native)));
    }

    #[test]
    fn unconvertible_types_are_rejected() {
        assert!(matches!(
            marked::<i64>(),
            Err(DecodeError::UnsupportedIdentifierType { field: "field", type_path: "Owner" })
        ));
        assert!(matches!(
            marked::<Vec<i64>>(),
            Err(DecodeError::UnsupportedIdentifierType { .. })
        ));
    }
}
