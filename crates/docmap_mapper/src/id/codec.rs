use core::any::{Any, type_name};
use core::fmt;

use bson::Bson;
use bson::oid::ObjectId;

use crate::error::{DecodeError, EncodeError};
use crate::info::TypeInfo;
use crate::stream::Value;

// -----------------------------------------------------------------------------
// IdRepr

/// The in-memory representation of an identifier.
///
/// - `Native`: a [`ObjectId`], passed through unchanged.
/// - `Text`: a `String` holding the 24 character hex form.
/// - `Bytes`: a `Vec<u8>` holding the 12 raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdRepr {
    Native,
    Text,
    Bytes,
}

impl IdRepr {
    /// Returns the representation a member of the given type uses, if any.
    ///
    /// Only `String`, `Vec<u8>` and [`ObjectId`] have an identifier conversion.
    pub fn of(info: &TypeInfo) -> Option<Self> {
        if info.type_is::<ObjectId>() {
            Some(Self::Native)
        } else if info.type_is::<String>() {
            Some(Self::Text)
        } else if info.is_byte_sequence() {
            Some(Self::Bytes)
        } else {
            None
        }
    }
}

impl fmt::Display for IdRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.pad("a native object id"),
            Self::Text => f.pad("text"),
            Self::Bytes => f.pad("a byte sequence"),
        }
    }
}

// -----------------------------------------------------------------------------
// Identifier

/// An application-facing identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Native(ObjectId),
    Text(String),
    Bytes(Vec<u8>),
}

impl Identifier {
    #[inline]
    pub const fn repr(&self) -> IdRepr {
        match self {
            Self::Native(_) => IdRepr::Native,
            Self::Text(_) => IdRepr::Text,
            Self::Bytes(_) => IdRepr::Bytes,
        }
    }

    /// Moves the identifier into a box of its in-memory type.
    pub fn into_any(self) -> Box<dyn Any> {
        match self {
            Self::Native(id) => Box::new(id),
            Self::Text(text) => Box::new(text),
            Self::Bytes(bytes) => Box::new(bytes),
        }
    }
}

impl From<ObjectId> for Identifier {
    #[inline]
    fn from(id: ObjectId) -> Self {
        Self::Native(id)
    }
}

// -----------------------------------------------------------------------------
// IdCodec

/// Converts identifiers between their wire form and their in-memory form.
///
/// ```
/// use docmap_mapper::id::{IdCodec, IdRepr, Identifier, ObjectId};
/// use docmap_mapper::stream::Value;
///
/// let oid = ObjectId::parse_str("5f0c6d2b9a1e4c3b2a190817").unwrap();
///
/// let text = IdCodec::decode(&Value::ObjectId(oid), IdRepr::Text).unwrap();
/// assert_eq!(text, Identifier::Text("5f0c6d2b9a1e4c3b2a190817".to_owned()));
///
/// let wire = IdCodec::encode(&text).unwrap();
/// assert_eq!(wire, bson::Bson::ObjectId(oid));
/// ```
pub struct IdCodec;

impl IdCodec {
    /// Converts an application identifier into the native wire value.
    ///
    /// Text must be a 24 character hex string and bytes must be exactly 12 long.
    pub fn encode(id: &Identifier) -> Result<Bson, EncodeError> {
        let oid = match id {
            Identifier::Native(oid) => *oid,
            Identifier::Text(text) => parse_hex(text).map_err(EncodeError::InvalidIdentifier)?,
            Identifier::Bytes(bytes) => from_bytes(bytes).map_err(EncodeError::InvalidIdentifier)?,
        };
        Ok(Bson::ObjectId(oid))
    }

    /// Converts a wire value into the requested representation.
    pub fn decode(wire: &Value, repr: IdRepr) -> Result<Identifier, DecodeError> {
        let wire = wire.normalized();
        let wire = wire.as_ref();
        match repr {
            IdRepr::Native => match wire {
                Value::ObjectId(oid) => Ok(Identifier::Native(*oid)),
                Value::String(text) => parse_hex(text)
                    .map(Identifier::Native)
                    .map_err(DecodeError::InvalidIdentifier),
                other => Err(mismatch(repr, other)),
            },
            IdRepr::Text => match wire {
                Value::ObjectId(oid) => Ok(Identifier::Text(oid.to_hex())),
                Value::String(text) => parse_hex(text)
                    .map(|oid| Identifier::Text(oid.to_hex()))
                    .map_err(DecodeError::InvalidIdentifier),
                other => Err(mismatch(repr, other)),
            },
            IdRepr::Bytes => match wire {
                Value::ObjectId(oid) => Ok(Identifier::Bytes(oid.bytes().to_vec())),
                Value::String(text) => parse_hex(text)
                    .map(|oid| Identifier::Bytes(oid.bytes().to_vec()))
                    .map_err(DecodeError::InvalidIdentifier),
                Value::Binary(bytes) => from_bytes(bytes)
                    .map(|oid| Identifier::Bytes(oid.bytes().to_vec()))
                    .map_err(DecodeError::InvalidIdentifier),
                other => Err(mismatch(repr, other)),
            },
        }
    }

    /// Decodes a wire value into a boxed `String`, `Vec<u8>` or [`ObjectId`].
    #[inline]
    pub(crate) fn decode_any(wire: &Value, repr: IdRepr) -> Result<Box<dyn Any>, DecodeError> {
        Self::decode(wire, repr).map(Identifier::into_any)
    }

    /// Encodes a `&String`, `&Vec<u8>` or `&ObjectId` behind `value`.
    pub(crate) fn encode_any(value: &dyn Any, repr: IdRepr) -> Result<Bson, EncodeError> {
        let id = match repr {
            IdRepr::Native => value
                .downcast_ref::<ObjectId>()
                .map(|oid| Identifier::Native(*oid)),
            IdRepr::Text => value
                .downcast_ref::<String>()
                .map(|text| Identifier::Text(text.clone())),
            IdRepr::Bytes => value
                .downcast_ref::<Vec<u8>>()
                .map(|bytes| Identifier::Bytes(bytes.clone())),
        };
        match id {
            Some(id) => Self::encode(&id),
            None => Err(EncodeError::TypeMismatch(match repr {
                IdRepr::Native => type_name::<ObjectId>(),
                IdRepr::Text => type_name::<String>(),
                IdRepr::Bytes => type_name::<Vec<u8>>(),
            })),
        }
    }
}

fn parse_hex(text: &str) -> Result<ObjectId, String> {
    ObjectId::parse_str(text).map_err(|err| format!("`{text}`: {err}"))
}

fn from_bytes(bytes: &[u8]) -> Result<ObjectId, String> {
    match <[u8; 12]>::try_from(bytes) {
        Ok(bytes) => Ok(ObjectId::from_bytes(bytes)),
        Err(_) => Err(format!("expected 12 bytes, found {}", bytes.len())),
    }
}

#[inline]
fn mismatch(expected: IdRepr, found: &Value) -> DecodeError {
    DecodeError::IdentifierTypeMismatch {
        expected,
        found: found.kind(),
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use bson::Bson;
    use bson::oid::ObjectId;

    use super::{IdCodec, IdRepr, Identifier};
    use crate::error::{DecodeError, EncodeError};
    use crate::info::Typed;
    use crate::stream::Value;

    const HEX: &str = "64b7f0c2a1d3e4f5a6b7c8d9";

    fn oid() -> ObjectId {
        ObjectId::parse_str(HEX).unwrap()
    }

    #[test]
    fn repr_of_member_types() {
        assert_eq!(IdRepr::of(String::type_info()), Some(IdRepr::Text));
        assert_eq!(IdRepr::of(<Vec<u8>>::type_info()), Some(IdRepr::Bytes));
        assert_eq!(IdRepr::of(ObjectId::type_info()), Some(IdRepr::Native));
        assert_eq!(IdRepr::of(i64::type_info()), None);
        assert_eq!(IdRepr::of(<Vec<u32>>::type_info()), None);
    }

    #[test]
    fn text_round_trip() {
        let text = IdCodec::decode(&Value::ObjectId(oid()), IdRepr::Text).unwrap();
        assert_eq!(text, Identifier::Text(HEX.to_owned()));
        assert_eq!(IdCodec::encode(&text).unwrap(), Bson::ObjectId(oid()));
    }

    #[test]
    fn bytes_round_trip() {
        let bytes = IdCodec::decode(&Value::ObjectId(oid()), IdRepr::Bytes).unwrap();
        assert_eq!(bytes, Identifier::Bytes(oid().bytes().to_vec()));
        assert_eq!(IdCodec::encode(&bytes).unwrap(), Bson::ObjectId(oid()));
    }

    #[test]
    fn native_passes_through() {
        let native = IdCodec::decode(&Value::ObjectId(oid()), IdRepr::Native).unwrap();
        assert_eq!(native, Identifier::Native(oid()));

        let wire = IdCodec::encode(&native).unwrap();
        assert_eq!(wire, Bson::ObjectId(oid()));
        assert_eq!(IdCodec::decode(&Value::Raw(wire), IdRepr::Native).unwrap(), native);
    }

    #[test]
    fn raw_values_are_normalized() {
        let raw = Value::Raw(Bson::ObjectId(oid()));
        let text = IdCodec::decode(&raw, IdRepr::Text).unwrap();
        assert_eq!(text, Identifier::Text(HEX.to_owned()));
    }

    #[test]
    fn binary_cannot_become_text() {
        let err = IdCodec::decode(&Value::Binary(oid().bytes().to_vec()), IdRepr::Text);
        assert!(matches!(
            err,
            Err(DecodeError::IdentifierTypeMismatch { expected: IdRepr::Text, .. })
        ));
    }

    #[test]
    fn twelve_byte_binary_becomes_bytes() {
        let raw = oid().bytes().to_vec();
        let bytes = IdCodec::decode(&Value::Binary(raw.clone()), IdRepr::Bytes).unwrap();
        assert_eq!(bytes, Identifier::Bytes(raw));
    }

    #[test]
    fn rejects_malformed_identifiers() {
        assert!(matches!(
            IdCodec::encode(&Identifier::Text("not-an-id".to_owned())),
            Err(EncodeError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            IdCodec::encode(&Identifier::Bytes(vec![1, 2, 3])),
            Err(EncodeError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            IdCodec::decode(&Value::String("zz".to_owned()), IdRepr::Text),
            Err(DecodeError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            IdCodec::decode(&Value::Int32(7), IdRepr::Native),
            Err(DecodeError::IdentifierTypeMismatch { .. })
        ));
    }

    #[test]
    fn erased_helpers_match_typed_ones() {
        let boxed = IdCodec::decode_any(&Value::ObjectId(oid()), IdRepr::Text).unwrap();
        let text = boxed.downcast::<String>().unwrap();
        assert_eq!(*text, HEX);
        assert_eq!(
            IdCodec::encode_any(&*text, IdRepr::Text).unwrap(),
            Bson::ObjectId(oid())
        );
        assert!(matches!(
            IdCodec::encode_any(&5_i32, IdRepr::Text),
            Err(EncodeError::TypeMismatch(_))
        ));
    }
}
