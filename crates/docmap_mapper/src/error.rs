//! Error types for decoding, encoding and fetching documents.

use core::fmt::Display;

use thiserror::Error;

use crate::id::IdRepr;

// -----------------------------------------------------------------------------
// DecodeError

/// An error raised while reading a document or one of its members.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// A member carries the `object_id` marker but its type has no identifier conversion.
    #[error("field `{field}` of `{type_path}` is marked as an object id but no identifier conversion exists for its type")]
    UnsupportedIdentifierType {
        field: &'static str,
        type_path: &'static str,
    },
    /// A reference was neither null, a db-ref value, nor an object.
    #[error("malformed reference: {0}")]
    MalformedReference(String),
    /// A reference carried an identifier but no target collection name.
    #[error("reference has an identifier but no `$ref` collection name")]
    MissingReferenceTarget,
    /// A reference was decoded by a reader that is not bound to a collection.
    #[error("references can only be decoded by a reader bound to a collection")]
    UnsupportedReferenceContext,
    /// The wire identifier kind cannot be represented by the requested in-memory type.
    #[error("identifier of kind `{found}` cannot be represented as {expected}")]
    IdentifierTypeMismatch {
        expected: IdRepr,
        found: &'static str,
    },
    /// A textual or binary identifier is not a valid object id.
    #[error("invalid object id: {0}")]
    InvalidIdentifier(String),
    /// Two members of a document share one wire name.
    #[error("wire name `{name}` is used by more than one field of `{type_path}`")]
    DuplicateWireName {
        name: &'static str,
        type_path: &'static str,
    },
    /// The document type is missing from the registry.
    #[error("document type `{0}` is not registered")]
    NotRegistered(&'static str),
    /// A required member did not appear on the wire.
    #[error("missing field `{field}` in `{type_path}`")]
    MissingField {
        field: &'static str,
        type_path: &'static str,
    },
    /// An unknown member was found while unknown fields are denied.
    #[error("unknown field `{field}` in `{type_path}`")]
    UnknownField {
        field: String,
        type_path: &'static str,
    },
    /// A null reference was found where the member is not optional.
    #[error("null value for non-optional reference `{0}`")]
    NullReference(&'static str),
    /// The token stream did not have the expected shape.
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    /// The token stream ended inside a value.
    #[error("unexpected end of token stream")]
    UnexpectedEnd,
    /// A decoded value did not have the expected in-memory type.
    #[error("decoded value is not a `{0}`")]
    TypeMismatch(&'static str),
    /// The raw bytes are not a valid BSON document.
    #[error(transparent)]
    Bson(#[from] bson::de::Error),
    /// An error raised by a serde implementation.
    #[error("{0}")]
    Custom(String),
}

impl DecodeError {
    #[inline]
    pub(crate) fn unexpected(expected: &'static str, found: impl Display) -> Self {
        Self::UnexpectedToken {
            expected,
            found: found.to_string(),
        }
    }
}

impl serde_core::de::Error for DecodeError {
    #[inline]
    fn custom<T: Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}

// -----------------------------------------------------------------------------
// EncodeError

/// An error raised while writing a document or an identifier.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// A textual or binary identifier is not a valid object id.
    #[error("invalid object id: {0}")]
    InvalidIdentifier(String),
    /// The document type is missing from the registry.
    #[error("document type `{0}` is not registered")]
    NotRegistered(&'static str),
    /// The document type could not be registered.
    #[error("failed to register document type: {0}")]
    Registration(#[from] DecodeError),
    /// A value did not have the in-memory type its type info describes.
    #[error("value is not a `{0}`")]
    TypeMismatch(&'static str),
    /// A leaf value could not be converted by the BSON serializer.
    #[error(transparent)]
    Bson(#[from] bson::ser::Error),
    /// The document could not be written as bytes.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// -----------------------------------------------------------------------------
// StoreError

/// An error reported by a collection backend.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    #[inline]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// -----------------------------------------------------------------------------
// FetchError

/// An error raised while resolving a reference or querying a collection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The reference was created without a collection to query.
    #[error("reference into `{0}` is not bound to a collection")]
    Unbound(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to decode fetched document: {0}")]
    Decode(#[from] DecodeError),
    #[error("failed to encode lookup key: {0}")]
    Encode(#[from] EncodeError),
}
