use std::borrow::Cow;
use std::fmt;

use bson::Bson;
use bson::oid::ObjectId;

/// Wire key holding the collection name of a database reference.
pub const REF_COLLECTION_KEY: &str = "$ref";
/// Wire key holding the identifier of a database reference.
pub const REF_ID_KEY: &str = "$id";
/// Optional wire key holding the database of a database reference.
pub const REF_DB_KEY: &str = "$db";

// -----------------------------------------------------------------------------
// DbRef

/// A database reference delivered by the reader as one value.
#[derive(Debug, Clone, PartialEq)]
pub struct DbRef {
    pub collection: String,
    pub id: Box<Value>,
}

// -----------------------------------------------------------------------------
// Value

/// A scalar wire value.
///
/// Raw readers may hand out [`Value::Raw`]; the decode pipeline adapter
/// normalizes those into the typed variants before any decoder sees them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    ObjectId(ObjectId),
    DateTime(bson::DateTime),
    DbRef(DbRef),
    Raw(Bson),
}

impl Value {
    /// Maps a BSON value onto the typed variants, keeping anything else as `Raw`.
    pub fn from_bson(bson: Bson) -> Self {
        match bson {
            Bson::Boolean(b) => Self::Boolean(b),
            Bson::Int32(i) => Self::Int32(i),
            Bson::Int64(i) => Self::Int64(i),
            Bson::Double(d) => Self::Double(d),
            Bson::String(s) => Self::String(s),
            Bson::Binary(binary) => Self::Binary(binary.bytes),
            Bson::ObjectId(oid) => Self::ObjectId(oid),
            Bson::DateTime(dt) => Self::DateTime(dt),
            other => Self::Raw(other),
        }
    }

    /// Converts `Raw` values, including the identifier of a db-ref, into typed variants.
    pub fn normalize(self) -> Self {
        match self {
            Self::Raw(bson) => Self::from_bson(bson),
            Self::DbRef(DbRef { collection, id }) => Self::DbRef(DbRef {
                collection,
                id: Box::new(id.normalize()),
            }),
            other => other,
        }
    }

    /// Borrows `self` if it is already normalized.
    pub fn normalized(&self) -> Cow<'_, Self> {
        match self {
            Self::Raw(_) | Self::DbRef(_) => Cow::Owned(self.clone().normalize()),
            _ => Cow::Borrowed(self),
        }
    }

    /// Converts the value back into BSON.
    pub fn into_bson(self) -> Bson {
        match self {
            Self::Boolean(b) => Bson::Boolean(b),
            Self::Int32(i) => Bson::Int32(i),
            Self::Int64(i) => Bson::Int64(i),
            Self::Double(d) => Bson::Double(d),
            Self::String(s) => Bson::String(s),
            Self::Binary(bytes) => Bson::Binary(bson::Binary {
                subtype: bson::spec::BinarySubtype::Generic,
                bytes,
            }),
            Self::ObjectId(oid) => Bson::ObjectId(oid),
            Self::DateTime(dt) => Bson::DateTime(dt),
            Self::DbRef(DbRef { collection, id }) => {
                let mut document = bson::Document::new();
                document.insert(REF_COLLECTION_KEY, collection);
                document.insert(REF_ID_KEY, id.into_bson());
                Bson::Document(document)
            }
            Self::Raw(bson) => bson,
        }
    }

    /// A short name of the wire kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Binary(_) => "binary",
            Self::ObjectId(_) => "objectId",
            Self::DateTime(_) => "date",
            Self::DbRef(_) => "dbPointer",
            Self::Raw(_) => "raw",
        }
    }

    /// Returns the text of a string value, normalizing raw strings.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Raw(Bson::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl From<Bson> for Value {
    #[inline]
    fn from(bson: Bson) -> Self {
        Self::from_bson(bson)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "boolean `{b}`"),
            Self::Int32(i) => write!(f, "int32 `{i}`"),
            Self::Int64(i) => write!(f, "int64 `{i}`"),
            Self::Double(d) => write!(f, "double `{d}`"),
            Self::String(s) => write!(f, "string {s:?}"),
            Self::Binary(b) => write!(f, "binary of {} bytes", b.len()),
            Self::ObjectId(oid) => write!(f, "objectId `{oid}`"),
            Self::DateTime(dt) => write!(f, "date `{dt}`"),
            Self::DbRef(r) => write!(f, "db-ref into `{}`", r.collection),
            Self::Raw(bson) => write!(f, "raw `{bson}`"),
        }
    }
}

// -----------------------------------------------------------------------------
// Token

/// One element of a pull-based document token stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName(String),
    Null,
    Value(Value),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartObject => f.pad("start of object"),
            Self::EndObject => f.pad("end of object"),
            Self::StartArray => f.pad("start of array"),
            Self::EndArray => f.pad("end of array"),
            Self::FieldName(name) => write!(f, "field name `{name}`"),
            Self::Null => f.pad("null"),
            Self::Value(value) => fmt::Display::fmt(value, f),
        }
    }
}

impl From<Value> for Token {
    #[inline]
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}
