use core::any::Any;

use bson::spec::BinarySubtype;
use bson::{Binary, Bson, Document as BsonDocument};

use crate::Document;
use crate::error::EncodeError;
use crate::id::IdCodec;
use crate::info::{DocumentInfo, TypeInfo, Typed};
use crate::registry::{FieldCodec, ReferenceCodec, TypeRegistry, TypeRegistryArc};
use crate::stream::{REF_COLLECTION_KEY, REF_ID_KEY};

// -----------------------------------------------------------------------------
// DocumentEncoder

/// Writes documents in their stored form.
///
/// - The identity member is written as `_id`, and omitted while it is `None`.
/// - Identifier conversions are reversed: text and byte ids become native ids.
/// - References become `{ "$ref": <collection>, "$id": <key> }`.
/// - `Vec<u8>` becomes binary data; other leaves go through `bson::to_bson`.
///
/// # Examples
///
/// ```
/// use docmap_mapper::{Document, registry::TypeRegistryArc, serde::DocumentEncoder};
/// use docmap_mapper::bson::{Bson, doc, oid::ObjectId};
///
/// #[derive(Document)]
/// struct Session {
///     #[document(id, object_id)]
///     id: Option<String>,
///     user: String,
/// }
///
/// let registry = TypeRegistryArc::default();
/// let encoder = DocumentEncoder::new(&registry);
///
/// let fresh = Session { id: None, user: "ada".to_owned() };
/// assert_eq!(encoder.encode(&fresh).unwrap(), doc! { "user": "ada" });
///
/// let oid = ObjectId::new();
/// let saved = Session { id: Some(oid.to_hex()), user: "ada".to_owned() };
/// assert_eq!(encoder.encode(&saved).unwrap().get("_id"), Some(&Bson::ObjectId(oid)));
/// ```
pub struct DocumentEncoder<'a> {
    registry: &'a TypeRegistryArc,
}

impl<'a> DocumentEncoder<'a> {
    #[inline]
    pub fn new(registry: &'a TypeRegistryArc) -> Self {
        Self { registry }
    }

    fn ensure(&self, info: &'static DocumentInfo) -> Result<(), EncodeError> {
        Ok(self.registry.ensure_registered(info)?)
    }

    /// Encodes a document.
    pub fn encode<T: Document>(&self, value: &T) -> Result<BsonDocument, EncodeError> {
        let info = T::document_info();
        self.ensure(info)?;
        encode_document(&self.registry.read(), info, value)
    }

    /// Encodes a document into its binary form.
    pub fn encode_to_vec<T: Document>(&self, value: &T) -> Result<Vec<u8>, EncodeError> {
        let document = self.encode(value)?;
        let mut bytes = Vec::new();
        document
            .to_writer(&mut bytes)
            .map_err(EncodeError::Bson)?;
        Ok(bytes)
    }

    /// Encodes a lookup key the way the identity member of `T` is written.
    pub fn encode_key<T: Document, K: Typed>(&self, key: &K) -> Result<Bson, EncodeError> {
        let info = T::document_info();
        self.ensure(info)?;
        let registry = self.registry.read();
        let meta = registry
            .get(info.type_id())
            .ok_or(EncodeError::NotRegistered(info.type_path()))?;
        let codec = meta
            .identity()
            .and_then(|binding| binding.codec().as_override());
        encode_node(&registry, K::type_info(), codec, key)
    }
}

// -----------------------------------------------------------------------------
// Dispatch

fn encode_document(
    registry: &TypeRegistry,
    info: &'static DocumentInfo,
    value: &dyn Any,
) -> Result<BsonDocument, EncodeError> {
    let meta = registry
        .get(info.type_id())
        .ok_or(EncodeError::NotRegistered(info.type_path()))?;

    let mut document = BsonDocument::new();
    for binding in meta.bindings() {
        let Some(member) = info.get_field(value, binding.index()) else {
            return Err(EncodeError::TypeMismatch(info.type_path()));
        };
        if binding.is_identity() && is_none(binding.type_info(), member) {
            continue;
        }
        let encoded = encode_node(
            registry,
            binding.type_info(),
            binding.codec().as_override(),
            member,
        )?;
        document.insert(binding.wire_name(), encoded);
    }
    Ok(document)
}

fn is_none(info: &TypeInfo, value: &dyn Any) -> bool {
    match info {
        TypeInfo::Option(option) => option.get(value).is_none(),
        _ => false,
    }
}

fn encode_node(
    registry: &TypeRegistry,
    info: &'static TypeInfo,
    codec: Option<&FieldCodec>,
    value: &dyn Any,
) -> Result<Bson, EncodeError> {
    if let Some(codec) = codec
        && codec.applies_to(info)
    {
        return match codec {
            FieldCodec::Identifier(repr) => IdCodec::encode_any(value, *repr),
            FieldCodec::Reference(reference) => encode_reference(registry, reference, value),
            FieldCodec::Default => encode_node(registry, info, None, value),
        };
    }
    match info {
        TypeInfo::Option(option) => match option.get(value) {
            Some(inner) => encode_node(registry, option.inner_info(), codec, inner),
            None => Ok(Bson::Null),
        },
        TypeInfo::List(list) if list.is_byte_sequence() => match value.downcast_ref::<Vec<u8>>() {
            Some(bytes) => Ok(Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes: bytes.clone(),
            })),
            None => Err(EncodeError::TypeMismatch(list.type_path())),
        },
        TypeInfo::List(list) => list
            .items(value)
            .into_iter()
            .map(|item| encode_node(registry, list.item_info(), codec, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Bson::Array),
        TypeInfo::Map(map) => {
            let mut document = BsonDocument::new();
            for (key, item) in map.entries(value) {
                document.insert(key, encode_node(registry, map.value_info(), codec, item)?);
            }
            Ok(Bson::Document(document))
        }
        TypeInfo::Reference(reference) => {
            encode_reference(registry, &ReferenceCodec::new(reference, None), value)
        }
        TypeInfo::Document(document) => {
            encode_document(registry, document, value).map(Bson::Document)
        }
        TypeInfo::Opaque(opaque) => opaque.to_bson(value),
    }
}

fn encode_reference(
    registry: &TypeRegistry,
    codec: &ReferenceCodec,
    value: &dyn Any,
) -> Result<Bson, EncodeError> {
    let info = codec.info();
    let Some((collection, key)) = info.parts(value) else {
        return Err(EncodeError::TypeMismatch(info.type_path()));
    };
    let id = match codec.key() {
        Some(repr) => IdCodec::encode_any(key, repr)?,
        None => encode_node(registry, info.key_info(), None, key)?,
    };
    let mut document = BsonDocument::new();
    document.insert(REF_COLLECTION_KEY, collection);
    document.insert(REF_ID_KEY, id);
    Ok(Bson::Document(document))
}
