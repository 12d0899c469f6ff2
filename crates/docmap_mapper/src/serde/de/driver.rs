use core::any::{Any, type_name};

use bson::oid::ObjectId;

use super::error_utils::{enter, leave, make_custom_error};
use super::{DecodeContext, ValueDeserializer, decode_reference};
use crate::Document;
use crate::error::DecodeError;
use crate::id::{IdCodec, IdRepr};
use crate::info::{DocumentInfo, ListInfo, MapInfo, OpaqueInfo, TypeInfo};
use crate::ops::DynamicDocument;
use crate::reference::CollectionBridge;
use crate::registry::{FieldCodec, ReferenceCodec, TypeRegistryArc};
use crate::stream::{Token, TokenReader, Value};

// -----------------------------------------------------------------------------
// DocumentDriver

/// Decodes one document from a token stream, driven by its type information.
///
/// The document type and everything reachable from it are registered on
/// first use. Members are matched by wire name; members no field claims are
/// offered to the reader first (see [`TokenReader::handle_unknown_field`]),
/// then skipped, or rejected if unknown fields are denied. Absent `Option`
/// members decode as `None`; any other absent member is an error unless
/// [`fill_absent_members`](Self::fill_absent_members) is set, in which case it
/// takes its empty value (see [`TypeInfo::empty_value`]).
///
/// # Examples
///
/// ```
/// use docmap_mapper::{Document, registry::TypeRegistryArc, serde::DocumentDriver};
/// use docmap_mapper::stream::{Token, TokenBuffer, Value};
///
/// #[derive(Document, Debug, PartialEq)]
/// struct Tag {
///     #[document(rename = "n")]
///     name: String,
///     weight: Option<i32>,
/// }
///
/// let registry = TypeRegistryArc::default();
/// let mut tokens = TokenBuffer::from_tokens([
///     Token::StartObject,
///     Token::FieldName("n".to_owned()),
///     Token::Value(Value::String("rust".to_owned())),
///     Token::EndObject,
/// ]);
///
/// let tag: Tag = DocumentDriver::of::<Tag>(&registry).decode_into(&mut tokens).unwrap();
/// assert_eq!(tag, Tag { name: "rust".to_owned(), weight: None });
/// ```
pub struct DocumentDriver<'a> {
    info: &'static DocumentInfo,
    registry: &'a TypeRegistryArc,
    bridge: Option<&'a dyn CollectionBridge>,
    deny_unknown_fields: bool,
    fill_absent_members: bool,
}

impl<'a> DocumentDriver<'a> {
    #[inline]
    pub fn new(info: &'static DocumentInfo, registry: &'a TypeRegistryArc) -> Self {
        Self {
            info,
            registry,
            bridge: None,
            deny_unknown_fields: false,
            fill_absent_members: false,
        }
    }

    #[inline]
    pub fn of<T: Document>(registry: &'a TypeRegistryArc) -> Self {
        Self::new(T::document_info(), registry)
    }

    /// Sets the bridge references are resolved through.
    ///
    /// Without one, decoding a non-null reference fails.
    #[inline]
    pub fn with_bridge(mut self, bridge: Option<&'a dyn CollectionBridge>) -> Self {
        self.bridge = bridge;
        self
    }

    #[inline]
    pub fn deny_unknown_fields(mut self, deny: bool) -> Self {
        self.deny_unknown_fields = deny;
        self
    }

    #[inline]
    pub fn fill_absent_members(mut self, fill: bool) -> Self {
        self.fill_absent_members = fill;
        self
    }

    /// Decodes a boxed document.
    pub fn decode<R: TokenReader + ?Sized>(
        self,
        reader: &mut R,
    ) -> Result<Box<dyn Any>, DecodeError> {
        self.registry.ensure_registered(self.info)?;
        let registry = self.registry.read();
        let mut ctx = DecodeContext::new(&registry, self.registry)
            .with_bridge(self.bridge)
            .with_deny_unknown_fields(self.deny_unknown_fields)
            .with_fill_absent_members(self.fill_absent_members);
        let first = reader.expect_token()?;
        decode_document(self.info, first, reader, &mut ctx)
    }

    /// Decodes a document of type `T`.
    pub fn decode_into<T: Document, R: TokenReader + ?Sized>(
        self,
        reader: &mut R,
    ) -> Result<T, DecodeError> {
        match self.decode(reader)?.downcast::<T>() {
            Ok(object) => Ok(*object),
            Err(_) => Err(DecodeError::TypeMismatch(type_name::<T>())),
        }
    }
}

/// Decodes a document of type `T` without a collection bridge.
#[inline]
pub fn from_reader<T: Document, R: TokenReader + ?Sized>(
    reader: &mut R,
    registry: &TypeRegistryArc,
) -> Result<T, DecodeError> {
    DocumentDriver::of::<T>(registry).decode_into(reader)
}

// -----------------------------------------------------------------------------
// Dispatch

/// Decodes one value of the shape `info`.
///
/// `codec` is the member override, applied at the level whose type it
/// converts; outer `Option`, list and map layers are descended first.
/// Returns `None` only for an absent reference.
pub(super) fn decode_node<R: TokenReader + ?Sized>(
    info: &'static TypeInfo,
    codec: Option<&FieldCodec>,
    first: Token,
    reader: &mut R,
    ctx: &mut DecodeContext<'_>,
) -> Result<Option<Box<dyn Any>>, DecodeError> {
    if let Some(codec) = codec
        && codec.applies_to(info)
    {
        return apply_codec(codec, first, reader, ctx);
    }
    match info {
        TypeInfo::Option(option) => {
            if first == Token::Null {
                return Ok(Some(option.none()));
            }
            match decode_node(option.inner_info(), codec, first, reader, ctx)? {
                Some(value) => option.some(value).map(Some),
                None => Ok(Some(option.none())),
            }
        }
        TypeInfo::List(list) => decode_list(list, codec, first, reader, ctx).map(Some),
        TypeInfo::Map(map) => decode_map(map, codec, first, reader, ctx).map(Some),
        TypeInfo::Reference(reference) => {
            decode_reference(&ReferenceCodec::new(reference, None), first, reader, ctx)
        }
        TypeInfo::Document(document) => {
            ctx.enter();
            let result = decode_document(document, first, reader, ctx);
            ctx.leave();
            result.map(Some)
        }
        TypeInfo::Opaque(opaque) => decode_opaque(opaque, first, reader).map(Some),
    }
}

fn apply_codec<R: TokenReader + ?Sized>(
    codec: &FieldCodec,
    first: Token,
    reader: &mut R,
    ctx: &mut DecodeContext<'_>,
) -> Result<Option<Box<dyn Any>>, DecodeError> {
    match codec {
        FieldCodec::Identifier(repr) => {
            let wire = read_identifier(first, reader)?;
            IdCodec::decode_any(&wire, *repr).map(Some)
        }
        FieldCodec::Reference(reference) => decode_reference(reference, first, reader, ctx),
        FieldCodec::Default => Err(DecodeError::unexpected("an override codec", "default")),
    }
}

/// Rejects an absent value where the shape cannot hold one.
#[inline]
fn require(
    value: Option<Box<dyn Any>>,
    info: &'static TypeInfo,
) -> Result<Box<dyn Any>, DecodeError> {
    value.ok_or(DecodeError::NullReference(info.type_path()))
}

// -----------------------------------------------------------------------------
// Documents

fn decode_document<R: TokenReader + ?Sized>(
    info: &'static DocumentInfo,
    first: Token,
    reader: &mut R,
    ctx: &mut DecodeContext<'_>,
) -> Result<Box<dyn Any>, DecodeError> {
    enter(info.ty());
    let result = decode_members(info, first, reader, ctx);
    leave();
    result
}

fn decode_members<R: TokenReader + ?Sized>(
    info: &'static DocumentInfo,
    first: Token,
    reader: &mut R,
    ctx: &mut DecodeContext<'_>,
) -> Result<Box<dyn Any>, DecodeError> {
    let meta = ctx
        .registry()
        .get(info.type_id())
        .ok_or(DecodeError::NotRegistered(info.type_path()))?;
    if first != Token::StartObject {
        return Err(DecodeError::unexpected("start of object", first));
    }

    let mut document = DynamicDocument::new(info);
    loop {
        let name = match reader.expect_token()? {
            Token::EndObject => break,
            Token::FieldName(name) => name,
            other => return Err(DecodeError::unexpected("a field name", other)),
        };
        let Some(binding) = meta.binding_for_wire(&name) else {
            skip_unknown(info, name, reader, ctx)?;
            continue;
        };
        let member = binding.type_info();
        let first = reader.expect_token()?;
        let value = decode_node(member, binding.codec().as_override(), first, reader, ctx)?;
        document.insert_boxed(binding.index(), require(value, member)?);
    }

    for binding in meta.bindings() {
        if document.contains(binding.index()) {
            continue;
        }
        match binding.type_info() {
            TypeInfo::Option(option) => document.insert_boxed(binding.index(), option.none()),
            member if ctx.fill_absent_members() => {
                if let Some(value) = member.empty_value() {
                    document.insert_boxed(binding.index(), value);
                } else {
                    log::trace!(
                        "absent member `{}` of `{}` has no empty value",
                        binding.name(),
                        info.type_path()
                    );
                }
            }
            _ => {}
        }
    }

    info.build(document)
}

fn skip_unknown<R: TokenReader + ?Sized>(
    info: &'static DocumentInfo,
    name: String,
    reader: &mut R,
    ctx: &DecodeContext<'_>,
) -> Result<(), DecodeError> {
    if reader.handle_unknown_field(&name, ctx.depth())? {
        return Ok(());
    }
    if ctx.deny_unknown_fields() {
        return Err(DecodeError::UnknownField {
            field: name,
            type_path: info.type_path(),
        });
    }
    log::trace!("skipping unknown member `{name}` of `{}`", info.type_path());
    let first = reader.expect_token()?;
    reader.skip_value(&first)
}

// -----------------------------------------------------------------------------
// Containers

fn decode_list<R: TokenReader + ?Sized>(
    list: &'static ListInfo,
    codec: Option<&FieldCodec>,
    first: Token,
    reader: &mut R,
    ctx: &mut DecodeContext<'_>,
) -> Result<Box<dyn Any>, DecodeError> {
    match first {
        Token::StartArray => {
            let item = list.item_info();
            let mut items = Vec::new();
            loop {
                let token = reader.expect_token()?;
                if token == Token::EndArray {
                    break;
                }
                let value = decode_node(item, codec, token, reader, ctx)?;
                items.push(require(value, item)?);
            }
            list.from_items(items)
        }
        Token::Value(value) if list.is_byte_sequence() => match value.normalize() {
            Value::Binary(bytes) => Ok(Box::new(bytes)),
            other => Err(DecodeError::unexpected("binary data", other)),
        },
        other => Err(DecodeError::unexpected("start of array", other)),
    }
}

fn decode_map<R: TokenReader + ?Sized>(
    map: &'static MapInfo,
    codec: Option<&FieldCodec>,
    first: Token,
    reader: &mut R,
    ctx: &mut DecodeContext<'_>,
) -> Result<Box<dyn Any>, DecodeError> {
    if first != Token::StartObject {
        return Err(DecodeError::unexpected("start of object", first));
    }
    let value_info = map.value_info();
    let mut entries = Vec::new();
    loop {
        let key = match reader.expect_token()? {
            Token::EndObject => break,
            Token::FieldName(key) => key,
            other => return Err(DecodeError::unexpected("a map key", other)),
        };
        let token = reader.expect_token()?;
        let value = decode_node(value_info, codec, token, reader, ctx)?;
        entries.push((key, require(value, value_info)?));
    }
    map.from_entries(entries)
}

// -----------------------------------------------------------------------------
// Leaves

fn decode_opaque<R: TokenReader + ?Sized>(
    opaque: &'static OpaqueInfo,
    first: Token,
    reader: &mut R,
) -> Result<Box<dyn Any>, DecodeError> {
    if opaque.type_is::<ObjectId>() {
        let wire = read_identifier(first, reader)?;
        return IdCodec::decode_any(&wire, IdRepr::Native);
    }
    let first = match first {
        Token::Value(value) => match value.normalize() {
            Value::DateTime(dt) if opaque.type_is::<bson::DateTime>() => return Ok(Box::new(dt)),
            value => Token::Value(value),
        },
        other => other,
    };
    opaque
        .deserialize(ValueDeserializer::new(first, reader))
        .map_err(|err| match err {
            DecodeError::Custom(msg) => make_custom_error(msg),
            other => other,
        })
}

/// Reads an identifier given either as a scalar or as `{ "$oid": <hex> }`.
pub(super) fn read_identifier<R: TokenReader + ?Sized>(
    first: Token,
    reader: &mut R,
) -> Result<Value, DecodeError> {
    match first {
        Token::Value(value) => Ok(value.normalize()),
        Token::StartObject => {
            let mut hex = None;
            loop {
                match reader.expect_token()? {
                    Token::EndObject => break,
                    Token::FieldName(name) => {
                        let token = reader.expect_token()?;
                        match (name.as_str(), token) {
                            ("$oid", Token::Value(value)) => hex = Some(value.normalize()),
                            (_, token) => reader.skip_value(&token)?,
                        }
                    }
                    other => return Err(DecodeError::unexpected("a field name", other)),
                }
            }
            match hex {
                Some(Value::String(hex)) => ObjectId::parse_str(&hex)
                    .map(Value::ObjectId)
                    .map_err(|err| DecodeError::InvalidIdentifier(format!("`{hex}`: {err}"))),
                Some(other) => Ok(other),
                None => Err(DecodeError::InvalidIdentifier(
                    "object identifier without `$oid`".to_owned(),
                )),
            }
        }
        other => Err(DecodeError::unexpected("an identifier", other)),
    }
}
