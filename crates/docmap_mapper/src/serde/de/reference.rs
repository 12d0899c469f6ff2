use core::any::Any;

use bson::Bson;

use super::DecodeContext;
use super::driver::{decode_node, read_identifier};
use crate::error::DecodeError;
use crate::id::IdCodec;
use crate::registry::ReferenceCodec;
use crate::stream::{DbRef, REF_COLLECTION_KEY, REF_ID_KEY, Token, TokenBuffer, TokenReader, Value};

/// Decodes a reference starting at `first`.
///
/// Accepted shapes:
/// - `null`: absent.
/// - a db-ref value: the key is read from its identifier.
/// - an object: `$id` holds the key and `$ref` the target collection name;
///   other members are skipped.
///
/// Returns `Ok(None)` for an absent reference, including one without `$id`
/// or with a null `$id`.
///
/// # Errors
///
/// - [`DecodeError::UnsupportedReferenceContext`] if `ctx` has no collection bridge.
/// - [`DecodeError::MalformedReference`] for any other shape, or a non-text `$ref`.
/// - [`DecodeError::MissingReferenceTarget`] if `$id` is present but `$ref` is not.
pub fn decode_reference<R: TokenReader + ?Sized>(
    codec: &ReferenceCodec,
    first: Token,
    reader: &mut R,
    ctx: &mut DecodeContext<'_>,
) -> Result<Option<Box<dyn Any>>, DecodeError> {
    if first == Token::Null {
        return Ok(None);
    }
    let Some(bridge) = ctx.bridge() else {
        return Err(DecodeError::UnsupportedReferenceContext);
    };

    let mut key = None;
    let mut collection = None;
    match first {
        Token::Value(Value::DbRef(DbRef { collection: name, id })) => {
            key = Some(match id.normalize() {
                Value::Raw(Bson::Null | Bson::Undefined) => TokenBuffer::from_tokens([Token::Null]),
                id => TokenBuffer::from_value(id),
            });
            collection = Some(name);
        }
        Token::StartObject => loop {
            match reader.expect_token()? {
                Token::EndObject => break,
                Token::FieldName(name) => {
                    let token = reader.expect_token()?;
                    match name.as_str() {
                        REF_ID_KEY => key = Some(capture(token, reader)?),
                        REF_COLLECTION_KEY => collection = Some(read_collection(token, reader)?),
                        _ => reader.skip_value(&token)?,
                    }
                }
                other => return Err(DecodeError::unexpected("a field name", other)),
            }
        },
        other => {
            return Err(DecodeError::MalformedReference(format!(
                "expected an object or a db-ref, found {other}"
            )));
        }
    }

    // The key is decoded last so a missing target is reported before a bad key.
    let Some(mut key) = key else {
        return Ok(None);
    };
    if key.peek() == Some(&Token::Null) {
        return Ok(None);
    }
    let Some(collection) = collection else {
        return Err(DecodeError::MissingReferenceTarget);
    };
    let Some(key) = decode_key(codec, &mut key, ctx)? else {
        return Ok(None);
    };
    log::trace!("decoded reference into `{collection}`");
    let related = bridge.owning_collection().related(&collection);
    codec
        .info()
        .construct(key, related, ctx.shared_registry())
        .map(Some)
}

/// Moves the tokens of one value, starting at `first`, into a buffer.
fn capture<R: TokenReader + ?Sized>(
    first: Token,
    reader: &mut R,
) -> Result<TokenBuffer, DecodeError> {
    let mut buffer = TokenBuffer::new();
    let mut depth = 0_usize;
    let mut token = first;
    loop {
        match token {
            Token::StartObject | Token::StartArray => depth += 1,
            Token::EndObject | Token::EndArray => depth = depth.saturating_sub(1),
            _ => {}
        }
        buffer.push(token);
        if depth == 0 {
            return Ok(buffer);
        }
        token = reader.expect_token()?;
    }
}

fn decode_key(
    codec: &ReferenceCodec,
    reader: &mut TokenBuffer,
    ctx: &mut DecodeContext<'_>,
) -> Result<Option<Box<dyn Any>>, DecodeError> {
    let token = reader.expect_token()?;
    match codec.key() {
        Some(repr) => {
            let wire = read_identifier(token, reader)?;
            IdCodec::decode_any(&wire, repr).map(Some)
        }
        None => decode_node(codec.info().key_info(), None, token, reader, ctx),
    }
}

fn read_collection<R: TokenReader + ?Sized>(
    token: Token,
    reader: &mut R,
) -> Result<String, DecodeError> {
    match token {
        Token::Value(value) => match value.normalize() {
            Value::String(name) => Ok(name),
            other => Err(DecodeError::MalformedReference(format!(
                "`$ref` must be text, found {other}"
            ))),
        },
        other => {
            reader.skip_value(&other)?;
            Err(DecodeError::MalformedReference(format!(
                "`$ref` must be text, found {other}"
            )))
        }
    }
}
