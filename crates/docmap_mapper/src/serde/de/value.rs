use core::marker::PhantomData;

use serde_core::de::value::{MapDeserializer, SeqDeserializer, StringDeserializer};
use serde_core::de::{
    self, DeserializeSeed, Deserializer, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use serde_core::forward_to_deserialize_any;

use crate::error::DecodeError;
use crate::stream::{REF_COLLECTION_KEY, REF_ID_KEY, Token, TokenReader, Value};

// -----------------------------------------------------------------------------
// ScalarDeserializer

/// A serde deserializer over one scalar [`Value`].
///
/// Object ids are presented as `{ "$oid": <hex> }` and db-refs as
/// `{ "$ref": <name>, "$id": <id> }`, matching BSON extended JSON.
pub struct ScalarDeserializer<E> {
    value: Value,
    marker: PhantomData<E>,
}

impl<E> ScalarDeserializer<E> {
    #[inline]
    pub fn new(value: Value) -> Self {
        Self {
            value,
            marker: PhantomData,
        }
    }
}

impl<'de, E: de::Error> IntoDeserializer<'de, E> for Value {
    type Deserializer = ScalarDeserializer<E>;

    #[inline]
    fn into_deserializer(self) -> Self::Deserializer {
        ScalarDeserializer::new(self)
    }
}

impl<'de, E: de::Error> Deserializer<'de> for ScalarDeserializer<E> {
    type Error = E;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        match self.value {
            Value::Boolean(b) => visitor.visit_bool(b),
            Value::Int32(i) => visitor.visit_i32(i),
            Value::Int64(i) => visitor.visit_i64(i),
            Value::Double(d) => visitor.visit_f64(d),
            Value::String(s) => visitor.visit_string(s),
            Value::Binary(bytes) => visitor.visit_byte_buf(bytes),
            Value::DateTime(dt) => visitor.visit_i64(dt.timestamp_millis()),
            Value::ObjectId(oid) => {
                let mut map = MapDeserializer::new(core::iter::once(("$oid", oid.to_hex())));
                let value = visitor.visit_map(&mut map)?;
                map.end()?;
                Ok(value)
            }
            Value::DbRef(db_ref) => {
                let entries = [
                    (REF_COLLECTION_KEY, Value::String(db_ref.collection)),
                    (REF_ID_KEY, *db_ref.id),
                ];
                let mut map = MapDeserializer::new(entries.into_iter());
                let value = visitor.visit_map(&mut map)?;
                map.end()?;
                Ok(value)
            }
            Value::Raw(bson) => bson::Deserializer::new(bson)
                .deserialize_any(visitor)
                .map_err(E::custom),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        match self.value {
            Value::Raw(bson::Bson::Null) => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, E> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, E> {
        match self.value {
            Value::String(s) => visitor.visit_enum(StringDeserializer::<E>::new(s)),
            Value::Raw(bson) => bson::Deserializer::new(bson)
                .deserialize_enum(name, variants, visitor)
                .map_err(E::custom),
            other => Err(E::custom(format_args!(
                "expected an enum variant name, found {other}"
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

// -----------------------------------------------------------------------------
// ValueDeserializer

/// A serde deserializer over one value pulled from a [`TokenReader`].
///
/// `first` is the token the value starts with; the remaining tokens of an
/// object or array are pulled from `reader`. The whole value is consumed
/// even if the visitor stops early.
pub struct ValueDeserializer<'a, R: ?Sized> {
    first: Token,
    reader: &'a mut R,
}

impl<'a, R: TokenReader + ?Sized> ValueDeserializer<'a, R> {
    #[inline]
    pub fn new(first: Token, reader: &'a mut R) -> Self {
        Self { first, reader }
    }
}

impl<'de, 'a, R: TokenReader + ?Sized> Deserializer<'de> for ValueDeserializer<'a, R> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.first {
            Token::Null => visitor.visit_unit(),
            Token::Value(value) => ScalarDeserializer::new(value).deserialize_any(visitor),
            Token::StartObject => {
                let mut access = ObjectAccess::new(self.reader);
                let value = visitor.visit_map(&mut access)?;
                access.finish()?;
                Ok(value)
            }
            Token::StartArray => {
                let mut access = ArrayAccess::new(self.reader);
                let value = visitor.visit_seq(&mut access)?;
                access.finish()?;
                Ok(value)
            }
            other => Err(DecodeError::unexpected("a value", other)),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.first {
            Token::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.first {
            Token::Value(Value::Binary(bytes)) => {
                let mut seq = SeqDeserializer::<_, DecodeError>::new(bytes.into_iter());
                let value = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(value)
            }
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        match self.first {
            Token::StartObject => {
                let value = visitor.visit_enum(VariantReader {
                    reader: &mut *self.reader,
                })?;
                match self.reader.expect_token()? {
                    Token::EndObject => Ok(value),
                    other => Err(DecodeError::unexpected("end of enum object", other)),
                }
            }
            Token::Value(value) => {
                ScalarDeserializer::new(value).deserialize_enum(name, variants, visitor)
            }
            other => Err(DecodeError::unexpected("an enum", other)),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.reader.skip_value(&self.first)?;
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct tuple tuple_struct map struct identifier
    }
}

// -----------------------------------------------------------------------------
// Access helpers

fn skip_to_close<R: TokenReader + ?Sized>(reader: &mut R) -> Result<(), DecodeError> {
    let mut depth = 0_usize;
    loop {
        match reader.expect_token()? {
            Token::StartObject | Token::StartArray => depth += 1,
            Token::EndObject | Token::EndArray if depth == 0 => return Ok(()),
            Token::EndObject | Token::EndArray => depth -= 1,
            _ => {}
        }
    }
}

struct ObjectAccess<'a, R: ?Sized> {
    reader: &'a mut R,
    closed: bool,
}

impl<'a, R: TokenReader + ?Sized> ObjectAccess<'a, R> {
    fn new(reader: &'a mut R) -> Self {
        Self {
            reader,
            closed: false,
        }
    }

    fn finish(self) -> Result<(), DecodeError> {
        if self.closed {
            Ok(())
        } else {
            skip_to_close(self.reader)
        }
    }
}

impl<'de, R: TokenReader + ?Sized> MapAccess<'de> for ObjectAccess<'_, R> {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DecodeError> {
        match self.reader.expect_token()? {
            Token::EndObject => {
                self.closed = true;
                Ok(None)
            }
            Token::FieldName(name) => seed
                .deserialize(StringDeserializer::<DecodeError>::new(name))
                .map(Some),
            other => Err(DecodeError::unexpected("a field name", other)),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, DecodeError> {
        let first = self.reader.expect_token()?;
        seed.deserialize(ValueDeserializer::new(first, &mut *self.reader))
    }
}

struct ArrayAccess<'a, R: ?Sized> {
    reader: &'a mut R,
    closed: bool,
}

impl<'a, R: TokenReader + ?Sized> ArrayAccess<'a, R> {
    fn new(reader: &'a mut R) -> Self {
        Self {
            reader,
            closed: false,
        }
    }

    fn finish(self) -> Result<(), DecodeError> {
        if self.closed {
            Ok(())
        } else {
            skip_to_close(self.reader)
        }
    }
}

impl<'de, R: TokenReader + ?Sized> SeqAccess<'de> for ArrayAccess<'_, R> {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, DecodeError> {
        match self.reader.expect_token()? {
            Token::EndArray => {
                self.closed = true;
                Ok(None)
            }
            first => seed
                .deserialize(ValueDeserializer::new(first, &mut *self.reader))
                .map(Some),
        }
    }
}

/// Reads an externally tagged enum: `{ "<variant>": <content> }`.
struct VariantReader<'a, R: ?Sized> {
    reader: &'a mut R,
}

impl<'de, 'a, R: TokenReader + ?Sized> EnumAccess<'de> for VariantReader<'a, R> {
    type Error = DecodeError;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self), DecodeError> {
        match self.reader.expect_token()? {
            Token::FieldName(name) => {
                let variant = seed.deserialize(StringDeserializer::<DecodeError>::new(name))?;
                Ok((variant, self))
            }
            other => Err(DecodeError::unexpected("a variant name", other)),
        }
    }
}

impl<'de, 'a, R: TokenReader + ?Sized> VariantAccess<'de> for VariantReader<'a, R> {
    type Error = DecodeError;

    fn unit_variant(self) -> Result<(), DecodeError> {
        let first = self.reader.expect_token()?;
        self.reader.skip_value(&first)
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(
        self,
        seed: T,
    ) -> Result<T::Value, DecodeError> {
        let first = self.reader.expect_token()?;
        seed.deserialize(ValueDeserializer::new(first, self.reader))
    }

    fn tuple_variant<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        let first = self.reader.expect_token()?;
        ValueDeserializer::new(first, self.reader).deserialize_seq(visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        let first = self.reader.expect_token()?;
        ValueDeserializer::new(first, self.reader).deserialize_any(visitor)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Deserialize;

    use super::ValueDeserializer;
    use crate::stream::{Token, TokenBuffer, TokenReader, Value};

    fn field(name: &str) -> Token {
        Token::FieldName(name.to_owned())
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    enum Shape {
        Dot,
        Circle(f64),
        Rect { w: i32, h: i32 },
    }

    fn decode<T: for<'de> Deserialize<'de>>(tokens: Vec<Token>) -> (T, TokenBuffer) {
        let mut buffer = TokenBuffer::from_tokens(tokens);
        let first = buffer.expect_token().unwrap();
        let value = T::deserialize(ValueDeserializer::new(first, &mut buffer)).unwrap();
        (value, buffer)
    }

    #[test]
    fn struct_from_object_tokens() {
        let (point, rest) = decode::<Point>(vec![
            Token::StartObject,
            field("y"),
            Token::Value(Value::Int32(2)),
            field("x"),
            Token::Value(Value::Int32(1)),
            Token::EndObject,
            Token::Null,
        ]);
        assert_eq!(point, Point { x: 1, y: 2 });
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn unknown_members_are_consumed() {
        let (point, rest) = decode::<Point>(vec![
            Token::StartObject,
            field("x"),
            Token::Value(Value::Int32(1)),
            field("extra"),
            Token::StartArray,
            Token::Value(Value::Int32(9)),
            Token::EndArray,
            field("y"),
            Token::Value(Value::Int32(2)),
            Token::EndObject,
        ]);
        assert_eq!(point, Point { x: 1, y: 2 });
        assert!(rest.is_empty());
    }

    #[test]
    fn enums_in_both_forms() {
        let (dot, _) = decode::<Shape>(vec![Token::Value(Value::String("Dot".to_owned()))]);
        assert_eq!(dot, Shape::Dot);

        let (circle, _) = decode::<Shape>(vec![
            Token::StartObject,
            field("Circle"),
            Token::Value(Value::Double(1.5)),
            Token::EndObject,
        ]);
        assert_eq!(circle, Shape::Circle(1.5));

        let (rect, rest) = decode::<Shape>(vec![
            Token::StartObject,
            field("Rect"),
            Token::StartObject,
            field("w"),
            Token::Value(Value::Int32(3)),
            field("h"),
            Token::Value(Value::Int32(4)),
            Token::EndObject,
            Token::EndObject,
        ]);
        assert_eq!(rect, Shape::Rect { w: 3, h: 4 });
        assert!(rest.is_empty());
    }

    #[test]
    fn options_and_maps() {
        let (map, _) = decode::<BTreeMap<String, Option<i64>>>(vec![
            Token::StartObject,
            field("a"),
            Token::Value(Value::Int64(1)),
            field("b"),
            Token::Null,
            Token::EndObject,
        ]);
        assert_eq!(map.get("a"), Some(&Some(1)));
        assert_eq!(map.get("b"), Some(&None));
    }

    #[test]
    fn binary_as_byte_list() {
        let (bytes, _) = decode::<Vec<u8>>(vec![Token::Value(Value::Binary(vec![1, 2, 3]))]);
        assert_eq!(bytes, vec![1, 2, 3]);
    }
}
