use bson::{Bson, Document};

use crate::error::DecodeError;
use crate::stream::{DbRef, REF_COLLECTION_KEY, REF_DB_KEY, REF_ID_KEY, Token, TokenReader, Value};

enum Frame {
    Document(bson::document::IntoIter),
    Array(std::vec::IntoIter<Bson>),
}

// -----------------------------------------------------------------------------
// BsonReader

/// A raw token reader over a BSON document.
///
/// Scalars are delivered as [`Value::Raw`]. With db-ref decoding enabled, a
/// sub-document whose members are `$ref`, `$id` and optionally `$db` is
/// delivered as a single [`Value::DbRef`] instead of an object.
pub struct BsonReader {
    root: Option<Document>,
    stack: Vec<Frame>,
    pending: Option<Bson>,
    decode_db_refs: bool,
}

impl BsonReader {
    pub fn new(document: Document) -> Self {
        Self {
            root: Some(document),
            stack: Vec::new(),
            pending: None,
            decode_db_refs: true,
        }
    }

    /// Parses a BSON document from its binary form.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self::new(Document::from_reader(bytes)?))
    }

    #[inline]
    pub fn with_db_refs(mut self, decode_db_refs: bool) -> Self {
        self.decode_db_refs = decode_db_refs;
        self
    }

    fn open(&mut self, value: Bson) -> Token {
        match value {
            Bson::Null | Bson::Undefined => Token::Null,
            Bson::Array(items) => {
                self.stack.push(Frame::Array(items.into_iter()));
                Token::StartArray
            }
            Bson::Document(document) => {
                if self.decode_db_refs && is_db_ref(&document) {
                    return Token::Value(Value::DbRef(into_db_ref(document)));
                }
                self.stack.push(Frame::Document(document.into_iter()));
                Token::StartObject
            }
            other => Token::Value(Value::Raw(other)),
        }
    }
}

fn is_db_ref(document: &Document) -> bool {
    matches!(document.get(REF_COLLECTION_KEY), Some(Bson::String(_)))
        && document.contains_key(REF_ID_KEY)
        && document
            .keys()
            .all(|key| key == REF_COLLECTION_KEY || key == REF_ID_KEY || key == REF_DB_KEY)
}

fn into_db_ref(document: Document) -> DbRef {
    let mut collection = String::new();
    let mut id = Bson::Null;
    for (key, value) in document {
        match (key.as_str(), value) {
            (REF_COLLECTION_KEY, Bson::String(name)) => collection = name,
            (REF_ID_KEY, value) => id = value,
            _ => {}
        }
    }
    DbRef {
        collection,
        id: Box::new(Value::Raw(id)),
    }
}

impl TokenReader for BsonReader {
    fn next_token(&mut self) -> Result<Option<Token>, DecodeError> {
        if let Some(value) = self.pending.take() {
            return Ok(Some(self.open(value)));
        }
        if let Some(root) = self.root.take() {
            self.stack.push(Frame::Document(root.into_iter()));
            return Ok(Some(Token::StartObject));
        }
        let token = match self.stack.last_mut() {
            None => return Ok(None),
            Some(Frame::Document(members)) => match members.next() {
                Some((name, value)) => {
                    self.pending = Some(value);
                    Token::FieldName(name)
                }
                None => {
                    self.stack.pop();
                    Token::EndObject
                }
            },
            Some(Frame::Array(items)) => match items.next() {
                Some(value) => self.open(value),
                None => {
                    self.stack.pop();
                    Token::EndArray
                }
            },
        };
        Ok(Some(token))
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use bson::oid::ObjectId;
    use bson::{Bson, doc};

    use super::BsonReader;
    use crate::stream::{Token, TokenReader, Value};

    fn drain(mut reader: BsonReader) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = reader.next_token().unwrap() {
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn emits_nested_structure() {
        let tokens = drain(BsonReader::new(doc! { "a": [1, null], "b": { "c": "x" } }));
        assert_eq!(
            tokens,
            vec![
                Token::StartObject,
                Token::FieldName("a".to_owned()),
                Token::StartArray,
                Token::Value(Value::Raw(Bson::Int32(1))),
                Token::Null,
                Token::EndArray,
                Token::FieldName("b".to_owned()),
                Token::StartObject,
                Token::FieldName("c".to_owned()),
                Token::Value(Value::Raw(Bson::String("x".to_owned()))),
                Token::EndObject,
                Token::EndObject,
            ]
        );
    }

    #[test]
    fn db_refs_become_single_values() {
        let oid = ObjectId::new();
        let tokens = drain(BsonReader::new(doc! { "r": { "$ref": "users", "$id": oid } }));
        let Token::Value(Value::DbRef(db_ref)) = &tokens[2] else {
            panic!("expected a db-ref, found {}", tokens[2]);
        };
        assert_eq!(db_ref.collection, "users");
        assert_eq!(*db_ref.id, Value::Raw(Bson::ObjectId(oid)));
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn db_refs_can_stay_objects() {
        let oid = ObjectId::new();
        let reader = BsonReader::new(doc! { "r": { "$ref": "users", "$id": oid } }).with_db_refs(false);
        let tokens = drain(reader);
        assert_eq!(tokens[2], Token::StartObject);
    }

    #[test]
    fn reads_binary_documents() {
        let mut bytes = Vec::new();
        doc! { "n": 5_i64 }.to_writer(&mut bytes).unwrap();
        let tokens = drain(BsonReader::from_slice(&bytes).unwrap());
        assert_eq!(tokens[2], Token::Value(Value::Raw(Bson::Int64(5))));
        assert!(BsonReader::from_slice(&[1, 2, 3]).is_err());
    }
}
