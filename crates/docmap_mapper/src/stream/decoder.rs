use core::marker::PhantomData;
use std::sync::Arc;

use bson::Document as BsonDocument;

use crate::Document;
use crate::error::DecodeError;
use crate::reference::CollectionHandle;
use crate::registry::TypeRegistryArc;
use crate::stream::{BsonReader, DecoderConfig, DecoderStream, SideChannel, TokenReader};

// -----------------------------------------------------------------------------
// Decoded

/// A decoded document together with the operational members diverted from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub object: T,
    pub side_channel: SideChannel,
}

impl<T> Decoded<T> {
    #[inline]
    pub fn into_object(self) -> T {
        self.object
    }
}

// -----------------------------------------------------------------------------
// DocumentDecoder

/// Decodes raw documents into `T`, optionally bound to the collection they came from.
///
/// ```
/// use docmap_mapper::{Document, registry::TypeRegistryArc, stream::DocumentDecoder};
/// use docmap_mapper::bson::doc;
///
/// #[derive(Document, Debug, PartialEq)]
/// struct Counter {
///     #[document(id, object_id)]
///     id: String,
///     hits: i64,
/// }
///
/// let decoder = DocumentDecoder::<Counter>::new(TypeRegistryArc::default());
/// let oid = docmap_mapper::id::ObjectId::new();
/// let decoded = decoder
///     .decode_document(doc! { "_id": oid, "hits": 3_i64, "ok": 1.0 })
///     .unwrap();
///
/// assert_eq!(decoded.object.id, oid.to_hex());
/// assert!(decoded.side_channel.contains("ok"));
/// ```
pub struct DocumentDecoder<T> {
    registry: TypeRegistryArc,
    collection: Option<Arc<dyn CollectionHandle>>,
    config: Arc<DecoderConfig>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> DocumentDecoder<T> {
    pub fn new(registry: TypeRegistryArc) -> Self {
        Self {
            registry,
            collection: None,
            config: Arc::default(),
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn with_collection(mut self, collection: Arc<dyn CollectionHandle>) -> Self {
        self.collection = Some(collection);
        self
    }

    #[inline]
    pub fn with_config(mut self, config: Arc<DecoderConfig>) -> Self {
        self.config = config;
        self
    }

    /// Decodes a document from its binary form.
    pub fn decode_slice(&self, bytes: &[u8]) -> Result<Decoded<T>, DecodeError> {
        self.decode_reader(BsonReader::from_slice(bytes)?.with_db_refs(self.config.decode_db_refs()))
    }

    pub fn decode_document(&self, document: BsonDocument) -> Result<Decoded<T>, DecodeError> {
        self.decode_reader(BsonReader::new(document).with_db_refs(self.config.decode_db_refs()))
    }

    /// Decodes a document from any raw token source.
    pub fn decode_reader<R: TokenReader>(&self, reader: R) -> Result<Decoded<T>, DecodeError> {
        let mut stream = DecoderStream::new(reader).with_config(self.config.clone());
        if let Some(collection) = &self.collection {
            stream = stream.with_collection(collection.clone());
        }
        let object = stream.decode::<T>(&self.registry)?;
        Ok(Decoded {
            object,
            side_channel: stream.take_side_channel(),
        })
    }
}

impl<T> Clone for DocumentDecoder<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            collection: self.collection.clone(),
            config: self.config.clone(),
            _marker: PhantomData,
        }
    }
}
