use std::sync::Arc;

use crate::Document;
use crate::error::DecodeError;
use crate::reference::{BoundCollection, CollectionBridge, CollectionHandle};
use crate::registry::TypeRegistryArc;
use crate::serde::DocumentDriver;
use crate::stream::{DecoderConfig, SideChannel, Token, TokenReader};

// -----------------------------------------------------------------------------
// DecoderStream

/// The decode pipeline adapter.
///
/// Wraps a raw [`TokenReader`] and
/// - normalizes raw scalar values into typed [`Value`](crate::stream::Value)s,
/// - diverts reserved top-level members into a [`SideChannel`],
/// - exposes the owning collection to reference decoders through [`bridge`].
///
/// [`bridge`]: DecoderStream::bridge
pub struct DecoderStream<R> {
    inner: R,
    config: Arc<DecoderConfig>,
    collection: Option<Arc<dyn CollectionHandle>>,
    side_channel: SideChannel,
}

impl<R: TokenReader> DecoderStream<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            config: Arc::default(),
            collection: None,
            side_channel: SideChannel::new(),
        }
    }

    #[inline]
    pub fn with_config(mut self, config: Arc<DecoderConfig>) -> Self {
        self.config = config;
        self
    }

    /// Binds the stream to the collection the document was read from.
    #[inline]
    pub fn with_collection(mut self, collection: Arc<dyn CollectionHandle>) -> Self {
        self.collection = Some(collection);
        self
    }

    #[inline]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Returns the collection bridge, if the stream is bound to a collection.
    #[inline]
    pub fn bridge(&self) -> Option<BoundCollection> {
        self.collection.clone().map(BoundCollection::new)
    }

    /// Members diverted so far.
    #[inline]
    pub fn side_channel(&self) -> &SideChannel {
        &self.side_channel
    }

    #[inline]
    pub fn take_side_channel(&mut self) -> SideChannel {
        core::mem::take(&mut self.side_channel)
    }

    #[inline]
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Decodes one document of type `T` from the stream.
    pub fn decode<T: Document>(&mut self, registry: &TypeRegistryArc) -> Result<T, DecodeError> {
        let bridge = self.bridge();
        DocumentDriver::of::<T>(registry)
            .with_bridge(bridge.as_ref().map(|bridge| bridge as &dyn CollectionBridge))
            .deny_unknown_fields(self.config.deny_unknown_fields())
            .fill_absent_members(self.config.fill_absent_members())
            .decode_into::<T, _>(self)
    }
}

impl<R: TokenReader> TokenReader for DecoderStream<R> {
    #[inline]
    fn next_token(&mut self) -> Result<Option<Token>, DecodeError> {
        Ok(match self.inner.next_token()? {
            Some(Token::Value(value)) => Some(Token::Value(value.normalize())),
            other => other,
        })
    }

    fn handle_unknown_field(&mut self, name: &str, depth: usize) -> Result<bool, DecodeError> {
        if depth != 0 || !self.config.is_reserved(name) {
            return Ok(false);
        }
        let value = match self.expect_token()? {
            Token::Value(value) => Some(value),
            Token::Null => None,
            first @ (Token::StartObject | Token::StartArray) => {
                self.skip_value(&first)?;
                None
            }
            other => return Err(DecodeError::unexpected("a member value", other)),
        };
        log::debug!("diverting reserved member `{name}` into the side channel");
        self.side_channel.insert(name.to_owned(), value);
        Ok(true)
    }
}
