use std::collections::VecDeque;

use crate::error::DecodeError;
use crate::stream::{Token, Value};

// -----------------------------------------------------------------------------
// TokenReader

/// A pull-based source of document tokens.
///
/// Decoders drive a reader one token at a time. Readers that wrap another
/// reader can intercept unknown members through [`handle_unknown_field`].
///
/// [`handle_unknown_field`]: TokenReader::handle_unknown_field
pub trait TokenReader {
    /// Returns the next token, or `None` once the stream is exhausted.
    fn next_token(&mut self) -> Result<Option<Token>, DecodeError>;

    /// Returns the next token, failing at the end of the stream.
    #[inline]
    fn expect_token(&mut self) -> Result<Token, DecodeError> {
        self.next_token()?.ok_or(DecodeError::UnexpectedEnd)
    }

    /// Consumes the remainder of the value that started with `first`.
    fn skip_value(&mut self, first: &Token) -> Result<(), DecodeError> {
        if !matches!(first, Token::StartObject | Token::StartArray) {
            return Ok(());
        }
        let mut depth = 1_usize;
        while depth > 0 {
            match self.expect_token()? {
                Token::StartObject | Token::StartArray => depth += 1,
                Token::EndObject | Token::EndArray => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    /// Offers a member that no field of the target document claims.
    ///
    /// Called right after the member name was read. Returning `true` means the
    /// reader consumed the member's value itself. `depth` is `0` for members of
    /// the outermost document.
    #[inline]
    fn handle_unknown_field(&mut self, name: &str, depth: usize) -> Result<bool, DecodeError> {
        let _ = (name, depth);
        Ok(false)
    }
}

impl<R: TokenReader + ?Sized> TokenReader for &mut R {
    #[inline]
    fn next_token(&mut self) -> Result<Option<Token>, DecodeError> {
        (**self).next_token()
    }

    #[inline]
    fn skip_value(&mut self, first: &Token) -> Result<(), DecodeError> {
        (**self).skip_value(first)
    }

    #[inline]
    fn handle_unknown_field(&mut self, name: &str, depth: usize) -> Result<bool, DecodeError> {
        (**self).handle_unknown_field(name, depth)
    }
}

// -----------------------------------------------------------------------------
// TokenBuffer

/// A reader over an in-memory token sequence.
///
/// ```
/// use docmap_mapper::stream::{Token, TokenBuffer, TokenReader, Value};
///
/// let mut buffer = TokenBuffer::from_tokens([
///     Token::StartObject,
///     Token::FieldName("n".to_owned()),
///     Token::Value(Value::Int32(1)),
///     Token::EndObject,
/// ]);
///
/// let first = buffer.expect_token().unwrap();
/// buffer.skip_value(&first).unwrap();
/// assert!(buffer.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TokenBuffer {
    tokens: VecDeque<Token>,
}

impl TokenBuffer {
    #[inline]
    pub const fn new() -> Self {
        Self {
            tokens: VecDeque::new(),
        }
    }

    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    /// A buffer holding a single scalar value.
    pub fn from_value(value: Value) -> Self {
        Self::from_tokens([Token::Value(value)])
    }

    /// The next token, without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.front()
    }

    #[inline]
    pub fn push(&mut self, token: Token) {
        self.tokens.push_back(token);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenReader for TokenBuffer {
    #[inline]
    fn next_token(&mut self) -> Result<Option<Token>, DecodeError> {
        Ok(self.tokens.pop_front())
    }
}

impl FromIterator<Token> for TokenBuffer {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self::from_tokens(iter)
    }
}
