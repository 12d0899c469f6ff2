//! Token streams, the decode pipeline adapter and the document decoder.

// -----------------------------------------------------------------------------
// Modules

mod bson_reader;
mod config;
mod decoder;
mod decoder_stream;
mod reader;
mod side_channel;
mod token;

// -----------------------------------------------------------------------------
// Exports

pub use bson_reader::BsonReader;
pub use config::{DEFAULT_RESERVED_NAMES, DEFAULT_RESERVED_PREFIX, DecoderConfig};
pub use decoder::{Decoded, DocumentDecoder};
pub use decoder_stream::DecoderStream;
pub use reader::{TokenBuffer, TokenReader};
pub use side_channel::SideChannel;
pub use token::{DbRef, REF_COLLECTION_KEY, REF_DB_KEY, REF_ID_KEY, Token, Value};
