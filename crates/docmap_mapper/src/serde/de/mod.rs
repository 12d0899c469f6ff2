// -----------------------------------------------------------------------------
// Modules

mod context;
mod driver;
mod error_utils;
mod reference;
mod value;

// -----------------------------------------------------------------------------
// Exports

pub use context::DecodeContext;
pub use driver::{DocumentDriver, from_reader};
pub use reference::decode_reference;
pub use value::{ScalarDeserializer, ValueDeserializer};
