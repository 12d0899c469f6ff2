#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// Generated code names this crate by its package name, which would not resolve
// inside the crate itself without this alias.
extern crate self as docmap_mapper;

// -----------------------------------------------------------------------------
// Modules

mod document;
mod utils;

pub mod error;
pub mod id;
pub mod impls;
pub mod info;
pub mod ops;
pub mod reference;
pub mod registry;
pub mod serde;
pub mod store;
pub mod stream;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use bson;
pub use docmap_mapper_derive::Document;
pub use document::Document;

pub use error::{DecodeError, EncodeError, FetchError, StoreError};
pub use id::{IdCodec, IdRepr, Identifier, ObjectId};
pub use reference::{Collection, CollectionBridge, CollectionHandle, DeferredRef, Projection};
pub use registry::{TypeRegistry, TypeRegistryArc};
pub use stream::{Decoded, DecoderConfig, DocumentDecoder, SideChannel};

#[cfg(test)]
mod tests;
