//! Provides `#[derive(Document)]`; see [`Document`].
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static DOCUMENT_ATTRIBUTE_NAME: &str = "document";

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod document;
mod manifest;

// -----------------------------------------------------------------------------
// Macros

/// # Document Derivation
///
/// `#[derive(Document)]` implements `Typed` and `Document` for a struct with
/// named fields. Generic structs are rejected.
///
/// ## Type attributes
///
/// - `#[document(collection = "users")]`: the default collection name.
/// - `#[document(auto_register)]`: submits the type to
///   `TypeRegistry::auto_register`. A no-op when the `auto_register` feature
///   is disabled.
///
/// ## Field attributes
///
/// - `#[document(id)]`: the identity member, always stored as `_id`.
///   At most one member may carry it.
/// - `#[document(object_id)]`: the member (or, for a `Vec` or map, each of its
///   values) is stored as a native object id. On a reference it selects the
///   key conversion.
/// - `#[document(rename = "wire")]`: the stored member name.
/// - `#[document(skip)]`: never read or written; filled with
///   `Default::default()` on decode.
///
/// ## Example
///
/// ```rust, ignore
/// #[derive(Document)]
/// #[document(collection = "posts", auto_register)]
/// struct Post {
///     #[document(id, object_id)]
///     id: Option<String>,
///     #[document(rename = "t")]
///     title: String,
///     #[document(object_id)]
///     author: DeferredRef<User, String>,
///     #[document(skip)]
///     dirty: bool,
/// }
/// ```
#[proc_macro_derive(Document, attributes(document))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match document::impl_document(&ast) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}
