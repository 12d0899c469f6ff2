//! Parsing of `#[document(...)]` attributes.

use syn::spanned::Spanned;
use syn::{Attribute, LitStr};

use crate::DOCUMENT_ATTRIBUTE_NAME;

// -----------------------------------------------------------------------------
// TypeAttributes

/// `#[document(collection = "...", auto_register)]` on the struct.
#[derive(Default)]
pub(crate) struct TypeAttributes {
    pub collection: Option<LitStr>,
    pub auto_register: bool,
}

impl TypeAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        for attr in attrs {
            if !attr.path().is_ident(DOCUMENT_ATTRIBUTE_NAME) {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("collection") {
                    if out.collection.is_some() {
                        return Err(meta.error("duplicate `collection`"));
                    }
                    out.collection = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("auto_register") {
                    out.auto_register = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `collection = \"...\"` or `auto_register`"))
                }
            })?;
        }
        Ok(out)
    }
}

// -----------------------------------------------------------------------------
// FieldAttributes

/// `#[document(id, object_id, rename = "...", skip)]` on a member.
#[derive(Default)]
pub(crate) struct FieldAttributes {
    pub id: bool,
    pub object_id: bool,
    pub rename: Option<LitStr>,
    pub skip: bool,
}

impl FieldAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        let mut span = None;
        for attr in attrs {
            if !attr.path().is_ident(DOCUMENT_ATTRIBUTE_NAME) {
                continue;
            }
            span.get_or_insert(attr.span());
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    out.id = true;
                } else if meta.path.is_ident("object_id") {
                    out.object_id = true;
                } else if meta.path.is_ident("skip") {
                    out.skip = true;
                } else if meta.path.is_ident("rename") {
                    if out.rename.is_some() {
                        return Err(meta.error("duplicate `rename`"));
                    }
                    out.rename = Some(meta.value()?.parse()?);
                } else {
                    return Err(meta.error(
                        "expected `id`, `object_id`, `rename = \"...\"` or `skip`",
                    ));
                }
                Ok(())
            })?;
        }

        if let Some(span) = span {
            if out.skip && (out.id || out.object_id || out.rename.is_some()) {
                return Err(syn::Error::new(
                    span,
                    "a skipped member cannot carry other document attributes",
                ));
            }
            if out.id && out.rename.is_some() {
                return Err(syn::Error::new(
                    span,
                    "the `id` member is always stored as `_id` and cannot be renamed",
                ));
            }
        }
        Ok(out)
    }
}
