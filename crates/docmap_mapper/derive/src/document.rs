use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Type};

use crate::attributes::{FieldAttributes, TypeAttributes};

/// A member as seen by the generated code.
struct Member<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    attrs: FieldAttributes,
}

pub(crate) fn impl_document(ast: &DeriveInput) -> syn::Result<TokenStream> {
    if !ast.generics.params.is_empty() || ast.generics.where_clause.is_some() {
        return Err(syn::Error::new(
            ast.generics.span(),
            "`Document` cannot be derived for generic types",
        ));
    }

    let Data::Struct(data) = &ast.data else {
        return Err(syn::Error::new(
            ast.ident.span(),
            "`Document` can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new(
            data.fields.span(),
            "`Document` can only be derived for structs with named fields",
        ));
    };

    let type_attrs = TypeAttributes::parse_attrs(&ast.attrs)?;
    let mut members = Vec::with_capacity(fields.named.len());
    for field in &fields.named {
        let attrs = FieldAttributes::parse_attrs(&field.attrs)?;
        // Named fields always carry an ident.
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        members.push(Member {
            ident,
            ty: &field.ty,
            attrs,
        });
    }

    if let Some(second) = members.iter().filter(|m| m.attrs.id).nth(1) {
        return Err(syn::Error::new(
            second.ident.span(),
            "only one member can be marked `id`",
        ));
    }

    let mapper = crate::manifest::docmap_mapper();
    let exports = quote!(#mapper::__macro_exports);
    let ident = &ast.ident;

    let stored: Vec<&Member> = members.iter().filter(|m| !m.attrs.skip).collect();

    // -------------------------------------------------------------------------
    // Typed

    let named_fields = stored.iter().map(|member| {
        let ty = member.ty;
        let name = LitStr::new(&member.ident.to_string(), member.ident.span());

        let mut markers = Vec::new();
        if member.attrs.id {
            markers.push(quote!(#exports::Markers::ID));
        }
        if member.attrs.object_id {
            markers.push(quote!(#exports::Markers::OBJECT_ID));
        }
        let with_markers = if markers.is_empty() {
            TokenStream::new()
        } else {
            quote!(.with_markers(#(#markers)|*))
        };
        let with_rename = match &member.attrs.rename {
            Some(rename) => quote!(.with_rename(#rename)),
            None => TokenStream::new(),
        };

        quote! {
            #exports::NamedField::new::<#ty>(#name) #with_markers #with_rename
        }
    });

    let with_collection = match &type_attrs.collection {
        Some(collection) => quote!(.with_collection(#collection)),
        None => TokenStream::new(),
    };

    let typed_impl = quote! {
        impl #exports::Typed for #ident {
            fn type_info() -> &'static #exports::TypeInfo {
                static CELL: #exports::NonGenericTypeInfoCell = #exports::NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    #exports::TypeInfo::Document(
                        #exports::DocumentInfo::new::<Self>(&[
                            #(#named_fields,)*
                        ])
                        #with_collection
                    )
                })
            }
        }
    };

    // -------------------------------------------------------------------------
    // Document

    let mut index = 0_usize;
    let assignments = members.iter().map(|member| {
        let field = member.ident;
        if member.attrs.skip {
            quote!(#field: ::core::default::Default::default())
        } else {
            let ty = member.ty;
            let current = index;
            index += 1;
            quote!(#field: document.take::<#ty>(#current)?)
        }
    });
    let assignments: Vec<TokenStream> = assignments.collect();

    let bind_document = if stored.is_empty() {
        quote!(let _ = document;)
    } else {
        quote!(let mut document = document;)
    };

    let field_arms = stored.iter().enumerate().map(|(index, member)| {
        let field = member.ident;
        quote!(#index => ::core::option::Option::Some(&self.#field))
    });

    let document_impl = quote! {
        impl #exports::Document for #ident {
            fn from_dynamic(
                document: #exports::DynamicDocument,
            ) -> ::core::result::Result<Self, #exports::DecodeError> {
                #bind_document
                ::core::result::Result::Ok(Self {
                    #(#assignments,)*
                })
            }

            fn field_at(&self, index: usize) -> ::core::option::Option<&dyn ::core::any::Any> {
                match index {
                    #(#field_arms,)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    };

    let auto_register_impl = impl_auto_register(&type_attrs, &exports, ident);

    Ok(quote! {
        #typed_impl
        #document_impl
        #auto_register_impl
    })
}

#[cfg(feature = "auto_register")]
fn impl_auto_register(attrs: &TypeAttributes, exports: &TokenStream, ident: &Ident) -> TokenStream {
    if !attrs.auto_register {
        return TokenStream::new();
    }
    quote! {
        #exports::auto_register::inventory::submit! {
            #exports::auto_register::__AutoRegisterFunc(
                #exports::auto_register::__register::<#ident>
            )
        }
    }
}

#[cfg(not(feature = "auto_register"))]
fn impl_auto_register(_: &TypeAttributes, _: &TokenStream, _: &Ident) -> TokenStream {
    TokenStream::new()
}
