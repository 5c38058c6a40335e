//! Procedural macros for the docmap project.
//!
//! `#[derive(Document)]` implements `docmap::document::Document` for a struct whose
//! collection is named with `#[document(collection = "...")]` and whose identifier lives in
//! the field marked `#[document(id)]`:
//!
//! ```ignore
//! use docmap::Document;
//!
//! #[derive(Debug, Clone, Document)]
//! #[document(collection = "test")]
//! pub struct Person {
//!     #[document(id)]
//!     entity: Entity,
//!     name: String,
//! }
//! ```
//!
//! The identifier field may be any type implementing `docmap::document::Identified`.

#[allow(unused_extern_crates)]
extern crate self as docmap_macros;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Member, parse_macro_input, spanned::Spanned};

#[proc_macro_derive(Document, attributes(document))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_document(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_document(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let collection = collection_name(input)?;
    let id_member = id_member(input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::docmap::document::Document for #name #ty_generics #where_clause {
            fn id(&self) -> &::docmap::bson::oid::ObjectId {
                ::docmap::document::Identified::object_id(&self.#id_member)
            }

            fn collection_name() -> &'static str {
                #collection
            }
        }
    })
}

fn collection_name(input: &DeriveInput) -> syn::Result<LitStr> {
    let mut collection = None;

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("document")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                if collection.is_some() {
                    return Err(meta.error("duplicate `collection` argument"));
                }
                collection = Some(meta.value()?.parse::<LitStr>()?);
                Ok(())
            } else {
                Err(meta.error("expected `collection = \"...\"`"))
            }
        })?;
    }

    let collection = collection.ok_or_else(|| syn::Error::new(
        input.ident.span(),
        "missing `#[document(collection = \"...\")]` attribute",
    ))?;

    if collection.value().is_empty() {
        return Err(syn::Error::new(collection.span(), "collection name must not be empty"));
    }

    Ok(collection)
}

fn id_member(input: &DeriveInput) -> syn::Result<Member> {
    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => return Err(syn::Error::new(
            input.ident.span(),
            "`Document` can only be derived for structs",
        )),
    };

    let mut found: Option<Member> = None;

    for (index, field) in fields.iter().enumerate() {
        let mut is_id = false;

        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("document")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    is_id = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `id`"))
                }
            })?;
        }

        if !is_id {
            continue;
        }
        if found.is_some() {
            return Err(syn::Error::new(field.span(), "only one field can be marked `#[document(id)]`"));
        }

        found = Some(match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(index.into()),
        });
    }

    if let Some(member) = found {
        return Ok(member);
    }

    // Fall back to a field literally named `id`.
    if let Fields::Named(named) = fields {
        let fallback = named
            .named
            .iter()
            .filter_map(|field| field.ident.as_ref())
            .find(|ident| *ident == "id");

        if let Some(ident) = fallback {
            return Ok(Member::Named(Ident::clone(ident)));
        }
    }

    Err(syn::Error::new(
        input.ident.span(),
        "no identifier field: mark one field with `#[document(id)]`",
    ))
}
