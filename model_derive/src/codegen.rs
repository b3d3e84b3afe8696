//! Code generation for the model contract and the embedded field table

use crate::parsing::{Binding, FieldInfo, TableInfo};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::Ident;

pub fn generate_model_impl(name: &Ident, table: &TableInfo, fields: &[FieldInfo]) -> TokenStream {
    let table_name = &table.name;
    let fetch_query = &table.fetch;
    let columns = fields.iter().filter(|f| !f.skipped).map(|f| &f.column);

    quote! {
        impl store_access::Model for #name {
            fn table_name() -> &'static str {
                #table_name
            }

            fn fetch_query() -> &'static str {
                #fetch_query
            }

            fn columns() -> &'static [&'static str] {
                &[#(#columns),*]
            }
        }
    }
}

/// `Embedded` impl backed by a constant table of accessor functions
///
/// The accessors are plain functions nested in `embedded_fields`, so the table
/// can live in a `const` without any runtime registration.
pub fn generate_embedded_impl(name: &Ident, bindings: &[Binding<'_>]) -> TokenStream {
    if bindings.is_empty() {
        return quote! {
            impl store_access::Embedded for #name {}
        };
    }

    let mut accessors = Vec::with_capacity(bindings.len());
    let mut entries = Vec::with_capacity(bindings.len());

    for (i, binding) in bindings.iter().enumerate() {
        let raw_fn = format_ident!("__raw_{}", i);
        let assign_fn = format_ident!("__assign_{}", i);
        let source_field = &binding.source.ident;
        let target_field = &binding.target.ident;
        let source_tag = &binding.source.column;
        let target_name = binding.target.ident.to_string();

        accessors.push(quote! {
            fn #raw_fn(record: &#name) -> ::core::option::Option<&str> {
                store_access::binder::RawSource::raw_json(&record.#source_field)
            }

            fn #assign_fn(record: &mut #name, raw: &str) -> store_access::binder::BindResult {
                store_access::binder::BindTarget::bind_json(&mut record.#target_field, raw)
            }
        });
        entries.push(quote! {
            store_access::EmbeddedField::new(#source_tag, #target_name, #raw_fn, #assign_fn)
        });
    }

    quote! {
        impl store_access::Embedded for #name {
            fn embedded_fields() -> &'static [store_access::EmbeddedField<Self>] {
                #(#accessors)*

                const FIELDS: &[store_access::EmbeddedField<#name>] = &[#(#entries),*];
                FIELDS
            }
        }
    }
}
