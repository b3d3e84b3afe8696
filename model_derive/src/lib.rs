//! Procedural macros for the QueryHaus model contract
//!
//! This crate provides the `#[model]` macro and the `Model` derive, which generate
//! the `Model` impl and the compile-time table of embedded JSON fields used by the
//! result binder.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, Error};

mod codegen;
mod model_macro;
mod parsing;

use codegen::{generate_embedded_impl, generate_model_impl};
use model_macro::model_attribute;
use parsing::{match_bindings, parse_fields, parse_table_attributes};

/// Derive macro for the `Model` and `Embedded` traits
///
/// Note: It's recommended to use the `#[model]` attribute macro instead,
/// which automatically includes this derive along with other necessary derives.
///
/// A field of type `JsonText` or `Option<JsonText>` is an embedded source. Its
/// column name (`#[sqlx(rename)]` or the field name) is matched against the
/// serialized name (`#[serde(rename)]` or the field name) of every sibling field;
/// each match is an `Option<T>` or `Vec<T>` filled from the JSON after a fetch.
///
/// ```ignore
/// #[derive(Debug, Clone, serde::Serialize, serde::Deserialize, sqlx::FromRow, Model)]
/// #[table(name = "contracts", fetch = "contracts/fetch")]
/// pub struct Contract {
///     pub id: Uuid,
///
///     #[sqlx(rename = "milestones")]
///     #[serde(skip)]
///     pub milestones_json: JsonText,
///
///     #[sqlx(skip)]
///     pub milestones: Vec<Milestone>,
/// }
/// ```
#[proc_macro_derive(Model, attributes(table, sqlx, serde))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;

    // Accessors are nested functions, which cannot see the struct's generics
    if !input.generics.params.is_empty() {
        return Error::new_spanned(&input.generics, "Model cannot be derived for generic structs")
            .to_compile_error()
            .into();
    }

    // Parse table attributes - handle errors properly
    let table_info = match parse_table_attributes(&input.attrs) {
        Ok(attrs) => attrs,
        Err(e) => return e.to_compile_error().into(),
    };

    let fields = match parse_fields(&input) {
        Ok(fields) => fields,
        Err(e) => return e.to_compile_error().into(),
    };

    let bindings = match match_bindings(&fields) {
        Ok(bindings) => bindings,
        Err(e) => return e.to_compile_error().into(),
    };

    let model_impl = generate_model_impl(name, &table_info, &fields);
    let embedded_impl = generate_embedded_impl(name, &bindings);

    let expanded = quote::quote! {
        #model_impl
        #embedded_impl
    };

    TokenStream::from(expanded)
}

/// Convenience attribute macro that adds all necessary derives for a database model
///
/// Usage:
/// ```ignore
/// use queryhaus::prelude::*;
///
/// #[model]
/// #[table(name = "users")]
/// pub struct User {
///     pub id: Uuid,
///     pub name: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn model(attr: TokenStream, item: TokenStream) -> TokenStream {
    model_attribute(attr, item)
}
