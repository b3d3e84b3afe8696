//! Parsing utilities for table and field attributes
//!
//! This module handles the parsing of `#[table]`, `#[sqlx]` and `#[serde]` attributes
//! and the validation of table and query names.

use syn::{
    spanned::Spanned, Attribute, Data, DeriveInput, Error, Fields, GenericArgument, Ident,
    LitStr, Meta, PathArguments, Result, Token, Type,
};

/// Validate table name and return syn::Error for better proc macro error handling
pub fn validate_table_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid table name '{}': {}", name, e)))
}

/// Validate a logical query name: a relative path of non-empty components
pub fn validate_query_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('/')
        && name
            .split('/')
            .all(|part| !part.is_empty() && part != "." && part != "..");
    if valid {
        Ok(())
    } else {
        Err(Error::new(
            span,
            format!("Invalid fetch query name '{}': expected a relative path such as \"contracts/fetch\"", name),
        ))
    }
}

fn validate_identifier(name: &str) -> std::result::Result<(), String> {
    // Check if empty
    if name.is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    // Check length (PostgreSQL limit)
    if name.len() > 63 {
        return Err(format!(
            "Name '{}' is too long: {} characters (max 63)",
            name,
            name.len()
        ));
    }

    // Check first character (must be letter or underscore)
    let first_char = name
        .chars()
        .next()
        .ok_or_else(|| "Name cannot be empty".to_string())?;
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(format!(
            "Name '{}' must start with a letter or underscore",
            name
        ));
    }

    // Check all characters (alphanumeric or underscore only)
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("Name '{}' contains invalid characters: only alphanumeric characters and underscores are allowed", name));
    }

    if is_reserved_keyword(name) {
        return Err(format!("Name '{}' is a reserved SQL keyword", name));
    }

    Ok(())
}

/// Check if a name is a reserved SQL keyword
fn is_reserved_keyword(name: &str) -> bool {
    const RESERVED_KEYWORDS: &[&str] = &[
        "SELECT", "INSERT", "UPDATE", "DELETE", "FROM", "WHERE", "JOIN", "INNER", "LEFT",
        "RIGHT", "FULL", "OUTER", "ON", "AS", "AND", "OR", "NOT", "NULL", "TRUE", "FALSE",
        "CASE", "WHEN", "THEN", "ELSE", "END", "IF", "EXISTS", "IN", "LIKE", "BETWEEN",
        "ORDER", "BY", "GROUP", "HAVING", "LIMIT", "OFFSET", "UNION", "ALL", "DISTINCT",
        "CREATE", "DROP", "ALTER", "TABLE", "INDEX", "VIEW", "DATABASE", "SCHEMA", "PRIMARY",
        "KEY", "FOREIGN", "REFERENCES", "UNIQUE", "CHECK", "DEFAULT", "CONSTRAINT", "COLUMN",
        "GRANT", "REVOKE", "USER", "RETURNING", "ANALYSE", "ANALYZE", "ASC", "DESC", "CAST",
        "COLLATE", "DO", "FETCH", "FOR", "INTO", "LATERAL", "ONLY", "PLACING", "SOME",
        "SYMMETRIC", "TO", "USING", "VARIADIC", "WINDOW", "WITH",
    ];

    RESERVED_KEYWORDS.contains(&name.to_ascii_uppercase().as_str())
}

#[derive(Debug)]
pub struct TableInfo {
    pub name: String,
    /// Logical name of the fetch-by-keys query, `<table>/fetch` unless given
    pub fetch: String,
}

/// How a field holds raw embedded JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    Plain,
    Optional,
}

#[derive(Debug)]
pub struct FieldInfo {
    pub ident: Ident,
    pub ty: Type,
    /// Column the field is scanned from (`#[sqlx(rename)]` or the field name)
    pub column: String,
    /// Name the field has in embedded JSON (`#[serde(rename)]` or the field name)
    pub external: String,
    /// `#[sqlx(skip)]`: not scanned from the row
    pub skipped: bool,
    pub raw: Option<RawKind>,
}

impl FieldInfo {
    /// Persistence tag of an embedded source, `None` if the field is not one
    pub fn source_tag(&self) -> Option<&str> {
        if self.raw.is_none() || self.skipped || self.column.is_empty() || self.column == "-" {
            return None;
        }
        Some(&self.column)
    }
}

/// A raw JSON source and the sibling field it is materialized into
#[derive(Debug)]
pub struct Binding<'a> {
    pub source: &'a FieldInfo,
    pub target: &'a FieldInfo,
}

pub fn parse_table_attributes(attrs: &[Attribute]) -> Result<TableInfo> {
    let mut table_name = None;
    let mut fetch = None;

    for attr in attrs {
        if attr.path().is_ident("table") {
            if let Meta::List(meta_list) = &attr.meta {
                // Parse nested tokens manually since syn 2.0 changed the API
                let mut tokens = meta_list.tokens.clone().into_iter().peekable();

                while let Some(token) = tokens.next() {
                    if let proc_macro2::TokenTree::Ident(key) = token {
                        let key_str = key.to_string();

                        // Expect '=' after key
                        if let Some(proc_macro2::TokenTree::Punct(punct)) = tokens.peek() {
                            if punct.as_char() == '=' {
                                tokens.next(); // consume '='

                                if let Some(proc_macro2::TokenTree::Literal(lit)) = tokens.next() {
                                    let value = lit.to_string().trim_matches('"').to_string();

                                    match key_str.as_str() {
                                        "name" => table_name = Some((value, lit.span())),
                                        "fetch" => fetch = Some((value, lit.span())),
                                        _ => {
                                            return Err(Error::new(
                                                key.span(),
                                                format!("unknown table attribute '{}'", key_str),
                                            ))
                                        }
                                    }
                                }
                            }
                        }

                        // Skip comma if present
                        if let Some(proc_macro2::TokenTree::Punct(punct)) = tokens.peek() {
                            if punct.as_char() == ',' {
                                tokens.next(); // consume ','
                            }
                        }
                    }
                }
            }
        }
    }

    let (name, span) = table_name.ok_or_else(|| {
        Error::new(
            proc_macro2::Span::call_site(),
            "table attribute is required: add #[table(name = \"table_name\")] to your struct",
        )
    })?;

    // Validate table name at compile time with proper error handling
    validate_table_name_syn(&name, span)?;

    let fetch = match fetch {
        Some((fetch, span)) => {
            validate_query_name_syn(&fetch, span)?;
            fetch
        }
        None => format!("{}/fetch", name),
    };

    Ok(TableInfo { name, fetch })
}

pub fn parse_fields(input: &DeriveInput) -> Result<Vec<FieldInfo>> {
    let Data::Struct(data_struct) = &input.data else {
        return Err(Error::new(
            proc_macro2::Span::call_site(),
            "Model can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(fields_named) = &data_struct.fields else {
        return Err(Error::new_spanned(
            &data_struct.fields,
            "Model can only be derived for structs with named fields",
        ));
    };

    let mut fields = Vec::new();
    for field in &fields_named.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| Error::new_spanned(field, "Field must have a name"))?;
        let name = ident.to_string();
        let name = name.strip_prefix("r#").unwrap_or(&name).to_string();

        let sqlx = parse_sqlx_attributes(&field.attrs)?;
        let external = parse_serde_rename(&field.attrs)?.unwrap_or_else(|| name.clone());

        fields.push(FieldInfo {
            ty: field.ty.clone(),
            column: sqlx.rename.unwrap_or(name),
            external,
            skipped: sqlx.skip,
            raw: raw_kind(&field.ty),
            ident,
        });
    }
    Ok(fields)
}

/// Pair every embedded source with the sibling fields sharing its tag
///
/// Sources without a usable tag and targets that are themselves raw JSON are ignored.
pub fn match_bindings(fields: &[FieldInfo]) -> Result<Vec<Binding<'_>>> {
    let mut bindings = Vec::new();

    for source in fields {
        let Some(tag) = source.source_tag() else {
            continue;
        };
        for target in fields {
            if target.ident == source.ident || target.raw.is_some() || target.external != tag {
                continue;
            }
            if !is_bind_target(&target.ty) {
                return Err(Error::new(
                    target.ty.span(),
                    format!(
                        "field '{}' receives embedded JSON from '{}' and must be an Option<T> or Vec<T>",
                        target.ident, source.ident
                    ),
                ));
            }
            bindings.push(Binding { source, target });
        }
    }
    Ok(bindings)
}

#[derive(Default)]
struct SqlxAttributes {
    rename: Option<String>,
    skip: bool,
}

fn parse_sqlx_attributes(attrs: &[Attribute]) -> Result<SqlxAttributes> {
    let mut parsed = SqlxAttributes::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("sqlx")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                parsed.rename = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("skip") {
                parsed.skip = true;
            } else {
                skip_meta_value(&meta)?;
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

/// The name a field is deserialized from, if renamed
fn parse_serde_rename(attrs: &[Attribute]) -> Result<Option<String>> {
    let mut rename = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if meta.input.peek(Token![=]) {
                    rename = Some(meta.value()?.parse::<LitStr>()?.value());
                } else {
                    // rename(serialize = "..", deserialize = "..")
                    meta.parse_nested_meta(|inner| {
                        let value = inner.value()?.parse::<LitStr>()?.value();
                        if inner.path.is_ident("deserialize") {
                            rename = Some(value);
                        }
                        Ok(())
                    })?;
                }
            } else {
                skip_meta_value(&meta)?;
            }
            Ok(())
        })?;
    }
    Ok(rename)
}

/// Consume the value of an attribute key this macro does not interpret
fn skip_meta_value(meta: &syn::meta::ParseNestedMeta) -> Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        content.parse::<proc_macro2::TokenStream>()?;
    }
    Ok(())
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path.path.segments.last(),
        _ => None,
    }
}

fn single_generic(segment: &syn::PathSegment) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

fn is_json_text(ty: &Type) -> bool {
    last_segment(ty).is_some_and(|s| s.ident == "JsonText" && s.arguments.is_empty())
}

fn raw_kind(ty: &Type) -> Option<RawKind> {
    if is_json_text(ty) {
        return Some(RawKind::Plain);
    }
    let segment = last_segment(ty)?;
    if segment.ident == "Option" && single_generic(segment).is_some_and(is_json_text) {
        return Some(RawKind::Optional);
    }
    None
}

fn is_bind_target(ty: &Type) -> bool {
    last_segment(ty)
        .is_some_and(|s| (s.ident == "Option" || s.ident == "Vec") && single_generic(s).is_some())
}
