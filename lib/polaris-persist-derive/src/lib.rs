use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, GenericArgument, Lit, Meta, PathArguments, Type, parse_macro_input};

/// Settings from a field's `#[column(...)]` attribute.
struct ColumnAttr {
    name: Option<String>,
    kind: Option<TokenStream2>,
    primary_key: bool,
}

/// Parse `#[column]` / `#[column(name = "...", kind = "...", primary_key)]`.
///
/// Returns `None` for untagged fields, which are not persisted.
fn parse_column_attr(field: &syn::Field) -> syn::Result<Option<ColumnAttr>> {
    let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("column")) else {
        return Ok(None);
    };

    let mut column = ColumnAttr {
        name: None,
        kind: None,
        primary_key: false,
    };

    if let Meta::Path(_) = attr.meta {
        return Ok(Some(column));
    }

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("name") {
            meta.input.parse::<syn::Token![=]>()?;
            let lit: Lit = meta.input.parse()?;
            match lit {
                Lit::Str(s) => column.name = Some(s.value()),
                other => return Err(syn::Error::new_spanned(other, "expected a string")),
            }
        } else if meta.path.is_ident("kind") {
            meta.input.parse::<syn::Token![=]>()?;
            let lit: Lit = meta.input.parse()?;
            match &lit {
                Lit::Str(s) => column.kind = Some(kind_from_name(&s.value(), &lit)?),
                other => return Err(syn::Error::new_spanned(other, "expected a string")),
            }
        } else if meta.path.is_ident("primary_key") {
            column.primary_key = true;
        } else {
            return Err(meta.error("expected `name`, `kind` or `primary_key`"));
        }
        Ok(())
    })?;

    Ok(Some(column))
}

/// Map an explicit `kind = "..."` to a `FieldKind` variant.
fn kind_from_name(kind: &str, span: &Lit) -> syn::Result<TokenStream2> {
    let tokens = match kind {
        "text" => quote! { polaris_persist::FieldKind::Text },
        "integer" => quote! { polaris_persist::FieldKind::Integer },
        "float" => quote! { polaris_persist::FieldKind::Float },
        "boolean" => quote! { polaris_persist::FieldKind::Boolean },
        "timestamp" => quote! { polaris_persist::FieldKind::Timestamp },
        "json" => quote! { polaris_persist::FieldKind::Json },
        _ => {
            return Err(syn::Error::new_spanned(
                span,
                "kind must be one of: text, integer, float, boolean, timestamp, json",
            ));
        }
    };
    Ok(tokens)
}

/// Map a Rust field type to a `FieldKind` variant.
///
/// `Option<T>` and references map as `T`. Matching is on the last path segment,
/// so `chrono::DateTime<Utc>` and `DateTime<Utc>` are treated alike.
fn rust_type_to_kind(ty: &Type) -> TokenStream2 {
    match ty {
        Type::Reference(r) => rust_type_to_kind(&r.elem),
        Type::Paren(p) => rust_type_to_kind(&p.elem),
        Type::Group(g) => rust_type_to_kind(&g.elem),
        Type::Path(p) if p.qself.is_none() => {
            let Some(last) = p.path.segments.last() else {
                return unsupported(ty);
            };

            if last.ident == "Option" {
                if let PathArguments::AngleBracketed(args) = &last.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return rust_type_to_kind(inner);
                    }
                }
                return unsupported(ty);
            }

            match last.ident.to_string().as_str() {
                "String" | "str" | "char" => quote! { polaris_persist::FieldKind::Text },
                "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" | "isize"
                | "usize" => quote! { polaris_persist::FieldKind::Integer },
                "f32" | "f64" => quote! { polaris_persist::FieldKind::Float },
                "bool" => quote! { polaris_persist::FieldKind::Boolean },
                "DateTime" | "NaiveDateTime" | "SystemTime" | "OffsetDateTime"
                | "PrimitiveDateTime" => quote! { polaris_persist::FieldKind::Timestamp },
                "Value" | "JsonValue" | "Json" => quote! { polaris_persist::FieldKind::Json },
                _ => unsupported(ty),
            }
        }
        _ => unsupported(ty),
    }
}

fn unsupported(ty: &Type) -> TokenStream2 {
    let written = quote!(#ty).to_string().replace(' ', "");
    quote! { polaris_persist::FieldKind::Unsupported(#written) }
}

/// Parse `#[model(name = "...")]` and return the type name override.
fn parse_model_attr(input: &DeriveInput) -> syn::Result<Option<String>> {
    let mut type_name = None;
    for attr in &input.attrs {
        if attr.path().is_ident("model") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    meta.input.parse::<syn::Token![=]>()?;
                    let lit: Lit = meta.input.parse()?;
                    match lit {
                        Lit::Str(s) => type_name = Some(s.value()),
                        other => return Err(syn::Error::new_spanned(other, "expected a string")),
                    }
                    Ok(())
                } else {
                    Err(meta.error("expected `name`"))
                }
            })?;
        }
    }
    Ok(type_name)
}

/// Same rule the runtime applies before splicing names into DDL.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Derive macro for the `Model` trait.
///
/// Generates a static `ModelSchema` listing every field tagged with
/// `#[column]`. Untagged fields are not persisted.
///
/// ## Attributes
///
/// Container:
/// - `#[model(name = "pkg.User")]` - type name used for table name derivation
///   (default: the struct name)
///
/// Field:
/// - `#[column]` - persist this field under its own name
/// - `#[column(name = "...")]` - override the column name
/// - `#[column(kind = "json")]` - override the inferred kind (`text`, `integer`,
///   `float`, `boolean`, `timestamp`, `json`)
/// - `#[column(primary_key)]` - mark the primary key (at most one)
///
/// ## Example
///
/// ```text
/// #[derive(Model)]
/// pub struct User {
///     #[column(primary_key)]
///     pub id: String,
///     #[column]
///     pub email: String,
///     #[column(name = "signed_up")]
///     pub created_at: DateTime<Utc>,
///     pub session: Option<Session>,   // not persisted
/// }
/// // User::schema().table_name("") == "user"
/// ```
#[proc_macro_derive(Model, attributes(model, column))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_model(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_model(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Model only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Model only supports structs",
            ));
        }
    };

    let type_name = parse_model_attr(input)?.unwrap_or_else(|| name.to_string());

    let mut field_entries = Vec::new();
    let mut seen_columns: Vec<String> = Vec::new();
    let mut primary_keys = 0;

    for field in fields.iter() {
        let Some(column) = parse_column_attr(field)? else {
            continue;
        };
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };

        let field_name = field_ident.to_string();
        let column_name = column.name.unwrap_or_else(|| field_name.clone());

        if !is_identifier(&column_name) {
            return Err(syn::Error::new_spanned(
                field_ident,
                format!("column name {:?} is not a valid SQL identifier", column_name),
            ));
        }
        if seen_columns.contains(&column_name) {
            return Err(syn::Error::new_spanned(
                field_ident,
                format!("duplicate column {:?}", column_name),
            ));
        }
        if column.primary_key {
            primary_keys += 1;
            if primary_keys > 1 {
                return Err(syn::Error::new_spanned(
                    field_ident,
                    "only one field may be marked #[column(primary_key)]",
                ));
            }
        }

        let kind = column.kind.unwrap_or_else(|| rust_type_to_kind(&field.ty));
        let primary_key = column.primary_key;
        field_entries.push(quote! {
            polaris_persist::FieldSchema {
                name: #field_name,
                column: #column_name,
                kind: #kind,
                primary_key: #primary_key,
            }
        });
        seen_columns.push(column_name);
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics polaris_persist::Model for #name #ty_generics #where_clause {
            fn schema() -> &'static polaris_persist::ModelSchema {
                static SCHEMA: polaris_persist::ModelSchema = polaris_persist::ModelSchema {
                    type_name: #type_name,
                    fields: &[#(#field_entries),*],
                };
                &SCHEMA
            }
        }
    })
}
