//! `#[derive(SortKeys)]` implementation.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Token, parse_macro_input, parse_quote};

use crate::case::RenameRule;

// ============================================================================
// ATTRIBUTE PARSING
// ============================================================================

#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    skip: bool,
}

#[derive(Default)]
struct ContainerAttrs {
    rename_all: Option<RenameRule>,
}

/// Which attribute a setting came from. `sort_key` wins over `serde`.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Source {
    SortKey,
    Serde,
}

impl Source {
    fn of(attr: &Attribute) -> Option<Self> {
        if attr.path().is_ident("sort_key") {
            Some(Self::SortKey)
        } else if attr.path().is_ident("serde") {
            Some(Self::Serde)
        } else {
            None
        }
    }
}

/// Consume a serde option this derive does not care about.
fn skip_meta(meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        let _: TokenStream2 = content.parse()?;
    }
    Ok(())
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut sort_key = FieldAttrs::default();
    let mut serde = FieldAttrs::default();

    for attr in attrs {
        let Some(source) = Source::of(attr) else {
            continue;
        };
        let target = match source {
            Source::SortKey => &mut sort_key,
            Source::Serde => &mut serde,
        };

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                let value: LitStr = meta.value()?.parse()?;
                target.rename = Some(value.value());
            } else if meta.path.is_ident("skip")
                || (source == Source::Serde && meta.path.is_ident("skip_serializing"))
            {
                target.skip = true;
            } else if source == Source::SortKey {
                return Err(meta.error("expected `rename = \"...\"` or `skip`"));
            } else {
                skip_meta(&meta)?;
            }
            Ok(())
        })?;
    }

    Ok(FieldAttrs {
        rename: sort_key.rename.or(serde.rename),
        skip: sort_key.skip || serde.skip,
    })
}

fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut sort_key = None;
    let mut serde = None;

    for attr in attrs {
        let Some(source) = Source::of(attr) else {
            continue;
        };

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") && meta.input.peek(Token![=]) {
                let value: LitStr = meta.value()?.parse()?;
                let rule = RenameRule::from_name(&value.value()).ok_or_else(|| {
                    syn::Error::new_spanned(&value, "unknown rename_all rule")
                })?;
                match source {
                    Source::SortKey => sort_key = Some(rule),
                    Source::Serde => serde = Some(rule),
                }
            } else if source == Source::SortKey {
                return Err(meta.error("expected `rename_all = \"...\"`"));
            } else {
                skip_meta(&meta)?;
            }
            Ok(())
        })?;
    }

    Ok(ContainerAttrs {
        rename_all: sort_key.or(serde),
    })
}

// ============================================================================
// CODE GENERATION
// ============================================================================

pub fn derive_sort_keys_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "SortKeys derive only supports structs with named fields. \
                     Example: `struct Post { id: i64, created_at: String }`",
                ));
            },
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "SortKeys derive only supports structs. \
                 Hint: Use `#[derive(SortKeys)]` on the row type you paginate.",
            ));
        },
    };

    let container = parse_container_attrs(&input.attrs)?;

    let mut generics = input.generics.clone();
    let generic = generics.type_params().next().is_some();

    let mut names: Vec<String> = Vec::new();
    let mut arms = Vec::new();
    for field in fields {
        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let Some(ident) = &field.ident else {
            continue;
        };

        let name = attrs.rename.unwrap_or_else(|| {
            let raw = ident.unraw().to_string();
            match container.rename_all {
                Some(rule) => rule.apply(&raw),
                None => raw,
            }
        });
        if names.contains(&name) {
            return Err(syn::Error::new_spanned(
                field,
                format!("duplicate sort key name '{name}'"),
            ));
        }

        if generic {
            let ty = &field.ty;
            generics
                .make_where_clause()
                .predicates
                .push(parse_quote!(#ty: ::seekpage::ToCursorValue));
        }

        arms.push(quote! {
            #name => ::core::option::Option::Some(
                ::seekpage::ToCursorValue::to_cursor_value(&self.#ident)
            ),
        });
        names.push(name);
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::seekpage::SortKeys for #ident #ty_generics #where_clause {
            const SORT_KEYS: &'static [&'static str] = &[#(#names),*];

            fn sort_key(&self, name: &str) -> ::core::option::Option<::seekpage::CursorValue> {
                match name {
                    #(#arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}
