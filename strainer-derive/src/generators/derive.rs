//! Implementation of the `#[derive(Filterable)]` macro.

use std::collections::HashSet;

use convert_case::Casing;
use proc_macro2::{TokenStream, TokenTree};
use quote::{ToTokens, quote};
use syn::{Data, DeriveInput, Fields, Ident, Type, parse_quote};

use super::attrs::{parse_field_attrs, parse_struct_attrs};

/// A field exposed as a member.
struct MemberInfo {
    ident: Ident,
    ty: Type,
    name: String,
}

/// Parse and generate code for the `#[derive(Filterable)]` macro.
pub fn derive_filterable_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let ident = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Filterable derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Filterable derive only supports structs",
            ));
        }
    };

    let struct_attrs = parse_struct_attrs(input)?;
    let krate = struct_attrs
        .krate
        .unwrap_or_else(|| parse_quote!(::strainer));

    let mut members = Vec::with_capacity(fields.len());
    let mut seen = HashSet::new();
    for field in fields {
        let attrs = parse_field_attrs(field)?;
        if attrs.skip {
            continue;
        }

        let field_ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new_spanned(field, "Fields must be named"))?;
        let raw = field_ident.to_string();
        let raw = raw.trim_start_matches("r#");
        let name = match (attrs.rename, struct_attrs.rename_all) {
            (Some(rename), _) => rename,
            (None, Some(case)) => raw.to_case(case),
            (None, None) => raw.to_string(),
        };

        if !seen.insert(name.clone()) {
            return Err(syn::Error::new_spanned(
                field,
                format!("duplicate member name `{name}`"),
            ));
        }
        members.push(MemberInfo {
            ident: field_ident,
            ty: field.ty.clone(),
            name,
        });
    }

    let type_name = ident.to_string();
    let mut generics = input.generics.clone();
    let bounded: Vec<Ident> = generics
        .type_params()
        .map(|param| param.ident.clone())
        .filter(|param| members.iter().any(|m| mentions(m.ty.to_token_stream(), param)))
        .collect();
    let where_clause = generics.make_where_clause();
    for param in &bounded {
        where_clause
            .predicates
            .push(parse_quote!(#param: #krate::Member));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let shapes = members.iter().map(|m| {
        let name = &m.name;
        let ty = &m.ty;
        quote! {
            #krate::FieldShape::new(#name, <#ty as #krate::Member>::field_type())
        }
    });
    let arms = members.iter().map(|m| {
        let name = &m.name;
        let field = &m.ident;
        quote! {
            #name => #krate::Member::to_value(&self.#field),
        }
    });

    Ok(quote! {
        impl #impl_generics #krate::Filterable for #ident #ty_generics #where_clause {
            fn shape() -> #krate::TypeShape {
                #krate::TypeShape::new(#type_name, ::std::vec![#(#shapes),*])
            }

            fn field(&self, name: &str) -> #krate::FieldValue<'_> {
                match name {
                    #(#arms)*
                    _ => #krate::FieldValue::Null,
                }
            }
        }

        impl #impl_generics #krate::Member for #ident #ty_generics #where_clause {
            fn field_type() -> #krate::FieldType {
                #krate::FieldType::Object(<Self as #krate::Filterable>::shape)
            }

            fn to_value(&self) -> #krate::FieldValue<'_> {
                #krate::FieldValue::Object(self)
            }
        }
    })
}

/// Whether `tokens` refer to the type parameter `param`.
fn mentions(tokens: TokenStream, param: &Ident) -> bool {
    tokens.into_iter().any(|token| match token {
        TokenTree::Ident(ident) => ident == *param,
        TokenTree::Group(group) => mentions(group.stream(), param),
        _ => false,
    })
}
