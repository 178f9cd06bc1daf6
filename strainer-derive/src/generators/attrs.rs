//! `#[filterable(...)]` attribute parsing.

use convert_case::Case;
use syn::{DeriveInput, Field, LitStr, Path};

/// Struct-level attributes.
#[derive(Default)]
pub struct StructAttrs {
    pub rename_all: Option<Case>,
    pub krate: Option<Path>,
}

/// Field-level attributes.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    pub rename: Option<String>,
    pub skip: bool,
}

/// Parse struct-level `#[filterable(...)]` attributes.
pub fn parse_struct_attrs(input: &DeriveInput) -> Result<StructAttrs, syn::Error> {
    let mut attrs = StructAttrs::default();

    for attr in &input.attrs {
        if !attr.path().is_ident("filterable") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                let value: LitStr = meta.value()?.parse()?;
                let case = parse_case(&value.value())
                    .ok_or_else(|| meta.error(format!("unknown case `{}`", value.value())))?;
                attrs.rename_all = Some(case);
            } else if meta.path.is_ident("crate") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.krate = Some(value.parse()?);
            } else {
                return Err(meta.error("unsupported filterable attribute"));
            }
            Ok(())
        })?;
    }

    Ok(attrs)
}

/// Parse `#[filterable(...)]` attributes on a field.
pub fn parse_field_attrs(field: &Field) -> Result<FieldAttrs, syn::Error> {
    let mut attrs = FieldAttrs::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("filterable") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(meta.error("member name must not be empty"));
                }
                attrs.rename = Some(value.value());
            } else if meta.path.is_ident("skip") {
                attrs.skip = true;
            } else {
                return Err(meta.error("unsupported filterable attribute"));
            }
            Ok(())
        })?;
    }

    Ok(attrs)
}

fn parse_case(name: &str) -> Option<Case> {
    Some(match name {
        "PascalCase" => Case::Pascal,
        "camelCase" => Case::Camel,
        "snake_case" => Case::Snake,
        "SCREAMING_SNAKE_CASE" => Case::UpperSnake,
        "kebab-case" => Case::Kebab,
        "lowercase" => Case::Flat,
        "UPPERCASE" => Case::UpperFlat,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_struct_attrs() {
        let input: DeriveInput = parse_quote! {
            #[filterable(rename_all = "camelCase", crate = "strainer_query")]
            struct Hero {
                name: String,
            }
        };

        let attrs = parse_struct_attrs(&input).unwrap();
        assert_eq!(attrs.rename_all, Some(Case::Camel));
        assert!(attrs.krate.unwrap().is_ident("strainer_query"));
    }

    #[test]
    fn test_unknown_case() {
        let input: DeriveInput = parse_quote! {
            #[filterable(rename_all = "Shouting")]
            struct Hero {
                name: String,
            }
        };

        assert!(parse_struct_attrs(&input).is_err());
    }

    #[test]
    fn test_field_attrs() {
        let field: Field = parse_quote! {
            #[filterable(rename = "Age")]
            age_in_years: u32
        };
        let attrs = parse_field_attrs(&field).unwrap();
        assert_eq!(attrs.rename.as_deref(), Some("Age"));
        assert!(!attrs.skip);

        let field: Field = parse_quote! {
            #[filterable(skip)]
            secret: String
        };
        assert!(parse_field_attrs(&field).unwrap().skip);
    }

    #[test]
    fn test_unknown_field_attr() {
        let field: Field = parse_quote! {
            #[filterable(column = "age")]
            age: u32
        };
        assert!(parse_field_attrs(&field).is_err());
    }
}
