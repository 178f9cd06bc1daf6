//! Procedural macros for Strainer.
//!
//! # Macros
//!
//! - [`Filterable`] - Describe a struct's members so filters and sorts can be
//!   compiled against it
//!
//! # Example
//!
//! ```rust,ignore
//! #[derive(strainer::Filterable)]
//! #[filterable(rename_all = "PascalCase")]
//! struct SuperHero {
//!     firstname: String,
//!     nickname: Option<String>,
//!     #[filterable(rename = "Age")]
//!     age_in_years: u32,
//!     #[filterable(skip)]
//!     secret_identity: String,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod generators;

/// Derive `Filterable` and `Member` for a struct with named fields.
///
/// Every field type must implement `Member`. Nested structs deriving
/// `Filterable` are members too, so paths such as `Henchman.Weapons.Name`
/// resolve through them.
///
/// # Attributes
///
/// ## Struct-level
/// - `#[filterable(rename_all = "PascalCase")]` - Case convention for member
///   names (`PascalCase`, `camelCase`, `snake_case`, `SCREAMING_SNAKE_CASE`,
///   `kebab-case`, `lowercase`, `UPPERCASE`)
/// - `#[filterable(crate = "strainer_query")]` - Path to the runtime crate
///   (default: `::strainer`)
///
/// ## Field-level
/// - `#[filterable(rename = "Name")]` - Member name used in filters
/// - `#[filterable(skip)]` - Hide the field from filters and sorts
#[proc_macro_derive(Filterable, attributes(filterable))]
pub fn derive_filterable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generators::derive_filterable_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
