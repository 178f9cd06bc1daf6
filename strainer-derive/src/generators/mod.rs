//! Code generators for `#[derive(Filterable)]`.

mod attrs;
mod derive;

pub use derive::derive_filterable_impl;
