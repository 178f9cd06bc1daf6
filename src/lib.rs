//! # Strainer
//!
//! A filter and sort description language for Rust collections.
//!
//! Strainer provides:
//! - A textual filter syntax (`Nickname eq Bat*|*man and Height gte 180`)
//!   and its JSON form
//! - Value expressions with wildcards, alternatives, ranges and negation
//! - Negation and semantic equivalence over filters
//! - Compilation of filters into predicates over any `#[derive(Filterable)]`
//!   type, including paths through nested objects and collections
//! - Sort strings (`-Height,Firstname`) compiled into order descriptors or
//!   in-memory comparators
//!
//! ## Quick Start
//!
//! ```rust
//! use strainer::prelude::*;
//!
//! #[derive(Filterable)]
//! #[filterable(rename_all = "PascalCase")]
//! struct SuperHero {
//!     firstname: String,
//!     nickname: Option<String>,
//!     height: i32,
//! }
//!
//! let heroes = vec![
//!     SuperHero { firstname: "Bruce".into(), nickname: Some("Batman".into()), height: 190 },
//!     SuperHero { firstname: "Clark".into(), nickname: Some("Superman".into()), height: 191 },
//!     SuperHero { firstname: "Barry".into(), nickname: None, height: 178 },
//! ];
//!
//! let filter = parse_filter("Nickname eq *man and Height gte 180")?;
//! let predicate = Predicate::<SuperHero>::compile(&filter)?;
//! let names: Vec<_> = predicate.filter(&heroes).map(|h| h.firstname.as_str()).collect();
//! assert_eq!(names, ["Bruce", "Clark"]);
//!
//! let order = parse_sort("-Height")?.to_order();
//! assert_eq!(order[0].to_string(), "Height DESC");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Filter and sort syntax: AST, parser and configuration.
pub mod syntax {
    pub use strainer_syntax::*;
}

/// Compilation of filters and sorts against Rust types.
pub mod query {
    pub use strainer_query::*;
}

// Re-export the derive macro
pub use strainer_derive::Filterable;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::query::{
        Comparator, Compiler, CompilerOptions, OrderDescriptor, Predicate, QueryError, ToOrder,
    };
    pub use crate::syntax::{
        Filter, FilterExpression, FilterLogic, FilterNode, FilterOperator, FilterValue, Sort,
        SortDirection, SortNode, parse_filter, parse_sort,
    };
    pub use crate::{Filterable, Member};
}

// Re-export key types at the crate root
pub use query::{
    ErrorCode, FieldShape, FieldType, FieldValue, Filterable, Member, QueryError, QueryResult,
    ScalarType, TypeShape, logging,
};
pub use syntax::{StrainerConfig, SyntaxError, SyntaxResult};
