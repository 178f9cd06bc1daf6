//! # strainer-syntax
//!
//! Filter and sort description language for Strainer.
//!
//! This crate provides:
//! - The filter tree ([`FilterNode`]) and value expressions ([`FilterExpression`])
//! - Negation and semantic equivalence over both
//! - A parser for filter strings and sort strings
//! - Configuration parsing for `strainer.toml` files
//!
//! ## Example
//!
//! ```rust
//! use strainer_syntax::{parse_filter, parse_sort, FilterNode};
//!
//! let filter = parse_filter(r#"Nickname eq Bat*|*man and Henchman["Firstname"] isnotnull"#)?;
//! let negated: FilterNode = filter.clone().negate();
//! assert_ne!(filter, negated);
//!
//! let sort = parse_sort("-Height,Firstname")?;
//! assert_eq!(sort.to_string(), "-Height,Firstname");
//! # Ok::<(), strainer_syntax::SyntaxError>(())
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod parser;

pub use ast::*;
pub use config::{CompilerConfig, LogFormat, LoggingConfig, ParserConfig, StrainerConfig};
pub use error::{SyntaxError, SyntaxResult};
pub use parser::{
    FilterParser, SORT_PATTERN, parse_field_path, parse_filter, parse_sort, parse_value,
};
