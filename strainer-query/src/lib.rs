//! # strainer-query
//!
//! Compiles Strainer filters and sorts against Rust types.
//!
//! This crate provides:
//! - The type-shape model ([`Filterable`], [`Member`]) types expose to filters
//! - Field-path resolution, including projection over collections
//! - The predicate compiler ([`Compiler`], [`Predicate`])
//! - The sort compiler ([`ToOrder`], [`Comparator`])
//! - Error codes and logging setup
//!
//! ## Example
//!
//! ```rust
//! use strainer_query::{Filterable, Predicate, ToOrder, OrderDescriptor};
//! use strainer_query::shape::{FieldShape, FieldValue, Member, TypeShape};
//! use strainer_syntax::{parse_filter, parse_sort};
//!
//! struct Weapon {
//!     name: String,
//!     level: i32,
//! }
//!
//! impl Filterable for Weapon {
//!     fn shape() -> TypeShape {
//!         TypeShape::new("Weapon", vec![
//!             FieldShape::new("Name", String::field_type()),
//!             FieldShape::new("Level", i32::field_type()),
//!         ])
//!     }
//!
//!     fn field(&self, name: &str) -> FieldValue<'_> {
//!         match name {
//!             "Name" => self.name.to_value(),
//!             "Level" => self.level.to_value(),
//!             _ => FieldValue::Null,
//!         }
//!     }
//! }
//!
//! let strong = Predicate::<Weapon>::compile(&parse_filter("Level gte 3 and Name neq stick")?)?;
//! assert!(strong.matches(&Weapon { name: "batarang".into(), level: 4 }));
//!
//! let order = parse_sort("-Level,Name")?.to_order();
//! assert_eq!(order[0], OrderDescriptor::desc("Level"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod coerce;
pub mod compiler;
pub mod error;
pub mod logging;
pub mod order;
pub mod path;
pub mod shape;

pub use compiler::{Compiler, CompilerOptions, Predicate};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use order::{Comparator, OrderDescriptor, ToOrder};
pub use path::{Access, FieldPath, PathSegment, ResolvedPath};
pub use shape::{FieldShape, FieldType, FieldValue, Filterable, Member, ScalarType, TypeShape};
