//! Abstract syntax tree for filters, value expressions and sorts.

pub mod expression;
pub mod filter;
pub mod sort;

pub use expression::{
    DateTimeExpression, FilterExpression, OneOfExpression, OrExpression, RangeExpression,
    TextOperand,
};
pub use filter::{
    CompositeFilter, Filter, FilterLogic, FilterNode, FilterOperator, FilterValue, MultiFilter,
};
pub use sort::{MultiSort, Sort, SortDirection, SortNode};
