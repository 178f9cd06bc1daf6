//! Sort compilation.
//!
//! A [`SortNode`] becomes a list of [`OrderDescriptor`]s for an external query
//! builder, or a [`Comparator`] for ordering values in memory.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use strainer_syntax::{MultiSort, Sort, SortDirection, SortNode, parse_sort};
use tracing::debug;

use crate::coerce::compare;
use crate::compiler::CompilerOptions;
use crate::error::{QueryError, QueryResult};
use crate::path::{FieldPath, single_value};
use crate::shape::{FieldValue, Filterable};

/// Ordering on one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderDescriptor {
    /// The field path, as written in the sort.
    pub field: Cow<'static, str>,
    /// The direction.
    pub direction: SortDirection,
}

impl OrderDescriptor {
    /// Create a new order descriptor.
    pub fn new(field: impl Into<Cow<'static, str>>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Create an ascending order.
    pub fn asc(field: impl Into<Cow<'static, str>>) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    /// Create a descending order.
    pub fn desc(field: impl Into<Cow<'static, str>>) -> Self {
        Self::new(field, SortDirection::Descending)
    }

    /// Whether this orders smallest first.
    #[inline]
    pub const fn is_ascending(&self) -> bool {
        matches!(self.direction, SortDirection::Ascending)
    }
}

impl fmt::Display for OrderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.is_ascending() { "ASC" } else { "DESC" };
        write!(f, "{} {direction}", self.field)
    }
}

impl From<&Sort> for OrderDescriptor {
    fn from(sort: &Sort) -> Self {
        Self::new(sort.field.clone(), sort.direction)
    }
}

/// Conversion of a sort description into order descriptors.
pub trait ToOrder {
    /// Descriptors in declaration order.
    fn to_order(&self) -> Vec<OrderDescriptor>;
}

impl ToOrder for Sort {
    fn to_order(&self) -> Vec<OrderDescriptor> {
        vec![self.into()]
    }
}

impl ToOrder for MultiSort {
    fn to_order(&self) -> Vec<OrderDescriptor> {
        self.sorts().iter().map(OrderDescriptor::from).collect()
    }
}

impl ToOrder for SortNode {
    fn to_order(&self) -> Vec<OrderDescriptor> {
        match self {
            Self::Sort(sort) => sort.to_order(),
            Self::Multi(multi) => multi.to_order(),
        }
    }
}

#[derive(Debug)]
struct SortKey {
    names: Vec<String>,
    direction: SortDirection,
}

/// In-memory ordering of `T` by a compiled sort.
pub struct Comparator<T> {
    keys: Arc<[SortKey]>,
    ignore_case: bool,
    _marker: PhantomData<fn(&T, &T) -> Ordering>,
}

impl<T> Clone for Comparator<T> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
            ignore_case: self.ignore_case,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Comparator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparator")
            .field("keys", &self.keys)
            .field("ignore_case", &self.ignore_case)
            .finish()
    }
}

impl<T: Filterable> Comparator<T> {
    /// Compile with default options.
    pub fn compile(sort: &SortNode) -> QueryResult<Self> {
        Self::with_options(sort, CompilerOptions::default())
    }

    /// Parse a sort string and compile it.
    pub fn compile_str(sort: &str) -> QueryResult<Self> {
        Self::compile(&parse_sort(sort)?)
    }

    /// Compile, resolving every field against the shape of `T`.
    ///
    /// Only single-valued scalar members can be sorted on.
    pub fn with_options(sort: &SortNode, options: CompilerOptions) -> QueryResult<Self> {
        let shape = T::shape();
        debug!(type_name = shape.name, sort = %sort, "compiling sort");

        let keys = sort
            .sorts()
            .iter()
            .map(|s| {
                let path = FieldPath::parse(&s.field)?.resolve(&shape)?;
                let sortable = !path.has_projection()
                    && path.leaf().is_some_and(|leaf| leaf.field_type.scalar().is_some());
                if !sortable {
                    let type_name = path
                        .leaf()
                        .map(|leaf| leaf.field_type.type_name())
                        .unwrap_or_default();
                    return Err(QueryError::type_mismatch(
                        &s.field,
                        format!("cannot sort on {type_name} values"),
                    )
                    .with_type(shape.name));
                }
                Ok(SortKey {
                    names: path.names(),
                    direction: s.direction,
                })
            })
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(Self {
            keys: keys.into(),
            ignore_case: options.ignore_case,
            _marker: PhantomData,
        })
    }

    /// Compare two values. Nulls, and NaN, come first when ascending.
    pub fn compare(&self, left: &T, right: &T) -> Ordering {
        self.keys
            .iter()
            .map(|key| {
                let a = sort_value(single_value(left, &key.names));
                let b = sort_value(single_value(right, &key.names));
                let ordering = match (&a, &b) {
                    (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
                    (FieldValue::Null, _) => Ordering::Less,
                    (_, FieldValue::Null) => Ordering::Greater,
                    _ => compare(&a, &b, self.ignore_case).unwrap_or(Ordering::Equal),
                };
                match key.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Stable sort of `items`.
    pub fn sort(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

fn sort_value(value: FieldValue<'_>) -> FieldValue<'_> {
    match value {
        FieldValue::Float(f) if f.is_nan() => FieldValue::Null,
        other => other,
    }
}
