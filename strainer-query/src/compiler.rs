//! Compiling filter trees into predicates over a [`Filterable`] type.
//!
//! Compilation resolves every field path against the type's shape and
//! converts every literal to the member's declared type up front, so a
//! compiled [`Predicate`] never fails when applied.
//!
//! ```rust
//! use strainer_query::{Compiler, Filterable, Predicate};
//! use strainer_query::shape::{FieldShape, FieldValue, Member, TypeShape};
//!
//! struct Hero {
//!     name: String,
//!     height: i32,
//! }
//!
//! impl Filterable for Hero {
//!     fn shape() -> TypeShape {
//!         TypeShape::new("Hero", vec![
//!             FieldShape::new("Name", String::field_type()),
//!             FieldShape::new("Height", i32::field_type()),
//!         ])
//!     }
//!
//!     fn field(&self, name: &str) -> FieldValue<'_> {
//!         match name {
//!             "Name" => self.name.to_value(),
//!             "Height" => self.height.to_value(),
//!             _ => FieldValue::Null,
//!         }
//!     }
//! }
//!
//! let tall: Predicate<Hero> = Compiler::default().compile_str("Height gte 190")?;
//! assert!(tall.matches(&Hero { name: "Bruce".into(), height: 190 }));
//! assert!(!tall.matches(&Hero { name: "Dick".into(), height: 170 }));
//! # Ok::<(), strainer_query::QueryError>(())
//! ```

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use strainer_syntax::{
    CompilerConfig, Filter, FilterExpression, FilterLogic, FilterNode, FilterOperator, FilterValue,
    TextOperand, parse_filter,
};
use tracing::debug;

use crate::coerce::{Literal, coerce, coerce_expression, compare, equals};
use crate::error::{QueryError, QueryResult};
use crate::path::{Access, FieldPath, PathSegment, any_value};
use crate::shape::{FieldType, FieldValue, Filterable, ScalarType, TypeShape};

type Matcher = Arc<dyn Fn(&dyn Filterable) -> bool + Send + Sync>;
type ValueTest = Arc<dyn Fn(&FieldValue<'_>) -> bool + Send + Sync>;

fn matcher(f: impl Fn(&dyn Filterable) -> bool + Send + Sync + 'static) -> Matcher {
    Arc::new(f)
}

fn value_test(f: impl Fn(&FieldValue<'_>) -> bool + Send + Sync + 'static) -> ValueTest {
    Arc::new(f)
}

/// Compiler settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Compare text without regard to case.
    pub ignore_case: bool,
}

impl From<&CompilerConfig> for CompilerOptions {
    fn from(config: &CompilerConfig) -> Self {
        Self {
            ignore_case: config.ignore_case,
        }
    }
}

/// A compiled filter over `T`.
pub struct Predicate<T> {
    matcher: Matcher,
    _marker: PhantomData<fn(&T) -> bool>,
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            matcher: Arc::clone(&self.matcher),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("type", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T: Filterable> Predicate<T> {
    /// Compile with default options.
    pub fn compile(node: &FilterNode) -> QueryResult<Self> {
        Compiler::default().compile(node)
    }

    /// Compile a filter that may be absent; an absent filter is rejected.
    pub fn compile_optional(node: Option<&FilterNode>) -> QueryResult<Self> {
        Compiler::default().compile_optional(node)
    }

    /// The predicate accepting every element.
    pub fn always() -> Self {
        Self::from_matcher(matcher(|_| true))
    }

    fn from_matcher(matcher: Matcher) -> Self {
        Self {
            matcher,
            _marker: PhantomData,
        }
    }

    /// Whether `item` is accepted.
    pub fn matches(&self, item: &T) -> bool {
        (self.matcher)(item as &dyn Filterable)
    }

    /// Keep the accepted items.
    pub fn filter<'t, I>(&self, items: I) -> impl Iterator<Item = &'t T>
    where
        I: IntoIterator<Item = &'t T>,
        T: 't,
    {
        let predicate = self.clone();
        items.into_iter().filter(move |item| predicate.matches(item))
    }

    /// Convert into a plain closure.
    pub fn into_fn(self) -> impl Fn(&T) -> bool + Clone + Send + Sync {
        move |item: &T| self.matches(item)
    }
}

/// How a constant in a value expression is compared with text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextMode {
    Equal,
    Contains,
    StartsWith,
    EndsWith,
}

/// Filter compiler.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
}

impl Compiler {
    /// Create a compiler with the given options.
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> CompilerOptions {
        self.options
    }

    /// Compile `node` against the shape of `T`.
    pub fn compile<T: Filterable>(&self, node: &FilterNode) -> QueryResult<Predicate<T>> {
        let shape = T::shape();
        debug!(type_name = shape.name, filter = %node, "compiling filter");
        self.node(&shape, node).map(Predicate::from_matcher)
    }

    /// Compile a filter that may be absent; an absent filter is rejected.
    pub fn compile_optional<T: Filterable>(
        &self,
        node: Option<&FilterNode>,
    ) -> QueryResult<Predicate<T>> {
        match node {
            Some(node) => self.compile(node),
            None => Err(QueryError::invalid_argument("filter")),
        }
    }

    /// Parse a filter string and compile it.
    pub fn compile_str<T: Filterable>(&self, filter: &str) -> QueryResult<Predicate<T>> {
        self.compile(&parse_filter(filter)?)
    }

    fn node(&self, shape: &TypeShape, node: &FilterNode) -> QueryResult<Matcher> {
        match node {
            FilterNode::Filter(filter) => self.leaf(shape, filter),
            FilterNode::Multi(multi) => self.group(shape, multi.logic, &multi.filters),
            FilterNode::Composite(composite) => {
                self.group(shape, composite.logic, &composite.filters)
            }
        }
    }

    fn group(
        &self,
        shape: &TypeShape,
        logic: FilterLogic,
        children: &[FilterNode],
    ) -> QueryResult<Matcher> {
        let mut matchers = children
            .iter()
            .map(|child| self.node(shape, child))
            .collect::<QueryResult<Vec<_>>>()?;

        if matchers.len() == 1 {
            return Ok(matchers.remove(0));
        }
        Ok(match logic {
            FilterLogic::And => matcher(move |item| matchers.iter().all(|m| m(item))),
            FilterLogic::Or => matcher(move |item| matchers.iter().any(|m| m(item))),
        })
    }

    fn leaf(&self, shape: &TypeShape, filter: &Filter) -> QueryResult<Matcher> {
        let Some(field) = filter.field() else {
            return Ok(matcher(|_| true));
        };

        let path = FieldPath::parse(field)?.resolve(shape)?;
        let leaf = path
            .leaf()
            .ok_or_else(|| QueryError::internal(format!("`{field}` resolved to an empty path")))?;

        let (operator, negated) = filter.operator.positive();
        let test = self
            .operator_test(operator, &filter.value, leaf, field)
            .map_err(|e| e.with_type(shape.name))?;

        let lifted = leaf.access == Access::Projection
            && !matches!(operator, FilterOperator::IsNull | FilterOperator::IsEmpty);
        let test = if lifted {
            value_test(move |value| any_element(value, &*test))
        } else {
            test
        };

        crate::strainer_trace!(
            field,
            operator = %filter.operator,
            negated,
            projection = path.has_projection(),
            "compiled filter"
        );

        let names = path.names();
        Ok(matcher(move |item| any_value(item, &names, &*test) != negated))
    }

    fn operator_test(
        &self,
        operator: FilterOperator,
        value: &FilterValue,
        leaf: &PathSegment,
        field: &str,
    ) -> QueryResult<ValueTest> {
        let scalar = leaf.field_type.scalar();

        match operator {
            FilterOperator::IsNull => Ok(value_test(|v| v.is_null())),

            FilterOperator::IsEmpty => match (&leaf.field_type, scalar) {
                (FieldType::Collection(_), _) => Ok(value_test(
                    |v| matches!(v, FieldValue::List(items) if items.is_empty()),
                )),
                (_, Some(ScalarType::String)) => {
                    Ok(value_test(|v| matches!(v, FieldValue::Str(s) if s.is_empty())))
                }
                _ => Err(QueryError::type_mismatch(
                    field,
                    format!(
                        "`isempty` applies to strings and collections, not {}",
                        leaf.field_type.type_name()
                    ),
                )),
            },

            FilterOperator::EqualTo if value.is_null() => Ok(value_test(|v| v.is_null())),

            FilterOperator::EqualTo => {
                let scalar = require_scalar(scalar, leaf, field)?;
                self.equality_test(value, scalar, field)
            }

            FilterOperator::GreaterThan | FilterOperator::GreaterThanOrEqual => {
                let scalar = require_scalar(scalar, leaf, field)?;
                if !scalar.is_orderable() {
                    return Err(QueryError::type_mismatch(
                        field,
                        format!("{scalar} values cannot be ordered"),
                    ));
                }
                if value.is_null() {
                    return Err(QueryError::invalid_argument("value").with_field(field));
                }

                let literal = literal(value, scalar, field)?;
                let or_equal = operator == FilterOperator::GreaterThanOrEqual;
                let ignore_case = self.options.ignore_case;
                Ok(value_test(move |v| {
                    match compare(v, &literal.as_value(), ignore_case) {
                        Some(Ordering::Greater) => true,
                        Some(Ordering::Equal) => or_equal,
                        _ => false,
                    }
                }))
            }

            FilterOperator::Contains | FilterOperator::StartsWith | FilterOperator::EndsWith => {
                if scalar != Some(ScalarType::String) {
                    return Err(QueryError::type_mismatch(
                        field,
                        format!(
                            "`{operator}` applies to strings, not {}",
                            leaf.field_type.type_name()
                        ),
                    ));
                }
                let mode = match operator {
                    FilterOperator::StartsWith => TextMode::StartsWith,
                    FilterOperator::EndsWith => TextMode::EndsWith,
                    _ => TextMode::Contains,
                };

                match value {
                    FilterValue::Null => {
                        Err(QueryError::invalid_argument("value").with_field(field))
                    }
                    FilterValue::Expression(expr) => {
                        self.expression_test(expr, ScalarType::String, mode, field)
                    }
                    FilterValue::List(items) => {
                        let tests = items
                            .iter()
                            .map(|item| self.text_test(mode, &item.to_text().unwrap_or_default(), field))
                            .collect::<QueryResult<Vec<_>>>()?;
                        Ok(any_of(tests))
                    }
                    other => self.text_test(mode, &other.to_text().unwrap_or_default(), field),
                }
            }

            negated => Err(QueryError::internal(format!(
                "`{negated}` must be compiled through its positive form"
            ))),
        }
    }

    fn equality_test(
        &self,
        value: &FilterValue,
        scalar: ScalarType,
        field: &str,
    ) -> QueryResult<ValueTest> {
        let ignore_case = self.options.ignore_case;
        match value {
            FilterValue::Expression(expr) => {
                self.expression_test(expr, scalar, TextMode::Equal, field)
            }
            FilterValue::List(items) => {
                let literals = items
                    .iter()
                    .map(|item| literal(item, scalar, field))
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(value_test(move |v| {
                    literals
                        .iter()
                        .any(|l| equals(v, &l.as_value(), ignore_case))
                }))
            }
            other => {
                let literal = literal(other, scalar, field)?;
                Ok(value_test(move |v| equals(v, &literal.as_value(), ignore_case)))
            }
        }
    }

    /// Test for a value expression. Constants compare according to `mode`.
    fn expression_test(
        &self,
        expr: &FilterExpression,
        scalar: ScalarType,
        mode: TextMode,
        field: &str,
    ) -> QueryResult<ValueTest> {
        let ignore_case = self.options.ignore_case;
        match expr {
            FilterExpression::Asterisk => Ok(value_test(|v| !v.is_null())),

            FilterExpression::Constant(text) if mode != TextMode::Equal => {
                self.text_test(mode, text, field)
            }
            FilterExpression::Date(_) | FilterExpression::DateTime(_)
                if mode != TextMode::Equal =>
            {
                self.text_test(mode, &expr.to_string(), field)
            }
            FilterExpression::Constant(_)
            | FilterExpression::Date(_)
            | FilterExpression::DateTime(_) => {
                let literal = coerce_expression(expr, scalar).ok_or_else(|| {
                    QueryError::type_mismatch(field, format!("`{expr}` cannot be read as {scalar}"))
                })?;
                Ok(value_test(move |v| equals(v, &literal.as_value(), ignore_case)))
            }

            FilterExpression::Contains(text)
            | FilterExpression::StartsWith(text)
            | FilterExpression::EndsWith(text) => {
                if scalar != ScalarType::String {
                    return Err(QueryError::type_mismatch(
                        field,
                        format!("`{expr}` applies to strings, not {scalar}"),
                    ));
                }
                let mode = match expr {
                    FilterExpression::StartsWith(_) => TextMode::StartsWith,
                    FilterExpression::EndsWith(_) => TextMode::EndsWith,
                    _ => TextMode::Contains,
                };
                self.text_test(mode, text.as_str(), field)
            }

            FilterExpression::OneOf(one_of) => {
                let tests = one_of
                    .values()
                    .iter()
                    .map(|value| self.expression_test(value, scalar, mode, field))
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(any_of(tests))
            }

            FilterExpression::Not(inner) => {
                let inner = self.expression_test(inner, scalar, mode, field)?;
                Ok(value_test(move |v| !inner(v)))
            }

            FilterExpression::Or(or) => {
                let left = self.expression_test(or.left(), scalar, mode, field)?;
                let right = self.expression_test(or.right(), scalar, mode, field)?;
                Ok(value_test(move |v| left(v) || right(v)))
            }

            FilterExpression::Range(range) => {
                if !scalar.is_orderable() {
                    return Err(QueryError::type_mismatch(
                        field,
                        format!("{scalar} values cannot be ordered"),
                    ));
                }
                let bound = |bound: Option<&FilterExpression>| {
                    bound
                        .map(|b| {
                            coerce_expression(b, scalar).ok_or_else(|| {
                                QueryError::type_mismatch(
                                    field,
                                    format!("`{b}` cannot be read as {scalar}"),
                                )
                            })
                        })
                        .transpose()
                };
                let min = bound(range.min())?;
                let max = bound(range.max())?;

                Ok(value_test(move |v| {
                    let above = min.as_ref().is_none_or(|min| {
                        matches!(
                            compare(v, &min.as_value(), ignore_case),
                            Some(Ordering::Greater | Ordering::Equal)
                        )
                    });
                    let below = max.as_ref().is_none_or(|max| {
                        matches!(
                            compare(v, &max.as_value(), ignore_case),
                            Some(Ordering::Less | Ordering::Equal)
                        )
                    });
                    !v.is_null() && above && below
                }))
            }
        }
    }

    fn text_test(&self, mode: TextMode, text: &str, field: &str) -> QueryResult<ValueTest> {
        let operand = TextOperand::new(text).map_err(|e| QueryError::from(e).with_field(field))?;
        let ignore_case = self.options.ignore_case;
        let needle = if ignore_case {
            operand.as_str().to_lowercase()
        } else {
            operand.as_str().to_string()
        };

        Ok(value_test(move |v| {
            let FieldValue::Str(s) = v else {
                return false;
            };
            let haystack: Cow<'_, str> = if ignore_case {
                Cow::Owned(s.to_lowercase())
            } else {
                Cow::Borrowed(*s)
            };
            match mode {
                TextMode::Equal => haystack == needle.as_str(),
                TextMode::Contains => haystack.contains(needle.as_str()),
                TextMode::StartsWith => haystack.starts_with(needle.as_str()),
                TextMode::EndsWith => haystack.ends_with(needle.as_str()),
            }
        }))
    }
}

fn require_scalar(
    scalar: Option<ScalarType>,
    leaf: &PathSegment,
    field: &str,
) -> QueryResult<ScalarType> {
    scalar.ok_or_else(|| {
        QueryError::type_mismatch(
            field,
            format!(
                "{} values can only be tested with `isnull` and `isempty`",
                leaf.field_type.type_name()
            ),
        )
    })
}

fn literal(value: &FilterValue, scalar: ScalarType, field: &str) -> QueryResult<Literal> {
    coerce(value, scalar).map_err(|message| QueryError::type_mismatch(field, message))
}

fn any_of(tests: Vec<ValueTest>) -> ValueTest {
    value_test(move |v| tests.iter().any(|test| test(v)))
}

/// Apply `test` to each element of a (possibly nested) collection.
fn any_element(value: &FieldValue<'_>, test: &dyn Fn(&FieldValue<'_>) -> bool) -> bool {
    match value {
        FieldValue::List(items) => items.iter().any(|item| any_element(item, test)),
        other => test(other),
    }
}
