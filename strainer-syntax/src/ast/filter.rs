//! Filter tree: leaf filters, logical groups and the values they carry.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::expression::FilterExpression;
use crate::error::{SyntaxError, SyntaxResult};
use crate::parser::parse_value;

/// Comparison applied by a leaf [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "eq")]
    EqualTo,
    #[serde(rename = "neq")]
    NotEqualTo,
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "gte")]
    GreaterThanOrEqual,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "lte")]
    LessThanOrEqualTo,
    #[serde(rename = "startswith")]
    StartsWith,
    #[serde(rename = "nstartswith")]
    NotStartsWith,
    #[serde(rename = "endswith")]
    EndsWith,
    #[serde(rename = "nendswith")]
    NotEndsWith,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "ncontains")]
    NotContains,
    #[serde(rename = "isnull")]
    IsNull,
    #[serde(rename = "isnotnull")]
    IsNotNull,
    #[serde(rename = "isempty")]
    IsEmpty,
    #[serde(rename = "isnotempty")]
    IsNotEmpty,
}

impl FilterOperator {
    /// Every operator, in declaration order.
    pub const ALL: [FilterOperator; 16] = [
        Self::EqualTo,
        Self::NotEqualTo,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::LessThan,
        Self::LessThanOrEqualTo,
        Self::StartsWith,
        Self::NotStartsWith,
        Self::EndsWith,
        Self::NotEndsWith,
        Self::Contains,
        Self::NotContains,
        Self::IsNull,
        Self::IsNotNull,
        Self::IsEmpty,
        Self::IsNotEmpty,
    ];

    /// The textual token, as written in filter strings and JSON.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EqualTo => "eq",
            Self::NotEqualTo => "neq",
            Self::GreaterThan => "gt",
            Self::GreaterThanOrEqual => "gte",
            Self::LessThan => "lt",
            Self::LessThanOrEqualTo => "lte",
            Self::StartsWith => "startswith",
            Self::NotStartsWith => "nstartswith",
            Self::EndsWith => "endswith",
            Self::NotEndsWith => "nendswith",
            Self::Contains => "contains",
            Self::NotContains => "ncontains",
            Self::IsNull => "isnull",
            Self::IsNotNull => "isnotnull",
            Self::IsEmpty => "isempty",
            Self::IsNotEmpty => "isnotempty",
        }
    }

    /// The operator accepting exactly the complement.
    pub const fn invert(self) -> Self {
        match self {
            Self::EqualTo => Self::NotEqualTo,
            Self::NotEqualTo => Self::EqualTo,
            Self::GreaterThan => Self::LessThanOrEqualTo,
            Self::LessThanOrEqualTo => Self::GreaterThan,
            Self::GreaterThanOrEqual => Self::LessThan,
            Self::LessThan => Self::GreaterThanOrEqual,
            Self::StartsWith => Self::NotStartsWith,
            Self::NotStartsWith => Self::StartsWith,
            Self::EndsWith => Self::NotEndsWith,
            Self::NotEndsWith => Self::EndsWith,
            Self::Contains => Self::NotContains,
            Self::NotContains => Self::Contains,
            Self::IsNull => Self::IsNotNull,
            Self::IsNotNull => Self::IsNull,
            Self::IsEmpty => Self::IsNotEmpty,
            Self::IsNotEmpty => Self::IsEmpty,
        }
    }

    /// Whether the operator is the complement of another one.
    ///
    /// `lt` and `lte` count as negations of `gte` and `gt`.
    pub const fn is_negation(self) -> bool {
        matches!(
            self,
            Self::NotEqualTo
                | Self::LessThan
                | Self::LessThanOrEqualTo
                | Self::NotStartsWith
                | Self::NotEndsWith
                | Self::NotContains
                | Self::IsNotNull
                | Self::IsNotEmpty
        )
    }

    /// The non-negated form together with whether a negation was removed.
    pub const fn positive(self) -> (Self, bool) {
        if self.is_negation() {
            (self.invert(), true)
        } else {
            (self, false)
        }
    }

    /// Whether a value follows the operator.
    pub const fn requires_value(self) -> bool {
        !matches!(
            self,
            Self::IsNull | Self::IsNotNull | Self::IsEmpty | Self::IsNotEmpty
        )
    }

    /// Substring operators, in either polarity.
    pub const fn is_text(self) -> bool {
        matches!(
            self,
            Self::StartsWith
                | Self::NotStartsWith
                | Self::EndsWith
                | Self::NotEndsWith
                | Self::Contains
                | Self::NotContains
        )
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SyntaxError::out_of_range("operator", format!("unknown operator `{s}`")))
    }
}

/// How the children of a group are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLogic {
    #[default]
    And,
    Or,
}

impl FilterLogic {
    /// De Morgan dual.
    pub const fn flip(self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }
}

impl fmt::Display for FilterLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => f.write_str("and"),
            Self::Or => f.write_str("or"),
        }
    }
}

/// Value carried by a leaf filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FilterValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    List(Vec<FilterValue>),
    /// A wildcard, set, range or logical expression.
    Expression(FilterExpression),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The value as written in a filter string, `None` for null.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Self::DateTime(dt) => Some(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Self::DateTimeOffset(dt) => Some(dt.to_rfc3339()),
            Self::List(values) => Some(
                values
                    .iter()
                    .map(|v| v.to_text().unwrap_or_else(|| "null".into()))
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            Self::Expression(expr) => Some(expr.to_string()),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for FilterValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<DateTime<FixedOffset>> for FilterValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::DateTimeOffset(v)
    }
}

impl From<FilterExpression> for FilterValue {
    fn from(v: FilterExpression) -> Self {
        Self::Expression(v)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl Serialize for FilterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::List(values) => values.serialize(serializer),
            other => match other.to_text() {
                Some(text) => serializer.serialize_str(&text),
                None => serializer.serialize_none(),
            },
        }
    }
}

impl<'de> Deserialize<'de> for FilterValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::try_from(value).map_err(D::Error::custom)
    }
}

impl TryFrom<serde_json::Value> for FilterValue {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().ok_or("number out of range")?),
            },
            Value::String(s) => Self::String(s),
            Value::Array(values) => Self::List(
                values
                    .into_iter()
                    .map(Self::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(_) => return Err("a filter value cannot be an object".into()),
        })
    }
}

/// Leaf filter: `field operator value`.
///
/// A filter without a field (or with an empty one) matches everything.
///
/// In JSON a string value is read with the same rules as a value in a filter
/// string, so `"Bat*"` is a prefix match and `"\"Bat*\""` the literal text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFilter")]
pub struct Filter {
    /// Path of the member to test.
    pub field: Option<String>,
    /// Comparison to apply.
    pub operator: FilterOperator,
    /// Operand, absent for the null and empty checks.
    #[serde(
        skip_serializing_if = "FilterValue::is_null",
        serialize_with = "serialize_operand"
    )]
    pub value: FilterValue,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFilter {
    field: Option<String>,
    operator: FilterOperator,
    #[serde(default)]
    value: FilterValue,
}

impl TryFrom<RawFilter> for Filter {
    type Error = SyntaxError;

    fn try_from(raw: RawFilter) -> SyntaxResult<Self> {
        let value = match raw.value {
            FilterValue::String(text) => match parse_value(&text, raw.operator) {
                Ok(value) => value,
                // Text outside the value grammar, such as `super strength`.
                Err(SyntaxError::ParseError { .. }) => FilterValue::String(text),
                Err(e) => return Err(e),
            },
            other => other,
        };

        Ok(Self {
            field: raw.field,
            operator: raw.operator,
            value,
        })
    }
}

/// Plain strings that would read back as something else are quoted.
fn serialize_operand<S: Serializer>(value: &FilterValue, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        FilterValue::String(text) if reads_differently(text) => {
            serializer.serialize_str(&FilterExpression::constant(text.as_str()).to_string())
        }
        other => other.serialize(serializer),
    }
}

fn reads_differently(text: &str) -> bool {
    match parse_value(text, FilterOperator::EqualTo) {
        Ok(FilterValue::String(read)) => read != text,
        Ok(_) => true,
        Err(_) => false,
    }
}

impl Filter {
    /// Create a filter on a field.
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: Some(field.into()),
            operator,
            value: value.into(),
        }
    }

    /// The filter that matches every element.
    pub fn always() -> Self {
        Self {
            field: None,
            operator: FilterOperator::EqualTo,
            value: FilterValue::Null,
        }
    }

    /// The field path, `None` when the filter matches everything.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref().filter(|f| !f.is_empty())
    }

    /// Same field and value, inverted operator.
    pub fn negate(self) -> Self {
        Self {
            operator: self.operator.invert(),
            ..self
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(field) = self.field() else {
            return f.write_str("*");
        };
        write!(f, "{field} {}", self.operator)?;
        match &self.value {
            FilterValue::Null if !self.operator.requires_value() => Ok(()),
            FilterValue::Null => f.write_str(" null"),
            FilterValue::Expression(expr) => write!(f, " {expr}"),
            FilterValue::List(values) => {
                let items = values
                    .iter()
                    .map(|v| FilterExpression::constant(v.to_text().unwrap_or_default()));
                write!(f, " {}", FilterExpression::one_of(items))
            }
            value @ (FilterValue::Bool(_) | FilterValue::Int(_) | FilterValue::Float(_)) => {
                write!(f, " {}", value.to_text().unwrap_or_default())
            }
            value => write!(
                f,
                " {}",
                FilterExpression::constant(value.to_text().unwrap_or_default())
            ),
        }
    }
}

/// Group of filters combined by one logic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MultiFilter {
    #[serde(default)]
    pub logic: FilterLogic,
    pub filters: Vec<FilterNode>,
}

impl MultiFilter {
    /// Create a group.
    pub fn new(logic: FilterLogic, filters: impl IntoIterator<Item = FilterNode>) -> Self {
        Self {
            logic,
            filters: filters.into_iter().collect(),
        }
    }

    /// Flip the logic and negate every child.
    pub fn negate(self) -> Self {
        Self {
            logic: self.logic.flip(),
            filters: self.filters.into_iter().map(FilterNode::negate).collect(),
        }
    }
}

/// Serialized form of a group. Behaves exactly like [`MultiFilter`], but
/// requires at least two children when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MultiFilter")]
pub struct CompositeFilter {
    pub logic: FilterLogic,
    pub filters: Vec<FilterNode>,
}

impl CompositeFilter {
    /// Create a composite from at least two filters.
    pub fn new(
        logic: FilterLogic,
        filters: impl IntoIterator<Item = FilterNode>,
    ) -> SyntaxResult<Self> {
        let filters: Vec<_> = filters.into_iter().collect();
        if filters.len() < 2 {
            return Err(SyntaxError::out_of_range(
                "filters",
                format!("a composite filter needs at least 2 filters, got {}", filters.len()),
            ));
        }
        Ok(Self { logic, filters })
    }

    /// Flip the logic and negate every child.
    pub fn negate(self) -> Self {
        Self {
            logic: self.logic.flip(),
            filters: self.filters.into_iter().map(FilterNode::negate).collect(),
        }
    }
}

impl TryFrom<MultiFilter> for CompositeFilter {
    type Error = SyntaxError;

    fn try_from(multi: MultiFilter) -> Result<Self, Self::Error> {
        Self::new(multi.logic, multi.filters)
    }
}

impl From<CompositeFilter> for MultiFilter {
    fn from(composite: CompositeFilter) -> Self {
        Self {
            logic: composite.logic,
            filters: composite.filters,
        }
    }
}

/// Any node of a filter tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterNode {
    Filter(Filter),
    Multi(MultiFilter),
    Composite(CompositeFilter),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FilterNodeRepr {
    Composite(CompositeFilter),
    Filter(Filter),
}

impl<'de> Deserialize<'de> for FilterNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match FilterNodeRepr::deserialize(deserializer)? {
            FilterNodeRepr::Composite(composite) => Self::Composite(composite),
            FilterNodeRepr::Filter(filter) => Self::Filter(filter),
        })
    }
}

impl FilterNode {
    /// The node matching every element.
    pub fn always() -> Self {
        Self::Filter(Filter::always())
    }

    /// Conjunction of the given nodes.
    pub fn and(filters: impl IntoIterator<Item = FilterNode>) -> Self {
        Self::Multi(MultiFilter::new(FilterLogic::And, filters))
    }

    /// Disjunction of the given nodes.
    pub fn or(filters: impl IntoIterator<Item = FilterNode>) -> Self {
        Self::Multi(MultiFilter::new(FilterLogic::Or, filters))
    }

    /// Logical complement, pushed down to the leaves.
    pub fn negate(self) -> Self {
        match self {
            Self::Filter(filter) => Self::Filter(filter.negate()),
            Self::Multi(multi) => Self::Multi(multi.negate()),
            Self::Composite(composite) => Self::Composite(composite.negate()),
        }
    }

    /// The logic and children of a group, `None` for a leaf.
    pub fn group(&self) -> Option<(FilterLogic, &[FilterNode])> {
        match self {
            Self::Filter(_) => None,
            Self::Multi(multi) => Some((multi.logic, &multi.filters)),
            Self::Composite(composite) => Some((composite.logic, &composite.filters)),
        }
    }
}

impl From<Filter> for FilterNode {
    fn from(filter: Filter) -> Self {
        Self::Filter(filter)
    }
}

impl From<MultiFilter> for FilterNode {
    fn from(multi: MultiFilter) -> Self {
        Self::Multi(multi)
    }
}

impl From<CompositeFilter> for FilterNode {
    fn from(composite: CompositeFilter) -> Self {
        Self::Composite(composite)
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter(filter) => write!(f, "{filter}"),
            Self::Multi(_) | Self::Composite(_) => {
                let Some((logic, filters)) = self.group() else {
                    return Ok(());
                };
                if filters.is_empty() {
                    return f.write_str("*");
                }
                for (i, child) in filters.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {logic} ")?;
                    }
                    match child {
                        Self::Filter(_) => write!(f, "{child}")?,
                        _ => write!(f, "({child})")?,
                    }
                }
                Ok(())
            }
        }
    }
}
