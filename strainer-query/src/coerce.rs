//! Converting filter literals to a member's type, and comparing values.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use strainer_syntax::{FilterExpression, FilterValue};

use crate::shape::{FieldValue, ScalarType};

/// A literal converted to the type of the member it is compared with.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
}

impl Literal {
    /// View as a member value.
    pub fn as_value(&self) -> FieldValue<'_> {
        match self {
            Self::Str(s) => FieldValue::Str(s),
            Self::Int(i) => FieldValue::Int(*i),
            Self::Float(f) => FieldValue::Float(*f),
            Self::Bool(b) => FieldValue::Bool(*b),
            Self::Date(d) => FieldValue::Date(*d),
            Self::DateTime(dt) => FieldValue::DateTime(*dt),
            Self::DateTimeOffset(dt) => FieldValue::DateTimeOffset(*dt),
        }
    }
}

/// Convert `value` to `target`. The error describes why it could not be read.
pub fn coerce(value: &FilterValue, target: ScalarType) -> Result<Literal, String> {
    let fail = || {
        format!(
            "`{}` cannot be read as {}",
            value.to_text().unwrap_or_else(|| "null".into()),
            target.name()
        )
    };

    match (target, value) {
        (_, FilterValue::Null | FilterValue::List(_)) => Err(fail()),
        (_, FilterValue::Expression(expr)) => coerce_expression(expr, target).ok_or_else(fail),

        (ScalarType::String, other) => other.to_text().map(Literal::Str).ok_or_else(fail),

        (ScalarType::Int, FilterValue::Int(i)) => Ok(Literal::Int(*i)),
        (ScalarType::Int, FilterValue::Float(f)) if f.fract() == 0.0 && in_i64_range(*f) => {
            Ok(Literal::Int(*f as i64))
        }
        (ScalarType::Int, FilterValue::String(s)) => {
            s.trim().parse().map(Literal::Int).map_err(|_| fail())
        }

        (ScalarType::Float, FilterValue::Int(i)) => Ok(Literal::Float(*i as f64)),
        (ScalarType::Float, FilterValue::Float(f)) => Ok(Literal::Float(*f)),
        (ScalarType::Float, FilterValue::String(s)) => {
            s.trim().parse().map(Literal::Float).map_err(|_| fail())
        }

        (ScalarType::Bool, FilterValue::Bool(b)) => Ok(Literal::Bool(*b)),
        (ScalarType::Bool, FilterValue::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" => Ok(Literal::Bool(true)),
            "false" => Ok(Literal::Bool(false)),
            _ => Err(fail()),
        },

        (_, FilterValue::Date(d)) => temporal(Temporal::Date(*d), target).ok_or_else(fail),
        (_, FilterValue::DateTime(dt)) => temporal(Temporal::Local(*dt), target).ok_or_else(fail),
        (_, FilterValue::DateTimeOffset(dt)) => {
            temporal(Temporal::Offset(*dt), target).ok_or_else(fail)
        }
        (_, FilterValue::String(s)) => FilterExpression::temporal(s.trim())
            .and_then(|expr| coerce_expression(&expr, target))
            .ok_or_else(fail),

        _ => Err(fail()),
    }
}

/// `i64::MIN` and `i64::MAX + 1` are both exact in `f64`.
fn in_i64_range(f: f64) -> bool {
    (i64::MIN as f64..i64::MAX as f64).contains(&f)
}

/// Convert a literal expression (constant, date or date-time) to `target`.
pub fn coerce_expression(expr: &FilterExpression, target: ScalarType) -> Option<Literal> {
    match expr {
        FilterExpression::Constant(text) => {
            coerce(&FilterValue::String(text.to_string()), target).ok()
        }
        FilterExpression::Date(_) | FilterExpression::DateTime(_)
            if target == ScalarType::String =>
        {
            Some(Literal::Str(expr.to_string()))
        }
        FilterExpression::Date(d) => temporal(Temporal::Date(*d), target),
        FilterExpression::DateTime(dt) => match dt.with_offset() {
            Some(with_offset) => temporal(Temporal::Offset(with_offset), target),
            None => temporal(Temporal::Local(dt.date_time), target),
        },
        _ => None,
    }
}

enum Temporal {
    Date(NaiveDate),
    Local(NaiveDateTime),
    Offset(DateTime<FixedOffset>),
}

/// Dates read as midnight, values without an offset as UTC.
fn temporal(value: Temporal, target: ScalarType) -> Option<Literal> {
    let utc = FixedOffset::east_opt(0)?;
    let local = match value {
        Temporal::Date(d) => d.and_time(NaiveTime::MIN),
        Temporal::Local(dt) => dt,
        Temporal::Offset(dt) => {
            return match target {
                ScalarType::Date => Some(Literal::Date(dt.date_naive())),
                ScalarType::DateTime => Some(Literal::DateTime(dt.naive_local())),
                ScalarType::DateTimeOffset => Some(Literal::DateTimeOffset(dt)),
                ScalarType::String => Some(Literal::Str(dt.to_rfc3339())),
                _ => None,
            };
        }
    };

    match target {
        ScalarType::Date => Some(Literal::Date(local.date())),
        ScalarType::DateTime => Some(Literal::DateTime(local)),
        ScalarType::DateTimeOffset => local
            .and_local_timezone(utc)
            .single()
            .map(Literal::DateTimeOffset),
        ScalarType::String => Some(Literal::Str(local.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        _ => None,
    }
}

/// Order two values of compatible types, `None` when they are not comparable.
///
/// Integers and floats compare numerically; instants with offsets compare
/// as points in time.
pub fn compare(left: &FieldValue<'_>, right: &FieldValue<'_>, ignore_case: bool) -> Option<Ordering> {
    use FieldValue as V;

    match (left, right) {
        (V::Str(a), V::Str(b)) if ignore_case => Some(a.to_lowercase().cmp(&b.to_lowercase())),
        (V::Str(a), V::Str(b)) => Some(a.cmp(b)),
        (V::Int(a), V::Int(b)) => Some(a.cmp(b)),
        (V::Float(a), V::Float(b)) => a.partial_cmp(b),
        (V::Int(a), V::Float(b)) => (*a as f64).partial_cmp(b),
        (V::Float(a), V::Int(b)) => a.partial_cmp(&(*b as f64)),
        (V::Bool(a), V::Bool(b)) => Some(a.cmp(b)),
        (V::Date(a), V::Date(b)) => Some(a.cmp(b)),
        (V::DateTime(a), V::DateTime(b)) => Some(a.cmp(b)),
        (V::DateTimeOffset(a), V::DateTimeOffset(b)) => {
            Some(a.with_timezone(&Utc).cmp(&b.with_timezone(&Utc)))
        }
        (V::DateTime(a), V::Date(b)) => Some(a.date().cmp(b)),
        (V::Date(a), V::DateTime(b)) => Some(a.cmp(&b.date())),
        _ => None,
    }
}

/// Whether two values are equal under [`compare`].
pub fn equals(left: &FieldValue<'_>, right: &FieldValue<'_>, ignore_case: bool) -> bool {
    compare(left, right, ignore_case) == Some(Ordering::Equal)
}
