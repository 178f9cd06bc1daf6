//! Value expressions embedded in filters: constants, wildcards, sets, ranges and logic.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use smol_str::SmolStr;

use crate::error::{SyntaxError, SyntaxResult};

/// A node of the value expression tree.
///
/// Structural equality (`==`) and hashing are derived. [`is_equivalent_to`]
/// is the looser, semantic comparison: it ignores operand order for
/// [`FilterExpression::Or`] and element order and duplicates for
/// [`FilterExpression::OneOf`].
///
/// [`is_equivalent_to`]: FilterExpression::is_equivalent_to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterExpression {
    /// A literal scalar.
    Constant(SmolStr),
    /// Matches any value.
    Asterisk,
    /// Matches any of the listed expressions.
    OneOf(OneOfExpression),
    /// Text containing the operand.
    Contains(TextOperand),
    /// Text starting with the operand.
    StartsWith(TextOperand),
    /// Text ending with the operand.
    EndsWith(TextOperand),
    /// Logical negation.
    Not(Box<FilterExpression>),
    /// Logical disjunction.
    Or(OrExpression),
    /// A calendar date.
    Date(NaiveDate),
    /// A date and time, with an optional UTC offset.
    DateTime(DateTimeExpression),
    /// An inclusive interval.
    Range(RangeExpression),
}

/// Non-empty text used by the substring expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextOperand(SmolStr);

impl TextOperand {
    /// Create a text operand. Empty text is rejected, whitespace is kept as is.
    pub fn new(text: impl Into<SmolStr>) -> SyntaxResult<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(SyntaxError::out_of_range("text", "must not be empty"));
        }
        Ok(Self(text))
    }

    /// Create a text operand from a value that may be absent.
    pub fn from_option(text: Option<&str>) -> SyntaxResult<Self> {
        match text {
            Some(text) => Self::new(text),
            None => Err(SyntaxError::invalid_argument("text")),
        }
    }

    /// The wrapped text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Ordered list of alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OneOfExpression {
    values: Vec<FilterExpression>,
}

impl OneOfExpression {
    /// The alternatives in declaration order.
    pub fn values(&self) -> &[FilterExpression] {
        &self.values
    }

    fn distinct(&self) -> HashSet<&FilterExpression> {
        self.values.iter().collect()
    }

    /// Set comparison. Against any other expression the distinct values must
    /// collapse to exactly that expression.
    pub fn is_equivalent_to(&self, other: &FilterExpression) -> bool {
        let mine = self.distinct();
        match other {
            FilterExpression::OneOf(theirs) => mine == theirs.distinct(),
            other => mine.len() == 1 && mine.contains(other),
        }
    }
}

/// Binary disjunction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrExpression {
    left: Box<FilterExpression>,
    right: Box<FilterExpression>,
}

impl OrExpression {
    /// Left operand.
    pub fn left(&self) -> &FilterExpression {
        &self.left
    }

    /// Right operand.
    pub fn right(&self) -> &FilterExpression {
        &self.right
    }

    /// Commutative comparison. `x | x` is also equivalent to a bare `x`.
    pub fn is_equivalent_to(&self, other: &FilterExpression) -> bool {
        match other {
            FilterExpression::Or(theirs) => {
                (self.left.is_equivalent_to(&theirs.left)
                    && self.right.is_equivalent_to(&theirs.right))
                    || (self.left.is_equivalent_to(&theirs.right)
                        && self.right.is_equivalent_to(&theirs.left))
            }
            other => self.left == self.right && self.left.is_equivalent_to(other),
        }
    }
}

/// Date and time literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTimeExpression {
    /// Local date and time.
    pub date_time: NaiveDateTime,
    /// Offset from UTC when one was written.
    pub offset: Option<FixedOffset>,
}

impl DateTimeExpression {
    /// The instant as an offset-aware value, `None` when no offset was given.
    pub fn with_offset(&self) -> Option<DateTime<FixedOffset>> {
        self.offset
            .and_then(|offset| self.date_time.and_local_timezone(offset).single())
    }
}

/// Inclusive interval. At least one bound is always present.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeExpression {
    min: Option<Box<FilterExpression>>,
    max: Option<Box<FilterExpression>>,
}

impl RangeExpression {
    /// Lower bound.
    pub fn min(&self) -> Option<&FilterExpression> {
        self.min.as_deref()
    }

    /// Upper bound.
    pub fn max(&self) -> Option<&FilterExpression> {
        self.max.as_deref()
    }
}

impl FilterExpression {
    /// A literal value.
    pub fn constant(value: impl Into<SmolStr>) -> Self {
        Self::Constant(value.into())
    }

    /// `*text*`
    pub fn contains(text: impl Into<SmolStr>) -> SyntaxResult<Self> {
        TextOperand::new(text).map(Self::Contains)
    }

    /// `text*`
    pub fn starts_with(text: impl Into<SmolStr>) -> SyntaxResult<Self> {
        TextOperand::new(text).map(Self::StartsWith)
    }

    /// `*text`
    pub fn ends_with(text: impl Into<SmolStr>) -> SyntaxResult<Self> {
        TextOperand::new(text).map(Self::EndsWith)
    }

    /// `{a,b,...}`
    pub fn one_of(values: impl IntoIterator<Item = FilterExpression>) -> Self {
        Self::OneOf(OneOfExpression {
            values: values.into_iter().collect(),
        })
    }

    /// `left|right`
    pub fn or(left: FilterExpression, right: FilterExpression) -> Self {
        Self::Or(OrExpression {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Wrap in a negation unconditionally. See [`FilterExpression::negate`].
    pub fn not(inner: FilterExpression) -> Self {
        Self::Not(Box::new(inner))
    }

    /// A date literal.
    pub fn date(date: NaiveDate) -> Self {
        Self::Date(date)
    }

    /// A date-time literal.
    pub fn date_time(date_time: NaiveDateTime, offset: Option<FixedOffset>) -> Self {
        Self::DateTime(DateTimeExpression { date_time, offset })
    }

    /// `[min TO max]`. Bounds must be constants or temporal literals.
    pub fn range(
        min: Option<FilterExpression>,
        max: Option<FilterExpression>,
    ) -> SyntaxResult<Self> {
        if min.is_none() && max.is_none() {
            return Err(SyntaxError::invalid_argument("min/max"));
        }
        for bound in min.iter().chain(max.iter()) {
            if !matches!(bound, Self::Constant(_) | Self::Date(_) | Self::DateTime(_)) {
                return Err(SyntaxError::out_of_range(
                    "bound",
                    format!("`{bound}` cannot be used as a range bound"),
                ));
            }
        }
        Ok(Self::Range(RangeExpression {
            min: min.map(Box::new),
            max: max.map(Box::new),
        }))
    }

    /// Read a temporal literal: `YYYY-MM-DD`, or an ISO 8601 date-time with
    /// an optional offset.
    pub fn temporal(text: &str) -> Option<Self> {
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Some(Self::Date(date));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(Self::date_time(dt.naive_local(), Some(*dt.offset())));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .map(|dt| Self::date_time(dt, None))
    }

    /// Logical negation. A negation is unwrapped instead of nested.
    pub fn negate(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::not(other),
        }
    }

    /// Semantic comparison.
    pub fn is_equivalent_to(&self, other: &FilterExpression) -> bool {
        match (self, other) {
            (Self::Or(or), _) => or.is_equivalent_to(other),
            (Self::OneOf(one_of), _) => one_of.is_equivalent_to(other),
            (_, Self::Or(or)) => or.is_equivalent_to(self),
            (_, Self::OneOf(one_of)) => one_of.is_equivalent_to(self),
            _ => self == other,
        }
    }
}

const SPECIAL: &[char] = &[
    '*', '!', '|', '{', '}', '[', ']', '(', ')', ',', '"', '\\',
];
const KEYWORDS: &[&str] = &["and", "or", "not", "null", "to"];

/// Write `text` bare when it reads back as the same constant, quoted otherwise.
pub(crate) fn write_literal(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    let bare = !text.is_empty()
        && !text.chars().any(|c| c.is_whitespace() || SPECIAL.contains(&c))
        && !KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(text))
        && FilterExpression::temporal(text).is_none();
    if bare {
        return f.write_str(text);
    }
    f.write_str("\"")?;
    for c in text.chars() {
        if c == '"' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("\"")
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &FilterExpression) -> fmt::Result {
    match expr {
        FilterExpression::Or(_) => write!(f, "({expr})"),
        other => write!(f, "{other}"),
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write_literal(f, value),
            Self::Asterisk => f.write_str("*"),
            Self::OneOf(one_of) => {
                f.write_str("{")?;
                for (i, value) in one_of.values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("}")
            }
            Self::Contains(text) => {
                f.write_str("*")?;
                write_literal(f, text.as_str())?;
                f.write_str("*")
            }
            Self::StartsWith(text) => {
                write_literal(f, text.as_str())?;
                f.write_str("*")
            }
            Self::EndsWith(text) => {
                f.write_str("*")?;
                write_literal(f, text.as_str())
            }
            Self::Not(inner) => {
                f.write_str("!")?;
                write_operand(f, inner)
            }
            Self::Or(or) => {
                write!(f, "{}|", or.left)?;
                write_operand(f, &or.right)
            }
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::DateTime(dt) => {
                write!(f, "{}", dt.date_time.format("%Y-%m-%dT%H:%M:%S%.f"))?;
                match dt.offset {
                    Some(offset) => write!(f, "{offset}"),
                    None => Ok(()),
                }
            }
            Self::Range(range) => {
                f.write_str("[")?;
                match range.min() {
                    Some(min) => write!(f, "{min}")?,
                    None => f.write_str("*")?,
                }
                f.write_str(" TO ")?;
                match range.max() {
                    Some(max) => write!(f, "{max}")?,
                    None => f.write_str("*")?,
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(value: &str) -> FilterExpression {
        FilterExpression::constant(value)
    }

    #[test]
    fn test_text_operand_rejects_empty() {
        let err = FilterExpression::contains("").unwrap_err();
        assert!(matches!(err, SyntaxError::OutOfRange { .. }));
    }

    #[test]
    fn test_text_operand_accepts_whitespace() {
        let expr = FilterExpression::contains("  ").unwrap();
        assert!(matches!(expr, FilterExpression::Contains(ref t) if t.as_str() == "  "));
    }

    #[test]
    fn test_text_operand_rejects_absent() {
        let err = TextOperand::from_option(None).unwrap_err();
        assert!(matches!(err, SyntaxError::InvalidArgument { .. }));
    }

    #[test]
    fn test_asterisks_are_equal() {
        assert_eq!(FilterExpression::Asterisk, FilterExpression::Asterisk);
        assert!(FilterExpression::Asterisk.is_equivalent_to(&FilterExpression::Asterisk));
    }

    #[test]
    fn test_one_of_equality_is_ordered() {
        let ab = FilterExpression::one_of([c("prop1"), c("prop2")]);
        let ba = FilterExpression::one_of([c("prop2"), c("prop1")]);
        assert_ne!(ab, ba);
        assert!(ab.is_equivalent_to(&ba));
        assert!(ba.is_equivalent_to(&ab));
    }

    #[test]
    fn test_one_of_ignores_duplicates() {
        let aab = FilterExpression::one_of([c("a"), c("a"), c("b")]);
        let ab = FilterExpression::one_of([c("a"), c("b")]);
        assert!(aab.is_equivalent_to(&ab));
        assert!(!aab.is_equivalent_to(&FilterExpression::one_of([c("a"), c("c")])));
    }

    #[test]
    fn test_one_of_collapses_to_single_value() {
        let repeated = FilterExpression::one_of([c("x"), c("x"), c("x")]);
        assert!(repeated.is_equivalent_to(&c("x")));
        assert!(c("x").is_equivalent_to(&repeated));
        assert!(!FilterExpression::one_of([c("x"), c("y")]).is_equivalent_to(&c("x")));
    }

    #[test]
    fn test_or_is_commutative() {
        let xy = FilterExpression::or(c("x"), c("y"));
        let yx = FilterExpression::or(c("y"), c("x"));
        assert_ne!(xy, yx);
        assert!(xy.is_equivalent_to(&yx));
    }

    #[test]
    fn test_or_of_same_operand_is_the_operand() {
        let xx = FilterExpression::or(c("x"), c("x"));
        assert!(xx.is_equivalent_to(&c("x")));
        assert!(!FilterExpression::or(c("x"), c("y")).is_equivalent_to(&c("x")));
    }

    #[test]
    fn test_cross_variant_is_never_equivalent() {
        let contains = FilterExpression::contains("a").unwrap();
        let starts = FilterExpression::starts_with("a").unwrap();
        assert!(!contains.is_equivalent_to(&starts));
        assert!(!c("a").is_equivalent_to(&contains));
    }

    #[test]
    fn test_negate_unwraps_not() {
        let expr = c("Bruce");
        let negated = expr.clone().negate();
        assert_eq!(negated, FilterExpression::not(c("Bruce")));
        assert_eq!(negated.negate(), expr);
    }

    #[test]
    fn test_range_requires_a_bound() {
        assert!(matches!(
            FilterExpression::range(None, None),
            Err(SyntaxError::InvalidArgument { .. })
        ));
        assert!(matches!(
            FilterExpression::range(Some(FilterExpression::Asterisk), None),
            Err(SyntaxError::OutOfRange { .. })
        ));
        assert!(FilterExpression::range(Some(c("1")), None).is_ok());
    }

    #[test]
    fn test_temporal_literals() {
        let date = FilterExpression::temporal("2019-01-03").unwrap();
        assert_eq!(
            date,
            FilterExpression::date(NaiveDate::from_ymd_opt(2019, 1, 3).unwrap())
        );

        let FilterExpression::DateTime(dt) = FilterExpression::temporal("2019-01-03T10:20:30+02:00").unwrap()
        else {
            panic!("expected a date-time");
        };
        assert_eq!(dt.offset, FixedOffset::east_opt(2 * 3600));
        assert!(dt.with_offset().is_some());

        assert!(FilterExpression::temporal("Bruce").is_none());
    }

    #[test]
    fn test_display() {
        let expr = FilterExpression::or(
            FilterExpression::one_of([c("a"), c("b c")]),
            FilterExpression::not(FilterExpression::starts_with("Br").unwrap()),
        );
        assert_eq!(expr.to_string(), r#"{a,"b c"}|!Br*"#);

        let range = FilterExpression::range(Some(c("10")), None).unwrap();
        assert_eq!(range.to_string(), "[10 TO *]");

        assert_eq!(c("null").to_string(), r#""null""#);
        assert_eq!(c("2019-01-03").to_string(), r#""2019-01-03""#);
        assert_eq!(
            FilterExpression::contains("say \"hi\"").unwrap().to_string(),
            r#"*"say \"hi\""*"#
        );
    }
}
