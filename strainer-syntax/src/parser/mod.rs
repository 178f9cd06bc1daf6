//! Parsers for filter and sort strings.

mod grammar;
mod sort;

use pest::Parser;
use pest::iterators::Pair;
use tracing::{debug, trace};

use crate::ast::*;
use crate::config::ParserConfig;
use crate::error::{SyntaxError, SyntaxResult};

pub use grammar::{Rule, StrainerParser};
pub use sort::{SORT_PATTERN, parse_sort};

/// Parse a filter string with the default parser settings.
///
/// ```
/// use strainer_syntax::{parse_filter, Filter, FilterNode, FilterOperator};
///
/// let node = parse_filter("Firstname eq Bruce").unwrap();
/// assert_eq!(node, FilterNode::Filter(Filter::new("Firstname", FilterOperator::EqualTo, "Bruce")));
/// ```
pub fn parse_filter(input: &str) -> SyntaxResult<FilterNode> {
    FilterParser::default().parse(input)
}

/// Filter string parser.
#[derive(Debug, Clone, Default)]
pub struct FilterParser {
    config: ParserConfig,
}

impl FilterParser {
    /// Create a parser with the given settings.
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a filter string. Blank input yields the filter matching everything.
    pub fn parse(&self, input: &str) -> SyntaxResult<FilterNode> {
        debug!(filter = input, "parsing filter");
        check_depth(input, self.config.max_depth)?;

        let mut pairs =
            StrainerParser::parse(Rule::input, input).map_err(|e| pest_error(input, e))?;

        let builder = Builder { input };
        let root = builder.required(pairs.next(), "filter")?;
        let node = match root.into_inner().find(|p| p.as_rule() == Rule::expression) {
            Some(expression) => builder.expression(expression)?,
            None => FilterNode::always(),
        };

        trace!(filter = input, node = %node, "parsed filter");
        Ok(node)
    }
}

/// Read a value the way it is read after `operator` in a filter string.
///
/// ```
/// use strainer_syntax::{parse_value, FilterExpression, FilterOperator, FilterValue};
///
/// let value = parse_value("Bat*", FilterOperator::EqualTo).unwrap();
/// assert_eq!(value, FilterValue::Expression(FilterExpression::starts_with("Bat").unwrap()));
/// ```
pub fn parse_value(input: &str, operator: FilterOperator) -> SyntaxResult<FilterValue> {
    let text = input.trim();
    check_depth(text, ParserConfig::default().max_depth)?;

    let value = StrainerParser::parse(Rule::value, text)
        .map_err(|e| pest_error(text, e))?
        .next()
        .ok_or_else(|| SyntaxError::parse(text, 0, text.len(), "expected a value"))?;

    let consumed = value.as_str().len();
    if consumed != text.len() {
        return Err(SyntaxError::parse(
            text,
            consumed,
            text.len() - consumed,
            "unexpected characters after value",
        ));
    }

    Builder { input: text }.value(value, operator)
}

/// Split a field path into member names.
///
/// Accepts `Name`, `Henchman.Name` and `Henchman["Weapons"]["Name"]`;
/// bracketed names are taken exactly as written.
pub fn parse_field_path(path: &str) -> SyntaxResult<Vec<String>> {
    let path = path.trim();
    let field = StrainerParser::parse(Rule::field, path)
        .map_err(|e| pest_error(path, e))?
        .next()
        .ok_or_else(|| SyntaxError::parse(path, 0, path.len(), "expected a field path"))?;

    let consumed = field.as_str().len();
    if consumed != path.len() {
        return Err(SyntaxError::parse(
            path,
            consumed,
            path.len() - consumed,
            "unexpected characters in field path",
        ));
    }

    Ok(field
        .into_inner()
        .map(|segment| match segment.as_rule() {
            Rule::quoted => unquote(&segment),
            _ => segment.as_str().to_string(),
        })
        .collect())
}

fn pest_error(input: &str, e: pest::error::Error<Rule>) -> SyntaxError {
    let (offset, len) = match e.location {
        pest::error::InputLocation::Pos(pos) => (pos, 0),
        pest::error::InputLocation::Span((start, end)) => (start, end - start),
    };
    SyntaxError::parse(input, offset, len, e.variant.message())
}

/// Reject input nested deeper than `max_depth` before handing it to pest.
fn check_depth(input: &str, max_depth: usize) -> SyntaxResult<()> {
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;

    for (offset, c) in input.char_indices() {
        if in_quotes {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            '(' | '{' | '[' => {
                depth += 1;
                if depth > max_depth {
                    return Err(SyntaxError::parse(
                        input,
                        offset,
                        1,
                        format!("nesting exceeds the maximum depth of {max_depth}"),
                    ));
                }
            }
            ')' | '}' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// Turns pest pairs into filter nodes.
struct Builder<'a> {
    input: &'a str,
}

impl<'a> Builder<'a> {
    fn required<'i>(&self, pair: Option<Pair<'i, Rule>>, what: &str) -> SyntaxResult<Pair<'i, Rule>> {
        pair.ok_or_else(|| {
            SyntaxError::parse(self.input, self.input.len(), 0, format!("expected {what}"))
        })
    }

    fn error(&self, pair: &Pair<'_, Rule>, message: impl Into<String>) -> SyntaxError {
        let span = pair.as_span();
        SyntaxError::parse(self.input, span.start(), span.end() - span.start(), message)
    }

    /// `conjunction (or conjunction)*`
    fn expression(&self, pair: Pair<'_, Rule>) -> SyntaxResult<FilterNode> {
        let nodes = pair
            .into_inner()
            .filter(|p| p.as_rule() == Rule::conjunction)
            .map(|p| self.conjunction(p))
            .collect::<SyntaxResult<Vec<_>>>()?;
        Ok(group(FilterLogic::Or, nodes))
    }

    /// `unary (and unary)*`
    fn conjunction(&self, pair: Pair<'_, Rule>) -> SyntaxResult<FilterNode> {
        let nodes = pair
            .into_inner()
            .filter(|p| p.as_rule() == Rule::unary)
            .map(|p| self.unary(p))
            .collect::<SyntaxResult<Vec<_>>>()?;
        Ok(group(FilterLogic::And, nodes))
    }

    /// `not* (expression | filter)`
    fn unary(&self, pair: Pair<'_, Rule>) -> SyntaxResult<FilterNode> {
        let span = pair.clone();
        let mut negations = 0;
        let mut node = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::kw_not => negations += 1,
                Rule::expression => node = Some(self.expression(inner)?),
                Rule::filter => node = Some(self.filter(inner)?),
                _ => {}
            }
        }

        let node = node.ok_or_else(|| self.error(&span, "expected a filter"))?;
        Ok((0..negations).fold(node, |node, _| node.negate()))
    }

    /// `field unary_op` or `field binary_op value`
    fn filter(&self, pair: Pair<'_, Rule>) -> SyntaxResult<FilterNode> {
        let mut inner = pair.into_inner();
        let field = self.required(inner.next(), "field")?;
        let op = self.required(inner.next(), "operator")?;
        let operator: FilterOperator = op
            .as_str()
            .parse()
            .map_err(|_| self.error(&op, format!("unknown operator `{}`", op.as_str())))?;

        let value = match inner.next() {
            Some(value) => self.value(value, operator)?,
            None => FilterValue::Null,
        };

        Ok(FilterNode::Filter(Filter {
            field: Some(field.as_str().to_string()),
            operator,
            value,
        }))
    }

    /// Value following a binary operator.
    ///
    /// A lone literal stays a plain value, except under the text operators
    /// where it becomes the matching substring expression.
    fn value(&self, pair: Pair<'_, Rule>, operator: FilterOperator) -> SyntaxResult<FilterValue> {
        if let Some((text, bare)) = simple_literal(&pair) {
            if operator.is_text() {
                let expr = match operator.positive().0 {
                    FilterOperator::StartsWith => FilterExpression::starts_with(text)?,
                    FilterOperator::EndsWith => FilterExpression::ends_with(text)?,
                    _ => FilterExpression::contains(text)?,
                };
                return Ok(FilterValue::Expression(expr));
            }
            if bare && text.eq_ignore_ascii_case("null") {
                return Ok(FilterValue::Null);
            }
            return Ok(FilterValue::String(text));
        }

        self.value_expression(pair).map(FilterValue::Expression)
    }

    /// `term (| term)*`, folded to the left.
    fn value_expression(&self, pair: Pair<'_, Rule>) -> SyntaxResult<FilterExpression> {
        let mut terms = pair.into_inner();
        let first = self.required(terms.next(), "value")?;
        terms.try_fold(self.term(first)?, |left, term| {
            Ok(FilterExpression::or(left, self.term(term)?))
        })
    }

    /// `!* atom`
    fn term(&self, pair: Pair<'_, Rule>) -> SyntaxResult<FilterExpression> {
        let span = pair.clone();
        let mut negations = 0;
        let mut expr = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::bang => negations += 1,
                Rule::group => {
                    let value = self.required(inner.into_inner().next(), "value")?;
                    expr = Some(self.value_expression(value)?);
                }
                Rule::one_of => {
                    let values = inner
                        .into_inner()
                        .map(|t| self.term(t))
                        .collect::<SyntaxResult<Vec<_>>>()?;
                    expr = Some(FilterExpression::one_of(values));
                }
                Rule::range => expr = Some(self.range(inner)?),
                Rule::pattern => expr = Some(self.pattern(inner)?),
                _ => {}
            }
        }

        let expr = expr.ok_or_else(|| self.error(&span, "expected a value"))?;
        Ok((0..negations).fold(expr, |expr, _| expr.negate()))
    }

    /// `[min TO max]`, `*` leaves a side open.
    fn range(&self, pair: Pair<'_, Rule>) -> SyntaxResult<FilterExpression> {
        let span = pair.clone();
        let mut bounds = pair.into_inner().filter(|p| p.as_rule() == Rule::bound);
        let min = self.bound(self.required(bounds.next(), "lower bound")?)?;
        let max = self.bound(self.required(bounds.next(), "upper bound")?)?;
        FilterExpression::range(min, max).map_err(|e| self.error(&span, e.to_string()))
    }

    fn bound(&self, pair: Pair<'_, Rule>) -> SyntaxResult<Option<FilterExpression>> {
        let inner = self.required(pair.into_inner().next(), "bound")?;
        Ok(match inner.as_rule() {
            Rule::star => None,
            Rule::quoted => Some(FilterExpression::constant(unquote(&inner))),
            _ => Some(nested_literal(inner.as_str())),
        })
    }

    /// `*`, `x`, `x*`, `*x`, `*x*`
    fn pattern(&self, pair: Pair<'_, Rule>) -> SyntaxResult<FilterExpression> {
        let span = pair.clone();
        let parts: Vec<_> = pair.into_inner().collect();
        let text = parts.iter().find_map(|p| match p.as_rule() {
            Rule::quoted => Some((unquote(p), false)),
            Rule::bare => Some((p.as_str().to_string(), true)),
            _ => None,
        });
        let leading = parts.first().is_some_and(|p| p.as_rule() == Rule::star);
        let trailing = parts.len() > 1 && parts.last().is_some_and(|p| p.as_rule() == Rule::star);

        match (leading, text, trailing) {
            (true, None, false) => Ok(FilterExpression::Asterisk),
            (true, None, true) => Err(self.error(&span, "`**` is not a valid pattern")),
            (false, Some((text, true)), false) => Ok(nested_literal(&text)),
            (false, Some((text, false)), false) => Ok(FilterExpression::constant(text)),
            (true, Some((text, _)), true) => FilterExpression::contains(text),
            (false, Some((text, _)), true) => FilterExpression::starts_with(text),
            (true, Some((text, _)), false) => FilterExpression::ends_with(text),
            (false, None, _) => Err(self.error(&span, "expected a value")),
        }
    }
}

/// Wrap several nodes in a group, keep a single node as is.
fn group(logic: FilterLogic, mut nodes: Vec<FilterNode>) -> FilterNode {
    if nodes.len() == 1 {
        if let Some(node) = nodes.pop() {
            return node;
        }
    }
    FilterNode::Multi(MultiFilter::new(logic, nodes))
}

/// The text of a value made of a single literal without wildcards, sets,
/// ranges or negations, and whether it was written bare.
fn simple_literal(value: &Pair<'_, Rule>) -> Option<(String, bool)> {
    let mut terms = value.clone().into_inner();
    let term = terms.next()?;
    if terms.next().is_some() {
        return None;
    }

    let mut inner = term.into_inner();
    let pattern = inner.next().filter(|p| p.as_rule() == Rule::pattern)?;
    let mut parts = pattern.into_inner();
    let literal = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    match literal.as_rule() {
        Rule::bare => Some((literal.as_str().to_string(), true)),
        Rule::quoted => Some((unquote(&literal), false)),
        _ => None,
    }
}

/// Bare token inside an expression: a temporal literal when it reads as one.
fn nested_literal(text: &str) -> FilterExpression {
    FilterExpression::temporal(text).unwrap_or_else(|| FilterExpression::constant(text))
}

fn unquote(quoted: &Pair<'_, Rule>) -> String {
    let raw = quoted
        .clone()
        .into_inner()
        .next()
        .map(|inner| inner.as_str())
        .unwrap_or_default();

    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => text.extend(chars.next()),
            c => text.push(c),
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn c(value: &str) -> FilterExpression {
        FilterExpression::constant(value)
    }

    fn leaf(node: FilterNode) -> Filter {
        match node {
            FilterNode::Filter(filter) => filter,
            other => panic!("expected a leaf filter, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_simple_filter() {
        let filter = leaf(parse_filter("Firstname eq Bruce").unwrap());
        assert_eq!(filter, Filter::new("Firstname", FilterOperator::EqualTo, "Bruce"));
    }

    #[test]
    fn test_parse_quoted_value() {
        let filter = leaf(parse_filter(r#"Nickname EQ "The \"Dark\" Knight""#).unwrap());
        assert_eq!(filter.value, FilterValue::String(r#"The "Dark" Knight"#.into()));
    }

    #[test]
    fn test_parse_null_value() {
        let filter = leaf(parse_filter("Nickname eq null").unwrap());
        assert_eq!(filter.value, FilterValue::Null);

        let filter = leaf(parse_filter(r#"Nickname eq "null""#).unwrap());
        assert_eq!(filter.value, FilterValue::String("null".into()));
    }

    #[test]
    fn test_parse_unary_operator() {
        let filter = leaf(parse_filter("Nickname isnotnull").unwrap());
        assert_eq!(filter.operator, FilterOperator::IsNotNull);
        assert_eq!(filter.value, FilterValue::Null);
    }

    #[test]
    fn test_text_operators_build_substring_expressions() {
        let filter = leaf(parse_filter("Powers contains heat").unwrap());
        assert_eq!(
            filter.value,
            FilterValue::Expression(FilterExpression::contains("heat").unwrap())
        );

        let filter = leaf(parse_filter("Nickname nstartswith Bat").unwrap());
        assert_eq!(filter.operator, FilterOperator::NotStartsWith);
        assert_eq!(
            filter.value,
            FilterValue::Expression(FilterExpression::starts_with("Bat").unwrap())
        );
    }

    #[test]
    fn test_empty_text_operand_is_out_of_range() {
        let err = parse_filter(r#"Nickname contains """#).unwrap_err();
        assert!(matches!(err, SyntaxError::OutOfRange { .. }), "{err:?}");
    }

    #[test]
    fn test_parse_wildcards() {
        let value = |input: &str| leaf(parse_filter(input).unwrap()).value;

        assert_eq!(value("Nickname eq *"), FilterValue::Expression(FilterExpression::Asterisk));
        assert_eq!(
            value("Nickname eq Bat*"),
            FilterValue::Expression(FilterExpression::starts_with("Bat").unwrap())
        );
        assert_eq!(
            value("Nickname eq *man"),
            FilterValue::Expression(FilterExpression::ends_with("man").unwrap())
        );
        assert_eq!(
            value(r#"Nickname eq *"at m"*"#),
            FilterValue::Expression(FilterExpression::contains("at m").unwrap())
        );
    }

    #[test]
    fn test_inner_wildcard_is_rejected() {
        let err = parse_filter("Nickname eq B*n").unwrap_err();
        assert!(matches!(err, SyntaxError::ParseError { .. }));
        assert!(parse_filter("Nickname eq **").is_err());
    }

    #[test]
    fn test_parse_one_of_keeps_order() {
        let filter = leaf(parse_filter("Firstname eq {Bruce,Clark|Diana}").unwrap());
        assert_eq!(
            filter.value,
            FilterValue::Expression(FilterExpression::one_of([c("Bruce"), c("Clark"), c("Diana")]))
        );
    }

    #[test]
    fn test_parse_or_and_negation() {
        let filter = leaf(parse_filter("Firstname eq Bruce|!Clark|Diana").unwrap());
        let expected = FilterExpression::or(
            FilterExpression::or(c("Bruce"), FilterExpression::not(c("Clark"))),
            c("Diana"),
        );
        assert_eq!(filter.value, FilterValue::Expression(expected));

        let filter = leaf(parse_filter("Firstname eq !!Bruce").unwrap());
        assert_eq!(filter.value, FilterValue::Expression(c("Bruce")));
    }

    #[test]
    fn test_parse_range_and_dates() {
        let filter = leaf(parse_filter("BirthDate eq [1970-01-01 TO *]").unwrap());
        let date = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(
            filter.value,
            FilterValue::Expression(
                FilterExpression::range(Some(FilterExpression::date(date)), None).unwrap()
            )
        );

        assert!(parse_filter("Height eq [* TO *]").is_err());
    }

    #[test]
    fn test_parse_nested_path() {
        let filter = leaf(parse_filter(r#"Henchman["Weapons"]["Name"] eq stick"#).unwrap());
        assert_eq!(filter.field.as_deref(), Some(r#"Henchman["Weapons"]["Name"]"#));
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let node = parse_filter("A eq 1 and B eq 2 or C eq 3 and not D eq 4").unwrap();
        let expected = FilterNode::or([
            FilterNode::and([
                Filter::new("A", FilterOperator::EqualTo, "1").into(),
                Filter::new("B", FilterOperator::EqualTo, "2").into(),
            ]),
            FilterNode::and([
                Filter::new("C", FilterOperator::EqualTo, "3").into(),
                Filter::new("D", FilterOperator::NotEqualTo, "4").into(),
            ]),
        ]);
        assert_eq!(node, expected);
    }

    #[test]
    fn test_parentheses_and_not_apply_de_morgan() {
        let node = parse_filter("NOT (A gt 1 AND B isempty)").unwrap();
        let expected = FilterNode::or([
            Filter::new("A", FilterOperator::LessThanOrEqualTo, "1").into(),
            Filter::new("B", FilterOperator::IsNotEmpty, FilterValue::Null).into(),
        ]);
        assert_eq!(node, expected);
    }

    #[test]
    fn test_parse_field_path() {
        assert_eq!(parse_field_path("Firstname").unwrap(), vec!["Firstname"]);
        assert_eq!(
            parse_field_path("Henchman.Weapons.Name").unwrap(),
            vec!["Henchman", "Weapons", "Name"]
        );
        assert_eq!(
            parse_field_path(r#"Henchman["Weapons"]["Level 2"]"#).unwrap(),
            vec!["Henchman", "Weapons", "Level 2"]
        );
        assert!(parse_field_path("Henchman[Weapons]").is_err());
        assert!(parse_field_path("").is_err());
    }

    #[test]
    fn test_blank_input_matches_everything() {
        assert_eq!(parse_filter("  ").unwrap(), FilterNode::always());
    }

    #[test]
    fn test_syntax_error_carries_location() {
        let err = parse_filter("Firstname like Bruce").unwrap_err();
        let SyntaxError::ParseError { span, .. } = err else {
            panic!("expected a parse error");
        };
        assert_eq!(span.offset(), 10);
    }

    #[test]
    fn test_structural_errors_point_at_their_pair() {
        let input = "Firstname";
        let builder = Builder { input };

        let field = StrainerParser::parse(Rule::field, input).unwrap().next().unwrap();
        let SyntaxError::ParseError { span, .. } = builder.unary(field.clone()).unwrap_err() else {
            panic!("expected a parse error");
        };
        assert_eq!((span.offset(), span.len()), (0, 9));

        let SyntaxError::ParseError { span, .. } = builder.term(field).unwrap_err() else {
            panic!("expected a parse error");
        };
        assert_eq!((span.offset(), span.len()), (0, 9));
    }

    #[test]
    fn test_parse_value_follows_filter_rules() {
        assert_eq!(
            parse_value("Bat*", FilterOperator::EqualTo).unwrap(),
            FilterValue::Expression(FilterExpression::starts_with("Bat").unwrap())
        );
        assert_eq!(
            parse_value("{Clark,Diana}", FilterOperator::EqualTo).unwrap(),
            FilterValue::Expression(FilterExpression::one_of([c("Clark"), c("Diana")]))
        );
        assert_eq!(
            parse_value("man", FilterOperator::NotContains).unwrap(),
            FilterValue::Expression(FilterExpression::contains("man").unwrap())
        );
        assert_eq!(
            parse_value(r#""Bat*""#, FilterOperator::EqualTo).unwrap(),
            FilterValue::String("Bat*".into())
        );
        assert_eq!(parse_value("null", FilterOperator::EqualTo).unwrap(), FilterValue::Null);
        assert!(parse_value("super strength", FilterOperator::EqualTo).is_err());
        assert!(parse_value("", FilterOperator::EqualTo).is_err());
    }

    #[test]
    fn test_depth_limit() {
        let parser = FilterParser::new(ParserConfig { max_depth: 2 });
        assert!(parser.parse("((A eq 1))").is_ok());
        assert!(parser.parse("(((A eq 1)))").is_err());
        assert!(parser.parse(r#"A eq "((((""#).is_ok());
    }

    #[test]
    fn test_display_round_trips() {
        for input in [
            "Firstname eq Bruce",
            r#"Nickname eq {Bat*,"Dark Knight"}|!*man"#,
            "A eq 1 or (B gt 2 and C isnull)",
            "BirthDate eq [1970-01-01 TO 1980-12-31]",
        ] {
            let node = parse_filter(input).unwrap();
            assert_eq!(parse_filter(&node.to_string()).unwrap(), node, "{input}");
        }
    }
}
