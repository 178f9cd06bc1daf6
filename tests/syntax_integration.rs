//! Integration tests for the filter syntax: parsing, rendering, negation
//! and equivalence.

use std::collections::HashSet;

use pretty_assertions::assert_eq;
use strainer::prelude::*;

fn constant(text: &str) -> FilterExpression {
    FilterExpression::constant(text)
}

#[test]
fn test_rendered_filter_parses_back() {
    let inputs = [
        r#"Firstname eq "Bruce Wayne""#,
        "Nickname eq Bat*|*man and Height gte 180",
        r#"Henchman["Weapons"]["Name"] eq {stick,sword} or Powers isempty"#,
        "Birth eq [1938-01-01 TO *] and not Nickname contains man",
    ];

    for input in inputs {
        let filter = parse_filter(input).unwrap();
        let rendered = filter.to_string();
        assert_eq!(parse_filter(&rendered).unwrap(), filter, "{rendered}");
    }
}

#[test]
fn test_rendering() {
    let filter = parse_filter("not (Nickname eq Bat*|*man and Height gte 180)").unwrap();
    insta::assert_snapshot!(filter, @"Nickname neq Bat*|*man or Height lt 180");

    let filter = parse_filter(r#"Firstname eq "Bruce Wayne""#).unwrap();
    insta::assert_snapshot!(filter, @r#"Firstname eq "Bruce Wayne""#);
}

#[test]
fn test_filter_json_round_trip() {
    let filter = parse_filter("Nickname eq Bat* or Age gt 30").unwrap();
    let json = serde_json::to_value(&filter).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "logic": "or",
            "filters": [
                { "field": "Nickname", "operator": "eq", "value": "Bat*" },
                { "field": "Age", "operator": "gt", "value": "30" }
            ]
        })
    );
}

#[test]
fn test_one_of_equivalence() {
    let a = FilterExpression::one_of([constant("Bruce"), constant("Clark")]);
    let b = FilterExpression::one_of([constant("Clark"), constant("Bruce"), constant("Bruce")]);
    assert_ne!(a, b);
    assert!(a.is_equivalent_to(&b));
    assert!(b.is_equivalent_to(&a));

    let single = FilterExpression::one_of([constant("Bruce"), constant("Bruce")]);
    assert!(single.is_equivalent_to(&constant("Bruce")));
    assert!(constant("Bruce").is_equivalent_to(&single));
}

#[test]
fn test_or_equivalence() {
    let ab = FilterExpression::or(constant("a"), constant("b"));
    let ba = FilterExpression::or(constant("b"), constant("a"));
    assert_ne!(ab, ba);
    assert!(ab.is_equivalent_to(&ba));

    let aa = FilterExpression::or(constant("a"), constant("a"));
    assert!(aa.is_equivalent_to(&constant("a")));
    assert!(!ab.is_equivalent_to(&constant("a")));
}

#[test]
fn test_double_negation() {
    let expr = FilterExpression::starts_with("Bat").unwrap();
    assert_eq!(expr.clone().negate().negate(), expr);

    let filter = parse_filter("Firstname eq Bruce and (Age gt 30 or Powers isempty)").unwrap();
    assert_eq!(filter.clone().negate().negate(), filter);
}

#[test]
fn test_expressions_as_set_keys() {
    let mut seen = HashSet::new();
    seen.insert(FilterExpression::Asterisk);
    seen.insert(FilterExpression::Asterisk);
    seen.insert(FilterExpression::contains("man").unwrap());
    seen.insert(FilterExpression::contains("man").unwrap());
    assert_eq!(seen.len(), 2);
}

#[test]
fn test_syntax_error_points_at_input() {
    let err = parse_filter("Firstname equals Bruce").unwrap_err();
    assert!(matches!(err, strainer::SyntaxError::ParseError { .. }));
}
