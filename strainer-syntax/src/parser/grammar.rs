//! Pest grammar for Strainer filter strings.

use pest_derive::Parser;

/// The Strainer filter parser.
#[derive(Parser)]
#[grammar = "parser/strainer.pest"]
pub struct StrainerParser;

#[cfg(test)]
mod tests {
    use super::*;
    use pest::Parser;

    #[test]
    fn test_parse_field() {
        assert!(StrainerParser::parse(Rule::field, "Firstname").is_ok());
        assert!(StrainerParser::parse(Rule::field, "Henchman.Firstname").is_ok());

        let pairs = StrainerParser::parse(Rule::field, r#"Henchman["Weapons"]["Name"]"#).unwrap();
        assert_eq!(pairs.as_str(), r#"Henchman["Weapons"]["Name"]"#);
    }

    #[test]
    fn test_parse_operators() {
        assert!(StrainerParser::parse(Rule::binary_op, "gte").is_ok());
        assert!(StrainerParser::parse(Rule::binary_op, "NStartsWith").is_ok());
        assert!(StrainerParser::parse(Rule::unary_op, "isnotempty").is_ok());
        assert!(StrainerParser::parse(Rule::binary_op, "like").is_err());
    }

    #[test]
    fn test_parse_patterns() {
        for input in ["*", "Bat*", "*man", "*at*", r#""Bruce Wayne""#, r#"*"a b"*"#] {
            let result = StrainerParser::parse(Rule::pattern, input);
            assert!(result.is_ok(), "failed to parse {input}: {:?}", result.err());
        }
    }

    #[test]
    fn test_parse_value() {
        let input = r#"{stick,sword}|!Bat*|[10 TO *]|("a"|b)"#;
        let result = StrainerParser::parse(Rule::value, input);
        assert!(result.is_ok(), "Failed to parse value: {:?}", result.err());
        assert_eq!(result.unwrap().as_str(), input);
    }

    #[test]
    fn test_parse_input() {
        let input = "Firstname eq Bruce and not (Height gt 180 or Nickname isnull)";
        let result = StrainerParser::parse(Rule::input, input);
        assert!(result.is_ok(), "Failed to parse filter: {:?}", result.err());
    }
}
