//! Sort string parser: `-Age,Name`, `+Henchman.Firstname`.

use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::debug;

use crate::ast::{MultiSort, Sort, SortDirection, SortNode};
use crate::error::{SyntaxError, SyntaxResult};

const FIELD: &str = r#"[a-z_]\w*(?:\.[a-z_]\w*|\["[^"\]]*"\])*"#;

/// Pattern a whole sort string must match (case-insensitive).
pub static SORT_PATTERN: LazyLock<String> =
    LazyLock::new(|| format!(r"^\s*(-|\+)?({FIELD})(\s*,\s*(-|\+)?({FIELD}))*\s*$"));

static SORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("(?i){}", *SORT_PATTERN)).expect("valid sort regex"));

static SORT_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^\s*(-|\+)?({FIELD})\s*$")).expect("valid sort part regex")
});

/// Split on the commas that separate fields, leaving quoted names whole.
fn split_parts(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (offset, c) in input.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&input[start..offset]);
                start = offset + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Parse a sort string. One field yields [`SortNode::Sort`], several yield
/// [`SortNode::Multi`] in the order written.
///
/// Every sub-expression that does not match is reported in a single
/// [`SyntaxError::InvalidSort`].
pub fn parse_sort(input: &str) -> SyntaxResult<SortNode> {
    debug!(sort = input, "parsing sort");

    if !SORT.is_match(input) {
        let expressions: Vec<String> = split_parts(input)
            .into_iter()
            .filter(|part| !SORT_PART.is_match(part))
            .map(str::to_string)
            .collect();
        return Err(SyntaxError::InvalidSort {
            expressions,
            pattern: SORT_PATTERN.clone(),
        });
    }

    let mut sorts = Vec::new();
    for part in split_parts(input) {
        let caps = SORT_PART.captures(part).ok_or_else(|| SyntaxError::InvalidSort {
            expressions: vec![part.to_string()],
            pattern: SORT_PATTERN.clone(),
        })?;
        let direction = match caps.get(1).map(|m| m.as_str()) {
            Some("-") => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        let field = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        sorts.push(Sort::new(field, direction));
    }

    Ok(match sorts.len() {
        1 => SortNode::Sort(sorts.remove(0)),
        _ => SortNode::Multi(MultiSort(sorts)),
    })
}
