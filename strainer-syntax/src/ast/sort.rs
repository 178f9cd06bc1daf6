//! Sort descriptions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordering direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// The sign used in sort strings (empty for ascending).
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Ascending => "",
            Self::Descending => "-",
        }
    }

    /// The opposite direction.
    pub const fn reverse(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Sort on one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl Sort {
    /// Create a sort.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Ascending sort.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    /// Descending sort.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Descending)
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.direction.prefix(), self.field)
    }
}

/// Sorts applied in sequence; earlier entries take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiSort(pub Vec<Sort>);

impl MultiSort {
    /// Create from sorts in precedence order.
    pub fn new(sorts: impl IntoIterator<Item = Sort>) -> Self {
        Self(sorts.into_iter().collect())
    }

    /// The sorts in precedence order.
    pub fn sorts(&self) -> &[Sort] {
        &self.0
    }
}

/// A single sort or a sequence of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortNode {
    Sort(Sort),
    Multi(MultiSort),
}

impl SortNode {
    /// The sorts in precedence order.
    pub fn sorts(&self) -> &[Sort] {
        match self {
            Self::Sort(sort) => std::slice::from_ref(sort),
            Self::Multi(multi) => multi.sorts(),
        }
    }
}

impl From<Sort> for SortNode {
    fn from(sort: Sort) -> Self {
        Self::Sort(sort)
    }
}

impl From<MultiSort> for SortNode {
    fn from(multi: MultiSort) -> Self {
        Self::Multi(multi)
    }
}

impl fmt::Display for SortNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.sorts().iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(","))
    }
}
