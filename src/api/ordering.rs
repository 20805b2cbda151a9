//! Server-side sort order.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitAnd;

use crate::helpers::escape_filter_value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// An ordered list of `(direction, field)` pairs, most significant first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ordering {
    pairs: Vec<(Direction, String)>,
}

impl Ordering {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            pairs: vec![(Direction::Asc, field.into())],
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            pairs: vec![(Direction::Desc, field.into())],
        }
    }

    pub fn pairs(&self) -> &[(Direction, String)] {
        &self.pairs
    }

    /// Appends `other` after `self`, leaving both operands untouched.
    pub fn then(&self, other: &Self) -> Self {
        let mut pairs = self.pairs.clone();
        pairs.extend(other.pairs.iter().cloned());
        Self { pairs }
    }

    /// Renders the single `order_by` query parameter.
    pub fn to_query_params(&self) -> BTreeMap<String, String> {
        let rendered = self
            .pairs
            .iter()
            .map(|(direction, field)| {
                format!("{}:{}", direction.as_str(), escape_filter_value(field))
            })
            .collect::<Vec<_>>()
            .join(";");
        BTreeMap::from([("order_by".to_string(), rendered)])
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .pairs
            .iter()
            .map(|(direction, field)| format!("{}({field})", direction.as_str()))
            .collect();
        write!(f, "Ordering({})", rendered.join(", "))
    }
}

impl BitAnd for Ordering {
    type Output = Ordering;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.then(&rhs)
    }
}
