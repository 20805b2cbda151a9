//! Server-side filter expressions.
//!
//! A [`Filter`] maps filter names to an ordered list of clauses. Clauses under
//! one name are ANDed, while the modifiers and values inside a single clause
//! are ORed. Expressions are immutable: `&` and `|` always produce a new value.
//!
//! ```
//! use caplena::projects::{DateFilter, ProjectsFilter};
//!
//! let filter = ProjectsFilter::tags(["customer", "survey"])
//!     & ProjectsFilter::created(DateFilter {
//!         year_gte: 2022.into(),
//!         ..Default::default()
//!     });
//! assert_eq!(filter.to_query_params()["tags"], "customer,survey");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{BitAnd, BitOr};

use thiserror::Error;

use crate::helpers::escape_filter_value;
use crate::time::Timestamp;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error(
        "Cannot build the disjunction of already conjuncted filters To fix this error, please make sure that your filters are in conjunctive normal form (CNF)."
    )]
    ConjunctionDisjunction,

    #[error(
        "Cannot build the disjunction for filter `{incoming}`, as there is already a different filter `{existing}` being applied."
    )]
    ConflictingFilter { existing: String, incoming: String },
}

// ============================================================================
// Values
// ============================================================================

/// A single raw filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(Timestamp),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Str(s) => f.write_str(s),
            FilterValue::Int(i) => write!(f, "{i}"),
            FilterValue::Float(x) => write!(f, "{x}"),
            FilterValue::Bool(b) => write!(f, "{b}"),
            FilterValue::Timestamp(t) => f.write_str(&t.to_rfc3339()),
        }
    }
}

macro_rules! filter_value_from {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$ty> for FilterValue {
                fn from($v: $ty) -> Self {
                    $body
                }
            }

            impl From<$ty> for Values {
                fn from(value: $ty) -> Self {
                    Values(vec![FilterValue::from(value)])
                }
            }
        )*
    };
}

filter_value_from! {
    &str => |v| FilterValue::Str(v.to_string()),
    String => |v| FilterValue::Str(v),
    i64 => |v| FilterValue::Int(v),
    i32 => |v| FilterValue::Int(i64::from(v)),
    u32 => |v| FilterValue::Int(i64::from(v)),
    f64 => |v| FilterValue::Float(v),
    bool => |v| FilterValue::Bool(v),
    Timestamp => |v| FilterValue::Timestamp(v),
}

/// Zero or more values supplied for one modifier.
///
/// An empty `Values` means "not given" and contributes no clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values(Vec<FilterValue>);

impl Values {
    pub fn none() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<FilterValue> {
        self.0
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for Values {
    fn from(values: Vec<T>) -> Self {
        Values(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>, const N: usize> From<[T; N]> for Values {
    fn from(values: [T; N]) -> Self {
        Values(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Values>> From<Option<T>> for Values {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// The modifier part of a clause literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// Values are matched by the filter name alone.
    Default,
    Named(String),
}

impl Modifier {
    pub fn named(name: impl Into<String>) -> Self {
        Modifier::Named(name.into())
    }
}

impl From<&str> for Modifier {
    fn from(name: &str) -> Self {
        Modifier::Named(name.to_string())
    }
}

impl From<String> for Modifier {
    fn from(name: String) -> Self {
        Modifier::Named(name)
    }
}

// ============================================================================
// Filter expression
// ============================================================================

/// Modifier/value pairs ORed together.
type Clause = Vec<(Modifier, Vec<FilterValue>)>;

/// An immutable filter expression in conjunctive normal form.
///
/// `S` is a scope marker: filters built for one endpoint cannot be combined
/// with filters built for another.
pub struct Filter<S> {
    constraints: Vec<(String, Vec<Clause>)>,
    has_conjunction: bool,
    scope: PhantomData<fn() -> S>,
}

impl<S> Filter<S> {
    /// The filter that matches everything.
    pub fn empty() -> Self {
        Self {
            constraints: Vec::new(),
            has_conjunction: false,
            scope: PhantomData,
        }
    }

    /// Builds a single-name filter.
    ///
    /// Every modifier with at least one value becomes its own clause. More
    /// than one clause marks the expression as already conjuncted.
    pub fn construct<I, M, V>(name: impl Into<String>, filters: I) -> Self
    where
        I: IntoIterator<Item = (M, V)>,
        M: Into<Modifier>,
        V: Into<Values>,
    {
        let clauses: Vec<Clause> = filters
            .into_iter()
            .map(|(modifier, values)| (modifier.into(), values.into()))
            .filter(|(_, values)| !values.is_empty())
            .map(|(modifier, values)| vec![(modifier, values.into_vec())])
            .collect();

        let has_conjunction = clauses.len() > 1;
        let constraints = if clauses.is_empty() {
            Vec::new()
        } else {
            vec![(name.into(), clauses)]
        };
        Self {
            constraints,
            has_conjunction,
            scope: PhantomData,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn has_conjunction(&self) -> bool {
        self.has_conjunction
    }

    /// The filter names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constraints.iter().map(|(name, _)| name.as_str())
    }

    /// Conjunction of two filters. Never fails.
    pub fn and(&self, other: &Self) -> Self {
        let mut constraints = self.constraints.clone();
        let has_conjunction = (!self.is_empty() && !other.is_empty())
            || self.has_conjunction
            || other.has_conjunction;

        for (name, clauses) in &other.constraints {
            match constraints.iter_mut().find(|(existing, _)| existing == name) {
                Some((_, existing)) => existing.extend(clauses.iter().cloned()),
                None => constraints.push((name.clone(), clauses.clone())),
            }
        }

        Self {
            constraints,
            has_conjunction,
            scope: PhantomData,
        }
    }

    /// Disjunction of two single-clause filters on the same name.
    ///
    /// When either side is empty the other side is returned, carrying the
    /// right-hand operand's conjunction flag in both cases.
    pub fn or(&self, other: &Self) -> Result<Self, FilterError> {
        if self.is_empty() {
            return Ok(Self {
                constraints: other.constraints.clone(),
                has_conjunction: other.has_conjunction,
                scope: PhantomData,
            });
        }
        if other.is_empty() {
            return Ok(Self {
                constraints: self.constraints.clone(),
                has_conjunction: other.has_conjunction,
                scope: PhantomData,
            });
        }
        if self.has_conjunction || other.has_conjunction {
            return Err(FilterError::ConjunctionDisjunction);
        }

        // Without a conjunction each side holds exactly one name and one clause.
        let (name, clauses) = &self.constraints[0];
        let (other_name, other_clauses) = &other.constraints[0];
        if name != other_name {
            return Err(FilterError::ConflictingFilter {
                existing: name.clone(),
                incoming: other_name.clone(),
            });
        }

        let mut merged = clauses[0].clone();
        for (modifier, values) in &other_clauses[0] {
            match merged.iter_mut().find(|(existing, _)| existing == modifier) {
                Some((_, existing)) => existing.extend(values.iter().cloned()),
                None => merged.push((modifier.clone(), values.clone())),
            }
        }

        Ok(Self {
            constraints: vec![(name.clone(), vec![merged])],
            has_conjunction: false,
            scope: PhantomData,
        })
    }

    /// Renders the expression as query parameters, one per filter name.
    pub fn to_query_params(&self) -> BTreeMap<String, String> {
        self.constraints
            .iter()
            .map(|(name, clauses)| {
                let rendered = clauses
                    .iter()
                    .map(render_clause)
                    .collect::<Vec<_>>()
                    .join(";");
                (name.clone(), rendered)
            })
            .collect()
    }
}

fn render_clause(clause: &Clause) -> String {
    let mut literals = Vec::new();
    for (modifier, values) in clause {
        for value in values {
            let escaped = escape_filter_value(&value.to_string());
            match modifier {
                Modifier::Default => literals.push(escaped),
                Modifier::Named(m) => literals.push(format!("{m}:{escaped}")),
            }
        }
    }
    literals.join(",")
}

impl<S> Default for Filter<S> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S> Clone for Filter<S> {
    fn clone(&self) -> Self {
        Self {
            constraints: self.constraints.clone(),
            has_conjunction: self.has_conjunction,
            scope: PhantomData,
        }
    }
}

impl<S> PartialEq for Filter<S> {
    fn eq(&self, other: &Self) -> bool {
        self.constraints == other.constraints && self.has_conjunction == other.has_conjunction
    }
}

impl<S> fmt::Debug for Filter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("constraints", &self.constraints)
            .field("has_conjunction", &self.has_conjunction)
            .finish()
    }
}

impl<S> fmt::Display for Filter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered = Vec::new();
        for (name, clauses) in &self.constraints {
            for clause in clauses {
                let literals: Vec<String> = clause
                    .iter()
                    .map(|(modifier, values)| {
                        let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                        match modifier {
                            Modifier::Default => format!("{name}={{{}}}", values.join(",")),
                            Modifier::Named(m) => format!("{name}.{m}={{{}}}", values.join(",")),
                        }
                    })
                    .collect();
                rendered.push(format!("({})", literals.join(" | ")));
            }
        }
        write!(f, "Filter({})", rendered.join(" & "))
    }
}

impl<S> BitAnd for Filter<S> {
    type Output = Filter<S>;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(&rhs)
    }
}

impl<S> BitOr for Filter<S> {
    type Output = Result<Filter<S>, FilterError>;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    enum Test {}
    type TestFilter = Filter<Test>;

    fn created(modifiers: Vec<(&str, Values)>) -> TestFilter {
        TestFilter::construct("created", modifiers)
    }

    #[test]
    fn test_construct_skips_missing_values() {
        let filter = created(vec![
            ("year", Values::none()),
            ("month", Vec::<i64>::new().into()),
            ("day", Option::<i64>::None.into()),
        ]);
        assert!(filter.is_empty());
        assert!(!filter.has_conjunction());
        assert_eq!(filter.to_string(), "Filter()");
        assert!(filter.to_query_params().is_empty());
    }

    #[test]
    fn test_construct_with_several_modifiers_is_conjuncted() {
        let filter = created(vec![("year.gt", 10.into()), ("year.lt", 20.into())]);
        assert!(filter.has_conjunction());
        assert_eq!(
            filter.to_string(),
            "Filter((created.year.gt={10}) & (created.year.lt={20}))"
        );
    }

    #[test]
    fn test_default_modifier_scenario() {
        let filter = TestFilter::construct("tags", [(Modifier::Default, Values::from("x"))]);
        let params = filter.to_query_params();
        assert_eq!(params.len(), 1);
        assert_eq!(params["tags"], "x");

        let filter = TestFilter::construct("tags", [(Modifier::Default, Values::from(["a", "b"]))]);
        assert_eq!(filter.to_string(), "Filter((tags={a,b}))");
    }

    #[test]
    fn test_and_appends_clauses_under_same_name() {
        let a = created(vec![("year.gt", [10, 20].into())]);
        let b = created(vec![("year.lt", 20.into())]);
        let combined = a.clone() & b;

        assert!(combined.has_conjunction());
        assert_eq!(
            combined.to_string(),
            "Filter((created.year.gt={10,20}) & (created.year.lt={20}))"
        );
        // operands are untouched
        assert_eq!(a.to_string(), "Filter((created.year.gt={10,20}))");
    }

    #[test]
    fn test_and_with_itself_is_well_defined() {
        let a = created(vec![("year", 2020.into())]);
        let doubled = a.and(&a);
        assert_eq!(doubled.to_query_params()["created"], "year:2020;year:2020");
    }

    #[test]
    fn test_and_with_empty_keeps_flag_clear() {
        let a = created(vec![("year", 2020.into())]);
        let combined = a.clone() & TestFilter::empty();
        assert!(!combined.has_conjunction());
        assert_eq!(combined, a);
    }

    #[test]
    fn test_or_merges_single_clauses() {
        let merged = (created(vec![("year.gt", 10.into())]) | created(vec![("year.lt", [2, 4].into())]))
            .unwrap();
        let merged = (merged | created(vec![("year.lt", 8.into())])).unwrap();
        let merged = (merged | created(vec![("day", 4.into())])).unwrap();

        assert_eq!(
            merged.to_string(),
            "Filter((created.year.gt={10} | created.year.lt={2,4,8} | created.day={4}))"
        );
        assert_eq!(
            merged.to_query_params()["created"],
            "year.gt:10,year.lt:2,year.lt:4,year.lt:8,day:4"
        );
    }

    #[test]
    fn test_or_rejects_conjuncted_operands() {
        let conjuncted = created(vec![("year", 1.into())]) & created(vec![("month", 2.into())]);
        let err = (conjuncted | created(vec![("day", 3.into())])).unwrap_err();
        assert_eq!(err, FilterError::ConjunctionDisjunction);
        assert!(err.to_string().contains("conjunctive normal form (CNF)"));
    }

    #[test]
    fn test_or_rejects_different_names() {
        let err = (created(vec![("year", 1.into())])
            | TestFilter::construct("tags", [(Modifier::Default, "a")]))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot build the disjunction for filter `tags`, as there is already a different filter `created` being applied."
        );
    }

    #[test]
    fn test_or_with_empty_operand_takes_right_flag() {
        let conjuncted = created(vec![("year", 1.into()), ("month", 2.into())]);

        let left_empty = TestFilter::empty().or(&conjuncted).unwrap();
        assert!(left_empty.has_conjunction());
        assert_eq!(left_empty.to_query_params(), conjuncted.to_query_params());

        let right_empty = conjuncted.or(&TestFilter::empty()).unwrap();
        assert!(!right_empty.has_conjunction());
        assert_eq!(right_empty.to_query_params(), conjuncted.to_query_params());
    }

    #[test]
    fn test_query_params_join_clauses_and_escape_values() {
        let filter = created(vec![("year", [2020, 2021, 2022].into())])
            & created(vec![("year.gt", [20, 30, 40].into())])
            & created(vec![("day", [10, 20, 30].into())])
            & TestFilter::construct("tags", [(Modifier::Default, ["a", "b", "c"])]);

        let params = filter.to_query_params();
        assert_eq!(
            params["created"],
            "year:2020,year:2021,year:2022;year.gt:20,year.gt:30,year.gt:40;day:10,day:20,day:30"
        );
        assert_eq!(params["tags"], "a,b,c");

        let escaped = TestFilter::construct("name", [("exact.i", "a:b,c;d\\e")]);
        assert_eq!(escaped.to_query_params()["name"], "exact.i:a\\:b\\,c\\;d\\\\e");
    }

    #[test]
    fn test_query_params_render_timestamps_and_bools() {
        let start = Timestamp::from(Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap());
        let filter = created(vec![("gte", start.into())])
            & TestFilter::construct("was_reviewed", [(Modifier::Default, true)]);

        let params = filter.to_query_params();
        assert_eq!(params["created"], "gte:2022-01-01T00\\:00\\:00.000Z");
        assert_eq!(params["was_reviewed"], "true");
    }
}
