//! Filter builders for the project and row list endpoints.

use crate::api::{Filter, Modifier, Values};

/// Scope marker for filters on `GET /projects`.
#[derive(Debug)]
pub enum ProjectsScope {}

/// Scope marker for filters on `GET /projects/{id}/rows`.
#[derive(Debug)]
pub enum RowsScope {}

pub type ProjectsFilter = Filter<ProjectsScope>;
pub type RowsFilter = Filter<RowsScope>;

/// Bounds on a timestamp field. Unset bounds are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateFilter {
    pub gte: Values,
    pub gt: Values,
    pub lte: Values,
    pub lt: Values,
    pub year: Values,
    pub year_gte: Values,
    pub year_gt: Values,
    pub year_lte: Values,
    pub year_lt: Values,
    pub month: Values,
    pub month_gte: Values,
    pub month_gt: Values,
    pub month_lte: Values,
    pub month_lt: Values,
    pub day: Values,
    pub day_gte: Values,
    pub day_gt: Values,
    pub day_lte: Values,
    pub day_lt: Values,
}

impl DateFilter {
    fn into_modifiers(self) -> [(&'static str, Values); 19] {
        [
            ("gte", self.gte),
            ("gt", self.gt),
            ("lte", self.lte),
            ("lt", self.lt),
            ("year", self.year),
            ("year.gte", self.year_gte),
            ("year.gt", self.year_gt),
            ("year.lte", self.year_lte),
            ("year.lt", self.year_lt),
            ("month", self.month),
            ("month.gte", self.month_gte),
            ("month.gt", self.month_gt),
            ("month.lte", self.month_lte),
            ("month.lt", self.month_lt),
            ("day", self.day),
            ("day.gte", self.day_gte),
            ("day.gt", self.day_gt),
            ("day.lte", self.day_lte),
            ("day.lt", self.day_lt),
        ]
    }
}

/// Case-insensitive text matching.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextFilter {
    pub exact_i: Values,
    pub contains_i: Values,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnerFilter {
    pub id: Values,
    pub email_exact_i: Values,
    pub email_contains_i: Values,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericalFilter {
    pub exact: Values,
    pub gte: Values,
    pub gt: Values,
    pub lte: Values,
    pub lt: Values,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextToAnalyzeFilter {
    pub exact_i: Values,
    pub contains_i: Values,
    pub was_reviewed: Values,
    pub source_language: Values,
    pub translated_value_exact_i: Values,
    pub translated_value_contains_i: Values,
}

fn default_modifier(values: impl Into<Values>) -> [(Modifier, Values); 1] {
    [(Modifier::Default, values.into())]
}

impl Filter<ProjectsScope> {
    pub fn name(filter: TextFilter) -> Self {
        Self::construct(
            "name",
            [("exact.i", filter.exact_i), ("contains.i", filter.contains_i)],
        )
    }

    pub fn owner(filter: OwnerFilter) -> Self {
        Self::construct(
            "owner",
            [
                ("id", filter.id),
                ("email.exact.i", filter.email_exact_i),
                ("email.contains.i", filter.email_contains_i),
            ],
        )
    }

    pub fn tags(values: impl Into<Values>) -> Self {
        Self::construct("tags", default_modifier(values))
    }

    pub fn upload_status(values: impl Into<Values>) -> Self {
        Self::construct("upload_status", default_modifier(values))
    }

    pub fn language(values: impl Into<Values>) -> Self {
        Self::construct("language", default_modifier(values))
    }

    pub fn translation_status(values: impl Into<Values>) -> Self {
        Self::construct(
            "translation_status",
            default_modifier(values),
        )
    }

    pub fn translation_engine(values: impl Into<Values>) -> Self {
        Self::construct(
            "translation_engine",
            default_modifier(values),
        )
    }

    pub fn created(filter: DateFilter) -> Self {
        Self::construct("created", filter.into_modifiers())
    }

    pub fn last_modified(filter: DateFilter) -> Self {
        Self::construct("last_modified", filter.into_modifiers())
    }
}

/// Column filters all live under the single `columns` query parameter, with
/// the column reference and type encoded in the modifier.
impl Filter<RowsScope> {
    pub fn numerical(reference: &str, filter: NumericalFilter) -> Self {
        let base = format!("{reference}[numerical]");
        Self::construct(
            "columns",
            [
                (base.clone(), filter.exact),
                (format!("{base}.gte"), filter.gte),
                (format!("{base}.gt"), filter.gt),
                (format!("{base}.lte"), filter.lte),
                (format!("{base}.lt"), filter.lt),
            ],
        )
    }

    pub fn boolean(reference: &str, exact: impl Into<Values>) -> Self {
        Self::construct("columns", [(format!("{reference}[boolean]"), exact.into())])
    }

    pub fn text(reference: &str, filter: TextFilter) -> Self {
        let base = format!("{reference}[text]");
        Self::construct(
            "columns",
            [
                (format!("{base}.exact.i"), filter.exact_i),
                (format!("{base}.contains.i"), filter.contains_i),
            ],
        )
    }

    pub fn text_to_analyze(reference: &str, filter: TextToAnalyzeFilter) -> Self {
        let base = format!("{reference}[text_to_analyze]");
        Self::construct(
            "columns",
            [
                (format!("{base}.exact.i"), filter.exact_i),
                (format!("{base}.contains.i"), filter.contains_i),
                (format!("{base}.was_reviewed"), filter.was_reviewed),
                (format!("{base}.source_language"), filter.source_language),
                (
                    format!("{base}.translated_value.exact.i"),
                    filter.translated_value_exact_i,
                ),
                (
                    format!("{base}.translated_value.contains.i"),
                    filter.translated_value_contains_i,
                ),
            ],
        )
    }

    pub fn created(filter: DateFilter) -> Self {
        Self::construct("created", filter.into_modifiers())
    }

    pub fn last_modified(filter: DateFilter) -> Self {
        Self::construct("last_modified", filter.into_modifiers())
    }
}
