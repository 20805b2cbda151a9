//! Rows and their typed columns.

use super::{ProjectDetail, ProjectsController};
use crate::error::Result;
use crate::object::{
    Field, JsonMap, ObjectError, RemoteResource, Schema, TrackedObject, Value, Variants,
};

const PROJECT: &str = "project";

// ============================================================================
// Schemas
// ============================================================================

const SCALAR_FIELDS: &[Field] = &[
    Field::plain("ref"),
    Field::plain("type"),
    Field::plain("value").mutable(),
];

const fn scalar_column(name: &'static str) -> Schema {
    Schema::new(name, SCALAR_FIELDS).inject_when_modified(&["ref"])
}

pub const NUMERICAL_COLUMN: Schema = scalar_column("NumericalColumn");
pub const BOOLEAN_COLUMN: Schema = scalar_column("BooleanColumn");
pub const ANY_COLUMN: Schema = scalar_column("AnyColumn");
pub const TEXT_COLUMN: Schema = scalar_column("TextColumn");

pub const DATE_COLUMN: Schema = Schema::new(
    "DateColumn",
    &[
        Field::plain("ref"),
        Field::plain("type"),
        Field::timestamp("value").mutable(),
    ],
)
.inject_when_modified(&["ref"]);

const ROW_TOPIC: Schema = Schema::new(
    "RowTopic",
    &[
        Field::plain("id"),
        Field::plain("label"),
        Field::plain("category"),
        Field::plain("code"),
        Field::plain("sentiment_label"),
        Field::plain("sentiment").mutable(),
    ],
);

pub const TEXT_TO_ANALYZE_VALUE: Schema = Schema::new(
    "TextToAnalyzeColumn",
    &[
        Field::plain("ref"),
        Field::plain("type"),
        Field::plain("value").mutable(),
        Field::plain("was_reviewed").mutable(),
        Field::plain("sentiment_overall"),
        Field::plain("source_language"),
        Field::plain("translated_value"),
        Field::list("topics", &ROW_TOPIC).mutable(),
    ],
)
.inject_when_modified(&["ref"]);

fn row_column(column_type: &str) -> Option<&'static Schema> {
    match column_type {
        "numerical" => Some(&NUMERICAL_COLUMN),
        "boolean" => Some(&BOOLEAN_COLUMN),
        "date" => Some(&DATE_COLUMN),
        "any" => Some(&ANY_COLUMN),
        "text" => Some(&TEXT_COLUMN),
        "text_to_analyze" => Some(&TEXT_TO_ANALYZE_VALUE),
        _ => None,
    }
}

const ROW_COLUMNS: Variants = Variants {
    discriminator: "type",
    dispatch: row_column,
};

pub const ROW: Schema = Schema::new(
    "Row",
    &[
        Field::timestamp("created"),
        Field::timestamp("last_modified"),
        Field::list_of("columns", &ROW_COLUMNS),
    ],
)
.identified();

// ============================================================================
// Resource
// ============================================================================

crate::tracked_type! {
    /// One row of a project.
    ///
    /// Rows remember the project they belong to in their `project` metadata
    /// entry, which every remote operation needs.
    pub struct Row for ProjectsController = ROW {
        created: timestamp,
        last_modified: timestamp,
        columns: list,
    }
}

impl Row {
    pub fn project_id(&self) -> Result<&str, ObjectError> {
        self.object.metadata_value(PROJECT)
    }

    fn position(&self, reference: &str) -> Option<usize> {
        self.columns()?
            .iter()
            .position(|column| column.value("ref").and_then(Value::as_str) == Some(reference))
    }

    pub fn column(&self, reference: &str) -> Option<&TrackedObject<ProjectsController>> {
        self.columns()?.get(self.position(reference)?)
    }

    pub fn value(&self, reference: &str) -> Option<&Value<ProjectsController>> {
        self.column(reference)?.value("value")
    }

    /// Assigns the value of the column with the given reference.
    pub fn set_value(
        &mut self,
        reference: &str,
        value: impl Into<Value<ProjectsController>>,
    ) -> Result<(), ObjectError> {
        let index = self.position(reference).ok_or_else(|| ObjectError::UnknownField {
            object: ROW.name,
            field: format!("columns[ref={reference}]"),
        })?;
        let mut columns = self.columns_mut()?;
        match columns.get_mut(index) {
            Some(mut column) => column.set("value", value),
            None => Err(ObjectError::UnknownField {
                object: ROW.name,
                field: format!("columns[{index}]"),
            }),
        }
    }

    /// Retrieves the project this row belongs to.
    pub fn retrieve_project(&self) -> Result<ProjectDetail> {
        self.object.controller()?.retrieve(self.project_id()?)
    }
}

impl RemoteResource for Row {
    fn fetch_remote(&self) -> Result<Self> {
        self.object
            .controller()?
            .retrieve_row(self.project_id()?, self.id())
    }

    fn update_remote(&self, changes: JsonMap) -> Result<Self> {
        self.object
            .controller()?
            .update_row_raw(self.project_id()?, self.id(), changes)
    }

    fn delete_remote(&self) -> Result<()> {
        self.object
            .controller()?
            .remove_row(self.project_id()?, self.id())
    }
}
