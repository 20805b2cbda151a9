//! Project resources and their column schemas.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{ListRows, ProjectsController, Row, RowsAppend, RowsAppendStatus};
use crate::error::Result;
use crate::object::{
    Field, JsonMap, ObjectError, RemoteResource, Schema, Tracked, TrackedList, TrackedObject,
    Variants,
};
use crate::pagination::Pages;

// ============================================================================
// Schemas
// ============================================================================

const LEARNS_FROM: Schema = Schema::new(
    "LearnsFrom",
    &[Field::plain("project").mutable(), Field::plain("ref").mutable()],
);

const COLUMN_METADATA: Schema = Schema::new(
    "ColumnMetadata",
    &[
        Field::plain("reviewed_count"),
        Field::object("learns_from", &LEARNS_FROM).mutable(),
    ],
);

const TOPIC_SENTIMENT: Schema = Schema::new(
    "TopicSentiment",
    &[Field::plain("code"), Field::plain("label")],
);

pub const PROJECT_TOPIC: Schema = Schema::new(
    "ProjectTopic",
    &[
        Field::plain("label"),
        Field::plain("category"),
        Field::plain("color"),
        Field::plain("description"),
        Field::plain("sentiment_enabled"),
        Field::object("sentiment_neutral", &TOPIC_SENTIMENT),
        Field::object("sentiment_negative", &TOPIC_SENTIMENT),
        Field::object("sentiment_positive", &TOPIC_SENTIMENT),
    ],
)
.identified();

pub const TEXT_TO_ANALYZE_COLUMN: Schema = Schema::new(
    "TextToAnalyzeColumn",
    &[
        Field::plain("ref"),
        Field::plain("name").mutable(),
        Field::plain("type"),
        Field::plain("description").mutable(),
        Field::list("topics", &PROJECT_TOPIC),
        Field::object("metadata", &COLUMN_METADATA),
    ],
)
.inject_when_modified(&["ref", "type"]);

/// Numerical, boolean, text, date and `any` columns.
pub const AUXILIARY_COLUMN: Schema = Schema::new(
    "AuxiliaryColumn",
    &[
        Field::plain("ref"),
        Field::plain("name").mutable(),
        Field::plain("type"),
    ],
)
.inject_when_modified(&["ref", "type"]);

fn project_column(column_type: &str) -> Option<&'static Schema> {
    match column_type {
        "text_to_analyze" => Some(&TEXT_TO_ANALYZE_COLUMN),
        _ => Some(&AUXILIARY_COLUMN),
    }
}

const PROJECT_COLUMNS: Variants = Variants {
    discriminator: "type",
    dispatch: project_column,
};

pub const PROJECT_DETAIL: Schema = Schema::new(
    "ProjectDetail",
    &[
        Field::plain("name").mutable(),
        Field::plain("owner"),
        Field::plain("tags").mutable(),
        Field::plain("upload_status"),
        Field::plain("language"),
        Field::list_of("columns", &PROJECT_COLUMNS),
        Field::timestamp("created"),
        Field::timestamp("last_modified"),
        Field::plain("translation_status"),
        Field::plain("translation_engine"),
    ],
)
.identified();

pub const LISTED_PROJECT: Schema = Schema::new(
    "ListedProject",
    &[
        Field::plain("name").mutable(),
        Field::plain("owner"),
        Field::plain("tags").mutable(),
        Field::plain("upload_status"),
        Field::plain("language"),
        Field::timestamp("created"),
        Field::timestamp("last_modified"),
        Field::plain("translation_status"),
        Field::plain("translation_engine"),
    ],
)
.identified();

// ============================================================================
// Resources
// ============================================================================

crate::tracked_type! {
    /// A project including its column definitions.
    pub struct ProjectDetail for ProjectsController = PROJECT_DETAIL {
        name: str mut,
        /// Identifier of the user owning the project.
        owner: str,
        tags: strings mut,
        /// One of `pending`, `in_progress`, `succeeded` or `failed`.
        upload_status: str,
        /// ISO-639-1 base language.
        language: str,
        columns: list,
        created: timestamp,
        last_modified: timestamp,
        translation_status: opt_str,
        translation_engine: opt_str,
    }
}

crate::tracked_type! {
    /// A project as returned by the list endpoint, without columns.
    pub struct ListedProject for ProjectsController = LISTED_PROJECT {
        name: str mut,
        owner: str,
        tags: strings mut,
        upload_status: str,
        language: str,
        created: timestamp,
        last_modified: timestamp,
        translation_status: opt_str,
        translation_engine: opt_str,
    }
}

impl ProjectDetail {
    /// Typed views over the project columns.
    pub fn project_columns(&self) -> impl Iterator<Item = ProjectColumn<'_>> {
        self.columns()
            .into_iter()
            .flat_map(TrackedList::iter)
            .map(ProjectColumn::new)
    }

    pub fn column(&self, reference: &str) -> Option<ProjectColumn<'_>> {
        self.project_columns()
            .find(|column| column.reference() == reference)
    }
}

/// A borrowed, typed view of one project column.
#[derive(Debug, Clone, Copy)]
pub enum ProjectColumn<'a> {
    TextToAnalyze(&'a TrackedObject<ProjectsController>),
    Auxiliary(&'a TrackedObject<ProjectsController>),
}

impl<'a> ProjectColumn<'a> {
    fn new(object: &'a TrackedObject<ProjectsController>) -> Self {
        if object.schema().name == TEXT_TO_ANALYZE_COLUMN.name {
            ProjectColumn::TextToAnalyze(object)
        } else {
            ProjectColumn::Auxiliary(object)
        }
    }

    pub fn object(&self) -> &'a TrackedObject<ProjectsController> {
        match self {
            ProjectColumn::TextToAnalyze(object) | ProjectColumn::Auxiliary(object) => object,
        }
    }

    fn text(&self, field: &str) -> Option<&'a str> {
        self.object().value(field).and_then(|value| value.as_str())
    }

    /// The column reference, unique within its project.
    pub fn reference(&self) -> &'a str {
        self.text("ref").unwrap_or_default()
    }

    pub fn name(&self) -> &'a str {
        self.text("name").unwrap_or_default()
    }

    pub fn column_type(&self) -> &'a str {
        self.text("type").unwrap_or_default()
    }

    pub fn description(&self) -> Option<&'a str> {
        self.text("description")
    }

    /// Topics of a `text_to_analyze` column.
    pub fn topics(&self) -> Option<&'a TrackedList<ProjectsController>> {
        self.object().value("topics").and_then(|value| value.as_list())
    }
}

// ============================================================================
// Remote operations
// ============================================================================

impl RemoteResource for ProjectDetail {
    fn fetch_remote(&self) -> Result<Self> {
        self.object().controller()?.retrieve_as(self.id())
    }

    fn update_remote(&self, changes: JsonMap) -> Result<Self> {
        self.object().controller()?.update_as(self.id(), changes)
    }

    fn delete_remote(&self) -> Result<()> {
        self.object().controller()?.remove(self.id())
    }
}

impl RemoteResource for ListedProject {
    fn fetch_remote(&self) -> Result<Self> {
        self.object().controller()?.retrieve_as(self.id())
    }

    fn update_remote(&self, changes: JsonMap) -> Result<Self> {
        self.object().controller()?.update_as(self.id(), changes)
    }

    fn delete_remote(&self) -> Result<()> {
        self.object().controller()?.remove(self.id())
    }
}

/// Row shortcuts shared by both project resources.
pub trait RowOperations: RemoteResource<Controller = ProjectsController> {
    fn projects(&self) -> Result<&Arc<ProjectsController>, ObjectError> {
        self.object().controller()
    }

    fn list_rows(&self, options: ListRows) -> Result<Pages<Row>> {
        Ok(self.projects()?.list_rows(self.id(), options))
    }

    fn retrieve_row(&self, row_id: &str) -> Result<Row> {
        self.projects()?.retrieve_row(self.id(), row_id)
    }

    fn append_row(&self, columns: Vec<JsonValue>) -> Result<Row> {
        self.projects()?.append_row(self.id(), columns)
    }

    fn append_rows(&self, rows: Vec<JsonValue>) -> Result<RowsAppend> {
        self.projects()?.append_rows(self.id(), rows)
    }

    fn get_append_status(&self, task_id: Option<&str>) -> Result<RowsAppendStatus> {
        self.projects()?.get_append_status(self.id(), task_id)
    }
}

impl RowOperations for ProjectDetail {}
impl RowOperations for ListedProject {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project_json() -> JsonValue {
        json!({
            "id": "pj_1",
            "name": "NPS survey",
            "owner": "usr_1",
            "tags": ["nps"],
            "upload_status": "succeeded",
            "language": "en",
            "columns": [
                {
                    "ref": "answer",
                    "name": "Answer",
                    "type": "text_to_analyze",
                    "description": "Why?",
                    "topics": [{
                        "id": "cd_1",
                        "label": "Price",
                        "category": "Product",
                        "color": "#ff0000",
                        "description": "",
                        "sentiment_enabled": true,
                        "sentiment_neutral": {"code": 1, "label": "Price"},
                        "sentiment_negative": {"code": 2, "label": "Price: negative"},
                        "sentiment_positive": {"code": 3, "label": "Price: positive"},
                    }],
                    "metadata": {"reviewed_count": 4, "learns_from": null},
                },
                {"ref": "score", "name": "Score", "type": "numerical"},
            ],
            "created": "2022-03-14T08:18:38.910Z",
            "last_modified": "2022-03-15T08:18:38.910Z",
            "translation_status": null,
            "translation_engine": null,
        })
    }

    fn project() -> ProjectDetail {
        ProjectDetail::build(&project_json(), None, true, Default::default()).unwrap()
    }

    #[test]
    fn test_typed_getters() {
        let project = project();
        assert_eq!(project.name(), "NPS survey");
        assert_eq!(project.tags(), vec!["nps"]);
        assert_eq!(project.translation_status(), None);
        assert_eq!(
            project.created().unwrap().to_rfc3339(),
            "2022-03-14T08:18:38.910Z"
        );

        let answer = project.column("answer").unwrap();
        assert!(matches!(answer, ProjectColumn::TextToAnalyze(_)));
        assert_eq!(answer.topics().unwrap().len(), 1);
        assert_eq!(project.column("score").unwrap().column_type(), "numerical");
    }

    #[test]
    fn test_column_diff_carries_identity() {
        let mut project = project();
        project
            .columns_mut()
            .unwrap()
            .get_mut(1)
            .unwrap()
            .set("name", "NPS score")
            .unwrap();

        assert_eq!(
            JsonValue::Object(project.modified_dict().unwrap().unwrap()),
            json!({"columns": [{"name": "NPS score", "ref": "score", "type": "numerical"}]})
        );
    }

    #[test]
    fn test_nested_learns_from_can_be_assigned() {
        let mut project = project();
        {
            let mut columns = project.columns_mut().unwrap();
            let mut answer = columns.get_mut(0).unwrap();
            answer
                .object_mut("metadata")
                .unwrap()
                .set("learns_from", json!({"project": "pj_0", "ref": "why"}))
                .unwrap();
        }
        assert_eq!(
            JsonValue::Object(project.modified_dict().unwrap().unwrap()),
            json!({"columns": [{
                "ref": "answer",
                "type": "text_to_analyze",
                "metadata": {"learns_from": {"project": "pj_0", "ref": "why"}},
            }]})
        );
    }

    #[test]
    fn test_immutable_project_fields() {
        let mut project = project();
        let err = project.object_mut().set("language", "de").unwrap_err();
        assert_eq!(err, ObjectError::ImmutableField("language".into()));
        assert!(project.save().is_ok());
    }

    #[test]
    fn test_listed_project_ignores_columns() {
        let listed = ListedProject::parse(&project_json()).unwrap();
        assert_eq!(listed.name(), "NPS survey");
        assert!(listed.object().value("columns").is_none());
    }
}
