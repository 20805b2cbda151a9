//! Request payloads, list options and plain response objects.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{ProjectsFilter, RowsFilter};
use crate::api::Ordering;

/// Body of `POST /projects`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectCreate {
    pub name: String,
    /// ISO-639-1 base language.
    pub language: String,
    /// Column definitions, e.g. `{"ref": "answer", "name": "Answer", "type": "text_to_analyze"}`.
    pub columns: Vec<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anonymize_pii: Option<JsonValue>,
}

/// Body of `PATCH /projects/{id}`. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<JsonValue>>,
}

/// Options for listing projects.
#[derive(Debug, Clone, PartialEq)]
pub struct ListProjects {
    pub order_by: Ordering,
    /// Maximum number of projects to yield; all of them if unset.
    pub limit: Option<usize>,
    pub filter: Option<ProjectsFilter>,
}

impl Default for ListProjects {
    fn default() -> Self {
        Self {
            order_by: Ordering::descending("last_modified"),
            limit: None,
            filter: None,
        }
    }
}

/// Options for listing the rows of a project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListRows {
    pub limit: Option<usize>,
    pub filter: Option<RowsFilter>,
}

/// Response of a bulk row append.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RowsAppend {
    /// Always `pending` right after queueing.
    pub status: String,
    pub task_id: String,
    pub queued_rows_count: u64,
    pub estimated_minutes: f64,
    pub results: Vec<RowsAppendResult>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RowsAppendResult {
    pub id: String,
}

/// Status of bulk append tasks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RowsAppendStatus {
    /// One of `in_progress`, `succeeded`, `failed` or `timed_out`.
    pub status: String,
    #[serde(default)]
    pub tasks: Option<Vec<SubTaskStatus>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubTaskStatus {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub subtasks: Option<Vec<SubTaskStatus>>,
}
