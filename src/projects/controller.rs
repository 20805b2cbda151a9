//! HTTP operations on projects and their rows.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde_json::{json, Value as JsonValue};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    ListProjects, ListRows, ListedProject, ProjectCreate, ProjectDetail, ProjectUpdate, Row,
    RowsAppend, RowsAppendStatus,
};
use crate::api::{ApiError, ApiRequestor};
use crate::cache::{Clock, SystemClock, TtlCache};
use crate::error::{Error, Result};
use crate::object::{JsonMap, Tracked};
use crate::pagination::{Page, Pages};

/// Results requested per page from list endpoints.
pub const PAGE_SIZE: u32 = 10;

/// How long append statuses are served from the cache.
pub const STATUS_CACHE_TTL: Duration = Duration::from_secs(10);

const PROJECT: &str = "project";

type StatusKey = (String, Option<String>);

/// Entry point for everything under `/projects`.
///
/// Always handed out as an `Arc`: the resources it builds keep a reference
/// to it so they can save, refresh and remove themselves.
pub struct ProjectsController {
    requestor: Arc<ApiRequestor>,
    me: Weak<ProjectsController>,
    status_cache: Mutex<TtlCache<StatusKey, RowsAppendStatus>>,
}

impl ProjectsController {
    pub fn new(requestor: Arc<ApiRequestor>) -> Arc<Self> {
        Self::with_cache_clock(requestor, Arc::new(SystemClock))
    }

    /// Like [`new`](Self::new), with the append status cache driven by `clock`.
    pub fn with_cache_clock(requestor: Arc<ApiRequestor>, clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            requestor,
            me: me.clone(),
            status_cache: Mutex::new(TtlCache::with_clock(STATUS_CACHE_TTL, clock)),
        })
    }

    pub fn requestor(&self) -> &ApiRequestor {
        &self.requestor
    }

    /// Builds a detached resource bound to this controller.
    ///
    /// The resource has no snapshot, so every field counts as modified.
    pub fn build<R>(&self, json: &JsonValue) -> Result<R>
    where
        R: Tracked<Controller = Self>,
    {
        Ok(R::build(json, self.me.upgrade(), false, BTreeMap::new())?)
    }

    // ========================================================================
    // Projects
    // ========================================================================

    #[instrument(skip(self, payload), fields(name = %payload.name))]
    pub fn create(&self, payload: ProjectCreate) -> Result<ProjectDetail> {
        let body = self
            .requestor
            .post("/projects")
            .json(serde_json::to_value(&payload)?)
            .send_json()?;
        self.build_response(&body, BTreeMap::new())
    }

    #[instrument(skip(self))]
    pub fn retrieve(&self, id: &str) -> Result<ProjectDetail> {
        self.retrieve_as(id)
    }

    #[instrument(skip(self))]
    pub fn remove(&self, id: &str) -> Result<()> {
        self.requestor
            .delete("/projects/{id}")
            .path_param("id", id)
            .send()?;
        Ok(())
    }

    /// Lists projects, most recently modified first unless ordered otherwise.
    #[instrument(skip(self))]
    pub fn list(&self, options: ListProjects) -> Pages<ListedProject> {
        let requestor = Arc::clone(&self.requestor);
        let me = self.me.clone();
        let ListProjects {
            order_by,
            limit,
            filter,
        } = options;

        Pages::new(
            move |page| {
                let body = requestor
                    .get("/projects")
                    .filter(filter.as_ref())
                    .order_by(Some(&order_by))
                    .query("page", page)
                    .query("limit", PAGE_SIZE)
                    .send_json()?;
                build_page(&body, me.upgrade(), &BTreeMap::new())
            },
            limit,
        )
    }

    #[instrument(skip(self, payload))]
    pub fn update(&self, id: &str, payload: ProjectUpdate) -> Result<ProjectDetail> {
        let changes = match serde_json::to_value(&payload)? {
            JsonValue::Object(map) => map,
            _ => JsonMap::new(),
        };
        self.update_as(id, changes)
    }

    pub(crate) fn retrieve_as<R>(&self, id: &str) -> Result<R>
    where
        R: Tracked<Controller = Self>,
    {
        let body = self
            .requestor
            .get("/projects/{id}")
            .path_param("id", id)
            .send_json()?;
        self.build_response(&body, BTreeMap::new())
    }

    pub(crate) fn update_as<R>(&self, id: &str, changes: JsonMap) -> Result<R>
    where
        R: Tracked<Controller = Self>,
    {
        let body = self
            .requestor
            .patch("/projects/{id}")
            .path_param("id", id)
            .json(JsonValue::Object(changes))
            .send_json()?;
        self.build_response(&body, BTreeMap::new())
    }

    // ========================================================================
    // Rows
    // ========================================================================

    /// Queues rows for a bulk append; the server answers `202 Accepted`.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub fn append_rows(&self, id: &str, rows: Vec<JsonValue>) -> Result<RowsAppend> {
        let body = self
            .requestor
            .post("/projects/{id}/rows/bulk")
            .path_param("id", id)
            .json(JsonValue::Array(rows))
            .allow(&[202])
            .send_json()?;
        Ok(serde_json::from_value(body)?)
    }

    /// Status of one bulk append task, or of all recent tasks of a project.
    ///
    /// Answers are cached for [`STATUS_CACHE_TTL`] per project and task. A
    /// blank task id asks for all tasks, like `None`.
    #[instrument(skip(self))]
    pub fn get_append_status(
        &self,
        project_id: &str,
        task_id: Option<&str>,
    ) -> Result<RowsAppendStatus> {
        let task_id = task_id
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                Uuid::parse_str(raw.trim())
                    .map(|uuid| uuid.to_string())
                    .map_err(|_| {
                        Error::InvalidArgument("task_id must be UUID or uuid in a string".into())
                    })
            })
            .transpose()?;

        let key = (project_id.to_string(), task_id.clone());
        if let Some(status) = self.cache().get(&key) {
            debug!("Serving append status from cache");
            return Ok(status);
        }

        let call = match &task_id {
            Some(task_id) => self
                .requestor
                .get("/projects/{project_id}/rows/bulk/{task_id}")
                .path_param("task_id", task_id.as_str()),
            None => self.requestor.get("/projects/{project_id}/rows/bulk"),
        };
        let body = call.path_param("project_id", project_id).send_json()?;
        let status: RowsAppendStatus = serde_json::from_value(body)?;

        self.cache().insert(key, status.clone());
        Ok(status)
    }

    #[instrument(skip(self, columns))]
    pub fn append_row(&self, id: &str, columns: Vec<JsonValue>) -> Result<Row> {
        let body = self
            .requestor
            .post("/projects/{id}/rows")
            .path_param("id", id)
            .json(json!({ "columns": columns }))
            .send_json()?;
        self.build_response(&body, project_metadata(id))
    }

    /// Lists the rows of a project, oldest first.
    #[instrument(skip(self))]
    pub fn list_rows(&self, id: &str, options: ListRows) -> Pages<Row> {
        let requestor = Arc::clone(&self.requestor);
        let me = self.me.clone();
        let id = id.to_string();
        let ListRows { limit, filter } = options;

        Pages::new(
            move |page| {
                let body = requestor
                    .get("/projects/{id}/rows")
                    .path_param("id", id.as_str())
                    .filter(filter.as_ref())
                    .query("page", page)
                    .query("limit", PAGE_SIZE)
                    .send_json()?;
                build_page(&body, me.upgrade(), &project_metadata(&id))
            },
            limit,
        )
    }

    #[instrument(skip(self))]
    pub fn retrieve_row(&self, p_id: &str, r_id: &str) -> Result<Row> {
        let body = self
            .requestor
            .get("/projects/{p_id}/rows/{r_id}")
            .path_param("p_id", p_id)
            .path_param("r_id", r_id)
            .send_json()?;
        self.build_response(&body, project_metadata(p_id))
    }

    #[instrument(skip(self))]
    pub fn remove_row(&self, p_id: &str, r_id: &str) -> Result<()> {
        self.requestor
            .delete("/projects/{p_id}/rows/{r_id}")
            .path_param("p_id", p_id)
            .path_param("r_id", r_id)
            .send()?;
        Ok(())
    }

    #[instrument(skip(self, columns))]
    pub fn update_row(&self, p_id: &str, r_id: &str, columns: Vec<JsonValue>) -> Result<Row> {
        let mut changes = JsonMap::new();
        changes.insert("columns".to_string(), JsonValue::Array(columns));
        self.update_row_raw(p_id, r_id, changes)
    }

    pub(crate) fn update_row_raw(&self, p_id: &str, r_id: &str, changes: JsonMap) -> Result<Row> {
        let body = self
            .requestor
            .patch("/projects/{p_id}/rows/{r_id}")
            .path_param("p_id", p_id)
            .path_param("r_id", r_id)
            .json(JsonValue::Object(changes))
            .send_json()?;
        self.build_response(&body, project_metadata(p_id))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn build_response<R>(&self, body: &JsonValue, metadata: BTreeMap<String, String>) -> Result<R>
    where
        R: Tracked<Controller = Self>,
    {
        Ok(R::build(body, self.me.upgrade(), true, metadata)?)
    }

    fn cache(&self) -> MutexGuard<'_, TtlCache<StatusKey, RowsAppendStatus>> {
        self.status_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn project_metadata(id: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(PROJECT.to_string(), id.to_string())])
}

/// Decodes a `{results, next_url, count}` list envelope.
fn build_page<R>(
    body: &JsonValue,
    controller: Option<Arc<ProjectsController>>,
    metadata: &BTreeMap<String, String>,
) -> Result<Page<R>>
where
    R: Tracked<Controller = ProjectsController>,
{
    let (Some(results), Some(count)) = (body["results"].as_array(), body["count"].as_u64()) else {
        return Err(ApiError::invalid_format().into());
    };
    let results = results
        .iter()
        .map(|item| R::build(item, controller.clone(), true, metadata.clone()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page {
        results,
        has_next: !body["next_url"].is_null(),
        count,
    })
}

impl fmt::Debug for ProjectsController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectsController")
            .field("base_uri", &self.requestor.config().api_base_uri.url())
            .finish_non_exhaustive()
    }
}
