//! Projects and their rows.
//!
//! [`ProjectsController`] issues the HTTP calls. The resources it returns
//! ([`ProjectDetail`], [`ListedProject`], [`Row`]) keep a handle to it, so
//! they can be changed locally and then saved, refreshed or removed.

pub mod controller;
pub mod filter;
pub mod payloads;
pub mod resources;
pub mod rows;

pub use controller::{ProjectsController, PAGE_SIZE, STATUS_CACHE_TTL};
pub use filter::{
    DateFilter, NumericalFilter, OwnerFilter, ProjectsFilter, ProjectsScope, RowsFilter,
    RowsScope, TextFilter, TextToAnalyzeFilter,
};
pub use payloads::{
    ListProjects, ListRows, ProjectCreate, ProjectUpdate, RowsAppend, RowsAppendResult,
    RowsAppendStatus, SubTaskStatus,
};
pub use resources::{ListedProject, ProjectColumn, ProjectDetail, RowOperations};
pub use rows::Row;
