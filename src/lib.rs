//! # Caplena
//!
//! > **A blocking client for the Caplena REST API.**
//!
//! This crate wraps the `/projects` endpoints in typed resources that track
//! their own changes: fetch a project, edit a few fields, call `save()`, and
//! only the edited fields travel back to the server.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Why change tracking?
//!
//! Projects and rows are large nested documents, but most updates touch a
//! handful of values. Every resource remembers the state it last saw on the
//! server and computes the minimal partial update from it:
//! - **Small payloads**: unchanged fields, columns and topics are never sent.
//! - **Safe edits**: immutable fields reject assignment locally, before any request.
//! - **Stable lists**: nested lists keep their shape, so their diffs can be matched by position.
//!
//! ## 🚀 Core Concepts
//!
//! ### Schemas instead of reflection
//! Each resource type is described by a `const` [`Schema`](object::Schema): its
//! field names, which of them are mutable, and how nested objects are
//! dispatched. The [`tracked_type!`] macro turns a schema into a struct with
//! typed getters and setters.
//!
//! ### Lazy pagination
//! List operations return [`Pages`](pagination::Pages), an iterator that fetches
//! the next page only once the current one is used up.
//!
//! ### Mocking: Testing without a network
//! Every request goes through the [`HttpTransport`](http::HttpTransport) trait.
//! Tests queue expected exchanges on a
//! [`MockTransport`](http::mock::MockTransport) instead of talking to the API.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Interface ([`client`], [`projects`])
//! - **Role**: Typed operations and resources for projects and rows.
//! - **Key items**: [`Client`], [`ProjectsController`](projects::ProjectsController),
//!   [`ProjectDetail`](projects::ProjectDetail), [`Row`](projects::Row).
//!
//! ### 2. The Object Model ([`object`], [`pagination`])
//! - **Role**: Change tracking, diffing and lazily paginated results.
//! - **Key items**: [`TrackedObject`](object::TrackedObject),
//!   [`RemoteResource`](object::RemoteResource), [`Pages`](pagination::Pages).
//!
//! ### 3. The Plumbing ([`api`], [`http`], [`helpers`])
//! - **Role**: Filters, ordering, URI building, headers, status checks and retries.
//! - **Key items**: [`Filter`](api::Filter), [`Ordering`](api::Ordering),
//!   [`ApiRequestor`](api::ApiRequestor), [`RetryPolicy`](http::RetryPolicy).
//!
//! ### 4. The Ambient Stack ([`config`], [`error`], [`runtime`])
//! - **Role**: Environment-driven configuration, one error type, tracing setup.
//!
//! ## 🚀 Quick Start
//!
//! ```no_run
//! use caplena::object::RemoteResource;
//! use caplena::projects::{DateFilter, ListProjects, ProjectsFilter};
//! use caplena::{Client, Configuration};
//!
//! # fn main() -> caplena::Result<()> {
//! caplena::runtime::setup_tracing();
//! let client = Client::new(Configuration::from_env()?)?;
//!
//! let recent = ProjectsFilter::created(DateFilter {
//!     year_gte: 2022.into(),
//!     ..Default::default()
//! });
//! let projects = client.projects().list(ListProjects {
//!     filter: Some(recent),
//!     limit: Some(5),
//!     ..Default::default()
//! });
//!
//! for project in projects {
//!     let mut project = client.projects().retrieve(project?.id())?;
//!     project.set_name(format!("{} (reviewed)", project.name()))?;
//!     project.save()?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Running the Demo
//!
//! ```bash
//! CAPLENA_API_KEY=... RUST_LOG=info cargo run --bin list_projects
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod helpers;
pub mod http;
pub mod object;
pub mod pagination;
pub mod projects;
pub mod runtime;
pub mod time;

pub use client::Client;
pub use config::Configuration;
pub use error::{Error, Result};
pub use time::Timestamp;

#[doc(hidden)]
pub use paste;
