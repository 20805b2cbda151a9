//! Change-tracked objects.
//!
//! A [`TrackedObject`] holds the attributes declared by its [`Schema`] next to
//! a snapshot of the last state known to the server. Mutations go through
//! setters that enforce per-field mutability, and
//! [`modified_dict`](TrackedObject::modified_dict) reports the minimal patch
//! needed to bring the server in line.

pub mod error;
pub mod list;
mod macros;
pub mod resource;
pub mod schema;
pub mod tracked;
pub mod value;

pub use error::{ListOp, ObjectError};
pub use list::{ListAffordances, ListMut, TrackedList};
pub use resource::{RemoteResource, Tracked};
pub use schema::{DiffIdentity, Field, FieldKind, Nested, Schema, Variants};
pub use tracked::{JsonMap, ObjectMut, TrackedObject};
pub use value::Value;
