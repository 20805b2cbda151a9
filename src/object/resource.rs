use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, instrument};

use super::{JsonMap, ObjectError, Schema, TrackedObject};
use crate::error::Result;

/// A typed view over a [`TrackedObject`] with a fixed schema.
///
/// Usually implemented through [`tracked_type!`](crate::tracked_type).
pub trait Tracked: Sized {
    type Controller;

    const SCHEMA: &'static Schema;

    fn from_object(object: TrackedObject<Self::Controller>) -> Self;

    fn object(&self) -> &TrackedObject<Self::Controller>;

    fn object_mut(&mut self) -> &mut TrackedObject<Self::Controller>;

    fn into_object(self) -> TrackedObject<Self::Controller>;

    /// Parses a detached instance.
    fn parse(json: &JsonValue) -> Result<Self, ObjectError> {
        TrackedObject::parse(Self::SCHEMA, json).map(Self::from_object)
    }

    fn build(
        json: &JsonValue,
        controller: Option<Arc<Self::Controller>>,
        exists: bool,
        metadata: BTreeMap<String, String>,
    ) -> Result<Self, ObjectError> {
        TrackedObject::build(Self::SCHEMA, json, controller, exists, metadata).map(Self::from_object)
    }

    fn is_modified(&self) -> bool {
        self.object().is_modified()
    }

    fn modified_dict(&self) -> Result<Option<JsonMap>, ObjectError> {
        self.object().modified_dict()
    }

    fn to_json(&self) -> Result<JsonMap, ObjectError> {
        self.object().to_json()
    }
}

/// A tracked object that lives on the server under an identifier.
///
/// Implementors supply the three remote calls; `remove`, `refresh` and
/// `save` are built on top of them.
pub trait RemoteResource: Tracked {
    fn fetch_remote(&self) -> Result<Self>;

    fn update_remote(&self, changes: JsonMap) -> Result<Self>;

    fn delete_remote(&self) -> Result<()>;

    fn id(&self) -> &str {
        self.object().id().unwrap_or_default()
    }

    /// Deletes the resource on the server.
    #[instrument(skip(self), fields(resource = Self::SCHEMA.name, id = %self.id()))]
    fn remove(&self) -> Result<()> {
        self.delete_remote()
    }

    /// Discards local state in favour of the server's current version.
    #[instrument(skip(self), fields(resource = Self::SCHEMA.name, id = %self.id()))]
    fn refresh(&mut self) -> Result<()> {
        let fresh = self.fetch_remote()?;
        self.object_mut().refresh_from(fresh.into_object());
        Ok(())
    }

    /// Sends the minimal diff, if any, and adopts the server's response.
    #[instrument(skip(self), fields(resource = Self::SCHEMA.name, id = %self.id()))]
    fn save(&mut self) -> Result<()> {
        let Some(changes) = self.modified_dict()? else {
            debug!("Nothing to save");
            return Ok(());
        };
        debug!(fields = changes.len(), "Saving modified fields");
        let updated = self.update_remote(changes)?;
        self.object_mut().refresh_from(updated.into_object());
        Ok(())
    }
}
