use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use tracing::trace;

use super::{DiffIdentity, FieldKind, ListMut, Nested, ObjectError, Schema, TrackedList, Value};
use crate::time::Timestamp;

pub type JsonMap = Map<String, JsonValue>;

/// A schema-backed object that remembers the state it was last synchronized
/// with and can report the minimal difference since then.
///
/// Objects built with `exists = true` snapshot their attributes and start out
/// unmodified. Detached objects have an empty snapshot, so every field counts
/// as modified.
pub struct TrackedObject<C> {
    schema: &'static Schema,
    id: Option<String>,
    attrs: BTreeMap<&'static str, Value<C>>,
    previous: BTreeMap<&'static str, Value<C>>,
    metadata: BTreeMap<String, String>,
    controller: Option<Arc<C>>,
}

impl<C> TrackedObject<C> {
    /// Parses a detached object: no controller, no snapshot.
    pub fn parse(schema: &'static Schema, json: &JsonValue) -> Result<Self, ObjectError> {
        let map = json.as_object().ok_or_else(|| ObjectError::InvalidField {
            object: schema.name,
            field: "<root>".to_string(),
            reason: "expected a JSON object".to_string(),
        })?;
        Self::from_map(schema, map)
    }

    /// Parses an object and attaches it to `controller`.
    ///
    /// When `exists` is set the parsed state becomes the snapshot, recursively
    /// for every nested object.
    pub fn build(
        schema: &'static Schema,
        json: &JsonValue,
        controller: Option<Arc<C>>,
        exists: bool,
        metadata: BTreeMap<String, String>,
    ) -> Result<Self, ObjectError> {
        let mut object = Self::parse(schema, json)?;
        object.metadata = metadata;
        object.prepare(controller, exists);
        Ok(object)
    }

    fn from_map(schema: &'static Schema, map: &JsonMap) -> Result<Self, ObjectError> {
        let id = if schema.identified {
            match map.get("id") {
                Some(JsonValue::String(id)) => Some(id.clone()),
                Some(other) => {
                    return Err(ObjectError::InvalidField {
                        object: schema.name,
                        field: "id".to_string(),
                        reason: format!("expected a string, got `{other}`"),
                    })
                }
                None => {
                    return Err(ObjectError::MissingField {
                        object: schema.name,
                        field: "id".to_string(),
                    })
                }
            }
        } else {
            None
        };

        let mut attrs = BTreeMap::new();
        for field in schema.fields {
            let raw = map.get(field.name).ok_or_else(|| ObjectError::MissingField {
                object: schema.name,
                field: field.name.to_string(),
            })?;
            let invalid = |reason: String| ObjectError::InvalidField {
                object: schema.name,
                field: field.name.to_string(),
                reason,
            };
            let value = match (field.kind, raw) {
                (_, JsonValue::Null) => Value::Null,
                (FieldKind::Plain, raw) => Value::from_json(raw),
                (FieldKind::Json, raw) => Value::Json(raw.clone()),
                (FieldKind::Timestamp, JsonValue::String(s)) => {
                    Value::Timestamp(Timestamp::parse(s).map_err(|e| invalid(e.to_string()))?)
                }
                (FieldKind::Object(nested), JsonValue::Object(inner)) => {
                    Value::Object(Box::new(Self::nested_from_map(nested, raw, inner)?))
                }
                (FieldKind::List(nested), JsonValue::Array(items)) => {
                    let items = items
                        .iter()
                        .map(|item| match item {
                            JsonValue::Object(inner) => Self::nested_from_map(nested, item, inner),
                            other => Err(invalid(format!("expected a list of objects, got `{other}`"))),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    Value::List(TrackedList::new(items))
                }
                (kind, other) => return Err(invalid(format!("`{other}` does not fit a {} field", kind.label()))),
            };
            attrs.insert(field.name, value);
        }

        Ok(Self {
            schema,
            id,
            attrs,
            previous: BTreeMap::new(),
            metadata: BTreeMap::new(),
            controller: None,
        })
    }

    fn nested_from_map(nested: Nested, raw: &JsonValue, map: &JsonMap) -> Result<Self, ObjectError> {
        let schema = nested.resolve(raw).map_err(|reason| ObjectError::InvalidField {
            object: "nested object",
            field: "<root>".to_string(),
            reason,
        })?;
        Self::from_map(schema, map)
    }

    fn prepare(&mut self, controller: Option<Arc<C>>, exists: bool) {
        for value in self.attrs.values_mut() {
            value.for_each_object(&mut |nested| nested.prepare(controller.clone(), exists));
        }
        self.controller = controller;
        if exists {
            self.previous = self.attrs.clone();
        }
    }

    // ========================================================================
    // Reading
    // ========================================================================

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Reads a declared field.
    pub fn get(&self, field: &str) -> Result<&Value<C>, ObjectError> {
        self.attrs.get(field).ok_or_else(|| self.unknown(field))
    }

    /// Reads a field, returning `None` for undeclared names.
    pub fn value(&self, field: &str) -> Option<&Value<C>> {
        self.attrs.get(field)
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Result<&str, ObjectError> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ObjectError::MissingMetadata {
                object: self.schema.name,
                key: key.to_string(),
            })
    }

    pub fn controller(&self) -> Result<&Arc<C>, ObjectError> {
        self.controller.as_ref().ok_or(ObjectError::MissingController)
    }

    /// Attaches a controller to this object and every nested object.
    pub fn set_controller(&mut self, controller: Arc<C>) {
        for value in self.attrs.values_mut() {
            value.for_each_object(&mut |nested| nested.set_controller(controller.clone()));
        }
        self.controller = Some(controller);
    }

    fn unknown(&self, field: &str) -> ObjectError {
        ObjectError::UnknownField {
            object: self.schema.name,
            field: field.to_string(),
        }
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Assigns a mutable field.
    ///
    /// JSON objects assigned to object fields are parsed with the nested
    /// schema, and strings assigned to timestamp fields are parsed as RFC3339.
    pub fn set(&mut self, field: &str, value: impl Into<Value<C>>) -> Result<(), ObjectError> {
        let declared = self.schema.field(field).ok_or_else(|| self.unknown(field))?;
        if !declared.mutable {
            return Err(ObjectError::ImmutableField(field.to_string()));
        }
        let mut value = self.coerce(declared.name, declared.kind, value.into())?;
        if let Some(controller) = &self.controller {
            value.for_each_object(&mut |nested| nested.set_controller(controller.clone()));
        }
        trace!(object = self.schema.name, field, "Assigned tracked field");
        self.attrs.insert(declared.name, value);
        Ok(())
    }

    /// Attributes can never be removed.
    pub fn unset(&mut self, field: &str) -> Result<(), ObjectError> {
        Err(ObjectError::Deletion(field.to_string()))
    }

    fn coerce(&self, field: &str, kind: FieldKind, value: Value<C>) -> Result<Value<C>, ObjectError> {
        let invalid = |reason: String| ObjectError::InvalidField {
            object: self.schema.name,
            field: field.to_string(),
            reason,
        };
        match (kind, value) {
            (_, Value::Null) => Ok(Value::Null),
            (FieldKind::Timestamp, Value::Str(s)) => Timestamp::parse(&s)
                .map(Value::Timestamp)
                .map_err(|e| invalid(e.to_string())),
            (FieldKind::Timestamp, value @ Value::Timestamp(_)) => Ok(value),
            (FieldKind::Object(nested), Value::Json(json)) => match &json {
                JsonValue::Object(map) => Self::nested_from_map(nested, &json, map)
                    .map(|object| Value::Object(Box::new(object))),
                other => Err(invalid(format!("expected an object, got `{other}`"))),
            },
            (FieldKind::Object(_), value @ Value::Object(_)) => Ok(value),
            (FieldKind::List(_), value @ Value::List(_)) => Ok(value),
            (FieldKind::Timestamp | FieldKind::Object(_) | FieldKind::List(_), other) => {
                Err(invalid(format!("{other:?} does not fit a {} field", kind.label())))
            }
            (FieldKind::Plain | FieldKind::Json, value) => Ok(value),
        }
    }

    /// Mutable access to a nested object. Its own fields keep their own
    /// mutability rules, whether or not `field` itself is mutable.
    pub fn object_mut(&mut self, field: &str) -> Result<ObjectMut<'_, C>, ObjectError> {
        let schema = self.schema;
        match self.attrs.get_mut(field) {
            Some(Value::Object(object)) => Ok(ObjectMut::new(object)),
            Some(_) => Err(ObjectError::InvalidField {
                object: schema.name,
                field: field.to_string(),
                reason: "not a nested object".to_string(),
            }),
            None => Err(ObjectError::UnknownField {
                object: schema.name,
                field: field.to_string(),
            }),
        }
    }

    /// Mutable access to a nested list, limited to its elements.
    pub fn list_mut(&mut self, field: &str) -> Result<ListMut<'_, C>, ObjectError> {
        let schema = self.schema;
        match self.attrs.get_mut(field) {
            Some(Value::List(list)) => Ok(ListMut::new(list)),
            Some(_) => Err(ObjectError::InvalidField {
                object: schema.name,
                field: field.to_string(),
                reason: "not a list of objects".to_string(),
            }),
            None => Err(ObjectError::UnknownField {
                object: schema.name,
                field: field.to_string(),
            }),
        }
    }

    // ========================================================================
    // Change tracking
    // ========================================================================

    pub fn is_modified(&self) -> bool {
        self.attrs != self.previous
    }

    /// Renders the object as JSON, including `id` for identified objects.
    ///
    /// Fails with [`ObjectError::ModifiedSnapshot`] while this object or any
    /// nested one has unsaved changes.
    pub fn to_json(&self) -> Result<JsonMap, ObjectError> {
        if self.is_modified() {
            return Err(ObjectError::ModifiedSnapshot);
        }
        let mut out = JsonMap::new();
        for (name, value) in &self.attrs {
            out.insert((*name).to_string(), value.to_json()?);
        }
        if let Some(id) = &self.id {
            out.insert("id".to_string(), JsonValue::String(id.clone()));
        }
        Ok(out)
    }

    /// Renders the current state regardless of pending changes.
    pub fn render_json(&self) -> JsonMap {
        let mut out: JsonMap = self
            .attrs
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.render()))
            .collect();
        if let Some(id) = &self.id {
            out.insert("id".to_string(), JsonValue::String(id.clone()));
        }
        out
    }

    /// The minimal JSON patch between the snapshot and the current state.
    ///
    /// Returns `None` when nothing changed. Nested objects contribute their own
    /// minimal diff; lists are diffed element by element and skip unchanged
    /// elements.
    pub fn modified_dict(&self) -> Result<Option<JsonMap>, ObjectError> {
        let mut diff = JsonMap::new();
        for field in self.schema.fields {
            let Some(current) = self.attrs.get(field.name) else {
                continue;
            };
            let previous = self.previous.get(field.name);
            if previous == Some(current) {
                continue;
            }
            if let Some(rendered) = Self::modified_value(field.name, previous, current)? {
                diff.insert(field.name.to_string(), rendered);
            }
        }

        let inject = match self.schema.diff_identity {
            DiffIdentity::None => &[][..],
            DiffIdentity::WhenModified(keys) if !diff.is_empty() => keys,
            DiffIdentity::WhenModified(_) => &[][..],
            DiffIdentity::Always(keys) => keys,
        };
        for key in inject {
            if let Some(value) = self.attrs.get(key) {
                diff.insert((*key).to_string(), value.render());
            }
        }

        Ok((!diff.is_empty()).then_some(diff))
    }

    fn modified_value(
        field: &str,
        previous: Option<&Value<C>>,
        current: &Value<C>,
    ) -> Result<Option<JsonValue>, ObjectError> {
        match current {
            Value::Object(object) => Ok(object.modified_dict()?.map(JsonValue::Object)),
            Value::List(list) => {
                if let Some(Value::List(before)) = previous {
                    if before.len() != list.len() {
                        return Err(ObjectError::ListLengthMismatch(field.to_string()));
                    }
                }
                let mut items = Vec::with_capacity(list.len());
                for item in list {
                    if let Some(diff) = item.modified_dict()? {
                        items.push(JsonValue::Object(diff));
                    }
                }
                Ok(Some(JsonValue::Array(items)))
            }
            other => Ok(Some(other.render())),
        }
    }

    /// Adopts the state of a freshly fetched copy and marks it synchronized.
    pub fn refresh_from(&mut self, fresh: TrackedObject<C>) {
        if fresh.id.is_some() {
            self.id = fresh.id;
        }
        self.attrs = fresh.attrs;
        let controller = self.controller.take();
        self.prepare(controller, true);
    }
}

impl<C> Clone for TrackedObject<C> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema,
            id: self.id.clone(),
            attrs: self.attrs.clone(),
            previous: self.previous.clone(),
            metadata: self.metadata.clone(),
            controller: self.controller.clone(),
        }
    }
}

/// Two objects are equal when they share a schema and hold equal attributes.
/// Snapshots, identifiers, metadata and controllers are ignored.
impl<C> PartialEq for TrackedObject<C> {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name == other.schema.name && self.attrs == other.attrs
    }
}

impl<C> fmt::Debug for TrackedObject<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.schema.name);
        if let Some(id) = &self.id {
            out.field("id", id);
        }
        for (name, value) in &self.attrs {
            out.field(name, value);
        }
        out.finish()
    }
}

// ============================================================================
// Mutable handle
// ============================================================================

/// Mutable access to a nested object that cannot replace it wholesale.
pub struct ObjectMut<'a, C> {
    object: &'a mut TrackedObject<C>,
}

impl<'a, C> ObjectMut<'a, C> {
    pub(crate) fn new(object: &'a mut TrackedObject<C>) -> Self {
        Self { object }
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value<C>>) -> Result<(), ObjectError> {
        self.object.set(field, value)
    }

    pub fn unset(&mut self, field: &str) -> Result<(), ObjectError> {
        self.object.unset(field)
    }

    pub fn object_mut(&mut self, field: &str) -> Result<ObjectMut<'_, C>, ObjectError> {
        self.object.object_mut(field)
    }

    pub fn list_mut(&mut self, field: &str) -> Result<ListMut<'_, C>, ObjectError> {
        self.object.list_mut(field)
    }
}

impl<C> Deref for ObjectMut<'_, C> {
    type Target = TrackedObject<C>;

    fn deref(&self) -> &Self::Target {
        self.object
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Field;
    use serde_json::json;

    const INNER: Schema = Schema::new(
        "Inner",
        &[Field::plain("ref").mutable(), Field::plain("label")],
    )
    .inject_when_modified(&["label"]);

    const OUTER: Schema = Schema::new(
        "Outer",
        &[
            Field::plain("name").mutable(),
            Field::timestamp("created").mutable(),
            Field::object("inner", &INNER),
            Field::list("items", &INNER),
            Field::plain("status"),
        ],
    )
    .identified();

    fn payload() -> JsonValue {
        json!({
            "id": "obj_1",
            "name": "Hello",
            "created": "2022-03-14T08:18:38.910Z",
            "inner": {"ref": "a", "label": "A"},
            "items": [{"ref": "b", "label": "B"}, {"ref": "c", "label": "C"}],
            "status": "pending",
        })
    }

    fn existing() -> TrackedObject<()> {
        TrackedObject::build(&OUTER, &payload(), None, true, BTreeMap::new()).unwrap()
    }

    #[test]
    fn test_existing_object_starts_clean() {
        let object = existing();
        assert!(!object.is_modified());
        assert_eq!(object.modified_dict().unwrap(), None);
        assert_eq!(object.id(), Some("obj_1"));
        assert_eq!(
            JsonValue::Object(object.to_json().unwrap()),
            payload()
        );
    }

    #[test]
    fn test_detached_object_diff_is_everything() {
        let object = TrackedObject::<()>::parse(&OUTER, &payload()).unwrap();
        assert!(object.is_modified());
        assert_eq!(object.to_json().unwrap_err(), ObjectError::ModifiedSnapshot);

        let diff = JsonValue::Object(object.modified_dict().unwrap().unwrap());
        assert_eq!(diff["name"], json!("Hello"));
        assert_eq!(diff["inner"], json!({"ref": "a", "label": "A"}));
        assert_eq!(diff["items"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_fields_and_ids_are_rejected() {
        let err = TrackedObject::<()>::parse(&OUTER, &json!({"id": "x"})).unwrap_err();
        assert!(matches!(err, ObjectError::MissingField { field, .. } if field == "name"));

        let mut payload = payload();
        payload.as_object_mut().unwrap().remove("id");
        let err = TrackedObject::<()>::parse(&OUTER, &payload).unwrap_err();
        assert!(matches!(err, ObjectError::MissingField { field, .. } if field == "id"));
    }

    #[test]
    fn test_set_respects_declared_mutability() {
        let mut object = existing();
        assert_eq!(
            object.set("status", "done").unwrap_err(),
            ObjectError::ImmutableField("status".into())
        );
        assert!(matches!(
            object.set("bogus", 1).unwrap_err(),
            ObjectError::UnknownField { .. }
        ));
        assert_eq!(
            object.unset("name").unwrap_err(),
            ObjectError::Deletion("name".into())
        );
        assert!(!object.is_modified());
    }

    #[test]
    fn test_timestamp_strings_are_parsed_on_assignment() {
        let mut object = existing();
        object.set("created", "2023-01-01T00:00:00.000Z").unwrap();
        assert_eq!(
            object.modified_dict().unwrap().unwrap()["created"],
            json!("2023-01-01T00:00:00.000Z")
        );
        assert!(matches!(
            object.set("created", "tomorrow").unwrap_err(),
            ObjectError::InvalidField { .. }
        ));
    }

    #[test]
    fn test_nested_changes_produce_nested_diffs() {
        let mut object = existing();
        object.object_mut("inner").unwrap().set("ref", "z").unwrap();
        object
            .list_mut("items")
            .unwrap()
            .get_mut(1)
            .unwrap()
            .set("ref", "y")
            .unwrap();

        assert_eq!(
            JsonValue::Object(object.modified_dict().unwrap().unwrap()),
            json!({
                "inner": {"ref": "z", "label": "A"},
                "items": [{"ref": "y", "label": "C"}],
            })
        );
        assert_eq!(
            object
                .object_mut("inner")
                .unwrap()
                .set("label", "nope")
                .unwrap_err(),
            ObjectError::ImmutableField("label".into())
        );
    }

    #[test]
    fn test_resized_list_cannot_be_diffed() {
        const RESIZABLE: Schema =
            Schema::new("Resizable", &[Field::list("items", &INNER).mutable()]);

        let payload = json!({"items": [{"ref": "b", "label": "B"}]});
        let mut object =
            TrackedObject::<()>::build(&RESIZABLE, &payload, None, true, BTreeMap::new()).unwrap();
        let item = object.get("items").unwrap().as_list().unwrap()[0].clone();

        object
            .set("items", TrackedList::new(vec![item.clone(), item]))
            .unwrap();
        assert_eq!(
            object.modified_dict().unwrap_err(),
            ObjectError::ListLengthMismatch("items".into())
        );
    }

    #[test]
    fn test_restoring_values_clears_modification() {
        let mut object = existing();
        let original = object.clone();
        object.set("name", "Other").unwrap();
        assert_ne!(object, original);
        object.set("name", "Hello").unwrap();
        assert_eq!(object, original);
        assert!(!object.is_modified());
    }

    #[test]
    fn test_refresh_adopts_state_and_snapshots() {
        let mut object = existing();
        object.set("name", "Local").unwrap();

        let mut fresh = payload();
        fresh["name"] = json!("Remote");
        let fresh = TrackedObject::parse(&OUTER, &fresh).unwrap();
        object.refresh_from(fresh);

        assert!(!object.is_modified());
        assert_eq!(object.get("name").unwrap().as_str(), Some("Remote"));
    }

    #[test]
    fn test_controller_and_metadata_lookups() {
        let object = existing();
        assert_eq!(object.controller().unwrap_err(), ObjectError::MissingController);
        assert!(matches!(
            object.metadata_value("project"),
            Err(ObjectError::MissingMetadata { .. })
        ));

        let attached = TrackedObject::build(
            &OUTER,
            &payload(),
            Some(Arc::new(7u8)),
            true,
            BTreeMap::from([("project".to_string(), "p1".to_string())]),
        )
        .unwrap();
        assert_eq!(**attached.controller().unwrap(), 7);
        assert_eq!(attached.metadata_value("project").unwrap(), "p1");
        let inner = attached.get("inner").unwrap().as_object().unwrap();
        assert_eq!(**inner.controller().unwrap(), 7);
    }
}
