use caplena::object::{Field, ListOp, ObjectError, Schema, Tracked};
use caplena::Timestamp;
use serde_json::{json, Value as JsonValue};

// =============================================================================
// Fixture types
// =============================================================================

/// Stands in for a real controller; these tests never talk to the network.
#[derive(Debug)]
struct SomeController;

const METADATA: Schema = Schema::new(
    "Metadata",
    &[
        Field::plain("some_other_field"),
        Field::plain("reviewed_count").mutable(),
    ],
);

const NESTED_FIELDS: &[Field] = &[
    Field::plain("ref").mutable(),
    Field::plain("name"),
    Field::plain("type"),
    Field::object("metadata", &METADATA),
];

const SOME_NESTED: Schema = Schema::new("SomeNested", NESTED_FIELDS);

/// Like `SOME_NESTED`, but every diff names the column it belongs to.
const CUSTOMIZED_NESTED: Schema =
    Schema::new("CustomizedNested", NESTED_FIELDS).inject_always(&["ref", "type"]);

const SOME_OBJECT: Schema = Schema::new(
    "SomeObject",
    &[
        Field::plain("name").mutable(),
        Field::plain("tags").mutable(),
        Field::plain("upload_status"),
        Field::list("columns", &SOME_NESTED),
        Field::timestamp("created").mutable(),
        Field::timestamp("last_modified"),
        Field::plain("translation_status").mutable(),
        Field::object("nested", &SOME_NESTED).mutable(),
    ],
)
.identified();

const CUSTOMIZED_OBJECT: Schema = Schema::new(
    "CustomizedObject",
    &[
        Field::plain("name").mutable(),
        Field::plain("tags").mutable(),
        Field::plain("upload_status"),
        Field::list("columns", &CUSTOMIZED_NESTED),
        Field::timestamp("created").mutable(),
        Field::timestamp("last_modified"),
        Field::plain("translation_status").mutable(),
        Field::object("nested", &CUSTOMIZED_NESTED).mutable(),
    ],
)
.identified();

caplena::tracked_type! {
    struct SomeObject for SomeController = SOME_OBJECT {
        name: str mut,
        tags: strings mut,
        upload_status: str,
        columns: list,
        created: timestamp mut,
        last_modified: timestamp,
        translation_status: opt_str mut,
        nested: object mut,
    }
}

caplena::tracked_type! {
    struct CustomizedObject for SomeController = CUSTOMIZED_OBJECT {
        columns: list,
    }
}

fn object_json() -> JsonValue {
    json!({
        "id": "id_object",
        "name": "Hello",
        "tags": ["tag1", "tag2"],
        "upload_status": "pending",
        "columns": [
            {
                "ref": "column_1",
                "name": "Column 1",
                "type": "numerical",
                "metadata": {"some_other_field": 12, "reviewed_count": 42},
            },
            {
                "ref": "column_2",
                "name": "Column 2",
                "type": "date",
                "metadata": {"some_other_field": 400, "reviewed_count": 40000},
            },
        ],
        "created": "2022-03-14T08:18:38.910Z",
        "last_modified": "2021-03-14T08:18:38.905Z",
        "translation_status": null,
        "nested": {
            "ref": "some_ref",
            "name": "nested name",
            "type": "numerical",
            "metadata": {"some_other_field": 12, "reviewed_count": 42},
        },
    })
}

fn build(exists: bool) -> SomeObject {
    SomeObject::build(&object_json(), None, exists, Default::default()).unwrap()
}

fn diff(object: &impl Tracked) -> JsonValue {
    object
        .modified_dict()
        .unwrap()
        .map_or(JsonValue::Null, JsonValue::Object)
}

/// Sets `ref` on the column at `index`.
fn set_column_ref(object: &mut SomeObject, index: usize, value: &str) {
    let mut columns = object.columns_mut().unwrap();
    columns.get_mut(index).unwrap().set("ref", value).unwrap();
}

/// Sets `metadata.reviewed_count` on the column at `index`.
fn set_column_reviewed(object: &mut SomeObject, index: usize, value: i64) {
    let mut columns = object.columns_mut().unwrap();
    let mut column = columns.get_mut(index).unwrap();
    column
        .object_mut("metadata")
        .unwrap()
        .set("reviewed_count", value)
        .unwrap();
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_parsing_objects_succeeds() {
    let object = SomeObject::parse(&object_json()).unwrap();

    assert_eq!(object.object().id(), Some("id_object"));
    assert_eq!(object.name(), "Hello");
    assert_eq!(object.tags(), vec!["tag1", "tag2"]);
    assert_eq!(
        object.created(),
        Some(Timestamp::parse("2022-03-14T08:18:38.910Z").unwrap())
    );
    assert_eq!(object.translation_status(), None);
    assert_eq!(
        object.nested().unwrap().get("ref").unwrap().as_str(),
        Some("some_ref")
    );
    // Detached: nothing has been confirmed by the server yet.
    assert!(object.is_modified());
}

#[test]
fn test_building_existing_object_starts_clean() {
    let object = build(true);
    assert!(!object.is_modified());
    assert_eq!(diff(&object), JsonValue::Null);
    assert_eq!(object.to_json().unwrap()["columns"][1]["ref"], "column_2");
}

#[test]
fn test_snapshot_is_independent_of_copies() {
    let original = build(true);
    let mut copy = original.clone();
    set_column_ref(&mut copy, 0, "column_invalid");

    assert!(copy.is_modified());
    assert!(!original.is_modified());
    assert_eq!(
        original.columns().unwrap()[0].get("ref").unwrap().as_str(),
        Some("column_1")
    );
}

// =============================================================================
// Equality
// =============================================================================

#[test]
fn test_object_equivalence_fails() {
    let first = build(false);

    let mut second = build(false);
    second.set_name("This property differs").unwrap();
    assert_ne!(second, first);

    let mut second = build(false);
    second.nested_mut().unwrap().set("ref", "invalid_ref").unwrap();
    assert_ne!(second, first);

    let mut second = build(false);
    second
        .nested_mut()
        .unwrap()
        .object_mut("metadata")
        .unwrap()
        .set("reviewed_count", 10000)
        .unwrap();
    assert_ne!(second, first);

    let mut second = build(false);
    second.set_tags(vec!["diff"]).unwrap();
    assert_ne!(second, first);

    let mut second = build(false);
    set_column_ref(&mut second, 0, "invalid_ref");
    assert_ne!(second, first);

    let mut second = build(false);
    set_column_reviewed(&mut second, 0, 10000);
    assert_ne!(second, first);
}

#[test]
fn test_object_equivalence_succeeds() {
    let first = build(false);
    let mut second = build(false);
    assert_eq!(first, second);

    second.set_name("Not the same anymore.").unwrap();
    assert_ne!(first, second);
    second.nested_mut().unwrap().set("ref", "still not the same.").unwrap();
    assert_ne!(first, second);
    second.set_name("Hello").unwrap();
    assert_ne!(first, second);
    second.nested_mut().unwrap().set("ref", "some_ref").unwrap();
    assert_eq!(first, second);
}

// =============================================================================
// Mutability
// =============================================================================

#[test]
fn test_modifying_forbidden_fields_fails() {
    let mut first = build(false);

    let err = first.object_mut().set("upload_status", "in_progress").unwrap_err();
    assert!(err.to_string().contains("upload_status"));

    let err = first.nested_mut().unwrap().set("type", "text").unwrap_err();
    assert_eq!(err, ObjectError::ImmutableField("type".into()));

    let err = first
        .nested_mut()
        .unwrap()
        .object_mut("metadata")
        .unwrap()
        .set("some_other_field", 400)
        .unwrap_err();
    assert!(err.to_string().contains("some_other_field"));

    let err = first.object_mut().set("undeclared", 1).unwrap_err();
    assert!(matches!(err, ObjectError::UnknownField { .. }));

    let err = first.object_mut().unset("name").unwrap_err();
    assert_eq!(
        err.to_string(),
        "name. HINT: You cannot delete any attributes."
    );
}

#[test]
fn test_list_shape_cannot_change() {
    let mut first = build(false);
    let existing = first.columns().unwrap()[0].clone();
    let mut columns = first.columns_mut().unwrap();

    let err = columns.push(existing.clone()).unwrap_err();
    assert!(err.to_string().starts_with("Error appending item at index 2"));

    let err = columns.remove(0).unwrap_err();
    assert!(err.to_string().starts_with("Error deleting item"));

    let err = columns.replace(0, existing).unwrap_err();
    assert_eq!(err, ObjectError::ListMutation { op: ListOp::Replace, index: 0 });
    assert!(err.to_string().starts_with("Error setting item"));

    assert_eq!(columns.len(), 2);
}

#[test]
fn test_to_json_refuses_unsaved_changes() {
    let mut first = build(true);
    first.set_name("changed").unwrap();
    assert_eq!(first.to_json().unwrap_err(), ObjectError::ModifiedSnapshot);
    assert_eq!(first.object().render_json()["name"], "changed");
}

// =============================================================================
// Diffs
// =============================================================================

#[test]
fn test_object_modified_dict_succeeds() {
    // Nothing has changed.
    let mut first = build(true);
    assert_eq!(diff(&first), JsonValue::Null);

    // A simple property.
    first.set_name("My New Name").unwrap();
    assert_eq!(diff(&first), json!({"name": "My New Name"}));

    // A plain list is sent whole.
    let mut first = build(true);
    first.set_tags(vec!["tag1", "tag2", "new-tag"]).unwrap();
    assert_eq!(diff(&first), json!({"tags": ["tag1", "tag2", "new-tag"]}));

    // A timestamp.
    let mut first = build(true);
    first.set_created("2020-10-10T00:00:00").unwrap();
    assert_eq!(diff(&first), json!({"created": "2020-10-10T00:00:00.000"}));

    // A simple nested field.
    let mut first = build(true);
    first.nested_mut().unwrap().set("ref", "new_ref").unwrap();
    assert_eq!(diff(&first), json!({"nested": {"ref": "new_ref"}}));
}

#[test]
fn test_many_fields_modified_dict() {
    let mut first = build(true);
    let now = Timestamp::parse("2020-10-10T00:00:00").unwrap();

    first.set_name("new name").unwrap();
    first.set_tags(vec!["new-tags"]).unwrap();
    first.set_created(now).unwrap();
    {
        let mut nested = first.nested_mut().unwrap();
        nested.set("ref", "new_ref").unwrap();
        nested
            .object_mut("metadata")
            .unwrap()
            .set("reviewed_count", 400)
            .unwrap();
    }
    set_column_ref(&mut first, 0, "obj_ref");
    set_column_reviewed(&mut first, 1, 200);

    assert_eq!(
        diff(&first),
        json!({
            "name": "new name",
            "tags": ["new-tags"],
            "created": now.to_rfc3339(),
            "nested": {"ref": "new_ref", "metadata": {"reviewed_count": 400}},
            "columns": [{"ref": "obj_ref"}, {"metadata": {"reviewed_count": 200}}],
        })
    );
}

#[test]
fn test_unchanged_list_elements_are_dropped() {
    let mut first = build(true);
    set_column_ref(&mut first, 0, "obj_ref");
    set_column_reviewed(&mut first, 0, 80000);

    assert_eq!(
        diff(&first),
        json!({"columns": [{"ref": "obj_ref", "metadata": {"reviewed_count": 80000}}]})
    );
}

#[test]
fn test_customizing_modified_dict_succeeds() {
    let build_customized =
        || CustomizedObject::build(&object_json(), None, true, Default::default()).unwrap();

    let first = build_customized();
    assert_eq!(diff(&first), JsonValue::Null);

    let mut first = build_customized();
    {
        let mut columns = first.columns_mut().unwrap();
        let mut column = columns.get_mut(0).unwrap();
        column.set("ref", "obj_ref").unwrap();
        column
            .object_mut("metadata")
            .unwrap()
            .set("reviewed_count", 80000)
            .unwrap();
    }
    assert_eq!(
        diff(&first),
        json!({
            "columns": [
                {"ref": "obj_ref", "type": "numerical", "metadata": {"reviewed_count": 80000}},
                {"ref": "column_2", "type": "date"},
            ]
        })
    );
}
