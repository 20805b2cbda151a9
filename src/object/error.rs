use std::fmt;

use thiserror::Error;

/// The structural list operations a [`TrackedList`](super::TrackedList) refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOp {
    Append,
    Replace,
    Remove,
}

impl ListOp {
    fn hint(&self) -> &'static str {
        match self {
            ListOp::Append => "You cannot append any items to this list.",
            ListOp::Replace => {
                "You cannot replace any items from this list. If you want to modify an object, \
                 consider updating its properties instead of replacing the object itself."
            }
            ListOp::Remove => "You cannot remove any items from this list.",
        }
    }
}

impl fmt::Display for ListOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ListOp::Append => "Error appending item",
            ListOp::Replace => "Error setting item",
            ListOp::Remove => "Error deleting item",
        })
    }
}

/// Errors raised by change-tracked objects.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ObjectError {
    #[error("{field}. HINT: `{field}` is not a declared field of {object}.")]
    UnknownField { object: &'static str, field: String },

    #[error("{0}. HINT: You cannot modify this attribute, as it is immutable.")]
    ImmutableField(String),

    #[error("{0}. HINT: You cannot delete any attributes.")]
    Deletion(String),

    #[error(
        "Failed computing the version difference, as the previous and new lists have a different length (field `{0}`)."
    )]
    ListLengthMismatch(String),

    #[error(
        "Cannot call `to_json()` on a modified object. HINT: Please call `save()` to propagate your updates to our API servers."
    )]
    ModifiedSnapshot,

    #[error("{op} at index {index}. HINT: {}", .op.hint())]
    ListMutation { op: ListOp, index: usize },

    #[error(
        "Replacing, appending and removing is currently not supported. HINT: To support it, please implement the respective diff logic for tracked lists."
    )]
    UnsupportedListAffordance,

    #[error("{object} is missing the required field `{field}`.")]
    MissingField { object: &'static str, field: String },

    #[error("Invalid value for `{field}` of {object}: {reason}")]
    InvalidField {
        object: &'static str,
        field: String,
        reason: String,
    },

    #[error(
        "You cannot access the non-existing controller for this object. HINT: This object does not have a controller attached. Build it through a controller instead of parsing it."
    )]
    MissingController,

    #[error("{object} is missing the `{key}` metadata entry.")]
    MissingMetadata { object: &'static str, key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_mutation_messages() {
        assert_eq!(
            ObjectError::ListMutation { op: ListOp::Append, index: 2 }.to_string(),
            "Error appending item at index 2. HINT: You cannot append any items to this list."
        );
        assert_eq!(
            ObjectError::ListMutation { op: ListOp::Remove, index: 0 }.to_string(),
            "Error deleting item at index 0. HINT: You cannot remove any items from this list."
        );
        assert!(ObjectError::ListMutation { op: ListOp::Replace, index: 1 }
            .to_string()
            .starts_with("Error setting item at index 1. HINT: You cannot replace any items"));
    }

    #[test]
    fn test_field_messages_name_the_field() {
        assert_eq!(
            ObjectError::ImmutableField("upload_status".into()).to_string(),
            "upload_status. HINT: You cannot modify this attribute, as it is immutable."
        );
        assert_eq!(
            ObjectError::Deletion("name".into()).to_string(),
            "name. HINT: You cannot delete any attributes."
        );
    }
}
