use std::fmt;

use chrono::{DateTime, TimeZone};
use serde_json::{Map, Number, Value as JsonValue};

use super::{ObjectError, TrackedList, TrackedObject};
use crate::time::Timestamp;

/// A single attribute value of a [`TrackedObject`].
///
/// Nested objects and lists of objects are themselves tracked; everything
/// else is a plain value compared by equality.
pub enum Value<C> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Timestamp(Timestamp),
    Array(Vec<Value<C>>),
    /// A JSON object without a declared schema, kept verbatim.
    Json(JsonValue),
    Object(Box<TrackedObject<C>>),
    List(TrackedList<C>),
}

impl<C> Value<C> {
    /// Converts plain JSON. Objects become [`Value::Json`].
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            JsonValue::String(s) => Value::Str(s.clone()),
            JsonValue::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(_) => Value::Json(json.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value<C>]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            Value::Json(json) => Some(json),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&TrackedObject<C>> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&TrackedList<C>> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Renders the value as JSON without checking for pending changes.
    pub fn render(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::from(*i),
            Value::Float(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::Timestamp(ts) => JsonValue::String(ts.to_rfc3339()),
            Value::Array(items) => JsonValue::Array(items.iter().map(Value::render).collect()),
            Value::Json(json) => json.clone(),
            Value::Object(object) => JsonValue::Object(object.render_json()),
            Value::List(list) => JsonValue::Array(
                list.iter()
                    .map(|item| JsonValue::Object(item.render_json()))
                    .collect(),
            ),
        }
    }

    /// Renders the value, failing if any nested object has pending changes.
    pub(crate) fn to_json(&self) -> Result<JsonValue, ObjectError> {
        match self {
            Value::Object(object) => object.to_json().map(JsonValue::Object),
            Value::List(list) => list
                .iter()
                .map(|item| item.to_json().map(JsonValue::Object))
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array),
            other => Ok(other.render()),
        }
    }

    pub(crate) fn for_each_object(&mut self, f: &mut dyn FnMut(&mut TrackedObject<C>)) {
        match self {
            Value::Object(object) => f(object),
            Value::List(list) => list.items_mut().iter_mut().for_each(|item| f(item)),
            _ => {}
        }
    }
}

impl<C> Clone for Value<C> {
    fn clone(&self) -> Self {
        match self {
            Value::Null => Value::Null,
            Value::Bool(b) => Value::Bool(*b),
            Value::Int(i) => Value::Int(*i),
            Value::Float(f) => Value::Float(*f),
            Value::Str(s) => Value::Str(s.clone()),
            Value::Timestamp(ts) => Value::Timestamp(*ts),
            Value::Array(items) => Value::Array(items.clone()),
            Value::Json(json) => Value::Json(json.clone()),
            Value::Object(object) => Value::Object(object.clone()),
            Value::List(list) => Value::List(list.clone()),
        }
    }
}

impl<C> PartialEq for Value<C> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

impl<C> fmt::Debug for Value<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Timestamp(ts) => write!(f, "Timestamp({ts})"),
            Value::Array(items) => f.debug_list().entries(items).finish(),
            Value::Json(json) => write!(f, "Json({json})"),
            Value::Object(object) => object.fmt(f),
            Value::List(list) => list.fmt(f),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl<C> From<$ty> for Value<C> {
                fn from($v: $ty) -> Self {
                    $body
                }
            }
        )*
    };
}

value_from! {
    &str => |v| Value::Str(v.to_string()),
    String => |v| Value::Str(v),
    bool => |v| Value::Bool(v),
    i64 => |v| Value::Int(v),
    i32 => |v| Value::Int(i64::from(v)),
    u32 => |v| Value::Int(i64::from(v)),
    f64 => |v| Value::Float(v),
    Timestamp => |v| Value::Timestamp(v),
    JsonValue => |v| Value::from_json(&v),
    TrackedObject<C> => |v| Value::Object(Box::new(v)),
    TrackedList<C> => |v| Value::List(v),
}

impl<C, Tz: TimeZone> From<DateTime<Tz>> for Value<C> {
    fn from(datetime: DateTime<Tz>) -> Self {
        Value::Timestamp(Timestamp::from_datetime(datetime))
    }
}

impl<C, T: Into<Value<C>>> From<Vec<T>> for Value<C> {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<C, T: Into<Value<C>>> From<Option<T>> for Value<C> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<C> From<Map<String, JsonValue>> for Value<C> {
    fn from(map: Map<String, JsonValue>) -> Self {
        Value::Json(JsonValue::Object(map))
    }
}
