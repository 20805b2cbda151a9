/// Declares a typed wrapper around a [`TrackedObject`](crate::object::TrackedObject).
///
/// Every listed field gets a getter; fields marked `mut` also get a
/// `set_<field>` method. `object` and `list` fields additionally get a
/// `<field>_mut` accessor returning a restricted mutable handle.
///
/// ```
/// use caplena::object::{Field, Schema, Tracked};
/// use serde_json::json;
///
/// const NOTE: Schema = Schema::new(
///     "Note",
///     &[Field::plain("title").mutable(), Field::plain("words")],
/// )
/// .identified();
///
/// caplena::tracked_type! {
///     /// A note.
///     pub struct Note for () = NOTE {
///         title: str mut,
///         words: int,
///     }
/// }
///
/// let mut note = Note::build(
///     &json!({"id": "n1", "title": "Draft", "words": 12}),
///     None,
///     true,
///     Default::default(),
/// )
/// .unwrap();
/// note.set_title("Final").unwrap();
/// assert_eq!(note.title(), "Final");
/// assert_eq!(note.words(), Some(12));
/// assert_eq!(note.modified_dict().unwrap().unwrap()["title"], "Final");
/// ```
#[macro_export]
macro_rules! tracked_type {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident for $controller:ty = $schema:path {
            $( $(#[$fmeta:meta])* $field:ident : $kind:ident $($access:ident)? ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq)]
        $vis struct $name {
            object: $crate::object::TrackedObject<$controller>,
        }

        impl $crate::object::Tracked for $name {
            type Controller = $controller;

            const SCHEMA: &'static $crate::object::Schema = &$schema;

            fn from_object(object: $crate::object::TrackedObject<$controller>) -> Self {
                Self { object }
            }

            fn object(&self) -> &$crate::object::TrackedObject<$controller> {
                &self.object
            }

            fn object_mut(&mut self) -> &mut $crate::object::TrackedObject<$controller> {
                &mut self.object
            }

            fn into_object(self) -> $crate::object::TrackedObject<$controller> {
                self.object
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Debug::fmt(&self.object, f)
            }
        }

        impl $name {
            $(
                $crate::tracked_type!(@get $controller; $(#[$fmeta])* $field $kind);
                $crate::tracked_type!(@set $controller; $field $($access)?);
            )*
        }
    };

    (@get $c:ty; $(#[$m:meta])* $field:ident str) => {
        $(#[$m])*
        pub fn $field(&self) -> &str {
            self.object
                .value(stringify!($field))
                .and_then($crate::object::Value::as_str)
                .unwrap_or_default()
        }
    };
    (@get $c:ty; $(#[$m:meta])* $field:ident opt_str) => {
        $(#[$m])*
        pub fn $field(&self) -> Option<&str> {
            self.object.value(stringify!($field)).and_then($crate::object::Value::as_str)
        }
    };
    (@get $c:ty; $(#[$m:meta])* $field:ident int) => {
        $(#[$m])*
        pub fn $field(&self) -> Option<i64> {
            self.object.value(stringify!($field)).and_then($crate::object::Value::as_i64)
        }
    };
    (@get $c:ty; $(#[$m:meta])* $field:ident float) => {
        $(#[$m])*
        pub fn $field(&self) -> Option<f64> {
            self.object.value(stringify!($field)).and_then($crate::object::Value::as_f64)
        }
    };
    (@get $c:ty; $(#[$m:meta])* $field:ident bool) => {
        $(#[$m])*
        pub fn $field(&self) -> Option<bool> {
            self.object.value(stringify!($field)).and_then($crate::object::Value::as_bool)
        }
    };
    (@get $c:ty; $(#[$m:meta])* $field:ident timestamp) => {
        $(#[$m])*
        pub fn $field(&self) -> Option<$crate::Timestamp> {
            self.object.value(stringify!($field)).and_then($crate::object::Value::as_timestamp)
        }
    };
    (@get $c:ty; $(#[$m:meta])* $field:ident strings) => {
        $(#[$m])*
        pub fn $field(&self) -> Vec<&str> {
            self.object
                .value(stringify!($field))
                .and_then($crate::object::Value::as_array)
                .map(|items| items.iter().filter_map($crate::object::Value::as_str).collect())
                .unwrap_or_default()
        }
    };
    (@get $c:ty; $(#[$m:meta])* $field:ident json) => {
        $(#[$m])*
        pub fn $field(&self) -> Option<&::serde_json::Value> {
            self.object.value(stringify!($field)).and_then($crate::object::Value::as_json)
        }
    };
    (@get $c:ty; $(#[$m:meta])* $field:ident object) => {
        $(#[$m])*
        pub fn $field(&self) -> Option<&$crate::object::TrackedObject<$c>> {
            self.object.value(stringify!($field)).and_then($crate::object::Value::as_object)
        }

        $crate::paste::paste! {
            pub fn [<$field _mut>](
                &mut self,
            ) -> ::std::result::Result<$crate::object::ObjectMut<'_, $c>, $crate::object::ObjectError> {
                self.object.object_mut(stringify!($field))
            }
        }
    };
    (@get $c:ty; $(#[$m:meta])* $field:ident list) => {
        $(#[$m])*
        pub fn $field(&self) -> Option<&$crate::object::TrackedList<$c>> {
            self.object.value(stringify!($field)).and_then($crate::object::Value::as_list)
        }

        $crate::paste::paste! {
            pub fn [<$field _mut>](
                &mut self,
            ) -> ::std::result::Result<$crate::object::ListMut<'_, $c>, $crate::object::ObjectError> {
                self.object.list_mut(stringify!($field))
            }
        }
    };

    (@set $c:ty; $field:ident mut) => {
        $crate::paste::paste! {
            pub fn [<set_ $field>](
                &mut self,
                value: impl Into<$crate::object::Value<$c>>,
            ) -> ::std::result::Result<(), $crate::object::ObjectError> {
                self.object.set(stringify!($field), value)
            }
        }
    };
    (@set $c:ty; $field:ident) => {};
}
