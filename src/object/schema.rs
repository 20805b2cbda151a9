//! Static field declarations for tracked objects.
//!
//! Each tracked type declares its fields once, as a `const` [`Schema`]:
//!
//! ```
//! use caplena::object::{Field, Schema};
//!
//! const METADATA: Schema = Schema::new(
//!     "Metadata",
//!     &[Field::plain("reviewed_count").mutable(), Field::plain("learns_from")],
//! );
//! assert!(METADATA.is_mutable("reviewed_count"));
//! assert!(!METADATA.is_mutable("learns_from"));
//! ```

/// Picks the schema of a polymorphic nested object from its discriminator.
#[derive(Debug, Clone, Copy)]
pub struct Variants {
    pub discriminator: &'static str,
    pub dispatch: fn(&str) -> Option<&'static Schema>,
}

/// How the schema of a nested object is determined.
#[derive(Debug, Clone, Copy)]
pub enum Nested {
    Fixed(&'static Schema),
    Dispatch(&'static Variants),
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Scalars and arrays of scalars, stored as-is.
    Plain,
    /// RFC3339 string, parsed into a [`Timestamp`](crate::Timestamp) unless null.
    Timestamp,
    /// Arbitrary JSON kept verbatim.
    Json,
    Object(Nested),
    List(Nested),
}

impl FieldKind {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Plain => "plain",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Json => "json",
            FieldKind::Object(_) => "object",
            FieldKind::List(_) => "list",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub mutable: bool,
    pub kind: FieldKind,
}

impl Field {
    const fn with_kind(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            mutable: false,
            kind,
        }
    }

    pub const fn plain(name: &'static str) -> Self {
        Self::with_kind(name, FieldKind::Plain)
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self::with_kind(name, FieldKind::Timestamp)
    }

    pub const fn json(name: &'static str) -> Self {
        Self::with_kind(name, FieldKind::Json)
    }

    pub const fn object(name: &'static str, schema: &'static Schema) -> Self {
        Self::with_kind(name, FieldKind::Object(Nested::Fixed(schema)))
    }

    pub const fn object_of(name: &'static str, variants: &'static Variants) -> Self {
        Self::with_kind(name, FieldKind::Object(Nested::Dispatch(variants)))
    }

    pub const fn list(name: &'static str, schema: &'static Schema) -> Self {
        Self::with_kind(name, FieldKind::List(Nested::Fixed(schema)))
    }

    pub const fn list_of(name: &'static str, variants: &'static Variants) -> Self {
        Self::with_kind(name, FieldKind::List(Nested::Dispatch(variants)))
    }

    pub const fn mutable(mut self) -> Self {
        self.mutable = true;
        self
    }
}

/// Identifying fields merged into a diff so the server can match array
/// elements.
#[derive(Debug, Clone, Copy)]
pub enum DiffIdentity {
    None,
    /// Added only when something else changed.
    WhenModified(&'static [&'static str]),
    /// Added to every diff, even an otherwise empty one.
    Always(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub name: &'static str,
    /// Identified objects carry an immutable `id` outside their fields.
    pub identified: bool,
    pub fields: &'static [Field],
    pub diff_identity: DiffIdentity,
}

impl Schema {
    pub const fn new(name: &'static str, fields: &'static [Field]) -> Self {
        Self {
            name,
            identified: false,
            fields,
            diff_identity: DiffIdentity::None,
        }
    }

    pub const fn identified(mut self) -> Self {
        self.identified = true;
        self
    }

    pub const fn inject_when_modified(mut self, keys: &'static [&'static str]) -> Self {
        self.diff_identity = DiffIdentity::WhenModified(keys);
        self
    }

    pub const fn inject_always(mut self, keys: &'static [&'static str]) -> Self {
        self.diff_identity = DiffIdentity::Always(keys);
        self
    }

    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn is_mutable(&self, name: &str) -> bool {
        self.field(name).is_some_and(|field| field.mutable)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|field| field.name)
    }
}

impl Nested {
    /// Resolves the schema for one JSON payload.
    pub fn resolve(&self, json: &serde_json::Value) -> Result<&'static Schema, String> {
        match self {
            Nested::Fixed(schema) => Ok(schema),
            Nested::Dispatch(variants) => {
                let tag = json
                    .get(variants.discriminator)
                    .and_then(serde_json::Value::as_str)
                    .ok_or_else(|| format!("missing `{}` discriminator", variants.discriminator))?;
                (variants.dispatch)(tag)
                    .ok_or_else(|| format!("unknown `{}` value `{tag}`", variants.discriminator))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const INNER: Schema = Schema::new("Inner", &[Field::plain("ref")]);
    const OTHER: Schema = Schema::new("Other", &[Field::plain("ref"), Field::plain("extra")]);

    fn pick(tag: &str) -> Option<&'static Schema> {
        match tag {
            "inner" => Some(&INNER),
            "other" => Some(&OTHER),
            _ => None,
        }
    }

    const VARIANTS: Variants = Variants {
        discriminator: "type",
        dispatch: pick,
    };

    #[test]
    fn test_field_lookup_and_mutability() {
        const OUTER: Schema = Schema::new(
            "Outer",
            &[
                Field::plain("name").mutable(),
                Field::object("inner", &INNER),
                Field::timestamp("created"),
            ],
        )
        .identified();

        assert!(OUTER.identified);
        assert!(OUTER.is_mutable("name"));
        assert!(!OUTER.is_mutable("inner"));
        assert!(!OUTER.is_mutable("missing"));
        assert_eq!(
            OUTER.field_names().collect::<Vec<_>>(),
            vec!["name", "inner", "created"]
        );
    }

    #[test]
    fn test_dispatch_resolves_variants() {
        let nested = Nested::Dispatch(&VARIANTS);
        assert_eq!(nested.resolve(&json!({"type": "other"})).unwrap().name, "Other");
        assert_eq!(
            nested.resolve(&json!({"type": "weird"})).unwrap_err(),
            "unknown `type` value `weird`"
        );
        assert_eq!(
            nested.resolve(&json!({})).unwrap_err(),
            "missing `type` discriminator"
        );
    }
}
