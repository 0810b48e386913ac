//! Normalized schema vocabulary produced by the resolver.
//!
//! The wire form is JSON-schema-ish: `{"type": ..}` for shapes, `{"$ref": ..}`
//! for named external fragments. Titles are advisory and skipped when absent.
use indexmap::{IndexMap, IndexSet};
use serde::ser::{Serialize, SerializeMap, Serializer};

pub const DATE_REF: &str = "runtime#date";
pub const PROMISE_REF: &str = "runtime#promise";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSchema {
    Any { title: Option<String> },
    Intrinsic(Intrinsic),
    Object {
        title: Option<String>,
        properties: IndexMap<String, TypeSchema>,
        required: IndexSet<String>, // every known property; no optionality
    },
    Array { items: Box<TypeSchema> },
    Reference(String),
}

/// Terminal leaf kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intrinsic {
    String,
    Number,
    Boolean,
    Null,
    Undefined,
    Bigint,
    Symbol,
    Void,
    Never,
    Unknown,
}

impl Intrinsic {
    pub fn as_str(self) -> &'static str {
        match self {
            Intrinsic::String => "string",
            Intrinsic::Number => "number",
            Intrinsic::Boolean => "boolean",
            Intrinsic::Null => "null",
            Intrinsic::Undefined => "undefined",
            Intrinsic::Bigint => "bigint",
            Intrinsic::Symbol => "symbol",
            Intrinsic::Void => "void",
            Intrinsic::Never => "never",
            Intrinsic::Unknown => "unknown",
        }
    }
}

impl TypeSchema {
    pub fn any() -> Self {
        TypeSchema::Any { title: None }
    }

    pub fn array_of(items: TypeSchema) -> Self {
        TypeSchema::Array { items: Box::new(items) }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        TypeSchema::Reference(name.into())
    }

    pub fn is_object(&self) -> bool {
        matches!(self, TypeSchema::Object { .. })
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            TypeSchema::Any { title } | TypeSchema::Object { title, .. } => title.as_deref(),
            _ => None,
        }
    }

    /// JSON view of the schema (same shape as the `Serialize` impl).
    pub fn to_json(&self) -> serde_json::Value {
        // Serializing into `Value` only fails on non-string map keys, which
        // this type never produces.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for TypeSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypeSchema::Any { title } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "any")?;
                if let Some(title) = title {
                    map.serialize_entry("title", title)?;
                }
                map.end()
            }
            TypeSchema::Intrinsic(kind) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("type", kind.as_str())?;
                map.end()
            }
            TypeSchema::Object { title, properties, required } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "object")?;
                if let Some(title) = title {
                    map.serialize_entry("title", title)?;
                }
                map.serialize_entry("properties", properties)?;
                map.serialize_entry("required", required)?;
                map.end()
            }
            TypeSchema::Array { items } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", items)?;
                map.end()
            }
            TypeSchema::Reference(name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$ref", name)?;
                map.end()
            }
        }
    }
}
