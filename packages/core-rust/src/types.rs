use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Module path prefixes that make up the platform's built-in type namespace.
///
/// Host objects whose type lives under one of these prefixes cannot be bound
/// directly; callers wrap them in their own type first.
pub const BUILTIN_PATH_PREFIXES: &[&str] = &["std::", "core::", "alloc::"];

/// Returns `true` if `path` names a type in the platform's built-in namespace.
#[must_use]
pub fn is_builtin_path(path: &str) -> bool {
    BUILTIN_PATH_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// Generic structured value exchanged across the process boundary.
///
/// Every argument, property snapshot and return value decomposes into this
/// type. Host objects that cannot be represented this way are exposed as
/// nested bound objects instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Script `null` / `undefined`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// 64-bit IEEE 754 float.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Named members. Uses `BTreeMap` for deterministic serialization order.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Declared type of a parameter, return value or property.
///
/// Host objects describe their members with this model so the registry can
/// classify them without runtime reflection. User-defined types carry their
/// full module path (usually `std::any::type_name::<T>()`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeDesc {
    Void,
    Bool,
    Int,
    Float,
    String,
    /// Untyped value; accepts anything.
    Any,
    /// Enumeration type at the given path.
    Enum(String),
    /// Plain value type (copied, not referenced) at the given path.
    Struct(String),
    /// Reference type at the given path.
    Object(String),
    Array(Box<TypeDesc>),
    /// String-keyed dictionary with the given value type.
    Map(Box<TypeDesc>),
    Nullable(Box<TypeDesc>),
    /// Callable value.
    Delegate {
        params: Vec<TypeDesc>,
        returns: Box<TypeDesc>,
    },
    /// Asynchronous result carrier, optionally carrying a payload type.
    Task(Option<Box<TypeDesc>>),
    /// A bare type token. Never serializable, never exposed.
    TypeDescriptor,
}

impl TypeDesc {
    /// Reference type at the path of `T`.
    #[must_use]
    pub fn object_of<T: ?Sized>() -> Self {
        TypeDesc::Object(std::any::type_name::<T>().to_string())
    }

    /// `Array(Any)`.
    #[must_use]
    pub fn any_array() -> Self {
        TypeDesc::Array(Box::new(TypeDesc::Any))
    }

    /// `Map(Any)`.
    #[must_use]
    pub fn any_map() -> Self {
        TypeDesc::Map(Box::new(TypeDesc::Any))
    }

    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeDesc::Bool | TypeDesc::Int | TypeDesc::Float)
    }

    /// Module path of user-defined types.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            TypeDesc::Enum(p) | TypeDesc::Struct(p) | TypeDesc::Object(p) => Some(p),
            _ => None,
        }
    }

    /// Whether the type belongs to the platform's built-in namespace.
    ///
    /// Containers, delegates, tasks and type tokens are all platform types.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        match self {
            TypeDesc::Enum(p) | TypeDesc::Struct(p) | TypeDesc::Object(p) => is_builtin_path(p),
            TypeDesc::Any
            | TypeDesc::Array(_)
            | TypeDesc::Map(_)
            | TypeDesc::Nullable(_)
            | TypeDesc::Delegate { .. }
            | TypeDesc::Task(_)
            | TypeDesc::TypeDescriptor => true,
            _ => false,
        }
    }

    /// Whether values of this type must be exposed as nested bound objects
    /// rather than snapshotted.
    #[must_use]
    pub fn is_complex(&self) -> bool {
        match self {
            TypeDesc::Void => false,
            TypeDesc::Nullable(inner) => inner.is_complex(),
            TypeDesc::Array(_) => false,
            _ if self.is_builtin() => false,
            // A one-way snapshot of a value type is too easy to misrepresent.
            TypeDesc::Struct(_) => false,
            _ => !self.is_primitive() && *self != TypeDesc::String,
        }
    }

    /// `Map(Any)` or `Array(Any)`: raw containers the binder leaves alone.
    #[must_use]
    pub fn is_raw_container(&self) -> bool {
        match self {
            TypeDesc::Map(inner) | TypeDesc::Array(inner) => **inner == TypeDesc::Any,
            _ => false,
        }
    }

    #[must_use]
    pub fn is_delegate(&self) -> bool {
        matches!(self, TypeDesc::Delegate { .. })
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Void => f.write_str("void"),
            TypeDesc::Bool => f.write_str("bool"),
            TypeDesc::Int => f.write_str("int"),
            TypeDesc::Float => f.write_str("float"),
            TypeDesc::String => f.write_str("string"),
            TypeDesc::Any => f.write_str("any"),
            TypeDesc::Enum(p) | TypeDesc::Struct(p) | TypeDesc::Object(p) => f.write_str(p),
            TypeDesc::Array(inner) => write!(f, "{inner}[]"),
            TypeDesc::Map(inner) => write!(f, "map<string, {inner}>"),
            TypeDesc::Nullable(inner) => write!(f, "{inner}?"),
            TypeDesc::Delegate { params, returns } => {
                f.write_str("fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {returns}")
            }
            TypeDesc::Task(Some(inner)) => write!(f, "task<{inner}>"),
            TypeDesc::Task(None) => f.write_str("task"),
            TypeDesc::TypeDescriptor => f.write_str("type"),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    struct Widget;

    #[test]
    fn void_primitives_and_strings_are_not_complex() {
        assert!(!TypeDesc::Void.is_complex());
        assert!(!TypeDesc::Bool.is_complex());
        assert!(!TypeDesc::Int.is_complex());
        assert!(!TypeDesc::Float.is_complex());
        assert!(!TypeDesc::String.is_complex());
    }

    #[test]
    fn user_reference_types_are_complex() {
        assert!(TypeDesc::object_of::<Widget>().is_complex());
        assert!(TypeDesc::Nullable(Box::new(TypeDesc::object_of::<Widget>())).is_complex());
    }

    #[test]
    fn user_enums_are_complex_but_value_types_are_not() {
        assert!(TypeDesc::Enum("app::Mode".to_string()).is_complex());
        assert!(!TypeDesc::Struct("app::Point".to_string()).is_complex());
    }

    #[test]
    fn arrays_and_builtin_types_are_not_complex() {
        assert!(!TypeDesc::Array(Box::new(TypeDesc::object_of::<Widget>())).is_complex());
        assert!(!TypeDesc::Object("std::fs::File".to_string()).is_complex());
        assert!(!TypeDesc::Object("core::cell::Cell".to_string()).is_complex());
        assert!(!TypeDesc::any_map().is_complex());
        assert!(!TypeDesc::Task(None).is_complex());
        assert!(!TypeDesc::TypeDescriptor.is_complex());
        assert!(!TypeDesc::Nullable(Box::new(TypeDesc::Int)).is_complex());
    }

    #[test]
    fn object_of_uses_full_type_path() {
        let ty = TypeDesc::object_of::<String>();
        assert_eq!(ty.path(), Some("alloc::string::String"));
        assert!(ty.is_builtin());
    }

    #[test]
    fn raw_containers() {
        assert!(TypeDesc::any_map().is_raw_container());
        assert!(TypeDesc::any_array().is_raw_container());
        assert!(!TypeDesc::Array(Box::new(TypeDesc::Int)).is_raw_container());
        assert!(!TypeDesc::Any.is_raw_container());
    }

    #[test]
    fn json_conversion_preserves_structure() {
        let json = serde_json::json!({"a": 1, "b": [true, null, 2.5], "c": "x"});
        let value = Value::from(json);
        let map = value.as_map().unwrap();
        assert_eq!(map["a"], Value::Int(1));
        assert_eq!(
            map["b"],
            Value::Array(vec![Value::Bool(true), Value::Null, Value::Float(2.5)])
        );
        assert_eq!(map["c"].as_str(), Some("x"));
    }

    #[test]
    fn display_renders_nested_types() {
        let ty = TypeDesc::Delegate {
            params: vec![TypeDesc::Int, TypeDesc::String],
            returns: Box::new(TypeDesc::Task(Some(Box::new(TypeDesc::Bool)))),
        };
        assert_eq!(ty.to_string(), "fn(int, string) -> task<bool>");
    }

    proptest! {
        #[test]
        fn builtin_paths_never_complex(segment in "[a-z]{1,8}", name in "[A-Z][a-z]{1,8}") {
            for prefix in BUILTIN_PATH_PREFIXES {
                let path = format!("{prefix}{segment}::{name}");
                prop_assert!(!TypeDesc::Object(path.clone()).is_complex());
                prop_assert!(!TypeDesc::Enum(path).is_complex());
            }
        }

        #[test]
        fn user_object_paths_always_complex(krate in "[a-z]{3,8}", name in "[A-Z][a-z]{1,8}") {
            prop_assume!(!["std", "core", "alloc"].contains(&krate.as_str()));
            let ty = TypeDesc::Object(format!("{krate}::{name}"));
            prop_assert!(ty.is_complex());
        }
    }
}
