//! Argument coercion into declared parameter types.

use anyhow::{anyhow, bail};
use objbridge_core::{TypeDesc, Value};

use crate::reflect::HostValue;

/// Converts an incoming argument into a declared parameter type.
///
/// Only called for non-null arguments whose parameter is not a raw
/// map/array; live objects and functions are passed through by convention.
pub trait Binder: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when `value` cannot represent `target`; the call then
    /// fails softly with the error as its diagnostic.
    fn bind(&self, value: HostValue, target: &TypeDesc) -> anyhow::Result<HostValue>;
}

/// Structural coercions between script values and declared types.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBinder;

impl Binder for DefaultBinder {
    fn bind(&self, value: HostValue, target: &TypeDesc) -> anyhow::Result<HostValue> {
        match value {
            HostValue::Value(v) => Ok(HostValue::Value(bind_value(v, target)?)),
            other => Ok(other),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn bind_value(value: Value, target: &TypeDesc) -> anyhow::Result<Value> {
    match (target, value) {
        (_, Value::Null) => Ok(Value::Null),
        (TypeDesc::Nullable(inner), v) => bind_value(v, inner),
        (TypeDesc::Any | TypeDesc::Struct(_) | TypeDesc::Object(_), v) => Ok(v),

        (TypeDesc::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
        (TypeDesc::Bool, Value::String(s)) => s
            .trim()
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| anyhow!("cannot convert string '{s}' to bool")),

        (TypeDesc::Int, Value::Int(i)) => Ok(Value::Int(i)),
        (TypeDesc::Int, Value::Float(f)) => {
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Ok(Value::Int(f as i64))
            } else {
                bail!("cannot convert {f} to int without losing precision")
            }
        }
        (TypeDesc::Int, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| anyhow!("cannot convert string '{s}' to int")),

        (TypeDesc::Float, Value::Float(f)) => Ok(Value::Float(f)),
        (TypeDesc::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
        (TypeDesc::Float, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| anyhow!("cannot convert string '{s}' to float")),

        (TypeDesc::String, Value::String(s)) => Ok(Value::String(s)),
        (TypeDesc::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),
        (TypeDesc::String, Value::Int(i)) => Ok(Value::String(i.to_string())),
        (TypeDesc::String, Value::Float(f)) => Ok(Value::String(f.to_string())),

        (TypeDesc::Enum(_), v @ (Value::Int(_) | Value::String(_))) => Ok(v),

        (TypeDesc::Array(element), Value::Array(items)) => items
            .into_iter()
            .map(|item| bind_value(item, element))
            .collect::<anyhow::Result<Vec<_>>>()
            .map(Value::Array),
        (TypeDesc::Map(element), Value::Map(entries)) => entries
            .into_iter()
            .map(|(k, v)| bind_value(v, element).map(|v| (k, v)))
            .collect::<anyhow::Result<_>>()
            .map(Value::Map),

        (target, v) => bail!("cannot convert {} to {target}", v.kind_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind(value: Value, target: &TypeDesc) -> anyhow::Result<Value> {
        DefaultBinder
            .bind(HostValue::Value(value), target)
            .map(|v| v.into_value().unwrap())
    }

    #[test]
    fn numeric_coercions() {
        assert_eq!(bind(Value::Float(4.0), &TypeDesc::Int).unwrap(), Value::Int(4));
        assert_eq!(bind(Value::Int(4), &TypeDesc::Float).unwrap(), Value::Float(4.0));
        assert_eq!(bind(Value::from(" 12 "), &TypeDesc::Int).unwrap(), Value::Int(12));
        assert!(bind(Value::Float(4.5), &TypeDesc::Int).is_err());
    }

    #[test]
    fn strings_accept_scalars() {
        assert_eq!(bind(Value::Int(7), &TypeDesc::String).unwrap(), Value::from("7"));
        assert_eq!(bind(Value::Bool(true), &TypeDesc::String).unwrap(), Value::from("true"));
    }

    #[test]
    fn nullable_unwraps_to_inner_type() {
        let target = TypeDesc::Nullable(Box::new(TypeDesc::Int));
        assert_eq!(bind(Value::Float(2.0), &target).unwrap(), Value::Int(2));
        assert_eq!(bind(Value::Null, &target).unwrap(), Value::Null);
    }

    #[test]
    fn arrays_bind_element_wise() {
        let target = TypeDesc::Array(Box::new(TypeDesc::Float));
        let bound = bind(Value::Array(vec![Value::Int(1), Value::Float(2.5)]), &target).unwrap();
        assert_eq!(bound, Value::Array(vec![Value::Float(1.0), Value::Float(2.5)]));

        let err = bind(Value::Array(vec![Value::from("x")]), &target).unwrap_err();
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn mismatches_are_errors() {
        let err = bind(Value::Map(Default::default()), &TypeDesc::Int).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert map to int");
        assert!(bind(Value::from("maybe"), &TypeDesc::Bool).is_err());
    }

    #[test]
    fn objects_pass_through() {
        let value = Value::Map(Default::default());
        assert_eq!(
            bind(value.clone(), &TypeDesc::Object("app::Config".into())).unwrap(),
            value
        );
        assert!(DefaultBinder
            .bind(HostValue::Missing, &TypeDesc::Int)
            .unwrap()
            .is_missing());
    }
}
