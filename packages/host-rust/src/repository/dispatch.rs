//! Call, get and set against bound object metadata.
//!
//! Lookup misses are hard faults ([`RegistryError`]); everything that goes
//! wrong after lookup becomes a failed [`InvocationResult`].

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Context};
use objbridge_core::{InvocationResult, ResultValue, Value};
use tracing::{debug, warn};

use super::analysis::{AnalysisFlags, Analyzer};
use super::bound::{BoundObject, Method};
use super::{next_object_id, ObjectRepository, RegistryError};
use crate::binding::{Binder, Proceed};
use crate::reflect::{HostObject, HostValue};

impl ObjectRepository {
    /// Calls a method on a bound object.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ObjectNotFound`] or
    /// [`RegistryError::MethodNotFound`] when the lookup misses. Failures of
    /// the call itself are reported through the returned result.
    pub async fn call_method(
        &self,
        object_id: i64,
        method_name: &str,
        args: Vec<HostValue>,
    ) -> Result<InvocationResult, RegistryError> {
        let object = self.lookup(object_id)?;
        let method = object
            .method(method_name)
            .ok_or_else(|| RegistryError::MethodNotFound {
                object_id,
                name: method_name.to_string(),
            })?;
        let Some(target) = object.value.clone() else {
            return Ok(InvocationResult::failure(format!("object {object_id} has no value")));
        };

        let args = match adapt_arguments(method, args, object.options.binder.as_deref()) {
            Ok(args) => args,
            Err(e) => return Ok(failure(&e)),
        };

        let outcome = match &object.options.interceptor {
            Some(interceptor) => {
                let proceed = Proceed::new(Arc::clone(&method.invoker), target);
                interceptor.intercept(&method.name, args, proceed).await
            }
            None => (method.invoker)(target, args).await,
        };

        Ok(match outcome {
            Ok(value) => self.convert_return(&object, &method.name, value),
            Err(e) => failure(&e),
        })
    }

    /// Reads a property of a bound object.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ObjectNotFound`] or
    /// [`RegistryError::PropertyNotFound`] when the lookup misses.
    pub fn get_property(
        &self,
        object_id: i64,
        property_name: &str,
    ) -> Result<InvocationResult, RegistryError> {
        let object = self.lookup(object_id)?;
        let property = object
            .property(property_name)
            .ok_or_else(|| RegistryError::PropertyNotFound {
                object_id,
                name: property_name.to_string(),
            })?;
        let (Some(target), Some(getter)) = (&object.value, &property.getter) else {
            return Ok(InvocationResult::failure(format!(
                "property '{property_name}' is not readable"
            )));
        };

        Ok(match getter(target.as_ref()) {
            Ok(value) => self.convert_return(&object, &property.name, value),
            Err(e) => failure(&e),
        })
    }

    /// Writes a property of a bound object, coercing the value with the
    /// object's binder when one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ObjectNotFound`] or
    /// [`RegistryError::PropertyNotFound`] when the lookup misses.
    pub fn set_property(
        &self,
        object_id: i64,
        property_name: &str,
        value: HostValue,
    ) -> Result<InvocationResult, RegistryError> {
        let object = self.lookup(object_id)?;
        let property = object
            .property(property_name)
            .ok_or_else(|| RegistryError::PropertyNotFound {
                object_id,
                name: property_name.to_string(),
            })?;
        let (Some(target), Some(setter)) = (&object.value, &property.setter) else {
            return Ok(InvocationResult::failure(format!(
                "property '{property_name}' is read-only"
            )));
        };

        let value = match object.options.binder.as_deref() {
            Some(binder) if !value.is_null() && !property.ty.is_raw_container() => {
                match binder.bind(value, &property.ty) {
                    Ok(value) => value,
                    Err(e) => return Ok(failure(&e)),
                }
            }
            _ => value,
        };

        Ok(match setter(target.as_ref(), value) {
            Ok(()) => InvocationResult::success(None),
            Err(e) => failure(&e),
        })
    }

    fn lookup(&self, object_id: i64) -> Result<Arc<BoundObject>, RegistryError> {
        self.get(object_id)
            .ok_or(RegistryError::ObjectNotFound { object_id })
    }

    /// Turns a host return value into a result the remote side can consume.
    fn convert_return(&self, object: &BoundObject, member: &str, value: HostValue) -> InvocationResult {
        match value {
            HostValue::Value(v) => InvocationResult::success(Some(ResultValue::Value(v))),
            HostValue::Missing | HostValue::Function(_) => {
                InvocationResult::success(Some(ResultValue::Value(Value::Null)))
            }
            HostValue::Object(returned) => {
                if !object.is_async && returned.type_info().ty.is_complex() {
                    let snapshot = self.snapshot(object, member, returned);
                    InvocationResult::success(Some(ResultValue::Object(snapshot)))
                } else {
                    let value = self.decompose(returned.as_ref(), object, 0);
                    InvocationResult::success(Some(ResultValue::Value(value)))
                }
            }
        }
    }

    /// Binds a returned object as a fresh child of the caller's tree.
    fn snapshot(
        &self,
        caller: &BoundObject,
        member: &str,
        value: Arc<dyn HostObject>,
    ) -> objbridge_core::ObjectDescriptor {
        let id = next_object_id();
        let script_name = caller.options.script_name(member);
        let created = Analyzer::new(&caller.options, caller.root_id, false).run(
            id,
            member,
            script_name,
            value,
            AnalysisFlags::snapshot(),
        );
        let descriptor = created[0].descriptor();
        debug!(object_id = id, root_id = caller.root_id, member, "bound return value snapshot");
        self.insert_tree(caller.root_id, created);
        descriptor
    }

    /// Plain-data rendering of an object: readable properties and dynamic
    /// data members, nested objects up to `max_value_depth`.
    fn decompose(&self, value: &dyn HostObject, caller: &BoundObject, depth: usize) -> Value {
        let mut map = BTreeMap::new();
        let info = value.type_info();
        for property in info.properties.iter().filter(|p| p.is_exposable() && !p.ty.is_delegate()) {
            let Some(getter) = &property.getter else {
                continue;
            };
            match getter(value) {
                Ok(current) => {
                    let rendered = self.decompose_member(current, caller, depth);
                    map.insert(caller.options.script_name(&property.name), rendered);
                }
                Err(e) => {
                    warn!(property = %property.name, error = %format!("{e:#}"), "property read failed while decomposing");
                }
            }
        }
        if let Some(dynamic) = value.dynamic_members() {
            for name in dynamic.member_names() {
                match dynamic.member(&name) {
                    Some(HostValue::Function(_)) | None => {}
                    Some(current) => {
                        let rendered = self.decompose_member(current, caller, depth);
                        map.insert(caller.options.script_name(&name), rendered);
                    }
                }
            }
        }
        Value::Map(map)
    }

    fn decompose_member(&self, current: HostValue, caller: &BoundObject, depth: usize) -> Value {
        match current {
            HostValue::Value(v) => v,
            HostValue::Object(nested) if depth + 1 < self.config.max_value_depth => {
                self.decompose(nested.as_ref(), caller, depth + 1)
            }
            HostValue::Object(_) | HostValue::Missing | HostValue::Function(_) => Value::Null,
        }
    }
}

fn failure(error: &anyhow::Error) -> InvocationResult {
    InvocationResult::failure(format!("{error:#}"))
}

/// Fits actual arguments to a method's formal parameters.
///
/// Trailing arguments are collected into the variadic tail, missing slots
/// are padded with [`HostValue::Missing`], then the binder coerces each
/// remaining argument into its declared type.
///
/// The tail is a plain [`Value::Array`], so every trailing argument must be
/// a plain value. A live object or function there is an adaptation error.
/// Arguments arriving from the remote side are always plain values.
pub(crate) fn adapt_arguments(
    method: &Method,
    mut args: Vec<HostValue>,
    binder: Option<&dyn Binder>,
) -> anyhow::Result<Vec<HostValue>> {
    let formal = method.parameters.len();
    if method.has_variadic_tail {
        let fixed = formal - 1;
        let tail = if args.len() > fixed {
            args.split_off(fixed)
        } else {
            Vec::new()
        };
        let tail = tail
            .into_iter()
            .map(|arg| match arg {
                HostValue::Value(v) => Ok(v),
                HostValue::Missing => Ok(Value::Null),
                HostValue::Object(_) | HostValue::Function(_) => {
                    bail!("variadic arguments of '{}' must be plain values", method.name)
                }
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        args.resize(fixed, HostValue::Missing);
        args.push(HostValue::Value(Value::Array(tail)));
    } else if args.len() > formal {
        bail!(
            "'{}' takes {formal} argument(s) but {} were supplied",
            method.name,
            args.len()
        );
    } else {
        args.resize(formal, HostValue::Missing);
    }

    if let Some(binder) = binder {
        for (arg, parameter) in args.iter_mut().zip(&method.parameters) {
            if arg.is_null() || arg.is_missing() || parameter.ty.is_raw_container() {
                continue;
            }
            let value = std::mem::replace(arg, HostValue::Missing);
            *arg = binder
                .bind(value, &parameter.ty)
                .with_context(|| format!("argument '{}' of '{}'", parameter.name, method.name))?;
        }
    }
    Ok(args)
}
