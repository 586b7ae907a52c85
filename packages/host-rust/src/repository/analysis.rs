//! Metadata construction for bound objects.
//!
//! Analysis runs once per registration (and once per snapshot). It walks a
//! host object's [`TypeInfo`](crate::reflect::TypeInfo), turns the exposable
//! members into [`Method`] and [`Property`] records and recurses into complex
//! properties, allocating a fresh identity for every child it creates.

use std::sync::Arc;

use anyhow::bail;
use objbridge_core::{TypeDesc, Value};
use tracing::warn;

use super::bound::{BoundObject, Method, Parameter, Property};
use super::next_object_id;
use crate::config::BindingOptions;
use crate::reflect::{CallFuture, Getter, HostObject, HostValue, Invoker, MethodInfo, PropertyInfo};

/// Which parts of an object analysis exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AnalysisFlags {
    pub methods: bool,
    pub properties: bool,
    /// Read simple property values now instead of on demand.
    pub read_values: bool,
}

impl AnalysisFlags {
    /// Top-level registrations. Async objects expose methods only; their
    /// property values are fetched through `get_property`.
    pub(crate) fn registration(is_async: bool) -> Self {
        Self {
            methods: true,
            properties: !is_async,
            read_values: false,
        }
    }

    /// Objects minted from complex return values.
    pub(crate) fn snapshot() -> Self {
        Self {
            methods: false,
            properties: true,
            read_values: true,
        }
    }

    fn child(self) -> Self {
        Self {
            properties: true,
            ..self
        }
    }
}

/// Builds one object tree. Every object created is also collected, so the
/// repository can insert the whole tree into its identity map.
pub(crate) struct Analyzer<'a> {
    options: &'a BindingOptions,
    root_id: i64,
    is_async: bool,
    created: Vec<Arc<BoundObject>>,
}

impl<'a> Analyzer<'a> {
    pub(crate) fn new(options: &'a BindingOptions, root_id: i64, is_async: bool) -> Self {
        Self {
            options,
            root_id,
            is_async,
            created: Vec::new(),
        }
    }

    /// Analyzes `value` as object `id` and returns every object created,
    /// with object `id` first.
    pub(crate) fn run(
        mut self,
        id: i64,
        name: &str,
        script_name: String,
        value: Arc<dyn HostObject>,
        flags: AnalysisFlags,
    ) -> Vec<Arc<BoundObject>> {
        let object = self.analyze(id, name, script_name, Some(value), flags);
        let mut created = Vec::with_capacity(self.created.len() + 1);
        created.push(object);
        created.append(&mut self.created);
        created
    }

    fn analyze(
        &mut self,
        id: i64,
        name: &str,
        script_name: String,
        value: Option<Arc<dyn HostObject>>,
        flags: AnalysisFlags,
    ) -> Arc<BoundObject> {
        let mut object = BoundObject::new(
            id,
            self.root_id,
            name.to_string(),
            script_name,
            self.is_async,
            self.options.clone(),
            value.clone(),
        );

        let Some(value) = value else {
            return Arc::new(object);
        };
        let info = value.type_info();
        if info.ty.is_primitive() || info.ty == TypeDesc::String {
            return Arc::new(object);
        }

        if flags.methods {
            for method in info.methods.iter().filter(|m| is_exposable_method(m)) {
                object.methods.push(self.declared_method(method));
            }
            if let Some(dynamic) = value.dynamic_members() {
                for member in dynamic.member_names() {
                    if let Some(HostValue::Function(func)) = dynamic.member(&member) {
                        let parameters = positional_parameters(func.params());
                        object.methods.push(Method::new(
                            self.options.script_name(&member),
                            member.clone(),
                            parameters,
                            dynamic_member_invoker(member),
                        ));
                    }
                }
            }
            for property in info.properties.iter().filter(|p| is_delegate_property(p)) {
                if let (TypeDesc::Delegate { params, .. }, Some(getter)) = (&property.ty, &property.getter) {
                    object.methods.push(Method::new(
                        self.options.script_name(&property.name),
                        property.name.clone(),
                        positional_parameters(params),
                        delegate_property_invoker(property.name.clone(), Arc::clone(getter)),
                    ));
                }
            }
        }

        if flags.properties {
            for property in info
                .properties
                .iter()
                .filter(|p| p.is_exposable() && !p.ty.is_delegate())
            {
                let exposed = self.property(id, value.as_ref(), property, flags);
                object.properties.push(exposed);
            }
        }

        Arc::new(object)
    }

    fn declared_method(&self, method: &MethodInfo) -> Method {
        let parameters = method
            .params
            .iter()
            .map(|p| Parameter {
                name: p.name.clone(),
                ty: p.ty.clone(),
                variadic: p.variadic,
            })
            .collect();
        Method::new(
            self.options.script_name(&method.name),
            method.name.clone(),
            parameters,
            Arc::clone(&method.invoker),
        )
    }

    fn property(
        &mut self,
        owner_id: i64,
        owner: &dyn HostObject,
        property: &PropertyInfo,
        flags: AnalysisFlags,
    ) -> Property {
        let complex = property.ty.is_complex();
        let mut exposed = Property {
            script_name: self.options.script_name(&property.name),
            name: property.name.clone(),
            ty: property.ty.clone(),
            read_only: property.setter.is_none(),
            complex,
            value: None,
            object: None,
            getter: property.getter.clone(),
            setter: property.setter.clone(),
        };

        if !complex && !flags.read_values {
            return exposed;
        }
        let Some(getter) = &property.getter else {
            return exposed;
        };
        let current = match getter(owner) {
            Ok(current) => current,
            Err(e) => {
                warn!(
                    object_id = owner_id,
                    property = %property.name,
                    error = %format!("{e:#}"),
                    "property read failed during analysis"
                );
                return exposed;
            }
        };

        if complex {
            if let HostValue::Object(child) = current {
                let object = self.analyze(
                    next_object_id(),
                    &property.name,
                    exposed.script_name.clone(),
                    Some(child),
                    flags.child(),
                );
                self.created.push(Arc::clone(&object));
                exposed.object = Some(object);
            }
        } else if let HostValue::Value(v) = current {
            exposed.value = Some(v);
        }
        exposed
    }
}

fn is_exposable_method(method: &MethodInfo) -> bool {
    !method.ignored && !method.special && method.returns != TypeDesc::TypeDescriptor
}

fn is_delegate_property(property: &PropertyInfo) -> bool {
    !property.ignored && !property.indexer && property.readable() && property.ty.is_delegate()
}

fn positional_parameters(types: &[TypeDesc]) -> Vec<Parameter> {
    types
        .iter()
        .enumerate()
        .map(|(i, ty)| Parameter {
            name: format!("arg{i}"),
            ty: ty.clone(),
            variadic: false,
        })
        .collect()
}

/// Calls whatever function the delegate property holds at call time.
fn delegate_property_invoker(property: String, getter: Getter) -> Invoker {
    Arc::new(move |target: Arc<dyn HostObject>, args: Vec<HostValue>| -> CallFuture {
        let current = getter(target.as_ref());
        let property = property.clone();
        Box::pin(async move { call_current(&property, current?, args).await })
    })
}

/// Calls whatever function the dynamic member holds at call time.
fn dynamic_member_invoker(member: String) -> Invoker {
    Arc::new(move |target: Arc<dyn HostObject>, args: Vec<HostValue>| -> CallFuture {
        let current = target
            .dynamic_members()
            .and_then(|members| members.member(&member))
            .unwrap_or(HostValue::Missing);
        let member = member.clone();
        Box::pin(async move { call_current(&member, current, args).await })
    })
}

async fn call_current(
    member: &str,
    current: HostValue,
    args: Vec<HostValue>,
) -> anyhow::Result<HostValue> {
    match current {
        HostValue::Function(func) => func.invoke(args).await,
        HostValue::Missing | HostValue::Value(Value::Null) => bail!("'{member}' is not set"),
        _ => bail!("'{member}' is not callable"),
    }
}
