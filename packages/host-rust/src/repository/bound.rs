//! Bound object records: the metadata table built once per registration.

use std::fmt;
use std::sync::Arc;

use objbridge_core::{MethodDescriptor, ObjectDescriptor, PropertyDescriptor, TypeDesc, Value};

use crate::config::BindingOptions;
use crate::reflect::{Getter, HostObject, Invoker, Setter};

/// A registered host object, or a child object reached through a complex
/// property or minted from a complex return value.
pub struct BoundObject {
    pub(crate) id: i64,
    /// Identity of the top-level registration this object belongs to.
    pub(crate) root_id: i64,
    pub(crate) name: String,
    pub(crate) script_name: String,
    pub(crate) is_async: bool,
    pub(crate) root: bool,
    pub(crate) options: BindingOptions,
    pub(crate) value: Option<Arc<dyn HostObject>>,
    pub(crate) methods: Vec<Method>,
    pub(crate) properties: Vec<Property>,
}

impl BoundObject {
    pub(crate) fn new(
        id: i64,
        root_id: i64,
        name: String,
        script_name: String,
        is_async: bool,
        options: BindingOptions,
        value: Option<Arc<dyn HostObject>>,
    ) -> Self {
        Self {
            id,
            root_id,
            name,
            script_name,
            is_async,
            root: id == root_id,
            options,
            value,
            methods: Vec::new(),
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn root_id(&self) -> i64 {
        self.root_id
    }

    /// Registration name for roots, declared member name for children.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    #[must_use]
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.root
    }

    #[must_use]
    pub fn value(&self) -> Option<&Arc<dyn HostObject>> {
        self.value.as_ref()
    }

    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Exact script-name lookup.
    #[must_use]
    pub fn method(&self, script_name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.script_name == script_name)
    }

    /// Exact script-name lookup.
    #[must_use]
    pub fn property(&self, script_name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.script_name == script_name)
    }

    /// Serializable projection, including nested property objects.
    #[must_use]
    pub fn descriptor(&self) -> ObjectDescriptor {
        ObjectDescriptor {
            id: self.id,
            name: self.name.clone(),
            script_name: self.script_name.clone(),
            is_async: self.is_async,
            camel_case_names: self.options.camel_case_names(),
            root: self.root,
            methods: self.methods.iter().map(Method::descriptor).collect(),
            properties: self.properties.iter().map(Property::descriptor).collect(),
        }
    }
}

impl fmt::Debug for BoundObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundObject")
            .field("id", &self.id)
            .field("root_id", &self.root_id)
            .field("name", &self.name)
            .field("script_name", &self.script_name)
            .field("is_async", &self.is_async)
            .field("methods", &self.methods)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

/// One formal parameter of an exposed method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeDesc,
    pub variadic: bool,
}

/// One exposed operation.
#[derive(Clone)]
pub struct Method {
    pub script_name: String,
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// The last parameter collects all trailing arguments.
    pub has_variadic_tail: bool,
    pub(crate) invoker: Invoker,
}

impl Method {
    pub(crate) fn new(
        script_name: String,
        name: String,
        parameters: Vec<Parameter>,
        invoker: Invoker,
    ) -> Self {
        let has_variadic_tail = parameters.last().is_some_and(|p| p.variadic);
        Self {
            script_name,
            name,
            parameters,
            has_variadic_tail,
            invoker,
        }
    }

    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    fn descriptor(&self) -> MethodDescriptor {
        MethodDescriptor {
            script_name: self.script_name.clone(),
            name: self.name.clone(),
            parameter_count: self.parameters.len(),
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("script_name", &self.script_name)
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("has_variadic_tail", &self.has_variadic_tail)
            .finish_non_exhaustive()
    }
}

/// One exposed data member.
#[derive(Clone)]
pub struct Property {
    pub script_name: String,
    pub name: String,
    pub ty: TypeDesc,
    pub read_only: bool,
    pub complex: bool,
    /// Snapshot taken at analysis time when eager reads were requested.
    pub value: Option<Value>,
    /// Child object wrapping the property's value, for complex properties.
    pub object: Option<Arc<BoundObject>>,
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
}

impl Property {
    fn descriptor(&self) -> PropertyDescriptor {
        PropertyDescriptor {
            script_name: self.script_name.clone(),
            name: self.name.clone(),
            read_only: self.read_only,
            complex: self.complex,
            value: self.value.clone(),
            object: self.object.as_ref().map(|o| Box::new(o.descriptor())),
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("script_name", &self.script_name)
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("read_only", &self.read_only)
            .field("complex", &self.complex)
            .field("value", &self.value)
            .field("object", &self.object.as_ref().map(|o| o.id))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{CallFuture, HostValue};

    fn noop_invoker() -> Invoker {
        Arc::new(|_target: Arc<dyn HostObject>, _args: Vec<HostValue>| -> CallFuture {
            Box::pin(async { Ok(HostValue::null()) })
        })
    }

    fn param(name: &str, variadic: bool) -> Parameter {
        Parameter {
            name: name.into(),
            ty: TypeDesc::Any,
            variadic,
        }
    }

    #[test]
    fn variadic_tail_is_computed_once_from_last_parameter() {
        let method = Method::new(
            "log".into(),
            "log".into(),
            vec![param("level", false), param("parts", true)],
            noop_invoker(),
        );
        assert!(method.has_variadic_tail);
        assert_eq!(method.parameter_count(), 2);

        let plain = Method::new("f".into(), "f".into(), vec![param("a", false)], noop_invoker());
        assert!(!plain.has_variadic_tail);
    }

    #[test]
    fn descriptor_nests_child_objects() {
        let mut child = BoundObject::new(
            8,
            7,
            "profile".into(),
            "profile".into(),
            false,
            BindingOptions::default(),
            None,
        );
        child.properties.push(Property {
            script_name: "age".into(),
            name: "age".into(),
            ty: TypeDesc::Int,
            read_only: true,
            complex: false,
            value: Some(Value::Int(41)),
            object: None,
            getter: None,
            setter: None,
        });

        let mut root = BoundObject::new(
            7,
            7,
            "settings".into(),
            "settings".into(),
            false,
            BindingOptions::default(),
            None,
        );
        root.properties.push(Property {
            script_name: "profile".into(),
            name: "profile".into(),
            ty: TypeDesc::Object("app::Profile".into()),
            read_only: true,
            complex: true,
            value: None,
            object: Some(Arc::new(child)),
            getter: None,
            setter: None,
        });

        let descriptor = root.descriptor();
        assert!(descriptor.root);
        let nested = descriptor.property("profile").unwrap().object.as_ref().unwrap();
        assert_eq!(nested.id, 8);
        assert!(!nested.root);
        assert_eq!(nested.property("age").unwrap().value, Some(Value::Int(41)));
    }
}
