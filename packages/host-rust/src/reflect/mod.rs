//! Introspection layer for host objects.
//!
//! Host types describe their script-visible surface once, through
//! [`TypeInfo::builder`]. The registry turns that description into a metadata
//! table of typed thunks, so no type information is queried per call.

pub mod builder;
pub mod expando;

use std::any::{type_name, Any};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::anyhow;
use futures_util::future::BoxFuture;
use objbridge_core::{TypeDesc, Value};

pub use builder::TypeInfoBuilder;
pub use expando::{DynamicMembers, ExpandoObject};

/// Future returned by every invocation thunk.
pub type CallFuture = BoxFuture<'static, anyhow::Result<HostValue>>;

/// Performs a method call against a target object.
pub type Invoker = Arc<dyn Fn(Arc<dyn HostObject>, Vec<HostValue>) -> CallFuture + Send + Sync>;

/// Reads a property from a target object.
pub type Getter = Arc<dyn Fn(&dyn HostObject) -> anyhow::Result<HostValue> + Send + Sync>;

/// Writes a property on a target object.
pub type Setter = Arc<dyn Fn(&dyn HostObject, HostValue) -> anyhow::Result<()> + Send + Sync>;

// ---------------------------------------------------------------------------
// HostObject
// ---------------------------------------------------------------------------

/// Upcasting helper so thunks can recover the concrete host type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A host value that can be exposed to script code.
///
/// Implementations use interior mutability for state that setters and
/// methods change; every accessor receives a shared reference.
pub trait HostObject: AsAny + Send + Sync + 'static {
    /// Describes the script-visible members of this object.
    fn type_info(&self) -> TypeInfo;

    /// Dynamic member dictionary, for expando-style objects.
    fn dynamic_members(&self) -> Option<&dyn DynamicMembers> {
        None
    }
}

pub(crate) fn downcast_ref<T: HostObject>(target: &dyn HostObject) -> anyhow::Result<&T> {
    <dyn HostObject as AsAny>::as_any(target)
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow!("target is not a {}", type_name::<T>()))
}

pub(crate) fn downcast_arc<T: HostObject>(target: Arc<dyn HostObject>) -> anyhow::Result<Arc<T>> {
    <dyn HostObject as AsAny>::into_any_arc(target)
        .downcast::<T>()
        .map_err(|_| anyhow!("target is not a {}", type_name::<T>()))
}

// ---------------------------------------------------------------------------
// HostValue
// ---------------------------------------------------------------------------

/// A value as seen by host code: plain data, a live object or a callable.
#[derive(Clone)]
pub enum HostValue {
    /// Argument slot the caller did not supply; the callee applies its default.
    Missing,
    Value(Value),
    Object(Arc<dyn HostObject>),
    Function(HostFunction),
}

impl HostValue {
    #[must_use]
    pub fn null() -> Self {
        HostValue::Value(Value::Null)
    }

    /// Wraps a host object.
    pub fn object<T: HostObject>(object: T) -> Self {
        HostValue::Object(Arc::new(object))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Value(Value::Null))
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, HostValue::Missing)
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            HostValue::Value(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            HostValue::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Missing => f.write_str("Missing"),
            HostValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            HostValue::Object(_) => f.write_str("Object(..)"),
            HostValue::Function(func) => f.debug_tuple("Function").field(func).finish(),
        }
    }
}

impl From<Value> for HostValue {
    fn from(v: Value) -> Self {
        HostValue::Value(v)
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Value(Value::Bool(b))
    }
}

impl From<i64> for HostValue {
    fn from(i: i64) -> Self {
        HostValue::Value(Value::Int(i))
    }
}

impl From<f64> for HostValue {
    fn from(f: f64) -> Self {
        HostValue::Value(Value::Float(f))
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Value(Value::from(s))
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::Value(Value::String(s))
    }
}

impl From<HostFunction> for HostValue {
    fn from(func: HostFunction) -> Self {
        HostValue::Function(func)
    }
}

// ---------------------------------------------------------------------------
// HostFunction
// ---------------------------------------------------------------------------

/// A callable host value with a declared signature.
#[derive(Clone)]
pub struct HostFunction {
    params: Vec<TypeDesc>,
    returns: TypeDesc,
    call: Arc<dyn Fn(Vec<HostValue>) -> CallFuture + Send + Sync>,
}

impl HostFunction {
    /// Creates a function from an async closure.
    pub fn new<F, Fut>(params: Vec<TypeDesc>, returns: TypeDesc, f: F) -> Self
    where
        F: Fn(Vec<HostValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<HostValue>> + Send + 'static,
    {
        Self {
            params,
            returns,
            call: Arc::new(move |args: Vec<HostValue>| -> CallFuture { Box::pin(f(args)) }),
        }
    }

    /// Creates a function from a synchronous closure.
    pub fn sync<F>(params: Vec<TypeDesc>, returns: TypeDesc, f: F) -> Self
    where
        F: Fn(Vec<HostValue>) -> anyhow::Result<HostValue> + Send + Sync + 'static,
    {
        Self {
            params,
            returns,
            call: Arc::new(move |args: Vec<HostValue>| -> CallFuture {
                let result = f(args);
                Box::pin(async move { result })
            }),
        }
    }

    #[must_use]
    pub fn params(&self) -> &[TypeDesc] {
        &self.params
    }

    #[must_use]
    pub fn returns(&self) -> &TypeDesc {
        &self.returns
    }

    #[must_use]
    pub fn signature(&self) -> TypeDesc {
        TypeDesc::Delegate {
            params: self.params.clone(),
            returns: Box::new(self.returns.clone()),
        }
    }

    /// Calls the function and awaits its result.
    ///
    /// A function declared to return `void` or a payload-less task yields null.
    ///
    /// # Errors
    ///
    /// Returns whatever error the function body produced.
    pub async fn invoke(&self, args: Vec<HostValue>) -> anyhow::Result<HostValue> {
        let value = (self.call)(args).await?;
        Ok(match self.returns {
            TypeDesc::Void | TypeDesc::Task(None) => HostValue::null(),
            _ => value,
        })
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature())
    }
}

// ---------------------------------------------------------------------------
// TypeInfo
// ---------------------------------------------------------------------------

/// Script-visible description of a host type.
#[derive(Clone)]
pub struct TypeInfo {
    pub ty: TypeDesc,
    pub methods: Vec<MethodInfo>,
    pub properties: Vec<PropertyInfo>,
}

impl TypeInfo {
    /// Starts describing host type `T`. The type path defaults to `T`'s full path.
    #[must_use]
    pub fn builder<T: HostObject>() -> TypeInfoBuilder<T> {
        TypeInfoBuilder::new()
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    pub name: String,
    pub ty: TypeDesc,
    /// Collects all trailing arguments into one array. Only valid last.
    pub variadic: bool,
}

impl ParamInfo {
    pub fn new(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            name: name.into(),
            ty,
            variadic: false,
        }
    }

    /// A variadic tail whose elements have type `element`.
    pub fn variadic(name: impl Into<String>, element: TypeDesc) -> Self {
        Self {
            name: name.into(),
            ty: TypeDesc::Array(Box::new(element)),
            variadic: true,
        }
    }
}

/// One declared method.
#[derive(Clone)]
pub struct MethodInfo {
    pub name: String,
    pub params: Vec<ParamInfo>,
    pub returns: TypeDesc,
    /// Explicitly hidden from script code.
    pub ignored: bool,
    /// Compiler- or framework-generated member (constructor, operator, ...).
    pub special: bool,
    pub invoker: Invoker,
}

/// One declared property.
#[derive(Clone)]
pub struct PropertyInfo {
    pub name: String,
    pub ty: TypeDesc,
    pub ignored: bool,
    pub special: bool,
    /// Takes an index argument; never exposed.
    pub indexer: bool,
    pub getter: Option<Getter>,
    pub setter: Option<Setter>,
}

impl PropertyInfo {
    #[must_use]
    pub fn readable(&self) -> bool {
        self.getter.is_some()
    }

    /// Properties that are candidates for exposure at all.
    pub(crate) fn is_exposable(&self) -> bool {
        !self.ignored && !self.special && !self.indexer && self.ty != TypeDesc::TypeDescriptor
    }
}
