//! Fluent builder for [`TypeInfo`].
//!
//! ```ignore
//! impl HostObject for Counter {
//!     fn type_info(&self) -> TypeInfo {
//!         TypeInfo::builder::<Self>()
//!             .property_rw("value", TypeDesc::Int, |c| Ok(c.get().into()), |c, v| c.set(v))
//!             .method("increment", vec![], TypeDesc::Int, |c, _| Ok(c.increment().into()))
//!             .async_method("reset_later", vec![], TypeDesc::Task(None), |c, _| async move {
//!                 c.reset().await;
//!                 Ok(HostValue::null())
//!             })
//!             .build()
//!     }
//! }
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use objbridge_core::TypeDesc;

use super::{
    downcast_arc, downcast_ref, CallFuture, Getter, HostObject, HostValue, Invoker, MethodInfo,
    ParamInfo, PropertyInfo, Setter, TypeInfo,
};

/// Which member the modifier methods (`ignore`, `special`, `indexer`) apply to.
#[derive(Debug, Clone, Copy)]
enum LastMember {
    Method,
    Property,
}

/// Builder for the [`TypeInfo`] of host type `T`.
///
/// Closures are typed over `T`; the builder erases them into thunks that
/// downcast the target object before running.
pub struct TypeInfoBuilder<T> {
    ty: TypeDesc,
    methods: Vec<MethodInfo>,
    properties: Vec<PropertyInfo>,
    last: Option<LastMember>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: HostObject> TypeInfoBuilder<T> {
    pub(super) fn new() -> Self {
        Self {
            ty: TypeDesc::object_of::<T>(),
            methods: Vec::new(),
            properties: Vec::new(),
            last: None,
            _marker: PhantomData,
        }
    }

    /// Overrides the declared type (e.g. to describe a proxy as another type).
    #[must_use]
    pub fn type_desc(mut self, ty: TypeDesc) -> Self {
        self.ty = ty;
        self
    }

    /// Adds a synchronous method.
    #[must_use]
    pub fn method<F>(
        mut self,
        name: impl Into<String>,
        params: Vec<ParamInfo>,
        returns: TypeDesc,
        f: F,
    ) -> Self
    where
        F: Fn(&T, Vec<HostValue>) -> anyhow::Result<HostValue> + Send + Sync + 'static,
    {
        let invoker: Invoker = Arc::new(
            move |target: Arc<dyn HostObject>, args: Vec<HostValue>| -> CallFuture {
                let result = downcast_ref::<T>(target.as_ref()).and_then(|this| f(this, args));
                Box::pin(async move { result })
            },
        );
        self.push_method(name.into(), params, returns, invoker);
        self
    }

    /// Adds a method whose body suspends.
    #[must_use]
    pub fn async_method<F, Fut>(
        mut self,
        name: impl Into<String>,
        params: Vec<ParamInfo>,
        returns: TypeDesc,
        f: F,
    ) -> Self
    where
        F: Fn(Arc<T>, Vec<HostValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<HostValue>> + Send + 'static,
    {
        let invoker: Invoker = Arc::new(
            move |target: Arc<dyn HostObject>, args: Vec<HostValue>| -> CallFuture {
                match downcast_arc::<T>(target) {
                    Ok(this) => Box::pin(f(this, args)),
                    Err(e) => Box::pin(async move { Err(e) }),
                }
            },
        );
        self.push_method(name.into(), params, returns, invoker);
        self
    }

    /// Adds a read-only property.
    #[must_use]
    pub fn property<G>(mut self, name: impl Into<String>, ty: TypeDesc, get: G) -> Self
    where
        G: Fn(&T) -> anyhow::Result<HostValue> + Send + Sync + 'static,
    {
        let getter = Self::erase_getter(get);
        self.push_property(name.into(), ty, Some(getter), None);
        self
    }

    /// Adds a read-write property.
    #[must_use]
    pub fn property_rw<G, S>(mut self, name: impl Into<String>, ty: TypeDesc, get: G, set: S) -> Self
    where
        G: Fn(&T) -> anyhow::Result<HostValue> + Send + Sync + 'static,
        S: Fn(&T, HostValue) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let getter = Self::erase_getter(get);
        let setter: Setter = Arc::new(move |target: &dyn HostObject, value: HostValue| {
            downcast_ref::<T>(target).and_then(|this| set(this, value))
        });
        self.push_property(name.into(), ty, Some(getter), Some(setter));
        self
    }

    /// Hides the last added member from script code.
    #[must_use]
    pub fn ignore(mut self) -> Self {
        match self.last {
            Some(LastMember::Method) => {
                if let Some(m) = self.methods.last_mut() {
                    m.ignored = true;
                }
            }
            Some(LastMember::Property) => {
                if let Some(p) = self.properties.last_mut() {
                    p.ignored = true;
                }
            }
            None => {}
        }
        self
    }

    /// Marks the last added member as framework-generated.
    #[must_use]
    pub fn special(mut self) -> Self {
        match self.last {
            Some(LastMember::Method) => {
                if let Some(m) = self.methods.last_mut() {
                    m.special = true;
                }
            }
            Some(LastMember::Property) => {
                if let Some(p) = self.properties.last_mut() {
                    p.special = true;
                }
            }
            None => {}
        }
        self
    }

    /// Marks the last added property as an indexer.
    #[must_use]
    pub fn indexer(mut self) -> Self {
        if let (Some(LastMember::Property), Some(p)) = (self.last, self.properties.last_mut()) {
            p.indexer = true;
        }
        self
    }

    #[must_use]
    pub fn build(self) -> TypeInfo {
        TypeInfo {
            ty: self.ty,
            methods: self.methods,
            properties: self.properties,
        }
    }

    fn erase_getter<G>(get: G) -> Getter
    where
        G: Fn(&T) -> anyhow::Result<HostValue> + Send + Sync + 'static,
    {
        Arc::new(move |target: &dyn HostObject| downcast_ref::<T>(target).and_then(&get))
    }

    fn push_method(&mut self, name: String, params: Vec<ParamInfo>, returns: TypeDesc, invoker: Invoker) {
        self.methods.push(MethodInfo {
            name,
            params,
            returns,
            ignored: false,
            special: false,
            invoker,
        });
        self.last = Some(LastMember::Method);
    }

    fn push_property(
        &mut self,
        name: String,
        ty: TypeDesc,
        getter: Option<Getter>,
        setter: Option<Setter>,
    ) {
        self.properties.push(PropertyInfo {
            name,
            ty,
            ignored: false,
            special: false,
            indexer: false,
            getter,
            setter,
        });
        self.last = Some(LastMember::Property);
    }
}

#[cfg(test)]
mod tests {
    use objbridge_core::Value;
    use parking_lot::Mutex;

    use super::*;

    struct Lamp {
        lit: Mutex<bool>,
    }

    impl HostObject for Lamp {
        fn type_info(&self) -> TypeInfo {
            TypeInfo::builder::<Self>()
                .property_rw(
                    "lit",
                    TypeDesc::Bool,
                    |lamp| Ok((*lamp.lit.lock()).into()),
                    |lamp, value| {
                        *lamp.lit.lock() = matches!(value, HostValue::Value(Value::Bool(true)));
                        Ok(())
                    },
                )
                .property("wattage", TypeDesc::Int, |_| Ok(60_i64.into()))
                .indexer()
                .method("toggle", vec![], TypeDesc::Bool, |lamp, _| {
                    let mut lit = lamp.lit.lock();
                    *lit = !*lit;
                    Ok((*lit).into())
                })
                .async_method("flash", vec![], TypeDesc::Task(None), |lamp, _| async move {
                    *lamp.lit.lock() = true;
                    Ok(HostValue::null())
                })
                .ignore()
                .build()
        }
    }

    fn lamp() -> Arc<dyn HostObject> {
        Arc::new(Lamp {
            lit: Mutex::new(false),
        })
    }

    #[test]
    fn builder_records_members_and_modifiers() {
        let info = lamp().type_info();
        assert_eq!(info.ty, TypeDesc::object_of::<Lamp>());
        assert_eq!(info.methods.len(), 2);
        assert!(!info.methods[0].ignored);
        assert!(info.methods[1].ignored);
        assert!(!info.properties[0].indexer);
        assert!(info.properties[1].indexer);
        assert!(info.properties[0].setter.is_some());
        assert!(info.properties[1].setter.is_none());
    }

    #[tokio::test]
    async fn erased_thunks_reach_the_concrete_type() {
        let object = lamp();
        let info = object.type_info();

        let toggled = (info.methods[0].invoker)(Arc::clone(&object), vec![]).await.unwrap();
        assert_eq!(toggled.into_value(), Some(Value::Bool(true)));

        let setter = info.properties[0].setter.as_ref().unwrap();
        setter(object.as_ref(), false.into()).unwrap();
        let getter = info.properties[0].getter.as_ref().unwrap();
        assert_eq!(getter(object.as_ref()).unwrap().into_value(), Some(Value::Bool(false)));

        (info.methods[1].invoker)(Arc::clone(&object), vec![]).await.unwrap();
        assert_eq!(getter(object.as_ref()).unwrap().into_value(), Some(Value::Bool(true)));
    }

    #[test]
    fn type_desc_override() {
        struct Point;
        impl HostObject for Point {
            fn type_info(&self) -> TypeInfo {
                TypeInfo::builder::<Self>()
                    .type_desc(TypeDesc::Struct("geo::Point".into()))
                    .build()
            }
        }
        assert_eq!(Point.type_info().ty, TypeDesc::Struct("geo::Point".into()));
    }
}
