use std::fmt;
use std::sync::Arc;

use objbridge_core::NamingConvention;
use serde::{Deserialize, Serialize};

use crate::binding::{Binder, MethodInterceptor, NameConverter};

/// Registry-wide configuration, fixed at construction.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Whether objects may be registered in synchronous mode.
    pub allow_sync_binding: bool,
    /// Nesting limit when decomposing host objects into plain values.
    pub max_value_depth: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            allow_sync_binding: false,
            max_value_depth: 8,
        }
    }
}

/// Per-registration options.
#[derive(Clone, Default)]
pub struct BindingOptions {
    pub naming: NamingConvention,
    /// Overrides `naming` when set.
    pub name_converter: Option<Arc<dyn NameConverter>>,
    /// Coerces arguments into declared parameter types.
    pub binder: Option<Arc<dyn Binder>>,
    /// Wraps every method call on the registered object tree.
    pub interceptor: Option<Arc<dyn MethodInterceptor>>,
}

impl BindingOptions {
    #[must_use]
    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    #[must_use]
    pub fn with_name_converter(mut self, converter: Arc<dyn NameConverter>) -> Self {
        self.name_converter = Some(converter);
        self
    }

    #[must_use]
    pub fn with_binder(mut self, binder: Arc<dyn Binder>) -> Self {
        self.binder = Some(binder);
        self
    }

    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn MethodInterceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    /// Script-visible name for a declared member name.
    #[must_use]
    pub fn script_name(&self, declared: &str) -> String {
        match &self.name_converter {
            Some(converter) => converter.convert(declared),
            None => self.naming.apply(declared),
        }
    }

    #[must_use]
    pub fn camel_case_names(&self) -> bool {
        self.name_converter.is_none() && self.naming == NamingConvention::CamelCase
    }
}

impl fmt::Debug for BindingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingOptions")
            .field("naming", &self.naming)
            .field("name_converter", &self.name_converter.is_some())
            .field("binder", &self.binder.is_some())
            .field("interceptor", &self.interceptor.is_some())
            .finish()
    }
}

/// How the invocation queue orders execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPolicy {
    /// One unit of work at a time, in arrival order.
    #[default]
    Sequential,
    /// Units are handed to the executor as soon as they are dequeued;
    /// completions may arrive out of order.
    Concurrent,
}

/// Invocation queue configuration.
#[derive(Debug, Clone, Default)]
pub struct QueueConfig {
    pub policy: ExecutionPolicy,
    /// Runtime that runs units of work under [`ExecutionPolicy::Concurrent`].
    /// Defaults to the runtime that calls `start()`.
    pub executor: Option<tokio::runtime::Handle>,
}

impl QueueConfig {
    #[must_use]
    pub fn concurrent() -> Self {
        Self {
            policy: ExecutionPolicy::Concurrent,
            executor: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::AsDeclaredNameConverter;

    #[test]
    fn repository_config_defaults() {
        let config = RepositoryConfig::default();
        assert!(!config.allow_sync_binding);
        assert_eq!(config.max_value_depth, 8);
    }

    #[test]
    fn binding_options_default_to_camel_case() {
        let options = BindingOptions::default();
        assert!(options.camel_case_names());
        assert_eq!(options.script_name("get_value"), "getValue");
    }

    #[test]
    fn converter_overrides_naming() {
        let options = BindingOptions::default()
            .with_name_converter(Arc::new(AsDeclaredNameConverter));
        assert!(!options.camel_case_names());
        assert_eq!(options.script_name("get_value"), "get_value");

        let declared = BindingOptions::default().with_naming(NamingConvention::AsDeclared);
        assert_eq!(declared.script_name("GetValue"), "GetValue");
    }

    #[test]
    fn queue_config_defaults_to_sequential() {
        assert_eq!(QueueConfig::default().policy, ExecutionPolicy::Sequential);
        assert_eq!(QueueConfig::concurrent().policy, ExecutionPolicy::Concurrent);
    }

    #[test]
    fn execution_policy_deserializes_lowercase() {
        let policy: ExecutionPolicy = serde::Deserialize::deserialize(
            serde::de::value::StrDeserializer::<serde::de::value::Error>::new("concurrent"),
        )
        .unwrap();
        assert_eq!(policy, ExecutionPolicy::Concurrent);
    }
}
