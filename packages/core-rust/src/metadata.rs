//! Serializable object metadata sent to the remote side.
//!
//! These descriptors are the wire projection of the host registry's bound
//! objects: everything the script side needs to build proxies, minus the
//! invocation thunks. Identities are echoed back verbatim in requests.

use serde::{Deserialize, Serialize};

use crate::types::Value;

/// Metadata of one bound object, including nested complex properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescriptor {
    pub id: i64,
    /// Registration name (roots) or declared member name (children).
    pub name: String,
    pub script_name: String,
    pub is_async: bool,
    pub camel_case_names: bool,
    /// `true` for top-level registrations.
    pub root: bool,
    pub methods: Vec<MethodDescriptor>,
    pub properties: Vec<PropertyDescriptor>,
}

impl ObjectDescriptor {
    #[must_use]
    pub fn method(&self, script_name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.script_name == script_name)
    }

    #[must_use]
    pub fn property(&self, script_name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.script_name == script_name)
    }
}

/// Metadata of one exposed method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    pub script_name: String,
    pub name: String,
    pub parameter_count: usize,
}

/// Metadata of one exposed property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    pub script_name: String,
    pub name: String,
    pub read_only: bool,
    pub complex: bool,
    /// Eagerly read value, present only for simple properties read at analysis time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Nested object for complex properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Box<ObjectDescriptor>>,
}
