//! Objects with a dynamic member dictionary.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{HostObject, HostValue, TypeInfo};

/// A member dictionary whose entries can change after registration.
///
/// Callable entries are exposed as methods that look the entry up again on
/// every call, so reassigning a member changes script-visible behavior.
pub trait DynamicMembers: Send + Sync {
    /// Names of the current members, in a stable order.
    fn member_names(&self) -> Vec<String>;

    /// Current value of a member.
    fn member(&self, name: &str) -> Option<HostValue>;

    /// Adds or replaces a member.
    fn set_member(&self, name: &str, value: HostValue);
}

/// A host object made of dynamic members only.
#[derive(Default)]
pub struct ExpandoObject {
    members: RwLock<BTreeMap<String, HostValue>>,
}

impl ExpandoObject {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member during construction.
    #[must_use]
    pub fn with(self, name: impl Into<String>, value: impl Into<HostValue>) -> Self {
        self.members.write().insert(name.into(), value.into());
        self
    }

    /// Removes a member, returning its last value.
    pub fn remove(&self, name: &str) -> Option<HostValue> {
        self.members.write().remove(name)
    }
}

impl DynamicMembers for ExpandoObject {
    fn member_names(&self) -> Vec<String> {
        self.members.read().keys().cloned().collect()
    }

    fn member(&self, name: &str) -> Option<HostValue> {
        self.members.read().get(name).cloned()
    }

    fn set_member(&self, name: &str, value: HostValue) {
        self.members.write().insert(name.to_string(), value);
    }
}

impl HostObject for ExpandoObject {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::builder::<Self>().build()
    }

    fn dynamic_members(&self) -> Option<&dyn DynamicMembers> {
        Some(self)
    }
}
