/// Hard faults raised by the object registry.
///
/// Registration errors are misuse of the registration API. The `*NotFound`
/// variants mean the remote side and the registry disagree about what exists;
/// they are not expected in correct operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("object name must not be empty")]
    InvalidName,
    #[error("no value supplied for object '{name}'")]
    InvalidValue { name: String },
    #[error("an object named '{name}' is already bound")]
    DuplicateName { name: String },
    #[error("cannot bind '{name}': values of type {type_name} must be wrapped in a host object")]
    UnsupportedType { name: String, type_name: String },
    #[error("cannot bind '{name}' synchronously: synchronous binding is disabled")]
    SynchronousBindingDisabled { name: String },
    #[error("object {object_id} not found")]
    ObjectNotFound { object_id: i64 },
    #[error("method '{name}' not found on object {object_id}")]
    MethodNotFound { object_id: i64, name: String },
    #[error("property '{name}' not found on object {object_id}")]
    PropertyNotFound { object_id: i64, name: String },
}

impl RegistryError {
    /// `true` for lookup misses during invocation (remote/local desync).
    #[must_use]
    pub fn is_desync(&self) -> bool {
        matches!(
            self,
            RegistryError::ObjectNotFound { .. }
                | RegistryError::MethodNotFound { .. }
                | RegistryError::PropertyNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_member() {
        let err = RegistryError::MethodNotFound {
            object_id: 4,
            name: "missing".into(),
        };
        assert_eq!(err.to_string(), "method 'missing' not found on object 4");
        assert!(err.is_desync());
        assert!(!RegistryError::InvalidName.is_desync());
    }
}
