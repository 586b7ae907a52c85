//! Registry of host objects exposed to script code.
//!
//! [`ObjectRepository`] owns every bound object in an identity-indexed arena.
//! Registration analyzes a host object once into a tree of [`BoundObject`]
//! records; calls, gets and sets then dispatch through that metadata.

mod analysis;
mod bound;
mod dispatch;
mod error;
mod observer;

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use objbridge_core::{BoundObjectNotice, ObjectDescriptor};
use tracing::{debug, warn};

use crate::config::{BindingOptions, RepositoryConfig};
use crate::reflect::{HostObject, HostValue};
use analysis::{AnalysisFlags, Analyzer};

pub use bound::{BoundObject, Method, Parameter, Property};
pub use error::RegistryError;
pub use observer::{CompositeObserver, RepositoryObserver, ResolveTarget};

/// Last identity handed out. Shared by every repository in the process so
/// identities stay unique across registries.
static LAST_OBJECT_ID: AtomicI64 = AtomicI64::new(0);

/// Allocates a process-unique object identity.
pub fn next_object_id() -> i64 {
    LAST_OBJECT_ID.fetch_add(1, Ordering::Relaxed) + 1
}

/// Maps identities to bound objects and registration names to root identities.
pub struct ObjectRepository {
    config: RepositoryConfig,
    objects: DashMap<i64, Arc<BoundObject>>,
    /// Lowercased registration name -> root identity.
    names: DashMap<String, i64>,
    observers: ArcSwap<CompositeObserver>,
}

impl ObjectRepository {
    #[must_use]
    pub fn new(config: RepositoryConfig) -> Self {
        Self {
            config,
            objects: DashMap::new(),
            names: DashMap::new(),
            observers: ArcSwap::from_pointee(CompositeObserver::default()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Binds a host object under `name` and returns its identity.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] when the name is empty or taken, the value
    /// is absent or of an unsupported type, or synchronous binding is
    /// requested while disabled.
    pub fn register(
        &self,
        name: &str,
        value: HostValue,
        is_async: bool,
        options: BindingOptions,
    ) -> Result<i64, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::InvalidName);
        }
        if value.is_missing() || value.is_null() {
            return Err(RegistryError::InvalidValue {
                name: name.to_string(),
            });
        }
        if self.is_bound(name) {
            return Err(RegistryError::DuplicateName {
                name: name.to_string(),
            });
        }
        let object = match value {
            HostValue::Object(object) => object,
            HostValue::Value(v) => {
                return Err(RegistryError::UnsupportedType {
                    name: name.to_string(),
                    type_name: v.kind_name().to_string(),
                })
            }
            HostValue::Function(func) => {
                return Err(RegistryError::UnsupportedType {
                    name: name.to_string(),
                    type_name: func.signature().to_string(),
                })
            }
            HostValue::Missing => {
                return Err(RegistryError::InvalidValue {
                    name: name.to_string(),
                })
            }
        };
        let ty = object.type_info().ty;
        if ty.is_builtin() || ty.is_primitive() || ty == objbridge_core::TypeDesc::String {
            return Err(RegistryError::UnsupportedType {
                name: name.to_string(),
                type_name: ty.to_string(),
            });
        }
        if !is_async && !self.config.allow_sync_binding {
            return Err(RegistryError::SynchronousBindingDisabled {
                name: name.to_string(),
            });
        }

        let id = next_object_id();
        match self.names.entry(name.to_lowercase()) {
            Entry::Occupied(_) => {
                return Err(RegistryError::DuplicateName {
                    name: name.to_string(),
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let created = Analyzer::new(&options, id, is_async).run(
            id,
            name,
            name.to_string(),
            object,
            AnalysisFlags::registration(is_async),
        );
        let count = created.len();
        self.insert_tree(id, created);
        debug!(object_id = id, name, is_async, objects = count, "registered object");
        Ok(id)
    }

    /// Convenience wrapper for [`register`](Self::register) with a concrete host type.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_object<T: HostObject>(
        &self,
        name: &str,
        object: Arc<T>,
        is_async: bool,
        options: BindingOptions,
    ) -> Result<i64, RegistryError> {
        self.register(name, HostValue::Object(object), is_async, options)
    }

    /// Removes the object bound under `name` (case-insensitive) and its whole
    /// tree. Returns whether anything was removed.
    pub fn unregister(&self, name: &str) -> bool {
        match self.names.remove(&name.to_lowercase()) {
            Some((_, root_id)) => {
                self.remove_tree(root_id);
                debug!(object_id = root_id, name, "unregistered object");
                true
            }
            None => false,
        }
    }

    /// Removes every bound object. Returns whether anything was removed.
    ///
    /// Removal is name-driven like [`unregister`](Self::unregister): a
    /// registration that races with this call is either removed whole or
    /// left bound whole.
    pub fn unregister_all(&self) -> bool {
        let bound: Vec<(String, i64)> = self
            .names
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        let removed: HashSet<i64> = bound
            .into_iter()
            .filter_map(|(key, root_id)| {
                self.names
                    .remove_if(&key, |_, id| *id == root_id)
                    .map(|(_, id)| id)
            })
            .collect();
        if removed.is_empty() {
            return false;
        }
        self.objects.retain(|_, object| !removed.contains(&object.root_id));
        debug!(roots = removed.len(), "unregistered all objects");
        true
    }

    #[must_use]
    pub fn is_bound(&self, name: &str) -> bool {
        self.names.contains_key(&name.to_lowercase())
    }

    #[must_use]
    pub fn has_bound_objects(&self) -> bool {
        !self.names.is_empty()
    }

    /// Looks up any object, root or child, by identity.
    #[must_use]
    pub fn get(&self, object_id: i64) -> Option<Arc<BoundObject>> {
        self.objects.get(&object_id).map(|entry| Arc::clone(entry.value()))
    }

    #[must_use]
    pub fn describe(&self, object_id: i64) -> Option<ObjectDescriptor> {
        self.get(object_id).map(|object| object.descriptor())
    }

    /// Describes bound root objects, giving observers a chance to bind
    /// objects on demand first.
    ///
    /// With no names every root is returned after an
    /// [`ResolveTarget::All`] notification. Otherwise each name not yet bound
    /// is resolved individually and the roots matching `names` are returned.
    pub fn list_objects(&self, names: &[String]) -> Vec<ObjectDescriptor> {
        let observers = self.observers.load_full();
        if names.is_empty() {
            if !observers.is_empty() {
                observers.on_resolve_object(self, &ResolveTarget::All);
            }
            return self.roots(|_| true);
        }

        for name in names {
            if !self.is_bound(name) && !observers.is_empty() {
                observers.on_resolve_object(self, &ResolveTarget::Named(name.clone()));
            }
        }
        let wanted: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
        self.roots(|object| wanted.contains(&object.name.to_lowercase()))
    }

    pub fn add_observer(&self, observer: Arc<dyn RepositoryObserver>) {
        self.observers.rcu(|current| {
            let mut next = CompositeObserver::clone(current);
            next.add(Arc::clone(&observer));
            next
        });
    }

    /// Reports objects the remote side finished binding.
    ///
    /// Observers are called off the calling thread, and only if there are any.
    pub fn notify_objects_bound(&self, objects: Vec<BoundObjectNotice>) {
        let observers = self.observers.load_full();
        if observers.is_empty() || objects.is_empty() {
            return;
        }
        let deliver = move || {
            for notice in &objects {
                observers.on_object_bound(notice);
            }
            let names: Vec<String> = objects.into_iter().map(|n| n.name).collect();
            observers.on_objects_bound(&names);
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(deliver);
            }
            Err(_) => {
                std::thread::spawn(deliver);
            }
        }
    }

    /// Inserts a freshly analyzed tree, unless its root was unregistered in
    /// the meantime.
    fn insert_tree(&self, root_id: i64, created: Vec<Arc<BoundObject>>) {
        for object in created {
            self.objects.insert(object.id, object);
        }
        let root_key = self
            .objects
            .get(&root_id)
            .map(|root| root.name.to_lowercase());
        let root_alive = root_key
            .and_then(|key| self.names.get(&key).map(|id| *id == root_id))
            .unwrap_or(false);
        if !root_alive {
            warn!(object_id = root_id, "object unregistered during analysis");
            self.remove_tree(root_id);
        }
    }

    fn remove_tree(&self, root_id: i64) {
        self.objects.retain(|_, object| object.root_id != root_id);
    }

    fn roots(&self, filter: impl Fn(&BoundObject) -> bool) -> Vec<ObjectDescriptor> {
        let mut roots: Vec<Arc<BoundObject>> = self
            .objects
            .iter()
            .filter(|entry| entry.value().root && filter(entry.value()))
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        roots.sort_by_key(|object| object.id);
        roots.iter().map(|object| object.descriptor()).collect()
    }
}

impl Default for ObjectRepository {
    fn default() -> Self {
        Self::new(RepositoryConfig::default())
    }
}
