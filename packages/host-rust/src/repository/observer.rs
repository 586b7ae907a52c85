//! Registry notifications.
//!
//! [`RepositoryObserver`] receives resolve requests (a chance to register
//! objects lazily) and "objects bound" reports from the remote side.
//! [`CompositeObserver`] fans each notification out to several observers.

use std::sync::Arc;

use objbridge_core::BoundObjectNotice;

use super::ObjectRepository;

/// What a resolve notification asks the host to bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveTarget {
    /// Script code enumerated every object.
    All,
    /// Script code asked for one object that is not bound yet.
    Named(String),
}

/// Observer of registry events. All methods default to no-ops.
///
/// Used as `Arc<dyn RepositoryObserver>`.
pub trait RepositoryObserver: Send + Sync {
    /// Called synchronously from `list_objects` before results are computed.
    /// Objects registered on `repository` here are included in the result.
    fn on_resolve_object(&self, _repository: &ObjectRepository, _target: &ResolveTarget) {}

    /// Called once per object reported bound by the remote side.
    fn on_object_bound(&self, _notice: &BoundObjectNotice) {}

    /// Called once per report, after the per-object calls.
    fn on_objects_bound(&self, _names: &[String]) {}
}

/// Composite observer that fans out to multiple observers.
#[derive(Clone, Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn RepositoryObserver>>,
}

impl CompositeObserver {
    pub fn add(&mut self, observer: Arc<dyn RepositoryObserver>) {
        self.observers.push(observer);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl RepositoryObserver for CompositeObserver {
    fn on_resolve_object(&self, repository: &ObjectRepository, target: &ResolveTarget) {
        for observer in &self.observers {
            observer.on_resolve_object(repository, target);
        }
    }

    fn on_object_bound(&self, notice: &BoundObjectNotice) {
        for observer in &self.observers {
            observer.on_object_bound(notice);
        }
    }

    fn on_objects_bound(&self, names: &[String]) {
        for observer in &self.observers {
            observer.on_objects_bound(names);
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    struct Tracking {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl RepositoryObserver for Tracking {
        fn on_object_bound(&self, notice: &BoundObjectNotice) {
            self.log.lock().push(format!("{}:{}", self.tag, notice.name));
        }

        fn on_objects_bound(&self, names: &[String]) {
            self.log.lock().push(format!("{}:all:{}", self.tag, names.len()));
        }
    }

    #[test]
    fn composite_fans_out_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut composite = CompositeObserver::default();
        assert!(composite.is_empty());
        composite.add(Arc::new(Tracking { tag: "a", log: log.clone() }));
        composite.add(Arc::new(Tracking { tag: "b", log: log.clone() }));

        composite.on_object_bound(&BoundObjectNotice {
            name: "api".into(),
            already_bound: false,
            cached: false,
        });
        composite.on_objects_bound(&["api".to_string()]);

        assert_eq!(
            *log.lock(),
            vec!["a:api", "b:api", "a:all:1", "b:all:1"]
        );
    }
}
