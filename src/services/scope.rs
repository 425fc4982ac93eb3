//! Per-call resolution scope.
//!
//! A [`Scope`] is opened at the start of every `send`/`publish` and dropped
//! when the call finishes, on every exit path. Scoped services are created
//! at most once per scope and released in reverse creation order on drop.
//! Singletons are shared and survive the scope.

use std::any::TypeId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{downcast_instance, Instance, Services};
use crate::error::{MediatorError, Result};
use crate::message::type_name_of;
use crate::Mediator;

/// Scope IDs, for tracing only.
static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Resolution context owned by a single mediator call.
///
/// # Thread Safety
///
/// `Scope` is `Send + Sync` so that handler futures borrowing it can move
/// between runtime threads. It is never shared between calls.
pub struct Scope {
    /// Scope ID.
    id: u64,
    /// Registered services.
    services: Arc<Services>,
    /// Mediator that opened this scope, if any.
    mediator: Option<Arc<Mediator>>,
    /// Scoped instances in creation order.
    instances: Mutex<Vec<(TypeId, Instance)>>,
    /// Scoped types whose factories are running.
    resolving: Mutex<Vec<TypeId>>,
}

impl Scope {
    /// Open a new scope over the given services.
    pub fn new(services: Arc<Services>) -> Self {
        let id = NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(scope = id, "Scope opened");
        Self {
            id,
            services,
            mediator: None,
            instances: Mutex::new(Vec::new()),
            resolving: Mutex::new(Vec::new()),
        }
    }

    /// Open a scope that hands out `mediator` to the handlers built in it.
    pub fn with_mediator(services: Arc<Services>, mediator: Mediator) -> Self {
        let mut scope = Self::new(services);
        scope.mediator = Some(Arc::new(mediator));
        scope
    }

    /// Get the scope ID.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The mediator that opened this scope.
    ///
    /// Handlers use it to send or publish nested messages.
    pub fn mediator(&self) -> Option<&Mediator> {
        self.mediator.as_deref()
    }

    /// Number of scoped instances created so far.
    pub fn instance_count(&self) -> usize {
        self.instances.lock().len()
    }

    /// Resolve a service.
    ///
    /// Lookup order: the owning [`Mediator`], instance already created in
    /// this scope, scoped factory, singleton. Factories may resolve other
    /// services from the same scope; a factory that (directly or not)
    /// resolves its own type fails with
    /// [`MediatorError::CircularDependency`].
    pub fn resolve<T>(&self) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let id = TypeId::of::<T>();

        if id == TypeId::of::<Mediator>() {
            if let Some(mediator) = &self.mediator {
                return downcast_instance(mediator.clone() as Instance);
            }
        }

        if let Some(existing) = self.cached(&id) {
            return downcast_instance(existing);
        }

        if let Some(factory) = self.services.scoped_factory(&id) {
            {
                let mut resolving = self.resolving.lock();
                if resolving.contains(&id) {
                    return Err(MediatorError::CircularDependency(type_name_of::<T>()));
                }
                resolving.push(id);
            }

            // Locks are not held while the factory runs.
            let created = factory(self);
            self.resolving.lock().retain(|key| *key != id);
            let created = created?;

            let mut instances = self.instances.lock();
            if let Some((_, existing)) = instances.iter().find(|(key, _)| *key == id) {
                return downcast_instance(existing.clone());
            }
            instances.push((id, created.clone()));
            tracing::trace!(scope = self.id, "Created scoped {}", type_name_of::<T>());
            return downcast_instance(created);
        }

        match self.services.singleton(&id) {
            Some(singleton) => downcast_instance(singleton),
            None => Err(MediatorError::ServiceNotFound(type_name_of::<T>())),
        }
    }

    /// Resolve a service, returning `None` when it is not registered.
    pub fn try_resolve<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.resolve::<T>().ok()
    }

    fn cached(&self, id: &TypeId) -> Option<Instance> {
        self.instances
            .lock()
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, instance)| instance.clone())
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let instances = self.instances.get_mut();
        let released = instances.len();
        while let Some((_, instance)) = instances.pop() {
            drop(instance);
        }
        tracing::trace!(scope = self.id, released, "Scope closed");
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("instances", &self.instance_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Connection {
        released: Arc<AtomicUsize>,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Drop for Connection {
        fn drop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
            self.order.lock().push("connection");
        }
    }

    struct Repository {
        _connection: Arc<Connection>,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Drop for Repository {
        fn drop(&mut self) {
            self.order.lock().push("repository");
        }
    }

    fn services(released: Arc<AtomicUsize>, order: Arc<Mutex<Vec<&'static str>>>) -> Arc<Services> {
        let mut services = Services::new();
        let conn_order = order.clone();
        services.add_scoped(move |_scope: &Scope| {
            Ok(Connection {
                released: released.clone(),
                order: conn_order.clone(),
            })
        });
        services.add_scoped(move |scope: &Scope| {
            Ok(Repository {
                _connection: scope.resolve::<Connection>()?,
                order: order.clone(),
            })
        });
        services.add_singleton(String::from("shared"));
        Arc::new(services)
    }

    #[test]
    fn test_scoped_instance_shared_within_scope() {
        let released = Arc::new(AtomicUsize::new(0));
        let scope = Scope::new(services(released, Arc::default()));

        let first = scope.resolve::<Connection>().unwrap();
        let second = scope.resolve::<Connection>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(scope.instance_count(), 1);
    }

    #[test]
    fn test_scoped_instance_distinct_across_scopes() {
        let released = Arc::new(AtomicUsize::new(0));
        let services = services(released, Arc::default());

        let a = Scope::new(services.clone());
        let b = Scope::new(services);

        let from_a = a.resolve::<Connection>().unwrap();
        let from_b = b.resolve::<Connection>().unwrap();
        assert!(!Arc::ptr_eq(&from_a, &from_b));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_release_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let scope = Scope::new(services(released.clone(), Arc::default()));

        scope.resolve::<Connection>().unwrap();
        assert_eq!(released.load(Ordering::SeqCst), 0);

        drop(scope);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let scope = Scope::new(services(Arc::default(), order.clone()));

        scope.resolve::<Repository>().unwrap();
        assert_eq!(scope.instance_count(), 2);

        drop(scope);
        assert_eq!(*order.lock(), vec!["repository", "connection"]);
    }

    #[test]
    fn test_singleton_outlives_scope() {
        let services = services(Arc::default(), Arc::default());
        let scope = Scope::new(services.clone());

        let shared = scope.resolve::<String>().unwrap();
        drop(scope);

        assert_eq!(shared.as_str(), "shared");
        let again = Scope::new(services).resolve::<String>().unwrap();
        assert!(Arc::ptr_eq(&shared, &again));
    }

    #[test]
    fn test_missing_service() {
        let scope = Scope::new(Arc::new(Services::new()));

        let result = scope.resolve::<u64>();
        assert!(matches!(result, Err(MediatorError::ServiceNotFound("u64"))));
        assert!(scope.try_resolve::<u64>().is_none());
    }

    #[derive(Debug)]
    struct Ping;
    #[derive(Debug)]
    struct Pong;

    #[test]
    fn test_circular_dependency_reported() {
        let mut services = Services::new();
        services.add_scoped(|scope: &Scope| {
            scope.resolve::<Pong>()?;
            Ok(Ping)
        });
        services.add_scoped(|scope: &Scope| {
            scope.resolve::<Ping>()?;
            Ok(Pong)
        });
        let scope = Scope::new(Arc::new(services));

        let err = scope.resolve::<Ping>().unwrap_err();
        assert!(matches!(err, MediatorError::CircularDependency(name) if name.ends_with("Ping")));
        assert_eq!(scope.instance_count(), 0);

        // Nothing left marked as in progress after the failure
        assert!(scope.resolving.lock().is_empty());
    }

    #[test]
    fn test_self_dependency_reported() {
        let mut services = Services::new();
        services.add_scoped(|scope: &Scope| {
            scope.resolve::<Ping>()?;
            Ok(Ping)
        });
        let scope = Scope::new(Arc::new(services));

        assert!(matches!(
            scope.resolve::<Ping>(),
            Err(MediatorError::CircularDependency(_))
        ));
    }

    #[test]
    fn test_plain_scope_has_no_mediator() {
        let scope = Scope::new(Arc::new(Services::new()));

        assert!(scope.mediator().is_none());
        assert!(matches!(
            scope.resolve::<Mediator>(),
            Err(MediatorError::ServiceNotFound(_))
        ));
    }

    #[test]
    fn test_scope_hands_out_its_mediator() {
        let mediator = Mediator::builder()
            .publish_policy(crate::PublishPolicy::CollectAll)
            .build();
        let scope = Scope::with_mediator(Arc::new(Services::new()), mediator);

        let borrowed = scope.mediator().unwrap();
        assert_eq!(borrowed.config().publish_policy, crate::PublishPolicy::CollectAll);
        let resolved = scope.resolve::<Mediator>().unwrap();
        assert_eq!(resolved.config().publish_policy, crate::PublishPolicy::CollectAll);
    }
}
