//! Service container - dependencies handlers are built from.
//!
//! Provides:
//! - [`Services`] - singleton values and scoped factories, frozen at build time
//! - [`Scope`] - per-call resolution context, releases scoped instances on drop
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mediator::services::{Scope, Services};
//!
//! struct Clock;
//! struct UnitOfWork {
//!     clock: Arc<Clock>,
//! }
//!
//! let mut services = Services::new();
//! services.add_singleton(Clock);
//! services.add_scoped(|scope: &Scope| {
//!     Ok(UnitOfWork {
//!         clock: scope.resolve::<Clock>()?,
//!     })
//! });
//!
//! let scope = Scope::new(Arc::new(services));
//! let first = scope.resolve::<UnitOfWork>().unwrap();
//! let second = scope.resolve::<UnitOfWork>().unwrap();
//! assert!(Arc::ptr_eq(&first, &second));
//! ```

mod scope;

pub use scope::Scope;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{MediatorError, Result};
use crate::message::type_name_of;

/// Type-erased shared instance.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// Factory producing one scoped instance per scope.
type ScopedFactory = Arc<dyn Fn(&Scope) -> Result<Instance> + Send + Sync>;

/// Container of singleton values and scoped factories.
///
/// Populated once while building the mediator and read-only afterwards.
#[derive(Clone, Default)]
pub struct Services {
    /// Shared values, one per type.
    singletons: HashMap<TypeId, Instance>,
    /// Factories invoked at most once per scope.
    scoped: HashMap<TypeId, ScopedFactory>,
}

impl Services {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value shared by every scope.
    ///
    /// Registering the same type twice replaces the earlier value.
    pub fn add_singleton<T>(&mut self, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.add_singleton_arc(Arc::new(value));
    }

    /// Register an already shared value.
    pub fn add_singleton_arc<T>(&mut self, value: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        tracing::debug!("Registered singleton {}", type_name_of::<T>());
        self.singletons.insert(TypeId::of::<T>(), value);
    }

    /// Register a factory creating one instance of `T` per scope.
    ///
    /// Scoped registrations shadow singletons of the same type.
    pub fn add_scoped<T, F>(&mut self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Scope) -> Result<T> + Send + Sync + 'static,
    {
        tracing::debug!("Registered scoped service {}", type_name_of::<T>());
        let erased: ScopedFactory = Arc::new(move |scope: &Scope| {
            let value = factory(scope)?;
            Ok(Arc::new(value) as Instance)
        });
        self.scoped.insert(TypeId::of::<T>(), erased);
    }

    /// Whether `T` can be resolved from a scope over this container.
    pub fn contains<T: 'static>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.scoped.contains_key(&id) || self.singletons.contains_key(&id)
    }

    /// Number of registered services (singletons plus scoped factories).
    pub fn len(&self) -> usize {
        self.singletons.len() + self.scoped.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn singleton(&self, id: &TypeId) -> Option<Instance> {
        self.singletons.get(id).cloned()
    }

    pub(crate) fn scoped_factory(&self, id: &TypeId) -> Option<ScopedFactory> {
        self.scoped.get(id).cloned()
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("singletons", &self.singletons.len())
            .field("scoped", &self.scoped.len())
            .finish()
    }
}

/// Recover a typed handle from an erased instance.
pub(crate) fn downcast_instance<T>(instance: Instance) -> Result<Arc<T>>
where
    T: Send + Sync + 'static,
{
    instance
        .downcast::<T>()
        .map_err(|_| MediatorError::TypeMismatch(type_name_of::<T>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Config {
        name: &'static str,
    }

    #[test]
    fn test_empty_container() {
        let services = Services::new();
        assert!(services.is_empty());
        assert!(!services.contains::<Config>());
    }

    #[test]
    fn test_contains_after_registration() {
        let mut services = Services::new();
        services.add_singleton(Config { name: "main" });
        services.add_scoped(|_scope: &Scope| Ok(String::from("per call")));

        assert!(services.contains::<Config>());
        assert!(services.contains::<String>());
        assert_eq!(services.len(), 2);
    }

    #[test]
    fn test_singleton_replaced() {
        let mut services = Services::new();
        services.add_singleton(Config { name: "first" });
        services.add_singleton(Config { name: "second" });

        assert_eq!(services.len(), 1);
        let instance = services.singleton(&TypeId::of::<Config>()).unwrap();
        let config = downcast_instance::<Config>(instance).unwrap();
        assert_eq!(config.name, "second");
    }

    #[test]
    fn test_downcast_mismatch() {
        let instance: Instance = Arc::new(5u32);
        let result = downcast_instance::<String>(instance);
        assert!(matches!(result, Err(MediatorError::TypeMismatch(_))));
    }
}
