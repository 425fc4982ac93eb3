//! Mediator builder and dispatch entry points.
//!
//! The [`MediatorBuilder`] collects services and handler bindings. Once
//! built, the [`Mediator`] binding table is read-only and the mediator can
//! be cloned and shared across tasks.
//!
//! Every call:
//! 1. Opens a [`Scope`] that also hands out this mediator, so handlers can
//!    send or publish nested messages
//! 2. Looks up the binding(s) for the message type
//! 3. Builds each handler inside the scope and awaits it
//! 4. Drops the scope, releasing scoped services, on every exit path
//!
//! # Example
//!
//! ```ignore
//! use mediator::Mediator;
//!
//! let mediator = Mediator::builder()
//!     .singleton(UserStore::default())
//!     .request_handler::<GetUser, GetUserHandler>()?
//!     .notification_handler::<OrderPlaced, SendReceipt>()
//!     .build();
//!
//! let user = mediator.send(GetUser { id: 1 }).await?;
//! mediator.publish(&OrderPlaced { order_id: 42 }).await?;
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{MediatorConfig, PublishPolicy};
use crate::discovery::{register_modules, resolve_modules, HandlerModule, ModuleCatalog, ModuleSelector};
use crate::error::Result;
use crate::handler::{HandlerRegistry, Injectable, NotificationHandler, RequestHandler};
use crate::message::{Notification, Request};
use crate::services::{Scope, Services};

/// Builder for configuring and creating a [`Mediator`].
pub struct MediatorBuilder {
    registry: HandlerRegistry,
    services: Services,
    config: MediatorConfig,
}

impl MediatorBuilder {
    /// Create a new mediator builder.
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::new(),
            services: Services::new(),
            config: MediatorConfig::default(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MediatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the failure policy for `publish`.
    ///
    /// Default: [`PublishPolicy::FailFast`]
    pub fn publish_policy(mut self, policy: PublishPolicy) -> Self {
        self.config.publish_policy = policy;
        self
    }

    /// Register a value shared by every call.
    pub fn singleton<T>(mut self, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.services.add_singleton(value);
        self
    }

    /// Register an already shared value.
    pub fn singleton_arc<T>(mut self, value: Arc<T>) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.services.add_singleton_arc(value);
        self
    }

    /// Register a service created once per call and released when it ends.
    pub fn scoped<T, F>(mut self, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Scope) -> Result<T> + Send + Sync + 'static,
    {
        self.services.add_scoped(factory);
        self
    }

    /// Register the handlers of the catalog modules picked by `selectors`.
    ///
    /// An empty selector list registers every scannable module. See
    /// [`resolve_modules`] for the accepted forms.
    pub fn register(mut self, catalog: &ModuleCatalog, selectors: &[ModuleSelector]) -> Result<Self> {
        let modules = resolve_modules(catalog, selectors)?;
        tracing::debug!(
            "Registering {} of {} catalog module(s)",
            modules.len(),
            catalog.len()
        );
        register_modules(&mut self.registry, &modules)?;
        Ok(self)
    }

    /// Register one module's handlers directly.
    pub fn module<M: HandlerModule + 'static>(mut self, module: M) -> Result<Self> {
        let modules: [Arc<dyn HandlerModule>; 1] = [Arc::new(module)];
        register_modules(&mut self.registry, &modules)?;
        Ok(self)
    }

    /// Bind request handler `H` to `R`.
    pub fn request_handler<R, H>(self) -> Result<Self>
    where
        R: Request,
        H: RequestHandler<R> + Injectable,
    {
        self.request_handler_with::<R, H, _>(H::inject)
    }

    /// Bind request handler `H` to `R`, built by `factory`.
    pub fn request_handler_with<R, H, F>(mut self, factory: F) -> Result<Self>
    where
        R: Request,
        H: RequestHandler<R>,
        F: Fn(&Scope) -> Result<H> + Send + Sync + 'static,
    {
        self.registry.register_request::<R, H, F>(factory)?;
        Ok(self)
    }

    /// Add notification handler `H` for `N`.
    pub fn notification_handler<N, H>(self) -> Self
    where
        N: Notification,
        H: NotificationHandler<N> + Injectable,
    {
        self.notification_handler_with::<N, H, _>(H::inject)
    }

    /// Add notification handler `H` for `N`, built by `factory`.
    pub fn notification_handler_with<N, H, F>(mut self, factory: F) -> Self
    where
        N: Notification,
        H: NotificationHandler<N>,
        F: Fn(&Scope) -> Result<H> + Send + Sync + 'static,
    {
        self.registry.register_notification::<N, H, F>(factory);
        self
    }

    /// Freeze the bindings and services into a [`Mediator`].
    pub fn build(self) -> Mediator {
        tracing::debug!(
            requests = self.registry.request_count(),
            notifications = self.registry.notification_count(),
            services = self.services.len(),
            "Mediator built"
        );
        Mediator {
            inner: Arc::new(Inner {
                registry: self.registry,
                services: Arc::new(self.services),
                config: self.config,
            }),
        }
    }
}

impl Default for MediatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct Inner {
    /// Frozen binding table.
    registry: HandlerRegistry,
    /// Services each scope resolves from.
    services: Arc<Services>,
    config: MediatorConfig,
}

/// Dispatches requests and notifications to their handlers.
///
/// Cheap to clone; clones share the same bindings and singletons.
#[derive(Clone)]
pub struct Mediator {
    inner: Arc<Inner>,
}

impl Mediator {
    /// Create a new mediator builder.
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    /// Send a request to its handler and return the response.
    ///
    /// Fails with [`HandlerNotFound`](crate::MediatorError::HandlerNotFound)
    /// if no handler is bound to the request type.
    pub async fn send<R: Request>(&self, request: R) -> Result<R::Response> {
        self.send_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Send a request, passing `cancel` to the handler unchanged.
    pub async fn send_with_cancellation<R: Request>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> Result<R::Response> {
        let scope = Scope::with_mediator(self.inner.services.clone(), self.clone());
        self.inner
            .registry
            .dispatch_request(request, &scope, cancel)
            .await
    }

    /// Publish a notification to every handler bound to its type.
    ///
    /// Handlers run sequentially in registration order. No handlers is
    /// not an error. Failures follow the configured [`PublishPolicy`].
    pub async fn publish<N: Notification>(&self, notification: &N) -> Result<()> {
        self.publish_with_cancellation(notification, CancellationToken::new())
            .await
    }

    /// Publish a notification, passing `cancel` to each handler unchanged.
    pub async fn publish_with_cancellation<N: Notification>(
        &self,
        notification: &N,
        cancel: CancellationToken,
    ) -> Result<()> {
        let scope = Scope::with_mediator(self.inner.services.clone(), self.clone());
        self.inner
            .registry
            .dispatch_notification(notification, &scope, cancel, self.inner.config.publish_policy)
            .await
    }

    /// Whether request type `R` has a handler.
    pub fn has_request_handler<R: Request>(&self) -> bool {
        self.inner.registry.contains_request::<R>()
    }

    /// Number of handlers bound to notification type `N`.
    pub fn notification_handler_count<N: Notification>(&self) -> usize {
        self.inner.registry.notification_handler_count::<N>()
    }

    /// The binding table.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.inner.registry
    }

    /// The active configuration.
    pub fn config(&self) -> &MediatorConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediator")
            .field("registry", &self.inner.registry)
            .field("services", &self.inner.services)
            .field("config", &self.inner.config)
            .finish()
    }
}
