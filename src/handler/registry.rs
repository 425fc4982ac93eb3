//! Handler registry - the binding table the mediator dispatches through.
//!
//! Each request type maps to exactly one binding; each notification type
//! maps to an ordered list of bindings. A binding is a typed wrapper that
//! downcasts the erased payload, builds the handler from the call's
//! [`Scope`] and invokes it, so dispatch is one indirect call.
//!
//! # Example
//!
//! ```ignore
//! use mediator::handler::HandlerRegistry;
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register_request::<GetUser, GetUserHandler, _>(|_scope| Ok(GetUserHandler))?;
//! registry.register_notification::<OrderPlaced, AuditLog, _>(|_scope| Ok(AuditLog));
//!
//! assert!(registry.contains_request::<GetUser>());
//! assert_eq!(registry.notification_handler_count::<OrderPlaced>(), 1);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use super::{NotificationHandler, RequestHandler};
use crate::config::PublishPolicy;
use crate::error::{MediatorError, Result};
use crate::message::{type_name_of, Notification, Request};
use crate::services::Scope;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Type-erased request or response value.
pub type Payload = Box<dyn Any + Send>;

/// Type-erased request binding.
pub trait ErasedRequestHandler: Send + Sync + 'static {
    /// Build the handler inside `scope` and handle the erased request.
    fn call<'a>(
        &'a self,
        request: Payload,
        scope: &'a Scope,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<Payload>>;

    /// Concrete handler type name.
    fn handler_name(&self) -> &'static str;
}

/// Type-erased notification binding.
pub trait ErasedNotificationHandler: Send + Sync + 'static {
    /// Build the handler inside `scope` and handle the erased notification.
    fn call<'a>(
        &'a self,
        notification: &'a (dyn Any + Send + Sync),
        scope: &'a Scope,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<()>>;

    /// Concrete handler type name.
    fn handler_name(&self) -> &'static str;
}

/// Binding that constructs `H` from a scope and invokes it for `R`.
pub struct TypedRequestHandler<R, H, F>
where
    R: Request,
    H: RequestHandler<R>,
    F: Fn(&Scope) -> Result<H> + Send + Sync + 'static,
{
    factory: F,
    _phantom: PhantomData<fn(R) -> H>,
}

impl<R, H, F> TypedRequestHandler<R, H, F>
where
    R: Request,
    H: RequestHandler<R>,
    F: Fn(&Scope) -> Result<H> + Send + Sync + 'static,
{
    /// Create a new typed binding.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            _phantom: PhantomData,
        }
    }
}

impl<R, H, F> ErasedRequestHandler for TypedRequestHandler<R, H, F>
where
    R: Request,
    H: RequestHandler<R>,
    F: Fn(&Scope) -> Result<H> + Send + Sync + 'static,
{
    fn call<'a>(
        &'a self,
        request: Payload,
        scope: &'a Scope,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<Payload>> {
        let request: R = match request.downcast::<R>() {
            Ok(r) => *r,
            Err(_) => {
                return Box::pin(async { Err(MediatorError::TypeMismatch(type_name_of::<R>())) })
            }
        };

        let handler = match (self.factory)(scope) {
            Ok(h) => h,
            Err(e) => return Box::pin(async move { Err(e) }),
        };

        Box::pin(async move {
            let response = handler.handle(request, cancel).await?;
            Ok(Box::new(response) as Payload)
        })
    }

    fn handler_name(&self) -> &'static str {
        type_name_of::<H>()
    }
}

/// Binding that constructs `H` from a scope and invokes it for `N`.
pub struct TypedNotificationHandler<N, H, F>
where
    N: Notification,
    H: NotificationHandler<N>,
    F: Fn(&Scope) -> Result<H> + Send + Sync + 'static,
{
    factory: F,
    _phantom: PhantomData<fn(N) -> H>,
}

impl<N, H, F> TypedNotificationHandler<N, H, F>
where
    N: Notification,
    H: NotificationHandler<N>,
    F: Fn(&Scope) -> Result<H> + Send + Sync + 'static,
{
    /// Create a new typed binding.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            _phantom: PhantomData,
        }
    }
}

impl<N, H, F> ErasedNotificationHandler for TypedNotificationHandler<N, H, F>
where
    N: Notification,
    H: NotificationHandler<N>,
    F: Fn(&Scope) -> Result<H> + Send + Sync + 'static,
{
    fn call<'a>(
        &'a self,
        notification: &'a (dyn Any + Send + Sync),
        scope: &'a Scope,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<()>> {
        let notification: &N = match notification.downcast_ref::<N>() {
            Some(n) => n,
            None => {
                return Box::pin(async { Err(MediatorError::TypeMismatch(type_name_of::<N>())) })
            }
        };

        let handler = match (self.factory)(scope) {
            Ok(h) => h,
            Err(e) => return Box::pin(async move { Err(e) }),
        };

        Box::pin(async move {
            handler.handle(notification, cancel).await?;
            Ok(())
        })
    }

    fn handler_name(&self) -> &'static str {
        type_name_of::<H>()
    }
}

/// Binding for a request type.
struct RequestEntry {
    /// Request type name.
    request: &'static str,
    /// The binding.
    handler: Box<dyn ErasedRequestHandler>,
}

/// Registry mapping message types to handler bindings.
#[derive(Default)]
pub struct HandlerRegistry {
    /// Request bindings by request type.
    requests: HashMap<TypeId, RequestEntry>,
    /// Notification bindings by notification type, in registration order.
    notifications: HashMap<TypeId, Vec<Box<dyn ErasedNotificationHandler>>>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the request handler `H` to request type `R`.
    ///
    /// Fails with [`MediatorError::AmbiguousHandler`] if `R` already has a
    /// handler; the existing binding is kept.
    pub fn register_request<R, H, F>(&mut self, factory: F) -> Result<()>
    where
        R: Request,
        H: RequestHandler<R>,
        F: Fn(&Scope) -> Result<H> + Send + Sync + 'static,
    {
        let id = TypeId::of::<R>();
        if let Some(existing) = self.requests.get(&id) {
            return Err(MediatorError::AmbiguousHandler {
                request: existing.request,
                existing: existing.handler.handler_name(),
                duplicate: type_name_of::<H>(),
            });
        }

        tracing::debug!(
            "Bound request {} to {}",
            type_name_of::<R>(),
            type_name_of::<H>()
        );
        self.requests.insert(
            id,
            RequestEntry {
                request: type_name_of::<R>(),
                handler: Box::new(TypedRequestHandler::<R, H, F>::new(factory)),
            },
        );
        Ok(())
    }

    /// Add the notification handler `H` for notification type `N`.
    ///
    /// Handlers for the same type run in the order they were added.
    pub fn register_notification<N, H, F>(&mut self, factory: F)
    where
        N: Notification,
        H: NotificationHandler<N>,
        F: Fn(&Scope) -> Result<H> + Send + Sync + 'static,
    {
        tracing::debug!(
            "Bound notification {} to {}",
            type_name_of::<N>(),
            type_name_of::<H>()
        );
        self.notifications
            .entry(TypeId::of::<N>())
            .or_default()
            .push(Box::new(TypedNotificationHandler::<N, H, F>::new(factory)));
    }

    /// Whether request type `R` has a handler.
    pub fn contains_request<R: Request>(&self) -> bool {
        self.requests.contains_key(&TypeId::of::<R>())
    }

    /// Get the handler type name bound to request type `R`.
    pub fn request_handler_name<R: Request>(&self) -> Option<&'static str> {
        self.requests
            .get(&TypeId::of::<R>())
            .map(|e| e.handler.handler_name())
    }

    /// Number of handlers for notification type `N`.
    pub fn notification_handler_count<N: Notification>(&self) -> usize {
        self.notification_handlers::<N>().len()
    }

    /// Handler type names for notification type `N`, in invocation order.
    pub fn notification_handler_names<N: Notification>(&self) -> Vec<&'static str> {
        self.notification_handlers::<N>()
            .iter()
            .map(|h| h.handler_name())
            .collect()
    }

    /// Number of bound request types.
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    /// Total number of notification bindings.
    pub fn notification_count(&self) -> usize {
        self.notifications.values().map(Vec::len).sum()
    }

    fn notification_handlers<N: Notification>(&self) -> &[Box<dyn ErasedNotificationHandler>] {
        self.notifications
            .get(&TypeId::of::<N>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Dispatch a request to its handler.
    ///
    /// # Arguments
    ///
    /// * `request` - The request value
    /// * `scope` - Scope the handler is built in
    /// * `cancel` - Token passed to the handler unchanged
    pub async fn dispatch_request<R: Request>(
        &self,
        request: R,
        scope: &Scope,
        cancel: CancellationToken,
    ) -> Result<R::Response> {
        let entry = self
            .requests
            .get(&TypeId::of::<R>())
            .ok_or(MediatorError::HandlerNotFound(type_name_of::<R>()))?;

        tracing::trace!(
            scope = scope.id(),
            "Dispatching {} to {}",
            entry.request,
            entry.handler.handler_name()
        );

        let response = entry.handler.call(Box::new(request), scope, cancel).await?;
        response
            .downcast::<R::Response>()
            .map(|r| *r)
            .map_err(|_| MediatorError::TypeMismatch(type_name_of::<R::Response>()))
    }

    /// Dispatch a notification to every handler bound to its type.
    ///
    /// Handlers run one after another in registration order; each is awaited
    /// before the next starts. No handlers is not an error.
    pub async fn dispatch_notification<N: Notification>(
        &self,
        notification: &N,
        scope: &Scope,
        cancel: CancellationToken,
        policy: PublishPolicy,
    ) -> Result<()> {
        let handlers = self.notification_handlers::<N>();
        tracing::trace!(
            scope = scope.id(),
            "Publishing {} to {} handler(s)",
            type_name_of::<N>(),
            handlers.len()
        );

        let mut failures = Vec::new();
        for handler in handlers {
            let result = handler.call(notification, scope, cancel.clone()).await;
            let err = match result {
                Ok(()) => continue,
                Err(e) => e,
            };

            match policy {
                PublishPolicy::FailFast => return Err(err),
                PublishPolicy::CollectAll => {
                    tracing::warn!(
                        "Notification handler {} failed: {}",
                        handler.handler_name(),
                        err
                    );
                    failures.push(err);
                }
            }
        }

        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(MediatorError::Aggregate(
                failures.into_iter().map(into_anyhow).collect(),
            )),
        }
    }
}

/// Unwrap a handler failure, or wrap a mediator failure, for aggregation.
fn into_anyhow(err: MediatorError) -> anyhow::Error {
    match err {
        MediatorError::Handler(e) => e,
        other => anyhow::Error::new(other),
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("requests", &self.request_count())
            .field("notifications", &self.notification_count())
            .finish()
    }
}
