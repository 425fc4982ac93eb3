//! Registrar handed to modules while they register their handlers.

use crate::error::Result;
use crate::handler::{
    HandlerRegistry, Injectable, NotificationHandler, RequestHandler,
};
use crate::message::{Notification, Request};
use crate::services::Scope;

/// Registration surface for one module.
///
/// Every binding is per call: the factory (or [`Injectable::inject`]) runs
/// inside the scope of each `send`/`publish`.
pub struct Registrar<'a> {
    registry: &'a mut HandlerRegistry,
    module: &'a str,
}

impl<'a> Registrar<'a> {
    pub(crate) fn new(registry: &'a mut HandlerRegistry, module: &'a str) -> Self {
        Self { registry, module }
    }

    /// Name of the module currently registering.
    pub fn module_name(&self) -> &str {
        self.module
    }

    /// Bind request handler `H` to `R`, built with [`Injectable::inject`].
    pub fn request_handler<R, H>(&mut self) -> Result<&mut Self>
    where
        R: Request,
        H: RequestHandler<R> + Injectable,
    {
        self.request_handler_with::<R, H, _>(H::inject)
    }

    /// Bind request handler `H` to `R`, built by `factory`.
    pub fn request_handler_with<R, H, F>(&mut self, factory: F) -> Result<&mut Self>
    where
        R: Request,
        H: RequestHandler<R>,
        F: Fn(&Scope) -> Result<H> + Send + Sync + 'static,
    {
        self.registry.register_request::<R, H, F>(factory)?;
        Ok(self)
    }

    /// Add notification handler `H` for `N`, built with [`Injectable::inject`].
    pub fn notification_handler<N, H>(&mut self) -> &mut Self
    where
        N: Notification,
        H: NotificationHandler<N> + Injectable,
    {
        self.notification_handler_with::<N, H, _>(H::inject)
    }

    /// Add notification handler `H` for `N`, built by `factory`.
    pub fn notification_handler_with<N, H, F>(&mut self, factory: F) -> &mut Self
    where
        N: Notification,
        H: NotificationHandler<N>,
        F: Fn(&Scope) -> Result<H> + Send + Sync + 'static,
    {
        self.registry.register_notification::<N, H, F>(factory);
        self
    }
}
