//! Handler module - capabilities and the binding table.
//!
//! Provides:
//! - [`RequestHandler`] / [`NotificationHandler`] - implemented by application code
//! - [`Injectable`] - lets a handler build itself from a per-call [`Scope`](crate::services::Scope)
//! - [`HandlerRegistry`] - maps message types to handler bindings
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//! use mediator::handler::RequestHandler;
//! use tokio_util::sync::CancellationToken;
//!
//! struct GetUserHandler;
//!
//! #[async_trait]
//! impl RequestHandler<GetUser> for GetUserHandler {
//!     async fn handle(&self, req: GetUser, _cancel: CancellationToken) -> anyhow::Result<UserDto> {
//!         Ok(UserDto { id: req.id, name: "Ada".into() })
//!     }
//! }
//! ```

mod registry;
mod traits;

pub use registry::{
    BoxFuture, ErasedNotificationHandler, ErasedRequestHandler, HandlerRegistry, Payload,
    TypedNotificationHandler, TypedRequestHandler,
};
pub use traits::{Injectable, NotificationHandler, RequestHandler};
