//! # mediator
//!
//! In-process mediator: callers send typed requests and publish
//! notifications without holding a reference to the handlers that serve
//! them.
//!
//! ## Architecture
//!
//! - **Requests**: exactly one handler per request type, its response is
//!   returned to the caller unchanged
//! - **Notifications**: zero or more handlers per type, run sequentially in
//!   registration order
//! - **Scopes**: each call opens a [`Scope`]; handlers and their scoped
//!   dependencies are built in it and released when the call ends
//! - **Modules**: handlers are registered through explicit
//!   [`HandlerModule`](discovery::HandlerModule)s selected from a
//!   [`ModuleCatalog`](discovery::ModuleCatalog)
//!
//! ## Example
//!
//! ```
//! use async_trait::async_trait;
//! use mediator::{Injectable, Mediator, Request, RequestHandler, Result, Scope};
//! use tokio_util::sync::CancellationToken;
//!
//! struct GetUser {
//!     id: u64,
//! }
//!
//! #[derive(Debug, PartialEq)]
//! struct UserDto {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl Request for GetUser {
//!     type Response = UserDto;
//! }
//!
//! struct GetUserHandler;
//!
//! impl Injectable for GetUserHandler {
//!     fn inject(_scope: &Scope) -> Result<Self> {
//!         Ok(GetUserHandler)
//!     }
//! }
//!
//! #[async_trait]
//! impl RequestHandler<GetUser> for GetUserHandler {
//!     async fn handle(&self, req: GetUser, _cancel: CancellationToken) -> anyhow::Result<UserDto> {
//!         Ok(UserDto { id: req.id, name: "Ada".to_string() })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mediator = Mediator::builder()
//!         .request_handler::<GetUser, GetUserHandler>()?
//!         .build();
//!
//!     let user = mediator.send(GetUser { id: 1 }).await?;
//!     assert_eq!(user, UserDto { id: 1, name: "Ada".to_string() });
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod handler;
pub mod message;
pub mod services;

mod mediator;

pub use config::{MediatorConfig, PublishPolicy};
pub use error::{MediatorError, Result};
pub use handler::{Injectable, NotificationHandler, RequestHandler};
pub use mediator::{Mediator, MediatorBuilder};
pub use message::{Notification, Request};
pub use services::Scope;
