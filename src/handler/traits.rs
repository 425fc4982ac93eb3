//! Handler capabilities implemented by application code.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::message::{Notification, Request};
use crate::services::Scope;

/// Handles one request type and produces its response.
///
/// The cancellation token is passed through from the caller unchanged. The
/// mediator never checks it; handlers decide how to react.
#[async_trait]
pub trait RequestHandler<R>: Send + Sync + 'static
where
    R: Request,
{
    /// Handle a request and return the response.
    async fn handle(&self, request: R, cancel: CancellationToken) -> anyhow::Result<R::Response>;
}

/// Observes one notification type.
#[async_trait]
pub trait NotificationHandler<N>: Send + Sync + 'static
where
    N: Notification,
{
    /// Handle a notification.
    async fn handle(&self, notification: &N, cancel: CancellationToken) -> anyhow::Result<()>;
}

/// A handler that can build itself from a resolution scope.
///
/// Handlers are constructed once per call, so anything resolved here lives
/// exactly as long as the call.
pub trait Injectable: Sized {
    /// Construct from the services available in `scope`.
    fn inject(scope: &Scope) -> Result<Self>;
}
