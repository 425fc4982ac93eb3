//! Message traits - what callers hand to the mediator.
//!
//! - [`Request`] - expects exactly one typed response from exactly one handler
//! - [`Notification`] - observed by zero or more handlers, no response
//!
//! # Example
//!
//! ```
//! use mediator::{Notification, Request};
//!
//! struct GetUser {
//!     id: u64,
//! }
//!
//! struct UserDto {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl Request for GetUser {
//!     type Response = UserDto;
//! }
//!
//! struct OrderPlaced {
//!     order_id: u64,
//! }
//!
//! impl Notification for OrderPlaced {}
//! ```

/// A value that expects a single response of type [`Request::Response`].
pub trait Request: Send + 'static {
    /// The value the bound handler produces.
    type Response: Send + 'static;
}

/// A value observed by every handler bound to its type.
///
/// Handlers receive the notification by reference, so every handler sees
/// the same instance.
pub trait Notification: Send + Sync + 'static {}

/// Type name used in errors and logs.
#[inline]
pub(crate) fn type_name_of<T: ?Sized>() -> &'static str {
    std::any::type_name::<T>()
}
