//! Error types for the mediator.

use thiserror::Error;

/// Main error type for all mediator operations.
#[derive(Debug, Error)]
pub enum MediatorError {
    /// Registration was called with an unsupported selector combination.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No request handler is bound for the given request type.
    #[error("Handler not found for request type: {0}")]
    HandlerNotFound(&'static str),

    /// A second request handler was registered for an already bound request type.
    #[error("Ambiguous handler for request type {request}: {existing} is already registered, refusing {duplicate}")]
    AmbiguousHandler {
        /// Request type name.
        request: &'static str,
        /// Handler type bound first.
        existing: &'static str,
        /// Handler type that was rejected.
        duplicate: &'static str,
    },

    /// A scope could not resolve a dependency.
    #[error("Service not registered: {0}")]
    ServiceNotFound(&'static str),

    /// A scoped factory needed its own type, directly or through other services.
    #[error("Circular dependency while resolving: {0}")]
    CircularDependency(&'static str),

    /// A payload or response did not have the type its binding expects.
    #[error("Type mismatch: expected {0}")]
    TypeMismatch(&'static str),

    /// A handler failed. Display and source are the handler's own.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),

    /// Several notification handlers failed during one publish.
    #[error("{} notification handlers failed{}", .0.len(), first_failure(.0))]
    Aggregate(Vec<anyhow::Error>),
}

impl MediatorError {
    /// Returns the handler error if this error came from a handler.
    pub fn as_handler_error(&self) -> Option<&anyhow::Error> {
        match self {
            MediatorError::Handler(e) => Some(e),
            _ => None,
        }
    }
}

/// Suffix naming the first aggregated failure, empty when there is none.
fn first_failure(errors: &[anyhow::Error]) -> String {
    errors
        .first()
        .map(|e| format!(", first: {e}"))
        .unwrap_or_default()
}

/// Result type alias using MediatorError.
pub type Result<T> = std::result::Result<T, MediatorError>;
