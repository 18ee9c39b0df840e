//! Workflow error types.

use auth::AuthError;
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Coarse classification used to pick a response status at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    InsufficientStock,
    Conflict,
    Unauthorized,
    Forbidden,
    InvalidState,
    Internal,
}

/// Errors returned by every workflow operation.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A user, product or order does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request is missing fields or carries malformed values.
    #[error("{0}")]
    InvalidInput(String),

    /// A line item asks for more units than are in stock.
    #[error("Insufficient stock for {product}")]
    InsufficientStock { product: String },

    /// Duplicate email, review or wishlist entry.
    #[error("{0}")]
    Conflict(String),

    /// Missing or invalid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but role or ownership is insufficient.
    #[error("{0}")]
    Forbidden(String),

    /// The order status does not allow the requested change.
    #[error("{0}")]
    InvalidState(String),

    /// Unexpected storage or runtime failure.
    #[error("{0}")]
    Internal(String),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::NotFound(_) => ErrorKind::NotFound,
            WorkflowError::InvalidInput(_) => ErrorKind::InvalidInput,
            WorkflowError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            WorkflowError::Conflict(_) => ErrorKind::Conflict,
            WorkflowError::Unauthorized(_) => ErrorKind::Unauthorized,
            WorkflowError::Forbidden(_) => ErrorKind::Forbidden,
            WorkflowError::InvalidState(_) => ErrorKind::InvalidState,
            WorkflowError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn not_found(entity: &str) -> Self {
        WorkflowError::NotFound(format!("{entity} not found"))
    }

    pub(crate) fn invalid_credentials() -> Self {
        WorkflowError::Unauthorized("Invalid email or password".to_string())
    }
}

impl From<DomainError> for WorkflowError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::Validation(_) => WorkflowError::InvalidInput(message),
            DomainError::AlreadyReviewed | DomainError::AlreadyInWishlist => {
                WorkflowError::Conflict(message)
            }
            DomainError::OrderFinalized { .. }
            | DomainError::InvalidTarget { .. }
            | DomainError::CannotCancel { .. } => WorkflowError::InvalidState(message),
            DomainError::Forbidden(_) => WorkflowError::Forbidden(message),
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, .. } => WorkflowError::not_found(entity),
            StoreError::Duplicate { field: "email" } => {
                WorkflowError::Conflict("Email already registered".to_string())
            }
            StoreError::Duplicate { field } => {
                WorkflowError::Conflict(format!("{field} already exists"))
            }
            StoreError::Rejected(domain) => domain.into(),
            other => {
                tracing::error!(error = %other, "store failure");
                WorkflowError::Internal(other.to_string())
            }
        }
    }
}

impl From<AuthError> for WorkflowError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Expired => {
                WorkflowError::Unauthorized("Token expired. Please login again.".to_string())
            }
            AuthError::Invalid => {
                WorkflowError::Unauthorized("Invalid token. Please login again.".to_string())
            }
            AuthError::Provider(reason) => {
                tracing::warn!(%reason, "federated sign-in rejected");
                WorkflowError::Unauthorized("Google authentication failed".to_string())
            }
            other => {
                tracing::error!(error = %other, "credential failure");
                WorkflowError::Internal(other.to_string())
            }
        }
    }
}

/// Convenience type alias for workflow results.
pub type Result<T> = std::result::Result<T, WorkflowError>;
