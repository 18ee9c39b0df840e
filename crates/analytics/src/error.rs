//! Analytics error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Loading orders, users or products failed.
    #[error(transparent)]
    Store(#[from] store::StoreError),

    /// The caller is not an admin.
    #[error(transparent)]
    Denied(#[from] domain::DomainError),
}

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
