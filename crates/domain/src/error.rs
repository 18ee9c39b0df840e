//! Domain error types.

use thiserror::Error;

use crate::order::OrderStatus;

/// Errors raised when a domain rule rejects an operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// A field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The user already reviewed this product.
    #[error("You have already reviewed this product")]
    AlreadyReviewed,

    /// The product is already on the wishlist.
    #[error("Product already in wishlist")]
    AlreadyInWishlist,

    /// The order reached a terminal state and cannot change any more.
    #[error("This order has already been {}", .current.label())]
    OrderFinalized { current: OrderStatus },

    /// The requested status cannot be set through a status update.
    #[error("Cannot move order to {target}")]
    InvalidTarget { target: OrderStatus },

    /// The order is too far along to be cancelled.
    #[error("Cannot cancel {} order", .current.label())]
    CannotCancel { current: OrderStatus },

    /// The caller's role or ownership does not permit the operation.
    #[error("{0}")]
    Forbidden(String),
}

impl DomainError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }
}
