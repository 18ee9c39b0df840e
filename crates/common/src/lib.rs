//! Shared identifier types for the storefront backend.

mod types;

pub use types::{OrderId, ParseIdError, ProductId, UserId};
