//! Business workflows for the storefront.
//!
//! Each service is generic over the backing [`store::Store`] and takes the
//! caller's [`domain::Identity`] explicitly:
//! - [`OrderWorkflow`]: placement with stock reservation and compensation,
//!   status changes, cancellation
//! - [`CatalogService`]: browsing, reviews and admin product management
//! - [`AccountService`]: registration, sign-in, profiles and wishlists

pub mod accounts;
pub mod catalog;
pub mod error;
pub mod orders;

pub use accounts::{AccountService, AuthSession};
pub use catalog::{CatalogService, FEATURED_LIMIT, MAX_PRODUCT_IMAGES, RELATED_LIMIT};
pub use error::{ErrorKind, Result, WorkflowError};
pub use orders::{OrderSummary, OrderWorkflow};
