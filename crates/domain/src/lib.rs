//! Domain layer for the storefront backend.
//!
//! This crate holds the records the stores persist and the rules that keep
//! them consistent:
//! - `Product` with embedded reviews and a derived rating
//! - `User` with normalized email, role and wishlist
//! - `Order` with immutable line-item snapshots and a status state machine
//! - `Identity`, the authenticated caller passed into every workflow call
//!
//! Computed fields are never maintained implicitly. Callers invoke the
//! normalization functions (`Order::prepare_for_save`,
//! `Product::recalculate_rating`, `User::validate`) right before persisting.

pub mod error;
pub mod identity;
pub mod money;
pub mod order;
pub mod product;
pub mod user;

pub use common::{OrderId, ProductId, UserId};
pub use error::DomainError;
pub use identity::{Identity, Role};
pub use money::Money;
pub use order::{
    NewOrder, NewOrderLine, Order, OrderItem, OrderStatus, PaymentInfo, PaymentMethod,
    PaymentStatus, ShippingAddress, TrackingInfo,
};
pub use product::{Category, NewProduct, Product, ProductImage, ProductUpdate, Review};
pub use user::{Address, Email, ProfileUpdate, User, validate_password};
