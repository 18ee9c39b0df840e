//! Persistence for the storefront: users, products and orders.
//!
//! Every store implements the same three traits, so workflows are generic
//! over the backing implementation:
//! - [`InMemoryStore`] for development and tests
//! - [`PostgresStore`] for production
//!
//! Each document update is atomic on its own. Multi-document invariants are
//! the caller's job, helped by [`ProductStore::decrement_stock_if_available`].

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, ProductPage, ProductQuery, ProductSort};
pub use store::{OrderStore, ProductStore, StockOutcome, Store, UserStore};
