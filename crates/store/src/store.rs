use async_trait::async_trait;
use domain::{
    Category, DomainError, Email, Order, OrderId, Product, ProductId, User, UserId,
};

use crate::{ProductPage, ProductQuery, Result};

/// Outcome of an atomic conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockOutcome {
    /// Stock was at least the requested quantity and has been reduced.
    Decremented,
    /// Not enough stock; nothing changed.
    Insufficient,
    /// The product does not exist.
    Missing,
}

/// Catalog persistence.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Inserts a new product.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Loads a product by ID. Returns None if it doesn't exist.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Loads several products. Missing IDs are skipped; order follows `ids`.
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>>;

    /// Applies `update` to the stored product atomically.
    ///
    /// If the closure returns an error the product is left untouched and the
    /// error comes back as `StoreError::Rejected`.
    async fn update_product<F>(&self, id: ProductId, update: F) -> Result<Product>
    where
        F: FnOnce(&mut Product) -> std::result::Result<(), DomainError> + Send;

    /// Physically removes a product. Returns false if it didn't exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    /// Lists one page of products matching the query.
    async fn list_products(&self, query: ProductQuery) -> Result<ProductPage>;

    /// Categories that currently have at least one product.
    async fn distinct_categories(&self) -> Result<Vec<Category>>;

    async fn count_products(&self) -> Result<u64>;

    /// Atomically performs `stock -= quantity WHERE stock >= quantity`.
    async fn decrement_stock_if_available(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> Result<StockOutcome>;

    /// Adds `quantity` back to stock. Returns false if the product no longer
    /// exists.
    async fn increment_stock(&self, id: ProductId, quantity: u32) -> Result<bool>;

    /// Overwrites the stock level of a product.
    async fn set_stock(&self, id: ProductId, stock: i64) -> Result<Product> {
        let now = chrono::Utc::now();
        self.update_product(id, move |product| product.set_stock(stock, now))
            .await
    }
}

/// Account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. Fails with `Duplicate` if the email or an
    /// external identity id is already taken.
    async fn insert_user(&self, user: User) -> Result<()>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>>;

    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>>;

    /// Applies `update` to the stored user atomically. Unique fields are
    /// re-checked after the closure runs.
    async fn update_user<F>(&self, id: UserId, update: F) -> Result<User>
    where
        F: FnOnce(&mut User) -> std::result::Result<(), DomainError> + Send;

    async fn delete_user(&self, id: UserId) -> Result<bool>;

    /// All users, newest first.
    async fn list_users(&self) -> Result<Vec<User>>;

    async fn count_users(&self) -> Result<u64>;
}

/// Order persistence. Orders are never deleted.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: Order) -> Result<()>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Applies `update` to the stored order atomically.
    async fn update_order<F>(&self, id: OrderId, update: F) -> Result<Order>
    where
        F: FnOnce(&mut Order) -> std::result::Result<(), DomainError> + Send;

    /// Orders placed by one user, newest first.
    async fn list_orders_for_user(&self, user: UserId) -> Result<Vec<Order>>;

    /// Every order, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    async fn count_orders(&self) -> Result<u64>;
}

/// A complete backing store.
pub trait Store: ProductStore + UserStore + OrderStore + Clone + 'static {}

// Blanket implementation for anything providing all three collections
impl<T> Store for T where T: ProductStore + UserStore + OrderStore + Clone + 'static {}
