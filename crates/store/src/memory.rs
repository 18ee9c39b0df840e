use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use domain::{
    Category, DomainError, Email, Order, OrderId, Product, ProductId, User, UserId,
};
use tokio::sync::RwLock;

use crate::{
    ProductPage, ProductQuery, Result, StoreError,
    store::{OrderStore, ProductStore, StockOutcome, UserStore},
};

/// In-memory store implementation.
///
/// Each collection sits behind its own lock, so every single-document
/// operation is atomic, mirroring the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    users: Arc<RwLock<HashMap<UserId, User>>>,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    fail_on_order_insert: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `insert_order` fail with a storage error.
    pub fn set_fail_on_order_insert(&self, fail: bool) {
        self.fail_on_order_insert.store(fail, Ordering::SeqCst);
    }

    /// Clears all collections.
    pub async fn clear(&self) {
        self.products.write().await.clear();
        self.users.write().await.clear();
        self.orders.write().await.clear();
    }
}

/// Finds which unique field of `candidate` collides with another user.
fn duplicate_field<'a>(
    mut others: impl Iterator<Item = &'a User>,
    candidate: &User,
) -> Option<&'static str> {
    others.find_map(|other| {
        if other.id == candidate.id {
            None
        } else if other.email == candidate.email {
            Some("email")
        } else if candidate.google_id.is_some() && other.google_id == candidate.google_id {
            Some("googleId")
        } else if candidate.facebook_id.is_some() && other.facebook_id == candidate.facebook_id {
            Some("facebookId")
        } else {
            None
        }
    })
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn insert_product(&self, product: Product) -> Result<()> {
        self.products.write().await.insert(product.id, product);
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    async fn update_product<F>(&self, id: ProductId, update: F) -> Result<Product>
    where
        F: FnOnce(&mut Product) -> std::result::Result<(), DomainError> + Send,
    {
        let mut products = self.products.write().await;
        let stored = products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;

        // Work on a copy so a rejected update leaves no trace
        let mut draft = stored.clone();
        update(&mut draft)?;
        *stored = draft.clone();
        Ok(draft)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        Ok(self.products.write().await.remove(&id).is_some())
    }

    async fn list_products(&self, query: ProductQuery) -> Result<ProductPage> {
        let products = self.products.read().await;
        let mut matching: Vec<&Product> = products.values().filter(|p| query.matches(p)).collect();
        matching.sort_by(|a, b| query.sort.compare(a, b));

        let total = matching.len() as u64;
        let products = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(ProductPage { products, total })
    }

    async fn distinct_categories(&self) -> Result<Vec<Category>> {
        let products = self.products.read().await;
        let mut categories: Vec<Category> = products.values().map(|p| p.category).collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn count_products(&self) -> Result<u64> {
        Ok(self.products.read().await.len() as u64)
    }

    async fn decrement_stock_if_available(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> Result<StockOutcome> {
        let mut products = self.products.write().await;
        let Some(product) = products.get_mut(&id) else {
            return Ok(StockOutcome::Missing);
        };
        if product.stock < quantity {
            return Ok(StockOutcome::Insufficient);
        }
        product.stock -= quantity;
        Ok(StockOutcome::Decremented)
    }

    async fn increment_stock(&self, id: ProductId, quantity: u32) -> Result<bool> {
        let mut products = self.products.write().await;
        match products.get_mut(&id) {
            Some(product) => {
                product.stock = product.stock.saturating_add(quantity);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(field) = duplicate_field(users.values(), &user) {
            return Err(StoreError::Duplicate { field });
        }
        users.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| &u.email == email).cloned())
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.google_id.as_deref() == Some(google_id))
            .cloned())
    }

    async fn update_user<F>(&self, id: UserId, update: F) -> Result<User>
    where
        F: FnOnce(&mut User) -> std::result::Result<(), DomainError> + Send,
    {
        let mut users = self.users.write().await;
        let mut draft = users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("User", id))?;
        update(&mut draft)?;

        if let Some(field) = duplicate_field(users.values(), &draft) {
            return Err(StoreError::Duplicate { field });
        }
        users.insert(id, draft.clone());
        Ok(draft)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn count_users(&self) -> Result<u64> {
        Ok(self.users.read().await.len() as u64)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: Order) -> Result<()> {
        if self.fail_on_order_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Corrupt(
                "order insert disabled by test hook".to_string(),
            ));
        }
        self.orders.write().await.insert(order.id, order);
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn update_order<F>(&self, id: OrderId, update: F) -> Result<Order>
    where
        F: FnOnce(&mut Order) -> std::result::Result<(), DomainError> + Send,
    {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Order", id))?;

        let mut draft = stored.clone();
        update(&mut draft)?;
        *stored = draft.clone();
        Ok(draft)
    }

    async fn list_orders_for_user(&self, user: UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut mine: Vec<Order> = orders.values().filter(|o| o.user == user).cloned().collect();
        newest_first(&mut mine);
        Ok(mine)
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        newest_first(&mut all);
        Ok(all)
    }

    async fn count_orders(&self) -> Result<u64> {
        Ok(self.orders.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Duration, Utc};
    use domain::{Category, NewProduct};

    use super::*;

    fn product(name: &str, price: i64, stock: i64) -> Product {
        Product::create(
            NewProduct {
                name: name.to_string(),
                description: format!("{name} description"),
                price,
                discount_price: None,
                category: Category::Electronics,
                stock,
                brand: String::new(),
                specifications: BTreeMap::new(),
                images: vec![],
                is_featured: false,
                is_active: true,
            },
            None,
            Utc::now(),
        )
        .unwrap()
    }

    fn user(email: &str) -> User {
        User::register("Test", Email::parse(email).unwrap(), "hash".into(), Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_conditional_decrement() {
        let store = InMemoryStore::new();
        let p = product("Widget", 1000, 3);
        let id = p.id;
        store.insert_product(p).await.unwrap();

        assert_eq!(
            store.decrement_stock_if_available(id, 5).await.unwrap(),
            StockOutcome::Insufficient
        );
        assert_eq!(
            store.decrement_stock_if_available(id, 3).await.unwrap(),
            StockOutcome::Decremented
        );
        assert_eq!(store.get_product(id).await.unwrap().unwrap().stock, 0);
        assert_eq!(
            store
                .decrement_stock_if_available(ProductId::new(), 1)
                .await
                .unwrap(),
            StockOutcome::Missing
        );
    }

    #[tokio::test]
    async fn test_increment_missing_product_is_skipped() {
        let store = InMemoryStore::new();
        assert!(!store.increment_stock(ProductId::new(), 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_document_untouched() {
        let store = InMemoryStore::new();
        let p = product("Widget", 1000, 3);
        let id = p.id;
        store.insert_product(p).await.unwrap();

        let result = store
            .update_product(id, |p| {
                p.stock = 99;
                Err(DomainError::AlreadyReviewed)
            })
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Rejected(DomainError::AlreadyReviewed))
        ));
        assert_eq!(store.get_product(id).await.unwrap().unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_on_insert_and_update() {
        let store = InMemoryStore::new();
        store.insert_user(user("a@example.com")).await.unwrap();

        let err = store.insert_user(user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "email" }));

        let b = user("b@example.com");
        let b_id = b.id;
        store.insert_user(b).await.unwrap();
        let err = store
            .update_user(b_id, |u| {
                u.email = Email::parse("a@example.com").unwrap();
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "email" }));
        assert_eq!(store.count_users().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_listing_filters_sorts_and_pages() {
        let store = InMemoryStore::new();
        for (name, price) in [("Alpha", 300), ("Bravo", 100), ("Charlie", 200)] {
            store.insert_product(product(name, price, 1)).await.unwrap();
        }
        let mut hidden = product("Delta phone", 50, 1);
        hidden.is_active = false;
        store.insert_product(hidden).await.unwrap();

        let page = store
            .list_products(
                ProductQuery::new()
                    .sort(crate::ProductSort::PriceAsc)
                    .paginate(1, 2),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        let names: Vec<_> = page.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Bravo", "Charlie"]);

        let page = store
            .list_products(ProductQuery::new().price_range(Some(150), None))
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let page = store
            .list_products(ProductQuery::new().keyword("PHONE").include_inactive())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_orders_listed_newest_first() {
        use domain::{NewOrder, OrderItem, PaymentMethod, ShippingAddress, Money};

        let store = InMemoryStore::new();
        let buyer = UserId::new();
        let address = ShippingAddress {
            street: "s".into(),
            city: "c".into(),
            state: "st".into(),
            zip_code: "z".into(),
            country: "co".into(),
            phone: "p".into(),
        };
        let item = OrderItem {
            product: ProductId::new(),
            name: "Widget".into(),
            quantity: 1,
            image: String::new(),
            price: Money::from_cents(100),
        };
        let now = Utc::now();
        for offset in [2, 0, 1] {
            let order = Order::place(
                buyer,
                vec![item.clone()],
                NewOrder {
                    lines: vec![],
                    shipping_address: address.clone(),
                    payment_method: PaymentMethod::Card,
                    transaction_id: None,
                    tax_price: Money::zero(),
                    shipping_price: Money::zero(),
                    notes: None,
                },
                now - Duration::minutes(offset),
            )
            .unwrap();
            store.insert_order(order).await.unwrap();
        }

        let orders = store.list_orders_for_user(buyer).await.unwrap();
        assert_eq!(orders.len(), 3);
        assert!(orders.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert!(store.list_orders_for_user(UserId::new()).await.unwrap().is_empty());
    }
}
