//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use domain::{
    Category, DomainError, Email, Money, NewOrder, NewProduct, Order, OrderItem, OrderStatus,
    PaymentMethod, Product, ProductId, Review, ShippingAddress, User, UserId,
};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    OrderStore, PostgresStore, ProductQuery, ProductSort, ProductStore, StockOutcome, StoreError,
    UserStore,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/001_create_tables.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE orders, products, users")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

fn product(name: &str, price: i64, stock: i64, category: Category) -> Product {
    Product::create(
        NewProduct {
            name: name.to_string(),
            description: format!("{name} for everyday use"),
            price,
            discount_price: None,
            category,
            stock,
            brand: "Acme".to_string(),
            specifications: BTreeMap::from([("color".to_string(), "black".to_string())]),
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
    User::register(
        "Jane",
        Email::parse(email).unwrap(),
        "$argon2id$placeholder".to_string(),
        Utc::now(),
    )
    .unwrap()
}

fn order_for(buyer: UserId, product: &Product, quantity: u32) -> Order {
    Order::place(
        buyer,
        vec![OrderItem {
            product: product.id,
            name: product.name.clone(),
            quantity,
            image: String::new(),
            price: product.effective_price(),
        }],
        NewOrder {
            lines: vec![],
            shipping_address: ShippingAddress {
                street: "1 Main St".into(),
                city: "Springfield".into(),
                state: "IL".into(),
                zip_code: "62701".into(),
                country: "US".into(),
                phone: "555-0100".into(),
            },
            payment_method: PaymentMethod::Card,
            transaction_id: None,
            tax_price: Money::from_cents(150),
            shipping_price: Money::zero(),
            notes: Some("Leave at door".into()),
        },
        Utc::now(),
    )
    .unwrap()
}

#[tokio::test]
#[serial]
async fn product_round_trips_through_jsonb_columns() {
    let store = get_test_store().await;
    let p = product("Desk Lamp", 2_499, 10, Category::HomeAndKitchen);
    let id = p.id;
    store.insert_product(p.clone()).await.unwrap();

    let loaded = store.get_product(id).await.unwrap().unwrap();
    assert_eq!(loaded.name, "Desk Lamp");
    assert_eq!(loaded.category, Category::HomeAndKitchen);
    assert_eq!(loaded.price, Money::from_cents(2_499));
    assert_eq!(loaded.specifications.get("color").map(String::as_str), Some("black"));
    assert!(store.get_product(ProductId::new()).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn conditional_decrement_never_goes_negative() {
    let store = get_test_store().await;
    let p = product("Keyboard", 4_999, 2, Category::Computers);
    let id = p.id;
    store.insert_product(p).await.unwrap();

    assert_eq!(
        store.decrement_stock_if_available(id, 3).await.unwrap(),
        StockOutcome::Insufficient
    );
    assert_eq!(
        store.decrement_stock_if_available(id, 2).await.unwrap(),
        StockOutcome::Decremented
    );
    assert_eq!(
        store.decrement_stock_if_available(id, 1).await.unwrap(),
        StockOutcome::Insufficient
    );
    assert_eq!(
        store
            .decrement_stock_if_available(ProductId::new(), 1)
            .await
            .unwrap(),
        StockOutcome::Missing
    );

    assert!(store.increment_stock(id, 2).await.unwrap());
    assert_eq!(store.get_product(id).await.unwrap().unwrap().stock, 2);
}

#[tokio::test]
#[serial]
async fn concurrent_decrements_respect_stock() {
    let store = get_test_store().await;
    let p = product("Limited Edition", 9_999, 5, Category::Toys);
    let id = p.id;
    store.insert_product(p).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.decrement_stock_if_available(id, 1).await.unwrap()
        }));
    }

    let mut decremented = 0;
    for handle in handles {
        if handle.await.unwrap() == StockOutcome::Decremented {
            decremented += 1;
        }
    }

    assert_eq!(decremented, 5);
    assert_eq!(store.get_product(id).await.unwrap().unwrap().stock, 0);
}

#[tokio::test]
#[serial]
async fn rejected_review_update_is_rolled_back() {
    let store = get_test_store().await;
    let p = product("Headphones", 7_999, 3, Category::Electronics);
    let id = p.id;
    store.insert_product(p).await.unwrap();
    let reviewer = UserId::new();

    let review = || Review::new(reviewer, "Jane", 4, "Great sound", Utc::now()).unwrap();

    let updated = store
        .update_product(id, |p| p.add_review(review(), Utc::now()))
        .await
        .unwrap();
    assert_eq!(updated.num_reviews, 1);
    assert_eq!(updated.ratings, 4.0);

    let err = store
        .update_product(id, |p| p.add_review(review(), Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Rejected(DomainError::AlreadyReviewed)));
    assert_eq!(store.get_product(id).await.unwrap().unwrap().num_reviews, 1);
}

#[tokio::test]
#[serial]
async fn listing_applies_filters_sorting_and_paging() {
    let store = get_test_store().await;
    for (name, price, category) in [
        ("Paperback Novel", 1_299, Category::Books),
        ("Hardcover Novel", 2_999, Category::Books),
        ("Cookbook", 1_999, Category::Books),
        ("Tennis Racket", 8_999, Category::Sports),
    ] {
        store
            .insert_product(product(name, price, 1, category))
            .await
            .unwrap();
    }

    let page = store
        .list_products(
            ProductQuery::new()
                .category(Category::Books)
                .sort(ProductSort::PriceDesc)
                .paginate(1, 2),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages(2), 2);
    let names: Vec<_> = page.products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Hardcover Novel", "Cookbook"]);

    let page = store
        .list_products(ProductQuery::new().keyword("novel"))
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    let page = store
        .list_products(ProductQuery::new().keyword("100%"))
        .await
        .unwrap();
    assert_eq!(page.total, 0);

    let categories = store.distinct_categories().await.unwrap();
    assert_eq!(categories, vec![Category::Books, Category::Sports]);
}

#[tokio::test]
#[serial]
async fn duplicate_email_maps_to_duplicate_error() {
    let store = get_test_store().await;
    store.insert_user(user("jane@example.com")).await.unwrap();

    let err = store.insert_user(user("JANE@example.com")).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { field: "email" }));

    let found = store
        .find_user_by_email(&Email::parse("jane@example.com").unwrap())
        .await
        .unwrap();
    assert!(found.is_some());
}

#[tokio::test]
#[serial]
async fn wishlist_persists_as_uuid_array() {
    let store = get_test_store().await;
    let u = user("wish@example.com");
    let id = u.id;
    store.insert_user(u).await.unwrap();
    let wanted = ProductId::new();

    store
        .update_user(id, |u| u.add_to_wishlist(wanted, Utc::now()))
        .await
        .unwrap();

    let loaded = store.get_user(id).await.unwrap().unwrap();
    assert_eq!(loaded.wishlist, vec![wanted]);
}

#[tokio::test]
#[serial]
async fn order_status_updates_are_persisted() {
    let store = get_test_store().await;
    let buyer = UserId::new();
    let p = product("Monitor", 19_999, 4, Category::Computers);
    let order = order_for(buyer, &p, 2);
    let id = order.id;
    store.insert_order(order).await.unwrap();

    let updated = store
        .update_order(id, |o| o.apply_status(OrderStatus::Delivered, None, Utc::now()))
        .await
        .unwrap();
    assert_eq!(updated.order_status, OrderStatus::Delivered);
    assert!(updated.delivered_at.is_some());

    let loaded = store.get_order(id).await.unwrap().unwrap();
    assert_eq!(loaded.order_status, OrderStatus::Delivered);
    assert_eq!(loaded.total_amount, Money::from_cents(19_999 * 2 + 150));
    assert_eq!(store.list_orders_for_user(buyer).await.unwrap().len(), 1);

    let err = store
        .update_order(id, |o| o.cancel(Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Rejected(DomainError::CannotCancel { .. })));
}
