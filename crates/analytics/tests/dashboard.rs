//! Dashboard snapshots against the in-memory store.

use std::collections::BTreeMap;

use analytics::{AnalyticsError, AnalyticsService, StatusCount};
use chrono::{Duration, TimeZone, Utc};
use domain::{
    Category, Email, Identity, Money, NewOrder, NewProduct, Order, OrderItem, OrderStatus,
    PaymentMethod, Product, ProductId, ProductImage, Role, ShippingAddress, User, UserId,
};
use store::{InMemoryStore, OrderStore, ProductStore, UserStore};

fn admin() -> Identity {
    Identity::new(UserId::new(), Role::Admin)
}

async fn add_user(store: &InMemoryStore, name: &str, email: &str) -> UserId {
    let user = User::register(
        name,
        Email::parse(email).unwrap(),
        "hash".into(),
        Utc::now(),
    )
    .unwrap();
    let id = user.id;
    store.insert_user(user).await.unwrap();
    id
}

async fn add_product(store: &InMemoryStore, name: &str) -> ProductId {
    let product = Product::create(
        NewProduct {
            name: name.into(),
            description: format!("{name} description"),
            price: 1_000,
            discount_price: None,
            category: Category::Sports,
            stock: 100,
            brand: String::new(),
            specifications: BTreeMap::new(),
            images: vec![ProductImage {
                url: format!("/uploads/{name}.png"),
                alt: None,
            }],
            is_featured: false,
            is_active: true,
        },
        None,
        Utc::now(),
    )
    .unwrap();
    let id = product.id;
    store.insert_product(product).await.unwrap();
    id
}

async fn add_order(
    store: &InMemoryStore,
    user: UserId,
    items: &[(ProductId, u32)],
    status: OrderStatus,
    placed: chrono::DateTime<Utc>,
) -> Order {
    let order_items = items
        .iter()
        .map(|&(product, quantity)| OrderItem {
            product,
            name: "Snapshot".into(),
            quantity,
            image: String::new(),
            price: Money::from_cents(1_000),
        })
        .collect();
    let request = NewOrder {
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
        tax_price: Money::zero(),
        shipping_price: Money::zero(),
        notes: None,
    };
    let mut order = Order::place(user, order_items, request, placed).unwrap();
    order.order_status = status;
    store.insert_order(order.clone()).await.unwrap();
    order
}

#[tokio::test]
async fn empty_store_yields_zeroed_dashboard() {
    let service = AnalyticsService::new(InMemoryStore::new());
    let dashboard = service.dashboard(admin(), Utc::now()).await.unwrap();

    assert_eq!(dashboard.total_orders, 0);
    assert_eq!(dashboard.total_revenue, Money::zero());
    assert!(dashboard.recent_orders.is_empty());
    assert!(dashboard.revenue_by_month.is_empty());
    assert!(dashboard.top_products.is_empty());
}

#[tokio::test]
async fn non_admin_is_denied() {
    let service = AnalyticsService::new(InMemoryStore::new());
    let buyer = Identity::new(UserId::new(), Role::User);

    let err = service.dashboard(buyer, Utc::now()).await.unwrap_err();
    assert!(matches!(err, AnalyticsError::Denied(_)));
}

#[tokio::test]
async fn dashboard_aggregates_orders() {
    let store = InMemoryStore::new();
    let now = Utc.with_ymd_and_hms(2026, 6, 15, 10, 0, 0).unwrap();

    let jane = add_user(&store, "Jane", "jane@example.com").await;
    let gone = add_user(&store, "Gone", "gone@example.com").await;
    let ball = add_product(&store, "Ball").await;
    let bat = add_product(&store, "Bat").await;
    let removed = add_product(&store, "Removed").await;

    add_order(&store, jane, &[(ball, 2)], OrderStatus::Delivered, now - Duration::days(40)).await;
    add_order(&store, jane, &[(bat, 1)], OrderStatus::Delivered, now - Duration::days(2)).await;
    add_order(&store, jane, &[(removed, 9)], OrderStatus::Pending, now - Duration::days(1)).await;
    add_order(&store, jane, &[(bat, 50)], OrderStatus::Cancelled, now - Duration::hours(5)).await;
    // Delivered, but older than the revenue window
    add_order(&store, gone, &[(ball, 1)], OrderStatus::Delivered, now - Duration::days(400)).await;
    let latest = add_order(&store, gone, &[(ball, 1)], OrderStatus::Processing, now).await;

    store.delete_product(removed).await.unwrap();
    store.delete_user(gone).await.unwrap();

    let dashboard = AnalyticsService::new(store)
        .dashboard(admin(), now)
        .await
        .unwrap();

    assert_eq!(dashboard.total_users, 1);
    assert_eq!(dashboard.total_products, 2);
    assert_eq!(dashboard.total_orders, 6);
    assert_eq!(dashboard.total_revenue, Money::from_cents(4_000));

    assert_eq!(dashboard.recent_orders.len(), 5);
    assert_eq!(dashboard.recent_orders[0].id, latest.id);
    assert_eq!(dashboard.recent_orders[0].buyer_name, None);
    assert_eq!(
        dashboard.recent_orders[1].buyer_email.as_deref(),
        Some("jane@example.com")
    );

    assert!(dashboard.orders_by_status.contains(&StatusCount {
        status: OrderStatus::Delivered,
        count: 3
    }));

    let windowed: i64 = dashboard
        .revenue_by_month
        .iter()
        .map(|m| m.revenue.cents())
        .sum();
    assert_eq!(windowed, 3_000);
    assert_eq!(
        (dashboard.revenue_by_month[0].year, dashboard.revenue_by_month[0].month),
        (2026, 5)
    );

    let names: Vec<&str> = dashboard.top_products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Ball", "Bat"]);
    assert_eq!(dashboard.top_products[0].units_sold, 4);
    assert_eq!(dashboard.top_products[0].image, "/uploads/Ball.png");
}
