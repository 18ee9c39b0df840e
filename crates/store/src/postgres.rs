use std::collections::HashMap;

use async_trait::async_trait;
use domain::{
    Address, Category, DomainError, Email, Order, OrderId, OrderItem, PaymentInfo, Product,
    ProductId, ProductImage, Review, Role, ShippingAddress, TrackingInfo, User, UserId,
};
use sqlx::{PgExecutor, PgPool, Postgres, Row, postgres::PgRow, types::Json};
use uuid::Uuid;

use crate::{
    ProductPage, ProductQuery, Result, StoreError,
    store::{OrderStore, ProductStore, StockOutcome, UserStore},
};

const PRODUCT_COLUMNS: &str = "id, name, description, price, discount_price, images, category, \
     stock, brand, specifications, reviews, ratings, num_reviews, is_featured, is_active, \
     created_by, created_at, updated_at";

const USER_COLUMNS: &str = "id, name, email, password_hash, google_id, facebook_id, \
     is_email_verified, role, wishlist, avatar, phone, address, reset_password_token, \
     reset_password_expire, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, user_id, order_items, shipping_address, payment_info, \
     items_price, tax_price, shipping_price, total_amount, order_status, delivered_at, \
     tracking_info, order_notes, created_at, updated_at";

/// PostgreSQL-backed store implementation.
///
/// Products, users and orders live in one table each; nested values
/// (images, reviews, line items, addresses) are stored as JSONB.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool against `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{what}: {err}"))
}

/// Maps unique-constraint violations on `users` to `Duplicate`.
fn map_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        let field = match db_err.constraint() {
            Some("users_email_key") => Some("email"),
            Some("users_google_id_key") => Some("googleId"),
            Some("users_facebook_id_key") => Some("facebookId"),
            _ => None,
        };
        if let Some(field) = field {
            return StoreError::Duplicate { field };
        }
    }
    StoreError::Database(err)
}

fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn row_to_product(row: &PgRow) -> Result<Product> {
    let stock: i64 = row.try_get("stock")?;
    let num_reviews: i32 = row.try_get("num_reviews")?;
    let category: String = row.try_get("category")?;

    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: domain::Money::from_cents(row.try_get("price")?),
        discount_price: row
            .try_get::<Option<i64>, _>("discount_price")?
            .map(domain::Money::from_cents),
        images: row.try_get::<Json<Vec<ProductImage>>, _>("images")?.0,
        category: category.parse().map_err(|e| corrupt("category", e))?,
        stock: u32::try_from(stock).map_err(|e| corrupt("stock", e))?,
        brand: row.try_get("brand")?,
        specifications: row
            .try_get::<Json<std::collections::BTreeMap<String, String>>, _>("specifications")?
            .0,
        reviews: row.try_get::<Json<Vec<Review>>, _>("reviews")?.0,
        ratings: row.try_get("ratings")?,
        num_reviews: u32::try_from(num_reviews).map_err(|e| corrupt("num_reviews", e))?,
        is_featured: row.try_get("is_featured")?,
        is_active: row.try_get("is_active")?,
        created_by: row
            .try_get::<Option<Uuid>, _>("created_by")?
            .map(UserId::from_uuid),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_user(row: &PgRow) -> Result<User> {
    let email: String = row.try_get("email")?;
    let role: String = row.try_get("role")?;
    let wishlist: Vec<Uuid> = row.try_get("wishlist")?;

    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        email: Email::parse(&email).map_err(|e| corrupt("email", e))?,
        password_hash: row.try_get("password_hash")?,
        google_id: row.try_get("google_id")?,
        facebook_id: row.try_get("facebook_id")?,
        is_email_verified: row.try_get("is_email_verified")?,
        role: role.parse::<Role>().map_err(|e| corrupt("role", e))?,
        wishlist: wishlist.into_iter().map(ProductId::from_uuid).collect(),
        avatar: row.try_get("avatar")?,
        phone: row.try_get("phone")?,
        address: row
            .try_get::<Option<Json<Address>>, _>("address")?
            .map(|json| json.0),
        reset_password_token: row.try_get("reset_password_token")?,
        reset_password_expire: row.try_get("reset_password_expire")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_order(row: &PgRow) -> Result<Order> {
    let status: String = row.try_get("order_status")?;

    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        order_items: row.try_get::<Json<Vec<OrderItem>>, _>("order_items")?.0,
        shipping_address: row
            .try_get::<Json<ShippingAddress>, _>("shipping_address")?
            .0,
        payment_info: row.try_get::<Json<PaymentInfo>, _>("payment_info")?.0,
        items_price: domain::Money::from_cents(row.try_get("items_price")?),
        tax_price: domain::Money::from_cents(row.try_get("tax_price")?),
        shipping_price: domain::Money::from_cents(row.try_get("shipping_price")?),
        total_amount: domain::Money::from_cents(row.try_get("total_amount")?),
        order_status: status.parse().map_err(|e| corrupt("order_status", e))?,
        delivered_at: row.try_get("delivered_at")?,
        tracking_info: row
            .try_get::<Option<Json<TrackingInfo>>, _>("tracking_info")?
            .map(|json| json.0),
        order_notes: row.try_get("order_notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Inserts or fully overwrites a product row.
async fn write_product<'e, E: PgExecutor<'e>>(executor: E, product: &Product) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO products (id, name, description, price, discount_price, images, category,
            stock, brand, specifications, reviews, ratings, num_reviews, is_featured, is_active,
            created_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            description = EXCLUDED.description,
            price = EXCLUDED.price,
            discount_price = EXCLUDED.discount_price,
            images = EXCLUDED.images,
            category = EXCLUDED.category,
            stock = EXCLUDED.stock,
            brand = EXCLUDED.brand,
            specifications = EXCLUDED.specifications,
            reviews = EXCLUDED.reviews,
            ratings = EXCLUDED.ratings,
            num_reviews = EXCLUDED.num_reviews,
            is_featured = EXCLUDED.is_featured,
            is_active = EXCLUDED.is_active,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(product.id.as_uuid())
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price.cents())
    .bind(product.discount_price.map(|p| p.cents()))
    .bind(Json(&product.images))
    .bind(product.category.as_str())
    .bind(i64::from(product.stock))
    .bind(&product.brand)
    .bind(Json(&product.specifications))
    .bind(Json(&product.reviews))
    .bind(product.ratings)
    .bind(i32::try_from(product.num_reviews).unwrap_or(i32::MAX))
    .bind(product.is_featured)
    .bind(product.is_active)
    .bind(product.created_by.map(|u| u.as_uuid()))
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Inserts or fully overwrites a user row.
async fn write_user<'e, E: PgExecutor<'e>>(executor: E, user: &User) -> Result<()> {
    let wishlist: Vec<Uuid> = user.wishlist.iter().map(|p| p.as_uuid()).collect();

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, google_id, facebook_id,
            is_email_verified, role, wishlist, avatar, phone, address, reset_password_token,
            reset_password_expire, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            email = EXCLUDED.email,
            password_hash = EXCLUDED.password_hash,
            google_id = EXCLUDED.google_id,
            facebook_id = EXCLUDED.facebook_id,
            is_email_verified = EXCLUDED.is_email_verified,
            role = EXCLUDED.role,
            wishlist = EXCLUDED.wishlist,
            avatar = EXCLUDED.avatar,
            phone = EXCLUDED.phone,
            address = EXCLUDED.address,
            reset_password_token = EXCLUDED.reset_password_token,
            reset_password_expire = EXCLUDED.reset_password_expire,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(user.id.as_uuid())
    .bind(&user.name)
    .bind(user.email.as_str())
    .bind(&user.password_hash)
    .bind(&user.google_id)
    .bind(&user.facebook_id)
    .bind(user.is_email_verified)
    .bind(user.role.as_str())
    .bind(wishlist)
    .bind(&user.avatar)
    .bind(&user.phone)
    .bind(user.address.as_ref().map(Json))
    .bind(&user.reset_password_token)
    .bind(user.reset_password_expire)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(executor)
    .await
    .map_err(map_unique_violation)?;
    Ok(())
}

/// Inserts or fully overwrites an order row.
async fn write_order<'e, E: PgExecutor<'e>>(executor: E, order: &Order) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (id, user_id, order_items, shipping_address, payment_info,
            items_price, tax_price, shipping_price, total_amount, order_status, delivered_at,
            tracking_info, order_notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ON CONFLICT (id) DO UPDATE SET
            order_items = EXCLUDED.order_items,
            shipping_address = EXCLUDED.shipping_address,
            payment_info = EXCLUDED.payment_info,
            items_price = EXCLUDED.items_price,
            tax_price = EXCLUDED.tax_price,
            shipping_price = EXCLUDED.shipping_price,
            total_amount = EXCLUDED.total_amount,
            order_status = EXCLUDED.order_status,
            delivered_at = EXCLUDED.delivered_at,
            tracking_info = EXCLUDED.tracking_info,
            order_notes = EXCLUDED.order_notes,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(order.id.as_uuid())
    .bind(order.user.as_uuid())
    .bind(Json(&order.order_items))
    .bind(Json(&order.shipping_address))
    .bind(Json(&order.payment_info))
    .bind(order.items_price.cents())
    .bind(order.tax_price.cents())
    .bind(order.shipping_price.cents())
    .bind(order.total_amount.cents())
    .bind(order.order_status.as_str())
    .bind(order.delivered_at)
    .bind(order.tracking_info.as_ref().map(Json))
    .bind(&order.order_notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Builds the `WHERE` clause for a catalog query. Parameters are numbered
/// from `$1` in the order [`bind_filters`] binds them.
fn filter_sql(query: &ProductQuery) -> (String, usize) {
    let mut sql = String::from(" WHERE 1=1");
    let mut param_count = 0;

    if query.active_only {
        sql.push_str(" AND is_active");
    }
    if query.featured_only {
        sql.push_str(" AND is_featured");
    }
    if query.deals_only {
        sql.push_str(" AND discount_price IS NOT NULL");
    }
    if query.category.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND category = ${param_count}"));
    }
    if query.min_price.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND price >= ${param_count}"));
    }
    if query.max_price.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND price <= ${param_count}"));
    }
    if query.min_rating.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND ratings >= ${param_count}"));
    }
    if query.exclude.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND id <> ${param_count}"));
    }
    if query.keyword.is_some() {
        param_count += 1;
        sql.push_str(&format!(
            " AND (name ILIKE ${param_count} OR description ILIKE ${param_count})"
        ));
    }

    (sql, param_count)
}

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>;

fn bind_filters<'q>(mut sqlx_query: PgQuery<'q>, query: &ProductQuery) -> PgQuery<'q> {
    if let Some(category) = query.category {
        sqlx_query = sqlx_query.bind(category.as_str());
    }
    if let Some(min) = query.min_price {
        sqlx_query = sqlx_query.bind(min);
    }
    if let Some(max) = query.max_price {
        sqlx_query = sqlx_query.bind(max);
    }
    if let Some(rating) = query.min_rating {
        sqlx_query = sqlx_query.bind(rating);
    }
    if let Some(excluded) = query.exclude {
        sqlx_query = sqlx_query.bind(excluded.as_uuid());
    }
    if let Some(ref keyword) = query.keyword {
        sqlx_query = sqlx_query.bind(escape_like(keyword));
    }
    sqlx_query
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn insert_product(&self, product: Product) -> Result<()> {
        write_product(&self.pool, &product).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(uuids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_id = rows
            .iter()
            .map(|row| row_to_product(row).map(|p| (p.id, p)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn update_product<F>(&self, id: ProductId, update: F) -> Result<Product>
    where
        F: FnOnce(&mut Product) -> std::result::Result<(), DomainError> + Send,
    {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Product", id))?;

        let mut product = row_to_product(&row)?;
        update(&mut product)?;
        write_product(&mut *tx, &product).await?;

        tx.commit().await?;
        Ok(product)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_products(&self, query: ProductQuery) -> Result<ProductPage> {
        let (where_sql, param_count) = filter_sql(&query);

        let count_sql = format!("SELECT COUNT(*) AS total FROM products{where_sql}");
        let count_row = bind_filters(sqlx::query(&count_sql), &query)
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = count_row.try_get("total")?;

        let list_sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products{where_sql} ORDER BY {} LIMIT ${} OFFSET ${}",
            query.sort.sql(),
            param_count + 1,
            param_count + 2,
        );
        let rows = bind_filters(sqlx::query(&list_sql), &query)
            .bind(i64::from(query.limit))
            .bind(query.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(ProductPage {
            products: rows.iter().map(row_to_product).collect::<Result<_>>()?,
            total: total.max(0) as u64,
        })
    }

    async fn distinct_categories(&self) -> Result<Vec<Category>> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM products ORDER BY category")
                .fetch_all(&self.pool)
                .await?;

        let mut categories = names
            .iter()
            .map(|name| name.parse().map_err(|e| corrupt("category", e)))
            .collect::<Result<Vec<Category>>>()?;
        categories.sort();
        Ok(categories)
    }

    async fn count_products(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn decrement_stock_if_available(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> Result<StockOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(StockOutcome::Decremented);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        Ok(if exists {
            StockOutcome::Insufficient
        } else {
            StockOutcome::Missing
        })
    }

    async fn increment_stock(&self, id: ProductId, quantity: u32) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE products SET stock = stock + $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert_user(&self, user: User) -> Result<()> {
        write_user(&self.pool, &user).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE google_id = $1"
        ))
        .bind(google_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn update_user<F>(&self, id: UserId, update: F) -> Result<User>
    where
        F: FnOnce(&mut User) -> std::result::Result<(), DomainError> + Send,
    {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("User", id))?;

        let mut user = row_to_user(&row)?;
        update(&mut user)?;
        write_user(&mut *tx, &user).await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_user).collect()
    }

    async fn count_users(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: Order) -> Result<()> {
        write_order(&self.pool, &order).await
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_order).transpose()
    }

    async fn update_order<F>(&self, id: OrderId, update: F) -> Result<Order>
    where
        F: FnOnce(&mut Order) -> std::result::Result<(), DomainError> + Send,
    {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Order", id))?;

        let mut order = row_to_order(&row)?;
        update(&mut order)?;
        write_order(&mut *tx, &order).await?;

        tx.commit().await?;
        Ok(order)
    }

    async fn list_orders_for_user(&self, user: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id ASC"
        ))
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_order).collect()
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_order).collect()
    }

    async fn count_orders(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
