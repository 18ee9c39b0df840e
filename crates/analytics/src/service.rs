//! Dashboard snapshot assembly.

use std::collections::HashMap;

use chrono::{DateTime, Months, Utc};
use domain::{Identity, User, UserId};
use store::Store;

use crate::Result;
use crate::aggregate::{delivered_revenue, orders_by_status, product_sales, revenue_by_month};
use crate::dashboard::{DashboardAnalytics, RecentOrder, TopProduct};

pub const RECENT_ORDERS: usize = 5;
pub const TOP_PRODUCTS: usize = 5;
pub const REVENUE_MONTHS: u32 = 6;

#[derive(Clone)]
pub struct AnalyticsService<S: Store> {
    store: S,
}

impl<S: Store> AnalyticsService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Builds the admin dashboard as of `now`. Admin only.
    #[tracing::instrument(skip(self), fields(admin = %identity.user_id))]
    pub async fn dashboard(
        &self,
        identity: Identity,
        now: DateTime<Utc>,
    ) -> Result<DashboardAnalytics> {
        identity.require_admin()?;

        let orders = self.store.list_orders().await?;
        let total_users = self.store.count_users().await?;
        let total_products = self.store.count_products().await?;

        let users: HashMap<UserId, User> = self
            .store
            .list_users()
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        // list_orders is newest first
        let recent_orders = orders
            .iter()
            .take(RECENT_ORDERS)
            .map(|order| {
                let buyer = users.get(&order.user);
                RecentOrder {
                    id: order.id,
                    buyer_name: buyer.map(|u| u.name.clone()),
                    buyer_email: buyer.map(|u| u.email.as_str().to_string()),
                    total_amount: order.total_amount,
                    order_status: order.order_status,
                    created_at: order.created_at,
                }
            })
            .collect();

        let since = now
            .checked_sub_months(Months::new(REVENUE_MONTHS))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut top_products = Vec::with_capacity(TOP_PRODUCTS);
        for sales in product_sales(&orders) {
            if top_products.len() == TOP_PRODUCTS {
                break;
            }
            // Deleted products drop out of the ranking
            let Some(product) = self.store.get_product(sales.product).await? else {
                continue;
            };
            top_products.push(TopProduct {
                product: product.id,
                image: product.primary_image().to_string(),
                name: product.name,
                units_sold: sales.units,
                revenue: sales.revenue,
            });
        }

        let analytics = DashboardAnalytics {
            total_users,
            total_products,
            total_orders: orders.len() as u64,
            total_revenue: delivered_revenue(&orders),
            recent_orders,
            orders_by_status: orders_by_status(&orders),
            revenue_by_month: revenue_by_month(&orders, since),
            top_products,
        };
        tracing::debug!(
            orders = analytics.total_orders,
            revenue = %analytics.total_revenue,
            "dashboard computed"
        );
        Ok(analytics)
    }
}
