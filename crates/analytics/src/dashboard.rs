//! Serialized dashboard shapes.

use chrono::{DateTime, Utc};
use domain::{Money, OrderId, OrderStatus, ProductId};
use serde::Serialize;

/// Everything the admin dashboard shows, taken at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalytics {
    pub total_users: u64,
    pub total_products: u64,
    pub total_orders: u64,
    /// Sum of delivered order totals.
    pub total_revenue: Money,
    pub recent_orders: Vec<RecentOrder>,
    pub orders_by_status: Vec<StatusCount>,
    pub revenue_by_month: Vec<MonthlyRevenue>,
    pub top_products: Vec<TopProduct>,
}

/// A recent order with its buyer's contact details. The buyer fields are
/// `None` when the account has since been deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: OrderId,
    pub buyer_name: Option<String>,
    pub buyer_email: Option<String>,
    pub total_amount: Money,
    pub order_status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    pub revenue: Money,
    pub orders: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product: ProductId,
    pub name: String,
    pub image: String,
    pub units_sold: u64,
    pub revenue: Money,
}
