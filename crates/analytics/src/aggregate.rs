//! Folds over the order ledger.
//!
//! All functions are pure so they can be unit tested without a store.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Utc};
use domain::{Money, Order, OrderStatus, ProductId};

use crate::dashboard::{MonthlyRevenue, StatusCount};

/// Units and revenue sold for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSales {
    pub product: ProductId,
    pub units: u64,
    pub revenue: Money,
}

/// Sum of delivered order totals.
pub fn delivered_revenue(orders: &[Order]) -> Money {
    orders
        .iter()
        .filter(|o| o.order_status == OrderStatus::Delivered)
        .map(|o| o.total_amount)
        .sum()
}

/// Order counts per status, in lifecycle order. Statuses with no orders
/// are left out.
pub fn orders_by_status(orders: &[Order]) -> Vec<StatusCount> {
    let mut counts: BTreeMap<OrderStatus, u64> = BTreeMap::new();
    for order in orders {
        *counts.entry(order.order_status).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect()
}

/// Delivered revenue grouped by the month the order was placed, for orders
/// placed at or after `since`. Oldest month first.
pub fn revenue_by_month(orders: &[Order], since: DateTime<Utc>) -> Vec<MonthlyRevenue> {
    let mut months: BTreeMap<(i32, u32), (Money, u64)> = BTreeMap::new();
    for order in orders
        .iter()
        .filter(|o| o.order_status == OrderStatus::Delivered && o.created_at >= since)
    {
        let key = (order.created_at.year(), order.created_at.month());
        let entry = months.entry(key).or_default();
        entry.0 += order.total_amount;
        entry.1 += 1;
    }
    months
        .into_iter()
        .map(|((year, month), (revenue, orders))| MonthlyRevenue {
            year,
            month,
            revenue,
            orders,
        })
        .collect()
}

/// Units sold per product across every order that was not cancelled.
/// Best sellers first; ties broken by revenue, then by product id so the
/// ranking is stable.
pub fn product_sales(orders: &[Order]) -> Vec<ProductSales> {
    let mut sales: HashMap<ProductId, ProductSales> = HashMap::new();
    for order in orders
        .iter()
        .filter(|o| o.order_status != OrderStatus::Cancelled)
    {
        for item in &order.order_items {
            let entry = sales.entry(item.product).or_insert(ProductSales {
                product: item.product,
                units: 0,
                revenue: Money::zero(),
            });
            entry.units += u64::from(item.quantity);
            entry.revenue += item.line_total();
        }
    }

    let mut ranked: Vec<ProductSales> = sales.into_values().collect();
    ranked.sort_by(|a, b| {
        b.units
            .cmp(&a.units)
            .then(b.revenue.cmp(&a.revenue))
            .then(a.product.cmp(&b.product))
    });
    ranked
}
