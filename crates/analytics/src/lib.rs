//! Admin dashboard analytics.
//!
//! Aggregates are computed on demand from the store rather than maintained
//! incrementally:
//! - [`AnalyticsService`] loads orders, users and products for one snapshot
//! - [`aggregate`] holds the pure folds over the order ledger
//! - [`DashboardAnalytics`] is the serialized result

pub mod aggregate;
pub mod dashboard;
pub mod error;
pub mod service;

pub use dashboard::{DashboardAnalytics, MonthlyRevenue, RecentOrder, StatusCount, TopProduct};
pub use error::{AnalyticsError, Result};
pub use service::{AnalyticsService, RECENT_ORDERS, REVENUE_MONTHS, TOP_PRODUCTS};
