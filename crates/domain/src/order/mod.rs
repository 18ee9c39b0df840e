//! Orders and their lifecycle.

mod state;
mod value_objects;

pub use state::OrderStatus;
pub use value_objects::{
    OrderItem, PaymentInfo, PaymentMethod, PaymentStatus, ShippingAddress, TrackingInfo,
};

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;

/// A requested line: which product and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NewOrderLine {
    pub product: ProductId,
    pub quantity: u32,
}

/// Everything the buyer supplies when placing an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub lines: Vec<NewOrderLine>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub tax_price: Money,
    pub shipping_price: Money,
    pub notes: Option<String>,
}

impl NewOrder {
    /// Checks the request before any stock is touched.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.lines.is_empty() {
            return Err(DomainError::validation("No order items provided"));
        }
        if self.lines.iter().any(|l| l.quantity == 0) {
            return Err(DomainError::validation("Quantity must be at least 1"));
        }
        self.shipping_address.validate()?;
        if self.tax_price.is_negative() || self.shipping_price.is_negative() {
            return Err(DomainError::validation("Prices cannot be negative"));
        }
        Ok(())
    }
}

/// A placed order.
///
/// `total_amount` always equals `items_price + tax_price + shipping_price`;
/// [`Order::prepare_for_save`] re-establishes this before every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user: UserId,
    pub order_items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_info: PaymentInfo,
    pub items_price: Money,
    pub tax_price: Money,
    pub shipping_price: Money,
    pub total_amount: Money,
    pub order_status: OrderStatus,
    pub delivered_at: Option<DateTime<Utc>>,
    pub tracking_info: Option<TrackingInfo>,
    pub order_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a new `Pending` order from line-item snapshots.
    ///
    /// `items_price` is the sum of the snapshot line totals; payment starts
    /// out `Pending` regardless of what the client claims.
    pub fn place(
        user: UserId,
        order_items: Vec<OrderItem>,
        request: NewOrder,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let items_price = order_items.iter().map(OrderItem::line_total).sum();
        let mut order = Self {
            id: OrderId::new(),
            user,
            order_items,
            shipping_address: request.shipping_address,
            payment_info: PaymentInfo {
                method: request.payment_method,
                status: Default::default(),
                transaction_id: request.transaction_id,
                paid_at: None,
            },
            items_price,
            tax_price: request.tax_price,
            shipping_price: request.shipping_price,
            total_amount: Money::zero(),
            order_status: OrderStatus::Pending,
            delivered_at: None,
            tracking_info: None,
            order_notes: request.notes.filter(|n| !n.trim().is_empty()),
            created_at: now,
            updated_at: now,
        };
        order.prepare_for_save()?;
        Ok(order)
    }

    /// Validates the record and recomputes `total_amount`. Called right
    /// before every persistence call.
    pub fn prepare_for_save(&mut self) -> Result<(), DomainError> {
        if self.order_items.is_empty() {
            return Err(DomainError::validation("No order items provided"));
        }
        if self.order_items.iter().any(|i| i.quantity == 0) {
            return Err(DomainError::validation("Quantity must be at least 1"));
        }
        if self.items_price.is_negative()
            || self.tax_price.is_negative()
            || self.shipping_price.is_negative()
        {
            return Err(DomainError::validation("Prices cannot be negative"));
        }
        self.shipping_address.validate()?;
        self.total_amount = self.items_price + self.tax_price + self.shipping_price;
        Ok(())
    }

    /// Admin status update.
    ///
    /// Terminal orders reject every change. Moving to `Delivered` stamps the
    /// delivery time and marks the payment completed.
    pub fn apply_status(
        &mut self,
        target: OrderStatus,
        tracking: Option<TrackingInfo>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.order_status.is_terminal() {
            return Err(DomainError::OrderFinalized {
                current: self.order_status,
            });
        }
        if !self.order_status.can_transition_to(target) {
            return Err(DomainError::InvalidTarget { target });
        }

        self.order_status = target;
        if target == OrderStatus::Delivered {
            self.delivered_at = Some(now);
            self.payment_info.status = PaymentStatus::Completed;
            self.payment_info.paid_at = Some(now);
        }
        if let Some(tracking) = tracking {
            self.tracking_info = Some(tracking);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Buyer/admin cancellation, allowed only before shipping.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.order_status.can_cancel() {
            return Err(DomainError::CannotCancel {
                current: self.order_status,
            });
        }
        self.order_status = OrderStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    /// Total quantity across all lines.
    pub fn unit_count(&self) -> u64 {
        self.order_items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}
