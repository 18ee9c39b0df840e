//! Order placement, status changes and cancellation.

use std::time::Instant;

use chrono::Utc;
use domain::{
    Identity, Money, NewOrder, Order, OrderId, OrderItem, OrderStatus, ProductId, TrackingInfo,
};
use store::{StockOutcome, Store};

use crate::error::{Result, WorkflowError};

/// Every order, plus the sum of their totals.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub orders: Vec<Order>,
    pub total_amount: Money,
}

/// Coordinates the order ledger and the catalog so stock never goes
/// negative and cancelled orders give their units back exactly once.
///
/// Stock is reserved line by line with an atomic conditional decrement.
/// If a later line or the order insert fails, every reservation made so
/// far is released again.
#[derive(Clone)]
pub struct OrderWorkflow<S: Store> {
    store: S,
}

impl<S: Store> OrderWorkflow<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Places an order for the caller.
    ///
    /// All-or-nothing: on any failure no order exists and every product's
    /// stock is back where it started.
    #[tracing::instrument(skip(self, request), fields(user_id = %identity.user_id, lines = request.lines.len()))]
    pub async fn create(&self, identity: Identity, request: NewOrder) -> Result<Order> {
        let start = Instant::now();
        let mut reserved = Vec::with_capacity(request.lines.len());

        let result = self.place(identity, request, &mut reserved).await;
        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(order_id = %order.id, total = %order.total_amount, "order placed");
            }
            Err(e) => {
                metrics::counter!("order_creation_failures_total").increment(1);
                tracing::warn!(error = %e, reserved = reserved.len(), "order placement failed");
                self.release(&reserved).await;
            }
        }
        metrics::histogram!("order_creation_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        result
    }

    /// Reserves stock for each line, snapshots the product, then persists
    /// the order. Successful reservations are recorded in `reserved`.
    async fn place(
        &self,
        identity: Identity,
        request: NewOrder,
        reserved: &mut Vec<(ProductId, u32)>,
    ) -> Result<Order> {
        request.validate()?;

        let mut items = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let product = self
                .store
                .get_product(line.product)
                .await?
                .ok_or_else(|| {
                    WorkflowError::NotFound(format!("Product not found: {}", line.product))
                })?;

            match self
                .store
                .decrement_stock_if_available(line.product, line.quantity)
                .await?
            {
                StockOutcome::Decremented => reserved.push((line.product, line.quantity)),
                StockOutcome::Insufficient => {
                    return Err(WorkflowError::InsufficientStock {
                        product: product.name,
                    });
                }
                StockOutcome::Missing => {
                    return Err(WorkflowError::NotFound(format!(
                        "Product not found: {}",
                        line.product
                    )));
                }
            }

            items.push(OrderItem {
                product: product.id,
                name: product.name.clone(),
                quantity: line.quantity,
                image: product.primary_image().to_string(),
                price: product.effective_price(),
            });
        }

        let order = Order::place(identity.user_id, items, request, Utc::now())?;
        self.store.insert_order(order.clone()).await?;
        Ok(order)
    }

    /// Gives reserved units back, most recent first. Failures are logged
    /// and skipped so one bad product does not strand the others.
    async fn release(&self, reserved: &[(ProductId, u32)]) {
        for &(product, quantity) in reserved.iter().rev() {
            metrics::counter!("stock_compensations_total").increment(1);
            match self.store.increment_stock(product, quantity).await {
                Ok(true) => {
                    tracing::debug!(%product, quantity, "reservation released");
                }
                Ok(false) => {
                    tracing::warn!(%product, quantity, "reserved product vanished before release");
                }
                Err(e) => {
                    tracing::error!(%product, quantity, error = %e, "failed to release reservation");
                }
            }
        }
    }

    /// Returns the units of a cancelled order to stock. Products deleted
    /// since purchase are skipped.
    async fn restore_stock(&self, order: &Order) {
        for item in &order.order_items {
            match self.store.increment_stock(item.product, item.quantity).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(product = %item.product, "skipping restock of deleted product");
                }
                Err(e) => {
                    tracing::error!(product = %item.product, error = %e, "failed to restock");
                }
            }
        }
    }

    /// Admin status update. Terminal orders reject every change; moving to
    /// `Cancelled` restores stock like a regular cancellation.
    #[tracing::instrument(skip(self, tracking), fields(admin = %identity.user_id))]
    pub async fn update_status(
        &self,
        identity: Identity,
        id: OrderId,
        target: OrderStatus,
        tracking: Option<TrackingInfo>,
    ) -> Result<Order> {
        identity.require_admin()?;

        let now = Utc::now();
        let order = self
            .store
            .update_order(id, |order| order.apply_status(target, tracking, now))
            .await?;

        if target == OrderStatus::Cancelled {
            self.restore_stock(&order).await;
            metrics::counter!("orders_cancelled_total").increment(1);
        }
        tracing::info!(order_id = %id, status = %target, "order status updated");
        Ok(order)
    }

    /// Owner or admin cancellation of a `Pending` or `Processing` order.
    #[tracing::instrument(skip(self), fields(user_id = %identity.user_id))]
    pub async fn cancel(&self, identity: Identity, id: OrderId) -> Result<Order> {
        let existing = self
            .store
            .get_order(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Order"))?;
        identity.require_owner_or_admin(existing.user, "cancel this order")?;

        let now = Utc::now();
        let order = self
            .store
            .update_order(id, |order| order.cancel(now))
            .await?;

        self.restore_stock(&order).await;
        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %id, "order cancelled");
        Ok(order)
    }

    /// Loads an order visible to the caller.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, identity: Identity, id: OrderId) -> Result<Order> {
        let order = self
            .store
            .get_order(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Order"))?;
        identity.require_owner_or_admin(order.user, "view this order")?;
        Ok(order)
    }

    /// The caller's own orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn my_orders(&self, identity: Identity) -> Result<Vec<Order>> {
        Ok(self.store.list_orders_for_user(identity.user_id).await?)
    }

    /// Every order, newest first. Admin only.
    #[tracing::instrument(skip(self))]
    pub async fn all_orders(&self, identity: Identity) -> Result<OrderSummary> {
        identity.require_admin()?;
        let orders = self.store.list_orders().await?;
        let total_amount = orders.iter().map(|o| o.total_amount).sum();
        Ok(OrderSummary {
            orders,
            total_amount,
        })
    }
}
