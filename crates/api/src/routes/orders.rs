//! Order placement, history and status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{
    Money, NewOrder, NewOrderLine, OrderId, OrderStatus, PaymentMethod, ShippingAddress,
    TrackingInfo,
};
use serde::Deserialize;
use serde_json::{Value, json};
use store::Store;

use crate::error::ApiError;
use crate::extract::{AdminUser, ApiJson, AuthUser};
use crate::routes::parse_id;
use crate::state::AppState;

/// Body of `POST /orders`. Client-supplied `itemsPrice`, `totalAmount` and
/// per-line prices are ignored; they are recomputed from the catalog.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub order_items: Vec<OrderLineRequest>,
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub payment_info: PaymentRequest,
    #[serde(default)]
    pub tax_price: i64,
    #[serde(default)]
    pub shipping_price: i64,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub product: String,
    pub quantity: u32,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[serde(default)]
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub status: OrderStatus,
    pub tracking_info: Option<TrackingInfo>,
}

impl CreateOrderRequest {
    fn into_new_order(self) -> Result<NewOrder, ApiError> {
        let lines = self
            .order_items
            .into_iter()
            .map(|line| -> Result<NewOrderLine, ApiError> {
                Ok(NewOrderLine {
                    product: parse_id(&line.product)?,
                    quantity: line.quantity,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewOrder {
            lines,
            shipping_address: self.shipping_address,
            payment_method: self.payment_info.method,
            transaction_id: self.payment_info.transaction_id,
            tax_price: Money::from_cents(self.tax_price),
            shipping_price: Money::from_cents(self.shipping_price),
            notes: self.notes,
        })
    }
}

/// POST /orders
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(identity): AuthUser,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let order = state.orders.create(identity, req.into_new_order()?).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Order created successfully",
            "order": order,
        })),
    ))
}

/// GET /orders/my-orders
#[tracing::instrument(skip(state))]
pub async fn my_orders<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let orders = state.orders.my_orders(identity).await?;
    Ok(Json(json!({ "success": true, "orders": orders })))
}

/// GET /orders/admin/all
#[tracing::instrument(skip(state))]
pub async fn all<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(identity): AdminUser,
) -> Result<Json<Value>, ApiError> {
    let summary = state.orders.all_orders(identity).await?;
    Ok(Json(json!({
        "success": true,
        "totalOrders": summary.orders.len(),
        "totalAmount": summary.total_amount,
        "orders": summary.orders,
    })))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let order = state.orders.get_order(identity, id).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

/// PUT /orders/{id}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let order = state.orders.cancel(identity, id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Order cancelled successfully",
        "order": order,
    })))
}

/// PUT /orders/{id}/status
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(identity): AdminUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> Result<Json<Value>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let order = state
        .orders
        .update_status(identity, id, req.status, req.tracking_info)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Order status updated successfully",
        "order": order,
    })))
}
