//! Wishlist and cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::ProductId;
use serde_json::{Value, json};
use store::Store;

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::routes::parse_id;
use crate::state::AppState;

/// GET /users/wishlist
#[tracing::instrument(skip(state))]
pub async fn wishlist<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let wishlist = state.accounts.wishlist(identity).await?;
    Ok(Json(json!({ "success": true, "wishlist": wishlist })))
}

/// POST /users/wishlist/{productId}
#[tracing::instrument(skip(state))]
pub async fn add_to_wishlist<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(identity): AuthUser,
    Path(product): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let product: ProductId = parse_id(&product)?;
    let wishlist = state.accounts.add_to_wishlist(identity, product).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Product added to wishlist",
        "wishlist": wishlist,
    })))
}

/// DELETE /users/wishlist/{productId}
#[tracing::instrument(skip(state))]
pub async fn remove_from_wishlist<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(identity): AuthUser,
    Path(product): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let product: ProductId = parse_id(&product)?;
    let wishlist = state.accounts.remove_from_wishlist(identity, product).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Product removed from wishlist",
        "wishlist": wishlist,
    })))
}

/// GET /users/cart: the cart lives in the client.
pub async fn cart(AuthUser(_): AuthUser) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Cart is managed on client-side",
        "cart": [],
    }))
}
