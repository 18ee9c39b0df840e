//! Public catalog endpoints and reviews.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{Category, ProductId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use store::{DEFAULT_PAGE_SIZE, ProductQuery, ProductSort, Store};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, AuthUser};
use crate::routes::parse_id;
use crate::state::AppState;

/// Query string of `GET /products`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub rating: Option<f64>,
    pub deals: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
}

impl ListParams {
    fn into_query(self) -> Result<ProductQuery, ApiError> {
        let mut query = ProductQuery::new()
            .price_range(self.min_price, self.max_price)
            .sort(ProductSort::parse(self.sort.as_deref().unwrap_or("-createdAt")))
            .paginate(
                self.page.unwrap_or(1),
                self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            );

        if let Some(keyword) = self.keyword.filter(|k| !k.trim().is_empty()) {
            query = query.keyword(keyword.trim());
        }
        if let Some(category) = self.category.filter(|c| !c.is_empty() && c != "All") {
            let category: Category = category
                .parse()
                .map_err(|e: domain::DomainError| ApiError::BadRequest(e.to_string()))?;
            query = query.category(category);
        }
        if let Some(rating) = self.rating {
            query = query.min_rating(rating);
        }
        if self.deals.as_deref() == Some("true") {
            query = query.deals_only();
        }
        Ok(query)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<domain::Product>,
    pub total_products: u64,
    pub total_pages: u64,
    pub current_page: u32,
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

/// GET /products
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let query = params.into_query()?;
    let (page, limit) = (query.page, query.limit);
    let result = state.catalog.list(query).await?;
    Ok(Json(ProductListResponse {
        success: true,
        total_pages: result.total_pages(limit),
        total_products: result.total,
        products: result.products,
        current_page: page,
    }))
}

/// GET /products/featured
#[tracing::instrument(skip(state))]
pub async fn featured<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Value>, ApiError> {
    let products = state.catalog.featured().await?;
    Ok(Json(json!({ "success": true, "products": products })))
}

/// GET /products/categories
#[tracing::instrument(skip(state))]
pub async fn categories<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Value>, ApiError> {
    let categories = state.catalog.categories().await?;
    Ok(Json(json!({ "success": true, "categories": categories })))
}

/// GET /products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let product = state.catalog.get(id).await?;
    Ok(Json(json!({ "success": true, "product": product })))
}

/// GET /products/{id}/related
#[tracing::instrument(skip(state))]
pub async fn related<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let products = state.catalog.related(id).await?;
    Ok(Json(json!({ "success": true, "products": products })))
}

/// POST /products/{id}/reviews
#[tracing::instrument(skip(state, req))]
pub async fn add_review<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id: ProductId = parse_id(&id)?;
    let product = state
        .catalog
        .add_review(identity, id, req.rating, req.comment)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Review added successfully",
            "ratings": product.ratings,
            "numReviews": product.num_reviews,
            "product": product,
        })),
    ))
}
