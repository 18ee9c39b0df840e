//! HTTP API server for the storefront backend.
//!
//! Provides the REST surface over the workflow services, with structured
//! logging (tracing), Prometheus metrics and static serving of uploaded
//! product images.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::ApiError;
pub use state::AppState;

/// Production only admits the frontend origin, with credentials so the
/// session cookie travels. Elsewhere any origin is allowed.
fn cors_layer(config: &Config) -> CorsLayer {
    match config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) if config.is_production() => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
        _ => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

/// Builds the router with every route, shared state and middleware.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let cors = cors_layer(&state.config);
    let expose_internal = state.config.is_development();
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .route("/health", get(routes::health::check))
        // Auth
        .route("/auth/register", post(routes::auth::register::<S>))
        .route("/auth/login", post(routes::auth::login::<S>))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/google", get(routes::auth::google::<S>))
        .route("/auth/google/callback", get(routes::auth::google_callback::<S>))
        .route(
            "/auth/profile",
            get(routes::auth::profile::<S>).put(routes::auth::update_profile::<S>),
        )
        .route("/auth/change-password", put(routes::auth::change_password::<S>))
        // Catalog
        .route("/products", get(routes::products::list::<S>))
        .route("/products/featured", get(routes::products::featured::<S>))
        .route("/products/categories", get(routes::products::categories::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/products/{id}/related", get(routes::products::related::<S>))
        .route("/products/{id}/reviews", post(routes::products::add_review::<S>))
        // Orders
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/my-orders", get(routes::orders::my_orders::<S>))
        .route("/orders/admin/all", get(routes::orders::all::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", put(routes::orders::cancel::<S>))
        .route("/orders/{id}/status", put(routes::orders::update_status::<S>))
        // Wishlist & cart
        .route("/users/wishlist", get(routes::users::wishlist::<S>))
        .route(
            "/users/wishlist/{product_id}",
            post(routes::users::add_to_wishlist::<S>)
                .delete(routes::users::remove_from_wishlist::<S>),
        )
        .route("/users/cart", get(routes::users::cart))
        // Admin
        .route("/admin/products", post(routes::admin::create_product::<S>))
        .route(
            "/admin/products/{id}",
            put(routes::admin::update_product::<S>).delete(routes::admin::delete_product::<S>),
        )
        .route("/admin/products/{id}/stock", put(routes::admin::update_stock::<S>))
        .route(
            "/admin/products/{id}/images",
            put(routes::admin::upload_images::<S>)
                .layer(DefaultBodyLimit::max(routes::admin::MAX_UPLOAD_BYTES)),
        )
        .route("/admin/users", get(routes::admin::users::<S>))
        .route("/admin/users/{id}/role", put(routes::admin::update_role::<S>))
        .route("/admin/users/{id}", delete(routes::admin::delete_user::<S>))
        .route("/admin/analytics", get(routes::admin::analytics::<S>))
        .with_state(state)
        .layer(middleware::map_response_with_state(
            expose_internal,
            error::expose_internal_detail,
        ))
        .nest_service("/uploads", uploads)
        .merge(metrics_router)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
