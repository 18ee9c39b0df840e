//! Admin-only catalog, user and analytics endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use domain::{NewProduct, ProductId, ProductImage, ProductUpdate, Role, UserId};
use serde::Deserialize;
use serde_json::{Value, json};
use store::Store;
use workflow::MAX_PRODUCT_IMAGES;

use crate::error::ApiError;
use crate::extract::{AdminUser, ApiJson};
use crate::routes::parse_id;
use crate::state::AppState;

/// Public path prefix of stored uploads.
const UPLOADS_PREFIX: &str = "/uploads/";

/// Request body cap for image uploads.
pub const MAX_UPLOAD_BYTES: usize = 30 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

/// POST /admin/products
#[tracing::instrument(skip(state, new))]
pub async fn create_product<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(identity): AdminUser,
    ApiJson(new): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let product = state.catalog.create_product(identity, new).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Product created successfully",
            "product": product,
        })),
    ))
}

/// PUT /admin/products/{id}
#[tracing::instrument(skip(state, update))]
pub async fn update_product<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(identity): AdminUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ProductUpdate>,
) -> Result<Json<Value>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let product = state.catalog.update_product(identity, id, update).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Product updated successfully",
        "product": product,
    })))
}

/// DELETE /admin/products/{id}
#[tracing::instrument(skip(state))]
pub async fn delete_product<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(identity): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    state.catalog.delete_product(identity, id).await?;
    Ok(Json(json!({ "success": true, "message": "Product deleted successfully" })))
}

/// PUT /admin/products/{id}/stock
#[tracing::instrument(skip(state))]
pub async fn update_stock<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(identity): AdminUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<StockRequest>,
) -> Result<Json<Value>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let product = state.catalog.set_stock(identity, id, req.stock).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Stock updated successfully",
        "product": product,
    })))
}

/// Maps an upload's content type to the stored file extension.
fn image_extension(content_type: Option<&str>) -> Result<&'static str, ApiError> {
    match content_type {
        Some("image/jpeg") | Some("image/jpg") => Ok("jpg"),
        Some("image/png") => Ok("png"),
        Some("image/webp") => Ok("webp"),
        Some("image/gif") => Ok("gif"),
        _ => Err(ApiError::BadRequest(
            "Only image files are allowed".to_string(),
        )),
    }
}

/// PUT /admin/products/{id}/images: multipart `images` fields replace the
/// product's images. Files land in the upload directory and are served
/// under `/uploads/`.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_images<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(identity): AdminUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let product = state.catalog.get(id).await?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("images") {
            continue;
        }
        let extension = image_extension(field.content_type())?;
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;
        files.push((extension, data));
        if files.len() > MAX_PRODUCT_IMAGES {
            return Err(ApiError::BadRequest(format!(
                "A product can have at most {MAX_PRODUCT_IMAGES} images"
            )));
        }
    }
    if files.is_empty() {
        return Err(ApiError::BadRequest(
            "Please upload at least one image".to_string(),
        ));
    }

    let dir = &state.config.upload_dir;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ApiError::Internal(format!("cannot create upload directory: {e}")))?;

    let mut images = Vec::with_capacity(files.len());
    for (extension, data) in files {
        let file_name = format!("{}.{extension}", uuid::Uuid::new_v4());
        if let Err(e) = tokio::fs::write(dir.join(&file_name), &data).await {
            discard_uploads(dir, &images).await;
            return Err(ApiError::Internal(format!("cannot store upload: {e}")));
        }
        tracing::debug!(%file_name, bytes = data.len(), "image stored");
        images.push(ProductImage {
            url: format!("{UPLOADS_PREFIX}{file_name}"),
            alt: Some(product.name.clone()),
        });
    }

    let updated = match state.catalog.replace_images(identity, id, images.clone()).await {
        Ok(updated) => updated,
        Err(e) => {
            discard_uploads(dir, &images).await;
            return Err(e.into());
        }
    };
    discard_uploads(dir, &product.images).await;

    Ok(Json(json!({
        "success": true,
        "message": "Images uploaded successfully",
        "product": updated,
    })))
}

/// Deletes the stored files behind `/uploads/` image urls. External urls
/// and names that would leave the upload directory are skipped.
async fn discard_uploads(dir: &std::path::Path, images: &[ProductImage]) {
    for image in images {
        let Some(file_name) = image.url.strip_prefix(UPLOADS_PREFIX) else {
            continue;
        };
        if file_name.is_empty() || file_name.starts_with('.') || file_name.contains(['/', '\\']) {
            continue;
        }
        if let Err(e) = tokio::fs::remove_file(dir.join(file_name)).await {
            tracing::warn!(%file_name, error = %e, "stale upload not removed");
        }
    }
}

/// GET /admin/users
#[tracing::instrument(skip(state))]
pub async fn users<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(identity): AdminUser,
) -> Result<Json<Value>, ApiError> {
    let users = state.accounts.list_users(identity).await?;
    Ok(Json(json!({
        "success": true,
        "totalUsers": users.len(),
        "users": users,
    })))
}

/// PUT /admin/users/{id}/role
#[tracing::instrument(skip(state, req))]
pub async fn update_role<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(identity): AdminUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<RoleRequest>,
) -> Result<Json<Value>, ApiError> {
    let id: UserId = parse_id(&id)?;
    let user = state.accounts.set_role(identity, id, req.role).await?;
    Ok(Json(json!({
        "success": true,
        "message": "User role updated successfully",
        "user": user,
    })))
}

/// DELETE /admin/users/{id}
#[tracing::instrument(skip(state))]
pub async fn delete_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(identity): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: UserId = parse_id(&id)?;
    state.accounts.delete_user(identity, id).await?;
    Ok(Json(json!({ "success": true, "message": "User deleted successfully" })))
}

/// GET /admin/analytics
#[tracing::instrument(skip(state))]
pub async fn analytics<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(identity): AdminUser,
) -> Result<Json<Value>, ApiError> {
    let analytics = state.analytics.dashboard(identity, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "analytics": analytics })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_images_are_accepted() {
        assert_eq!(image_extension(Some("image/png")).unwrap(), "png");
        assert_eq!(image_extension(Some("image/jpeg")).unwrap(), "jpg");
        assert!(image_extension(Some("application/pdf")).is_err());
        assert!(image_extension(None).is_err());
    }

    fn image(url: &str) -> ProductImage {
        ProductImage {
            url: url.to_string(),
            alt: None,
        }
    }

    #[tokio::test]
    async fn test_discard_uploads_only_touches_upload_files() {
        let root = std::env::temp_dir().join(format!("discard-{}", uuid::Uuid::new_v4()));
        let dir = root.join("uploads");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("old.png"), b"x").unwrap();
        std::fs::write(root.join("outside.png"), b"x").unwrap();

        discard_uploads(
            &dir,
            &[
                image("/uploads/old.png"),
                image("/uploads/../outside.png"),
                image("https://cdn.example.com/outside.png"),
                image("/uploads/missing.png"),
            ],
        )
        .await;

        assert!(!dir.join("old.png").exists());
        assert!(root.join("outside.png").exists());
        let _ = std::fs::remove_dir_all(&root);
    }
}
