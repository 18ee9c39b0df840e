//! Catalog browsing, reviews and admin product management.

use chrono::Utc;
use domain::{
    Category, Identity, NewProduct, Product, ProductId, ProductImage, ProductUpdate, Review,
};
use store::{ProductPage, ProductQuery, ProductSort, Store};

use crate::error::{Result, WorkflowError};

pub const FEATURED_LIMIT: u32 = 8;
pub const RELATED_LIMIT: u32 = 4;
pub const MAX_PRODUCT_IMAGES: usize = 5;

#[derive(Clone)]
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, query: ProductQuery) -> Result<ProductPage> {
        Ok(self.store.list_products(query).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Product"))
    }

    /// Active featured products, best rated first.
    #[tracing::instrument(skip(self))]
    pub async fn featured(&self) -> Result<Vec<Product>> {
        let query = ProductQuery::new()
            .featured_only()
            .sort(ProductSort::RatingDesc)
            .paginate(1, FEATURED_LIMIT);
        Ok(self.store.list_products(query).await?.products)
    }

    /// Categories with at least one product.
    #[tracing::instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.store.distinct_categories().await?)
    }

    /// Active products in the same category, best rated first.
    #[tracing::instrument(skip(self))]
    pub async fn related(&self, id: ProductId) -> Result<Vec<Product>> {
        let product = self.get(id).await?;
        let query = ProductQuery::new()
            .category(product.category)
            .exclude(product.id)
            .sort(ProductSort::RatingDesc)
            .paginate(1, RELATED_LIMIT);
        Ok(self.store.list_products(query).await?.products)
    }

    /// Adds the caller's review. One review per user per product.
    #[tracing::instrument(skip(self, comment), fields(user_id = %identity.user_id))]
    pub async fn add_review(
        &self,
        identity: Identity,
        id: ProductId,
        rating: u8,
        comment: String,
    ) -> Result<Product> {
        let reviewer = self
            .store
            .get_user(identity.user_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("User"))?;

        let now = Utc::now();
        let review = Review::new(identity.user_id, reviewer.name, rating, comment, now)?;
        let product = self
            .store
            .update_product(id, |product| product.add_review(review, now))
            .await?;

        metrics::counter!("reviews_added_total").increment(1);
        Ok(product)
    }

    #[tracing::instrument(skip(self, new), fields(admin = %identity.user_id))]
    pub async fn create_product(&self, identity: Identity, new: NewProduct) -> Result<Product> {
        identity.require_admin()?;
        let product = Product::create(new, Some(identity.user_id), Utc::now())?;
        self.store.insert_product(product.clone()).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    #[tracing::instrument(skip(self, update), fields(admin = %identity.user_id))]
    pub async fn update_product(
        &self,
        identity: Identity,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product> {
        identity.require_admin()?;
        let now = Utc::now();
        Ok(self
            .store
            .update_product(id, |product| product.apply_update(update, now))
            .await?)
    }

    /// Physically removes a product. Orders keep their snapshots.
    #[tracing::instrument(skip(self), fields(admin = %identity.user_id))]
    pub async fn delete_product(&self, identity: Identity, id: ProductId) -> Result<()> {
        identity.require_admin()?;
        if !self.store.delete_product(id).await? {
            return Err(WorkflowError::not_found("Product"));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(admin = %identity.user_id))]
    pub async fn set_stock(&self, identity: Identity, id: ProductId, stock: i64) -> Result<Product> {
        identity.require_admin()?;
        Ok(self.store.set_stock(id, stock).await?)
    }

    /// Replaces the product's images with freshly uploaded ones.
    #[tracing::instrument(skip(self, images), fields(admin = %identity.user_id, count = images.len()))]
    pub async fn replace_images(
        &self,
        identity: Identity,
        id: ProductId,
        images: Vec<ProductImage>,
    ) -> Result<Product> {
        identity.require_admin()?;
        if images.len() > MAX_PRODUCT_IMAGES {
            return Err(WorkflowError::InvalidInput(format!(
                "A product can have at most {MAX_PRODUCT_IMAGES} images"
            )));
        }

        let now = Utc::now();
        Ok(self
            .store
            .update_product(id, |product| {
                product.apply_update(
                    ProductUpdate {
                        images: Some(images),
                        ..Default::default()
                    },
                    now,
                )
            })
            .await?)
    }
}
