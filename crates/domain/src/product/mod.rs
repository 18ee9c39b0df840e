//! Catalog products.

mod category;
mod review;

pub use category::Category;
pub use review::{MAX_COMMENT_LEN, Review};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Reference to an uploaded or hosted product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// A catalog product.
///
/// `ratings` and `num_reviews` are derived from `reviews` and must be
/// refreshed with [`Product::recalculate_rating`] whenever reviews change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub discount_price: Option<Money>,
    pub images: Vec<ProductImage>,
    pub category: Category,
    pub stock: u32,
    pub brand: String,
    pub specifications: BTreeMap<String, String>,
    pub reviews: Vec<Review>,
    pub ratings: f64,
    pub num_reviews: u32,
    pub is_featured: bool,
    pub is_active: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: i64,
    #[serde(default)]
    pub discount_price: Option<i64>,
    pub category: Category,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Partial update of a product. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub discount_price: Option<i64>,
    /// Removes the discount when set.
    #[serde(default)]
    pub clear_discount: bool,
    pub category: Option<Category>,
    pub stock: Option<i64>,
    pub brand: Option<String>,
    pub specifications: Option<BTreeMap<String, String>>,
    pub images: Option<Vec<ProductImage>>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
}

impl Product {
    /// Creates a validated product owned by `created_by`.
    pub fn create(
        new: NewProduct,
        created_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let product = Self {
            id: ProductId::new(),
            name: new.name.trim().to_string(),
            description: new.description,
            price: Money::from_cents(new.price),
            discount_price: new.discount_price.map(Money::from_cents),
            images: new.images,
            category: new.category,
            stock: stock_from(new.stock)?,
            brand: new.brand,
            specifications: new.specifications,
            reviews: Vec::new(),
            ratings: 0.0,
            num_reviews: 0,
            is_featured: new.is_featured,
            is_active: new.is_active,
            created_by,
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    /// Applies a partial update and re-validates.
    pub fn apply_update(
        &mut self,
        update: ProductUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = Money::from_cents(price);
        }
        if update.clear_discount {
            self.discount_price = None;
        } else if let Some(discount) = update.discount_price {
            self.discount_price = Some(Money::from_cents(discount));
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(stock) = update.stock {
            self.stock = stock_from(stock)?;
        }
        if let Some(brand) = update.brand {
            self.brand = brand;
        }
        if let Some(specifications) = update.specifications {
            self.specifications = specifications;
        }
        if let Some(images) = update.images {
            self.images = images;
        }
        if let Some(featured) = update.is_featured {
            self.is_featured = featured;
        }
        if let Some(active) = update.is_active {
            self.is_active = active;
        }
        self.validate()?;
        self.updated_at = now;
        Ok(())
    }

    /// Checks field constraints.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.is_empty() {
            return Err(DomainError::validation("Please enter product name"));
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::validation(
                "Product name cannot exceed 200 characters",
            ));
        }
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("Please enter product description"));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(DomainError::validation(
                "Description cannot exceed 2000 characters",
            ));
        }
        if self.price.is_negative() {
            return Err(DomainError::validation("Price cannot be negative"));
        }
        if self.discount_price.is_some_and(|d| d.is_negative()) {
            return Err(DomainError::validation("Discount price cannot be negative"));
        }
        Ok(())
    }

    /// Sets stock to an absolute value.
    pub fn set_stock(&mut self, stock: i64, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.stock = stock_from(stock)?;
        self.updated_at = now;
        Ok(())
    }

    /// Price charged at purchase time: the discount price when present,
    /// otherwise the list price.
    pub fn effective_price(&self) -> Money {
        self.discount_price.unwrap_or(self.price)
    }

    /// The image captured on order line items.
    pub fn primary_image(&self) -> &str {
        self.images.first().map(|i| i.url.as_str()).unwrap_or("")
    }

    pub fn has_reviewed(&self, user: UserId) -> bool {
        self.reviews.iter().any(|r| r.user == user)
    }

    /// Adds a review, allowing one review per user, and refreshes the rating.
    pub fn add_review(&mut self, review: Review, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.has_reviewed(review.user) {
            return Err(DomainError::AlreadyReviewed);
        }
        self.reviews.push(review);
        self.recalculate_rating();
        self.updated_at = now;
        Ok(())
    }

    /// Recomputes `ratings` (mean rounded to one decimal) and `num_reviews`
    /// from the current reviews.
    pub fn recalculate_rating(&mut self) {
        if self.reviews.is_empty() {
            self.ratings = 0.0;
            self.num_reviews = 0;
            return;
        }
        let total: u32 = self.reviews.iter().map(|r| u32::from(r.rating)).sum();
        let mean = f64::from(total) / self.reviews.len() as f64;
        self.ratings = (mean * 10.0).round() / 10.0;
        self.num_reviews = self.reviews.len() as u32;
    }

    /// Case-insensitive substring match over name and description.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

fn stock_from(stock: i64) -> Result<u32, DomainError> {
    u32::try_from(stock).map_err(|_| DomainError::validation("Stock cannot be negative"))
}
