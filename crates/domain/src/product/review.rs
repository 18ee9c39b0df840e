//! Embedded product reviews.

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

pub const MAX_COMMENT_LEN: usize = 500;

/// A single user's review of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub user: UserId,
    pub name: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Builds a validated review: rating 1..=5, comment present and at most
    /// 500 characters.
    pub fn new(
        user: UserId,
        name: impl Into<String>,
        rating: u8,
        comment: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !(1..=5).contains(&rating) {
            return Err(DomainError::validation("Rating must be between 1 and 5"));
        }
        let comment = comment.into().trim().to_string();
        if comment.is_empty() {
            return Err(DomainError::validation("Please enter a review comment"));
        }
        if comment.chars().count() > MAX_COMMENT_LEN {
            return Err(DomainError::validation(
                "Review cannot exceed 500 characters",
            ));
        }
        Ok(Self {
            user,
            name: name.into(),
            rating,
            comment,
            created_at: now,
        })
    }
}
