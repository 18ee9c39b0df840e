//! Fixed catalog categories.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Product category. Serialized with its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Computers,
    Smartphones,
    Fashion,
    #[serde(rename = "Home & Kitchen")]
    HomeAndKitchen,
    Books,
    Sports,
    Beauty,
    Toys,
    Automotive,
    Other,
}

impl Category {
    /// Every category, in catalog order.
    pub const ALL: [Category; 11] = [
        Category::Electronics,
        Category::Computers,
        Category::Smartphones,
        Category::Fashion,
        Category::HomeAndKitchen,
        Category::Books,
        Category::Sports,
        Category::Beauty,
        Category::Toys,
        Category::Automotive,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Computers => "Computers",
            Category::Smartphones => "Smartphones",
            Category::Fashion => "Fashion",
            Category::HomeAndKitchen => "Home & Kitchen",
            Category::Books => "Books",
            Category::Sports => "Sports",
            Category::Beauty => "Beauty",
            Category::Toys => "Toys",
            Category::Automotive => "Automotive",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("Invalid category: {s}")))
    }
}
