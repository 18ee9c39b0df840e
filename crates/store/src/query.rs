use domain::{Category, Product, ProductId};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    NewestFirst,
    OldestFirst,
    PriceAsc,
    PriceDesc,
    RatingAsc,
    RatingDesc,
    NameAsc,
    NameDesc,
}

impl ProductSort {
    /// Parses a `field` / `-field` sort key. Unknown keys fall back to
    /// newest first.
    pub fn parse(key: &str) -> Self {
        match key.trim() {
            "createdAt" => ProductSort::OldestFirst,
            "price" => ProductSort::PriceAsc,
            "-price" => ProductSort::PriceDesc,
            "ratings" => ProductSort::RatingAsc,
            "-ratings" => ProductSort::RatingDesc,
            "name" => ProductSort::NameAsc,
            "-name" => ProductSort::NameDesc,
            _ => ProductSort::NewestFirst,
        }
    }

    /// `ORDER BY` clause for the PostgreSQL store.
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            ProductSort::NewestFirst => "created_at DESC, id ASC",
            ProductSort::OldestFirst => "created_at ASC, id ASC",
            ProductSort::PriceAsc => "price ASC, id ASC",
            ProductSort::PriceDesc => "price DESC, id ASC",
            ProductSort::RatingAsc => "ratings ASC, id ASC",
            ProductSort::RatingDesc => "ratings DESC, id ASC",
            ProductSort::NameAsc => "name ASC, id ASC",
            ProductSort::NameDesc => "name DESC, id ASC",
        }
    }

    /// Orders two products the same way [`ProductSort::sql`] does.
    pub(crate) fn compare(&self, a: &Product, b: &Product) -> std::cmp::Ordering {
        let primary = match self {
            ProductSort::NewestFirst => b.created_at.cmp(&a.created_at),
            ProductSort::OldestFirst => a.created_at.cmp(&b.created_at),
            ProductSort::PriceAsc => a.price.cmp(&b.price),
            ProductSort::PriceDesc => b.price.cmp(&a.price),
            ProductSort::RatingAsc => a.ratings.total_cmp(&b.ratings),
            ProductSort::RatingDesc => b.ratings.total_cmp(&a.ratings),
            ProductSort::NameAsc => a.name.cmp(&b.name),
            ProductSort::NameDesc => b.name.cmp(&a.name),
        };
        primary.then(a.id.cmp(&b.id))
    }
}

/// Builder for product catalog queries.
///
/// Filters combine with AND. Pages are 1-based.
#[derive(Debug, Clone)]
pub struct ProductQuery {
    /// Case-insensitive substring match over name or description.
    pub keyword: Option<String>,

    /// Filter by category.
    pub category: Option<Category>,

    /// Minimum list price in cents (inclusive).
    pub min_price: Option<i64>,

    /// Maximum list price in cents (inclusive).
    pub max_price: Option<i64>,

    /// Minimum aggregate rating (inclusive).
    pub min_rating: Option<f64>,

    /// Only products with a discount price.
    pub deals_only: bool,

    /// Only featured products.
    pub featured_only: bool,

    /// Only active products.
    pub active_only: bool,

    /// Leave this product out of the results.
    pub exclude: Option<ProductId>,

    pub sort: ProductSort,
    pub page: u32,
    pub limit: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            category: None,
            min_price: None,
            max_price: None,
            min_rating: None,
            deals_only: false,
            featured_only: false,
            active_only: true,
            exclude: None,
            sort: ProductSort::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProductQuery {
    /// Creates a query over active products with default paging.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        self.keyword = (!keyword.trim().is_empty()).then(|| keyword.trim().to_string());
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn price_range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn min_rating(mut self, rating: f64) -> Self {
        self.min_rating = Some(rating);
        self
    }

    pub fn deals_only(mut self) -> Self {
        self.deals_only = true;
        self
    }

    pub fn featured_only(mut self) -> Self {
        self.featured_only = true;
        self
    }

    /// Includes inactive products.
    pub fn include_inactive(mut self) -> Self {
        self.active_only = false;
        self
    }

    pub fn exclude(mut self, id: ProductId) -> Self {
        self.exclude = Some(id);
        self
    }

    pub fn sort(mut self, sort: ProductSort) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the page (1-based) and page size. Page 0 is treated as 1 and the
    /// size is clamped to `1..=100`.
    pub fn paginate(mut self, page: u32, limit: u32) -> Self {
        self.page = page.max(1);
        self.limit = limit.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Number of rows skipped before the current page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit)
    }

    /// Returns true if the product passes every filter.
    pub fn matches(&self, product: &Product) -> bool {
        if self.active_only && !product.is_active {
            return false;
        }
        if self.featured_only && !product.is_featured {
            return false;
        }
        if self.deals_only && product.discount_price.is_none() {
            return false;
        }
        if let Some(category) = self.category
            && product.category != category
        {
            return false;
        }
        if let Some(min) = self.min_price
            && product.price.cents() < min
        {
            return false;
        }
        if let Some(max) = self.max_price
            && product.price.cents() > max
        {
            return false;
        }
        if let Some(rating) = self.min_rating
            && product.ratings < rating
        {
            return false;
        }
        if let Some(excluded) = self.exclude
            && product.id == excluded
        {
            return false;
        }
        if let Some(ref keyword) = self.keyword
            && !product.matches_keyword(keyword)
        {
            return false;
        }
        true
    }
}

/// One page of a product listing.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Number of products matching the filters across all pages.
    pub total: u64,
}

impl ProductPage {
    /// `ceil(total / limit)`.
    pub fn total_pages(&self, limit: u32) -> u64 {
        self.total.div_ceil(u64::from(limit.max(1)))
    }
}
