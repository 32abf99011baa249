use serde::{Deserialize, Serialize};

use grocer_core::{CategoryId, DomainError, DomainResult, Money, ProductId, SupplierId};

/// Product category (e.g. "Dairy", "Produce").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: CategoryId,
    pub name: String,
}

/// Supplier that restock intents are placed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub supplier_id: SupplierId,
    pub name: String,
}

/// Catalog product.
///
/// Owned by the catalog; the ledger only references it by `product_id` and
/// reads `unit_price` at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub category_name: String,
    pub brand: String,
    pub unit_price: Money,
    /// Unit of measure ("kg", "pack", "litre", ...).
    pub unit: String,
    pub description: String,
    pub image_ref: Option<String>,
}

/// Input for registering a new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category_id: CategoryId,
    pub brand: String,
    pub unit_price: Money,
    pub unit: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_ref: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::invalid_input("name cannot be empty"));
        }
        if self.brand.trim().is_empty() {
            return Err(DomainError::invalid_input("brand cannot be empty"));
        }
        if self.unit.trim().is_empty() {
            return Err(DomainError::invalid_input("unit cannot be empty"));
        }
        Ok(())
    }
}

/// Price ordering for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSort {
    #[default]
    None,
    LowToHigh,
    HighToLow,
}

/// Listing filter: case-insensitive substring match on category and brand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub brand: Option<String>,
    #[serde(default)]
    pub sort: PriceSort,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            match needle.as_deref().map(str::trim) {
                None | Some("") => true,
                Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
            }
        }
        contains(&product.category_name, &self.category) && contains(&product.brand, &self.brand)
    }

    /// Filter and order a product list.
    pub fn apply(&self, mut products: Vec<Product>) -> Vec<Product> {
        products.retain(|p| self.matches(p));
        match self.sort {
            PriceSort::None => products.sort_by_key(|p| p.product_id),
            PriceSort::LowToHigh => products.sort_by(|a, b| {
                a.unit_price.cmp(&b.unit_price).then(a.product_id.cmp(&b.product_id))
            }),
            PriceSort::HighToLow => products.sort_by(|a, b| {
                b.unit_price.cmp(&a.unit_price).then(a.product_id.cmp(&b.product_id))
            }),
        }
        products
    }
}

/// What the ledger core consumes from the catalog.
///
/// Implementations must be cheap to call concurrently; the core reads prices
/// outside of any stock lock.
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch a product, `NotFound` if unknown.
    async fn product(&self, product_id: ProductId) -> DomainResult<Product>;

    /// Current unit price (not versioned; always the latest price).
    async fn unit_price(&self, product_id: ProductId) -> DomainResult<Money> {
        Ok(self.product(product_id).await?.unit_price)
    }

    async fn product_exists(&self, product_id: ProductId) -> DomainResult<bool> {
        match self.product(product_id).await {
            Ok(_) => Ok(true),
            Err(DomainError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn supplier_exists(&self, supplier_id: SupplierId) -> DomainResult<bool>;
}

#[async_trait::async_trait]
impl<C> Catalog for std::sync::Arc<C>
where
    C: Catalog + ?Sized,
{
    async fn product(&self, product_id: ProductId) -> DomainResult<Product> {
        (**self).product(product_id).await
    }

    async fn unit_price(&self, product_id: ProductId) -> DomainResult<Money> {
        (**self).unit_price(product_id).await
    }

    async fn product_exists(&self, product_id: ProductId) -> DomainResult<bool> {
        (**self).product_exists(product_id).await
    }

    async fn supplier_exists(&self, supplier_id: SupplierId) -> DomainResult<bool> {
        (**self).supplier_exists(supplier_id).await
    }
}
