use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use grocer_core::{CategoryId, DomainError, DomainResult, Money, ProductId, SupplierId};

use crate::product::{Catalog, Category, NewProduct, Product, ProductFilter, Supplier};

#[derive(Debug, Default)]
struct CatalogState {
    categories: BTreeMap<CategoryId, Category>,
    suppliers: BTreeMap<SupplierId, Supplier>,
    products: BTreeMap<ProductId, Product>,
    next_category: i64,
    next_supplier: i64,
    next_product: i64,
}

/// In-memory catalog for tests/dev.
///
/// Identifiers are assigned sequentially starting at 1. Every mutation is a
/// single map insert or field write, so a panicked writer cannot leave the
/// state half-updated and a poisoned lock is simply recovered.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_category(&self, name: impl Into<String>) -> DomainResult<Category> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::invalid_input("category name cannot be empty"));
        }
        let mut state = self.write();
        state.next_category += 1;
        let category = Category {
            category_id: CategoryId::new(state.next_category),
            name,
        };
        state.categories.insert(category.category_id, category.clone());
        Ok(category)
    }

    pub fn add_supplier(&self, name: impl Into<String>) -> DomainResult<Supplier> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::invalid_input("supplier name cannot be empty"));
        }
        let mut state = self.write();
        state.next_supplier += 1;
        let supplier = Supplier {
            supplier_id: SupplierId::new(state.next_supplier),
            name,
        };
        state.suppliers.insert(supplier.supplier_id, supplier.clone());
        Ok(supplier)
    }

    pub fn add_product(&self, new: NewProduct) -> DomainResult<Product> {
        new.validate()?;
        let mut state = self.write();
        let category_name = state
            .categories
            .get(&new.category_id)
            .map(|c| c.name.clone())
            .ok_or_else(|| DomainError::not_found(format!("category {}", new.category_id)))?;

        state.next_product += 1;
        let product = Product {
            product_id: ProductId::new(state.next_product),
            name: new.name,
            category_id: new.category_id,
            category_name,
            brand: new.brand,
            unit_price: new.unit_price,
            unit: new.unit,
            description: new.description,
            image_ref: new.image_ref,
        };
        state.products.insert(product.product_id, product.clone());
        Ok(product)
    }

    /// Drop a product that never made it into inventory. Returns whether it
    /// was present.
    pub fn remove_product(&self, product_id: ProductId) -> bool {
        self.write().products.remove(&product_id).is_some()
    }

    /// Change a product's price. Orders placed afterwards pay the new price.
    pub fn set_price(&self, product_id: ProductId, unit_price: Money) -> DomainResult<()> {
        let mut state = self.write();
        let product = state
            .products
            .get_mut(&product_id)
            .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;
        product.unit_price = unit_price;
        Ok(())
    }

    pub fn list(&self, filter: &ProductFilter) -> DomainResult<Vec<Product>> {
        let all: Vec<Product> = self.read().products.values().cloned().collect();
        Ok(filter.apply(all))
    }

    /// Case-insensitive name substring search.
    pub fn search(&self, name: &str) -> DomainResult<Vec<Product>> {
        let needle = name.trim().to_lowercase();
        let state = self.read();
        Ok(state
            .products
            .values()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl Catalog for InMemoryCatalog {
    async fn product(&self, product_id: ProductId) -> DomainResult<Product> {
        self.read()
            .products
            .get(&product_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))
    }

    async fn supplier_exists(&self, supplier_id: SupplierId) -> DomainResult<bool> {
        Ok(self.read().suppliers.contains_key(&supplier_id))
    }
}
