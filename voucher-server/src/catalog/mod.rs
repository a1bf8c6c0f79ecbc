//! Catalog Store
//!
//! Read-mostly product repository backed by redb. Products are mutated
//! only by explicit admin updates, which bump the version; orders freeze
//! their own name/price snapshot at pricing time, so an update never
//! reaches back into in-flight orders.

use crate::storage::{self, StorageError};
use crate::utils::time::now_millis;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::models::Product;
use shared::request::{ProductCreate, ProductUpdate};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for products: key = product_id, value = JSON-serialized Product
const PRODUCTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("products");

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Product is inactive: {0}")]
    Inactive(String),

    #[error("Invalid product data: {0}")]
    Invalid(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Product repository
#[derive(Clone)]
pub struct CatalogStore {
    db: Arc<Database>,
}

impl CatalogStore {
    /// Open or create the catalog database at the given path
    pub fn open(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let db = storage::open_database(path)?;
        Self::init(db)
    }

    /// Open an in-memory catalog (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> CatalogResult<Self> {
        let db = storage::open_in_memory()?;
        Self::init(db)
    }

    fn init(db: Database) -> CatalogResult<Self> {
        let write_txn = db.begin_write().map_err(StorageError::from)?;
        {
            let _ = write_txn
                .open_table(PRODUCTS_TABLE)
                .map_err(StorageError::from)?;
        }
        write_txn.commit().map_err(StorageError::from)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Create a new product
    pub fn create(&self, payload: ProductCreate) -> CatalogResult<Product> {
        validate_payload(payload.base_price, &payload.tier_discounts)?;

        let now = now_millis();
        let mut tiers = payload.tier_discounts;
        tiers.sort_by_key(|t| t.min_quantity);

        let product = Product {
            id: uuid::Uuid::new_v4().to_string(),
            name: payload.name,
            category: payload.category,
            unit_type: payload.unit_type,
            base_price: payload.base_price,
            currency: payload.currency,
            tier_discounts: tiers,
            is_active: true,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        let txn = self.db.begin_write().map_err(StorageError::from)?;
        {
            let mut table = txn.open_table(PRODUCTS_TABLE).map_err(StorageError::from)?;
            let value = serde_json::to_vec(&product).map_err(StorageError::from)?;
            table
                .insert(product.id.as_str(), value.as_slice())
                .map_err(StorageError::from)?;
        }
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Apply an admin update, bumping the version
    ///
    /// Takes effect only for orders priced afterwards.
    pub fn update(&self, id: &str, payload: ProductUpdate) -> CatalogResult<Product> {
        let txn = self.db.begin_write().map_err(StorageError::from)?;
        let updated = {
            let mut table = txn.open_table(PRODUCTS_TABLE).map_err(StorageError::from)?;
            let mut product = match table.get(id).map_err(StorageError::from)? {
                Some(guard) => serde_json::from_slice::<Product>(guard.value())
                    .map_err(StorageError::from)?,
                None => return Err(CatalogError::NotFound(id.to_string())),
            };

            if let Some(name) = payload.name {
                product.name = name;
            }
            if let Some(category) = payload.category {
                product.category = category;
            }
            if let Some(base_price) = payload.base_price {
                product.base_price = base_price;
            }
            if let Some(mut tiers) = payload.tier_discounts {
                tiers.sort_by_key(|t| t.min_quantity);
                product.tier_discounts = tiers;
            }
            if let Some(is_active) = payload.is_active {
                product.is_active = is_active;
            }
            validate_payload(product.base_price, &product.tier_discounts)?;

            product.version += 1;
            product.updated_at = now_millis();

            let value = serde_json::to_vec(&product).map_err(StorageError::from)?;
            table
                .insert(id, value.as_slice())
                .map_err(StorageError::from)?;
            product
        };
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(product_id = %id, version = updated.version, "Product updated");
        Ok(updated)
    }

    /// Get a product by id
    pub fn get(&self, id: &str) -> CatalogResult<Product> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let table = read_txn
            .open_table(PRODUCTS_TABLE)
            .map_err(StorageError::from)?;
        match table.get(id).map_err(StorageError::from)? {
            Some(guard) => {
                Ok(serde_json::from_slice(guard.value()).map_err(StorageError::from)?)
            }
            None => Err(CatalogError::NotFound(id.to_string())),
        }
    }

    /// Get a product that buyers may currently order
    pub fn get_active(&self, id: &str) -> CatalogResult<Product> {
        let product = self.get(id)?;
        if !product.is_active {
            return Err(CatalogError::Inactive(id.to_string()));
        }
        Ok(product)
    }

    /// List all products, oldest first
    pub fn list(&self) -> CatalogResult<Vec<Product>> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let table = read_txn
            .open_table(PRODUCTS_TABLE)
            .map_err(StorageError::from)?;

        let mut products = Vec::new();
        for result in table.iter().map_err(StorageError::from)? {
            let (_key, value) = result.map_err(StorageError::from)?;
            let product: Product =
                serde_json::from_slice(value.value()).map_err(StorageError::from)?;
            products.push(product);
        }
        products.sort_by_key(|p| p.created_at);
        Ok(products)
    }
}

fn validate_payload(
    base_price: f64,
    tiers: &[shared::models::TierDiscount],
) -> CatalogResult<()> {
    if !base_price.is_finite() || base_price < 0.0 {
        return Err(CatalogError::Invalid("base_price must be >= 0".into()));
    }
    for tier in tiers {
        if tier.min_quantity == 0 {
            return Err(CatalogError::Invalid("tier min_quantity must be >= 1".into()));
        }
        if !(0.0..=100.0).contains(&tier.percent) {
            return Err(CatalogError::Invalid(
                "tier percent must be within 0..=100".into(),
            ));
        }
    }
    Ok(())
}
