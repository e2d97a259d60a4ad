//! Catalog entity store trait.

use crate::Result;
use crate::models::{
    ListConfig, Product, ProductFilter, ProductInput, ProductOption, ProductVariant, Region,
    ShippingProfile, VariantInput,
};

/// Transaction isolation requested by a batch phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// Statement-level snapshot.
    #[default]
    ReadCommitted,
    /// Transaction-level snapshot; repeated reads see the same rows.
    RepeatableRead,
    /// Strictest level.
    Serializable,
}

/// Entity storage for products, variants and the reference data they point at.
///
/// Transactions are flat: `begin` opens a scope, `commit` or `rollback` closes it.
/// Writes made inside a scope are discarded by `rollback`.
pub trait CatalogBackend: Send + Sync {
    /// Opens a transaction scope.
    fn begin(&self, isolation: IsolationLevel) -> Result<()>;

    /// Makes the writes of the open scope durable.
    fn commit(&self) -> Result<()>;

    /// Discards the writes of the open scope.
    fn rollback(&self) -> Result<()>;

    /// Looks up a region by its exact name.
    fn find_region_by_name(&self, name: &str) -> Result<Option<Region>>;

    /// Returns the store's default shipping profile.
    fn default_shipping_profile(&self) -> Result<ShippingProfile>;

    /// Creates a product, its option groups and images.
    fn create_product(&self, input: ProductInput) -> Result<Product>;

    /// Updates an existing product.
    fn update_product(&self, id: &str, input: ProductInput) -> Result<Product>;

    /// Retrieves a product with all relations by handle.
    fn retrieve_product_by_handle(&self, handle: &str) -> Result<Option<Product>>;

    /// Finds an option group of a product by title.
    fn find_product_option(&self, product_id: &str, title: &str) -> Result<Option<ProductOption>>;

    /// Creates a variant under a product.
    fn create_variant(&self, product_id: &str, input: VariantInput) -> Result<ProductVariant>;

    /// Updates an existing variant.
    fn update_variant(&self, id: &str, input: VariantInput) -> Result<ProductVariant>;

    /// Lists products with all relations.
    fn list_products(&self, filter: &ProductFilter, config: &ListConfig) -> Result<Vec<Product>>;

    /// Lists products and counts every product matching `filter`, ignoring paging.
    fn list_and_count_products(
        &self,
        filter: &ProductFilter,
        config: &ListConfig,
    ) -> Result<(Vec<Product>, usize)>;
}

/// Runs `f` inside a transaction, committing on success and rolling back on error.
///
/// # Errors
///
/// Returns the error of `f`, or of `begin`/`commit`. A rollback failure is logged
/// and the original error is returned.
pub fn with_transaction<B, T, F>(backend: &B, isolation: IsolationLevel, f: F) -> Result<T>
where
    B: CatalogBackend + ?Sized,
    F: FnOnce() -> Result<T>,
{
    backend.begin(isolation)?;
    match f() {
        Ok(value) => {
            backend.commit()?;
            Ok(value)
        },
        Err(e) => {
            if let Err(rollback_err) = backend.rollback() {
                tracing::error!(error = %rollback_err, "transaction rollback failed");
            }
            Err(e)
        },
    }
}
