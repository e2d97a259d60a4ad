//! In-memory catalog backend.
//!
//! Holds regions, shipping profiles and products (with their options, images,
//! variants and prices) in a single [`CatalogSnapshot`]. Transactions snapshot the
//! whole state on `begin` and restore it on `rollback`, which gives every
//! isolation level for free since only one transaction may be open at a time.
//!
//! The snapshot can be loaded from and saved to a JSON file so the CLI can keep a
//! catalog between runs.

use crate::models::{
    Image, ListConfig, MoneyAmount, PriceInput, Product, ProductCollection, ProductFilter,
    ProductInput, ProductOption, ProductOptionValue, ProductVariant, Region, ShippingProfile,
    ShippingProfileType, SortOrder, VariantInput,
};
use crate::storage::connection::acquire_lock;
use crate::storage::traits::{CatalogBackend, IsolationLevel};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tracing::instrument;

/// Serializable state of an [`InMemoryCatalog`].
///
/// Stored prices carry only `region_id`; the joined `region` and the joined
/// product `profile` are filled in when products are read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Pricing regions.
    #[serde(default)]
    pub regions: Vec<Region>,
    /// Shipping profiles.
    #[serde(default)]
    pub shipping_profiles: Vec<ShippingProfile>,
    /// Products in insertion order.
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Default)]
struct State {
    current: CatalogSnapshot,
    /// State as of `begin`, present while a transaction is open.
    saved: Option<CatalogSnapshot>,
}

/// [`CatalogBackend`] keeping the whole catalog in memory.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: Mutex<State>,
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::now_v7().simple())
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidData(message.into())
}

impl InMemoryCatalog {
    /// Creates an empty catalog with no regions and no shipping profiles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding `snapshot`.
    #[must_use]
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        Self {
            state: Mutex::new(State {
                current: snapshot,
                saved: None,
            }),
        }
    }

    /// Creates an empty catalog with a default shipping profile.
    #[must_use]
    pub fn with_default_profile() -> Self {
        let catalog = Self::new();
        catalog.add_shipping_profile("Default Shipping Profile", ShippingProfileType::Default);
        catalog
    }

    /// Loads a catalog from a JSON snapshot.
    ///
    /// A missing file yields an empty catalog with a default shipping profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no catalog snapshot, starting empty");
            return Ok(Self::with_default_profile());
        }
        let raw = fs::read_to_string(path).map_err(|e| Error::operation("read_catalog", e))?;
        let snapshot: CatalogSnapshot =
            serde_json::from_str(&raw).map_err(|e| Error::operation("parse_catalog", e))?;
        tracing::debug!(
            path = %path.display(),
            products = snapshot.products.len(),
            regions = snapshot.regions.len(),
            "loaded catalog snapshot"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Writes the committed state to a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = self.snapshot();
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| Error::operation("serialize_catalog", e))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::operation("write_catalog", e))?;
        }
        fs::write(path, json).map_err(|e| Error::operation("write_catalog", e))
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        acquire_lock(&self.state).current.clone()
    }

    /// Adds a region and returns it.
    pub fn add_region(&self, name: &str, currency_code: &str) -> Region {
        let region = Region {
            id: new_id("reg"),
            name: name.to_string(),
            currency_code: currency_code.to_lowercase(),
        };
        acquire_lock(&self.state).current.regions.push(region.clone());
        region
    }

    /// Adds a shipping profile and returns it.
    pub fn add_shipping_profile(
        &self,
        name: &str,
        profile_type: ShippingProfileType,
    ) -> ShippingProfile {
        let profile = ShippingProfile {
            id: new_id("sp"),
            name: name.to_string(),
            profile_type,
        };
        acquire_lock(&self.state)
            .current
            .shipping_profiles
            .push(profile.clone());
        profile
    }

    /// Number of products.
    #[must_use]
    pub fn product_count(&self) -> usize {
        acquire_lock(&self.state).current.products.len()
    }

    /// Returns whether a transaction is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        acquire_lock(&self.state).saved.is_some()
    }
}

impl CatalogSnapshot {
    fn product_mut(&mut self, id: &str) -> Result<&mut Product> {
        self.products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound {
                entity: "product",
                id: id.to_string(),
            })
    }

    fn ensure_unique_handle(&self, handle: &str, except_id: Option<&str>) -> Result<()> {
        let taken = self
            .products
            .iter()
            .any(|p| p.handle == handle && Some(p.id.as_str()) != except_id);
        if taken {
            return Err(invalid(format!(
                "product with handle {handle} already exists"
            )));
        }
        Ok(())
    }

    fn ensure_unique_sku(&self, sku: &str, except_id: Option<&str>) -> Result<()> {
        let taken = self
            .products
            .iter()
            .flat_map(|p| &p.variants)
            .any(|v| v.sku.as_deref() == Some(sku) && Some(v.id.as_str()) != except_id);
        if taken {
            return Err(invalid(format!("variant with sku {sku} already exists")));
        }
        Ok(())
    }

    fn resolve_prices(&self, prices: Vec<PriceInput>) -> Result<Vec<MoneyAmount>> {
        prices
            .into_iter()
            .map(|price| {
                let (currency_code, region_id) = match (price.region_id, price.currency_code) {
                    (Some(region_id), _) => {
                        let region = self
                            .regions
                            .iter()
                            .find(|r| r.id == region_id)
                            .ok_or_else(|| invalid(format!("region {region_id} does not exist")))?;
                        (region.currency_code.clone(), Some(region_id))
                    },
                    (None, Some(code)) => (code.to_lowercase(), None),
                    (None, None) => {
                        return Err(invalid("price needs a region or a currency code"));
                    },
                };
                Ok(MoneyAmount {
                    id: new_id("ma"),
                    currency_code,
                    amount: price.amount,
                    region_id,
                    region: None,
                })
            })
            .collect()
    }

    /// Returns a product with regions and profile joined.
    fn joined(&self, product: &Product) -> Product {
        let mut product = product.clone();
        product.profile = product
            .profile_id
            .as_deref()
            .and_then(|id| self.shipping_profiles.iter().find(|p| p.id == id))
            .cloned();
        for price in product.variants.iter_mut().flat_map(|v| v.prices.iter_mut()) {
            price.region = price
                .region_id
                .as_deref()
                .and_then(|id| self.regions.iter().find(|r| r.id == id))
                .cloned();
        }
        product
    }

    fn matching(&self, filter: &ProductFilter, config: &ListConfig) -> Vec<&Product> {
        let mut matched: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| matches_filter(p, filter))
            .collect();
        match config.order {
            SortOrder::CreatedAtAsc => matched.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::CreatedAtDesc => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        matched
    }
}

fn matches_filter(product: &Product, filter: &ProductFilter) -> bool {
    if let Some(ids) = &filter.ids {
        if !ids.contains(&product.id) {
            return false;
        }
    }
    if let Some(statuses) = &filter.status {
        if !statuses.contains(&product.status) {
            return false;
        }
    }
    if let Some(handle) = &filter.collection_handle {
        if product.collection.as_ref().map(|c| &c.handle) != Some(handle) {
            return false;
        }
    }
    if let Some(q) = &filter.q {
        let q = q.to_lowercase();
        if !product.title.to_lowercase().contains(&q) && !product.handle.to_lowercase().contains(&q)
        {
            return false;
        }
    }
    true
}

fn collection_from(input: &ProductInput) -> Option<ProductCollection> {
    match (&input.collection_title, &input.collection_handle) {
        (None, None) => None,
        (title, handle) => {
            let handle = handle
                .clone()
                .or_else(|| title.as_ref().map(|t| slugify(t)))
                .unwrap_or_default();
            let title = title.clone().unwrap_or_else(|| handle.clone());
            Some(ProductCollection { title, handle })
        },
    }
}

fn slugify(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn images_from(urls: Vec<String>) -> Vec<Image> {
    urls.into_iter()
        .map(|url| Image {
            id: new_id("img"),
            url,
        })
        .collect()
}

/// Copies every `Some` field of `input` onto `product`, except options and
/// images which the callers handle.
fn apply_product_fields(product: &mut Product, input: &mut ProductInput) {
    macro_rules! set {
        ($($field:ident),*) => {
            $(if let Some(value) = input.$field.take() {
                product.$field = Some(value);
            })*
        };
    }
    set!(
        subtitle,
        description,
        thumbnail,
        weight,
        length,
        width,
        height,
        hs_code,
        origin_country,
        mid_code,
        material,
        product_type,
        external_id,
        profile_id
    );
    if let Some(handle) = input.handle.take() {
        product.handle = handle;
    }
    if let Some(title) = input.title.take() {
        product.title = title;
    }
    if let Some(status) = input.status {
        product.status = status;
    }
    if let Some(tags) = input.tags.take() {
        product.tags = tags;
    }
    if let Some(discountable) = input.discountable {
        product.discountable = discountable;
    }
    if let Some(collection) = collection_from(input) {
        product.collection = Some(collection);
    }
}

fn apply_variant_fields(variant: &mut ProductVariant, input: &mut VariantInput) {
    macro_rules! set {
        ($($field:ident),*) => {
            $(if let Some(value) = input.$field.take() {
                variant.$field = Some(value);
            })*
        };
    }
    set!(
        sku,
        barcode,
        ean,
        upc,
        weight,
        length,
        width,
        height,
        hs_code,
        origin_country,
        mid_code,
        material
    );
    if let Some(title) = input.title.take() {
        variant.title = title;
    }
    if let Some(quantity) = input.inventory_quantity {
        variant.inventory_quantity = quantity;
    }
    if let Some(allow) = input.allow_backorder {
        variant.allow_backorder = allow;
    }
    if let Some(manage) = input.manage_inventory {
        variant.manage_inventory = manage;
    }
}

fn check_options(product: &Product, options: &[ProductOptionValue]) -> Result<()> {
    for value in options {
        if !product.options.iter().any(|o| o.id == value.option_id) {
            return Err(invalid(format!(
                "option {} does not belong to product {}",
                value.option_id, product.id
            )));
        }
    }
    Ok(())
}

impl CatalogBackend for InMemoryCatalog {
    fn begin(&self, isolation: IsolationLevel) -> Result<()> {
        let mut state = acquire_lock(&self.state);
        if state.saved.is_some() {
            return Err(Error::InvalidInput(
                "a catalog transaction is already open".to_string(),
            ));
        }
        tracing::trace!(?isolation, "begin catalog transaction");
        state.saved = Some(state.current.clone());
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let mut state = acquire_lock(&self.state);
        state
            .saved
            .take()
            .map(|_| ())
            .ok_or_else(|| Error::InvalidInput("no catalog transaction to commit".to_string()))
    }

    fn rollback(&self) -> Result<()> {
        let mut state = acquire_lock(&self.state);
        let saved = state
            .saved
            .take()
            .ok_or_else(|| Error::InvalidInput("no catalog transaction to roll back".to_string()))?;
        state.current = saved;
        tracing::debug!("catalog transaction rolled back");
        Ok(())
    }

    fn find_region_by_name(&self, name: &str) -> Result<Option<Region>> {
        let state = acquire_lock(&self.state);
        Ok(state.current.regions.iter().find(|r| r.name == name).cloned())
    }

    fn default_shipping_profile(&self) -> Result<ShippingProfile> {
        let state = acquire_lock(&self.state);
        state
            .current
            .shipping_profiles
            .iter()
            .find(|p| p.profile_type == ShippingProfileType::Default)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                entity: "shipping profile",
                id: ShippingProfileType::Default.as_str().to_string(),
            })
    }

    #[instrument(skip(self, input), fields(handle = ?input.handle))]
    fn create_product(&self, mut input: ProductInput) -> Result<Product> {
        let mut state = acquire_lock(&self.state);
        let catalog = &mut state.current;

        let title = input
            .title
            .take()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid("product title is required"))?;
        let handle = input
            .handle
            .take()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| slugify(&title));
        catalog.ensure_unique_handle(&handle, None)?;

        let id = new_id("prod");
        let mut product = Product::new(id.clone(), handle, title);
        apply_product_fields(&mut product, &mut input);
        product.options = input
            .options
            .take()
            .unwrap_or_default()
            .into_iter()
            .map(|title| ProductOption {
                id: new_id("opt"),
                product_id: id.clone(),
                title,
            })
            .collect();
        product.images = images_from(input.images.take().unwrap_or_default());
        if product.thumbnail.is_none() {
            product.thumbnail = product.images.first().map(|i| i.url.clone());
        }

        catalog.products.push(product.clone());
        Ok(catalog.joined(&product))
    }

    #[instrument(skip(self, input))]
    fn update_product(&self, id: &str, mut input: ProductInput) -> Result<Product> {
        let mut state = acquire_lock(&self.state);
        let catalog = &mut state.current;

        if let Some(handle) = input.handle.as_deref() {
            catalog.ensure_unique_handle(handle, Some(id))?;
        }
        let product = catalog.product_mut(id)?;
        apply_product_fields(product, &mut input);
        for title in input.options.take().unwrap_or_default() {
            if product.option_by_title(&title).is_none() {
                product.options.push(ProductOption {
                    id: new_id("opt"),
                    product_id: product.id.clone(),
                    title,
                });
            }
        }
        if let Some(urls) = input.images.take() {
            product.images = images_from(urls);
        }

        let product = product.clone();
        Ok(catalog.joined(&product))
    }

    fn retrieve_product_by_handle(&self, handle: &str) -> Result<Option<Product>> {
        let state = acquire_lock(&self.state);
        let catalog = &state.current;
        Ok(catalog
            .products
            .iter()
            .find(|p| p.handle == handle)
            .map(|p| catalog.joined(p)))
    }

    fn find_product_option(&self, product_id: &str, title: &str) -> Result<Option<ProductOption>> {
        let state = acquire_lock(&self.state);
        Ok(state
            .current
            .products
            .iter()
            .find(|p| p.id == product_id)
            .and_then(|p| p.option_by_title(title))
            .cloned())
    }

    #[instrument(skip(self, input), fields(sku = ?input.sku))]
    fn create_variant(&self, product_id: &str, mut input: VariantInput) -> Result<ProductVariant> {
        let mut state = acquire_lock(&self.state);
        let catalog = &mut state.current;

        if let Some(sku) = input.sku.as_deref() {
            catalog.ensure_unique_sku(sku, None)?;
        }
        let prices = catalog.resolve_prices(input.prices.take().unwrap_or_default())?;
        let options: Vec<ProductOptionValue> = input
            .options
            .take()
            .unwrap_or_default()
            .into_iter()
            .map(|o| ProductOptionValue {
                option_id: o.option_id,
                value: o.value,
            })
            .collect();
        let regions = catalog.regions.clone();

        let product = catalog.product_mut(product_id)?;
        check_options(product, &options)?;

        let mut variant = ProductVariant {
            id: new_id("variant"),
            product_id: product_id.to_string(),
            manage_inventory: true,
            ..ProductVariant::default()
        };
        apply_variant_fields(&mut variant, &mut input);
        if variant.title.is_empty() {
            variant.title = default_variant_title(&variant, &options);
        }
        variant.options = options;
        variant.prices = prices;
        product.variants.push(variant.clone());

        for price in &mut variant.prices {
            price.region = price
                .region_id
                .as_deref()
                .and_then(|id| regions.iter().find(|r| r.id == id))
                .cloned();
        }
        Ok(variant)
    }

    #[instrument(skip(self, input))]
    fn update_variant(&self, id: &str, mut input: VariantInput) -> Result<ProductVariant> {
        let mut state = acquire_lock(&self.state);
        let catalog = &mut state.current;

        if let Some(sku) = input.sku.as_deref() {
            catalog.ensure_unique_sku(sku, Some(id))?;
        }
        let prices = input
            .prices
            .take()
            .map(|p| catalog.resolve_prices(p))
            .transpose()?;

        let product = catalog
            .products
            .iter_mut()
            .find(|p| p.variants.iter().any(|v| v.id == id))
            .ok_or_else(|| Error::NotFound {
                entity: "variant",
                id: id.to_string(),
            })?;
        let options: Vec<ProductOptionValue> = input
            .options
            .take()
            .unwrap_or_default()
            .into_iter()
            .map(|o| ProductOptionValue {
                option_id: o.option_id,
                value: o.value,
            })
            .collect();
        check_options(product, &options)?;

        let product_id = product.id.clone();
        let Some(variant) = product.variants.iter_mut().find(|v| v.id == id) else {
            return Err(Error::NotFound {
                entity: "variant",
                id: id.to_string(),
            });
        };
        apply_variant_fields(variant, &mut input);
        for value in options {
            match variant
                .options
                .iter_mut()
                .find(|o| o.option_id == value.option_id)
            {
                Some(existing) => existing.value = value.value,
                None => variant.options.push(value),
            }
        }
        if let Some(prices) = prices {
            variant.prices = prices;
        }
        let variant_id = variant.id.clone();

        let joined = catalog
            .products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| catalog.joined(p))
            .and_then(|p| p.variants.into_iter().find(|v| v.id == variant_id));
        joined.ok_or_else(|| Error::NotFound {
            entity: "variant",
            id: id.to_string(),
        })
    }

    fn list_products(&self, filter: &ProductFilter, config: &ListConfig) -> Result<Vec<Product>> {
        self.list_and_count_products(filter, config)
            .map(|(products, _)| products)
    }

    fn list_and_count_products(
        &self,
        filter: &ProductFilter,
        config: &ListConfig,
    ) -> Result<(Vec<Product>, usize)> {
        let state = acquire_lock(&self.state);
        let catalog = &state.current;
        let matched = catalog.matching(filter, config);
        let count = matched.len();
        let page = matched
            .into_iter()
            .skip(config.skip)
            .take(config.take)
            .map(|p| catalog.joined(p))
            .collect();
        Ok((page, count))
    }
}

fn default_variant_title(variant: &ProductVariant, options: &[ProductOptionValue]) -> String {
    if !options.is_empty() {
        return options
            .iter()
            .map(|o| o.value.as_str())
            .collect::<Vec<_>>()
            .join(" / ");
    }
    variant
        .sku
        .clone()
        .unwrap_or_else(|| "Default Variant".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VariantOptionInput;
    use crate::storage::traits::with_transaction;
    use tempfile::TempDir;

    fn product_input(handle: &str, options: &[&str]) -> ProductInput {
        ProductInput {
            handle: Some(handle.to_string()),
            title: Some(format!("Title {handle}")),
            options: Some(options.iter().map(ToString::to_string).collect()),
            ..ProductInput::default()
        }
    }

    #[test]
    fn test_create_product_with_options_and_images() {
        let catalog = InMemoryCatalog::with_default_profile();
        let product = catalog
            .create_product(ProductInput {
                images: Some(vec!["https://img/1.png".to_string()]),
                ..product_input("shirt", &["Size", "Color"])
            })
            .unwrap();

        assert!(product.id.starts_with("prod_"));
        assert_eq!(product.options.len(), 2);
        assert_eq!(product.options[0].title, "Size");
        assert_eq!(product.thumbnail.as_deref(), Some("https://img/1.png"));
    }

    #[test]
    fn test_duplicate_handle_rejected() {
        let catalog = InMemoryCatalog::new();
        catalog.create_product(product_input("shirt", &[])).unwrap();
        assert!(matches!(
            catalog.create_product(product_input("shirt", &[])),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_variant_prices_join_region() {
        let catalog = InMemoryCatalog::new();
        let region = catalog.add_region("Denmark", "DKK");
        let product = catalog.create_product(product_input("shirt", &["Size"])).unwrap();

        let variant = catalog
            .create_variant(
                &product.id,
                VariantInput {
                    sku: Some("SHIRT-S".to_string()),
                    prices: Some(vec![
                        PriceInput {
                            region_id: Some(region.id.clone()),
                            currency_code: None,
                            amount: 100,
                        },
                        PriceInput {
                            region_id: None,
                            currency_code: Some("EUR".to_string()),
                            amount: 15,
                        },
                    ]),
                    options: Some(vec![VariantOptionInput {
                        option_id: product.options[0].id.clone(),
                        value: "S".to_string(),
                    }]),
                    ..VariantInput::default()
                },
            )
            .unwrap();

        assert_eq!(variant.title, "S");
        assert_eq!(variant.prices[0].currency_code, "dkk");
        assert_eq!(variant.prices[0].region.as_ref().map(|r| r.name.as_str()), Some("Denmark"));
        assert_eq!(variant.prices[1].currency_code, "eur");

        let listed = catalog
            .list_products(&ProductFilter::default(), &ListConfig::default())
            .unwrap();
        assert!(listed[0].variants[0].prices[0].region.is_some());
    }

    #[test]
    fn test_variant_with_foreign_option_rejected() {
        let catalog = InMemoryCatalog::new();
        let product = catalog.create_product(product_input("a", &["Size"])).unwrap();
        let result = catalog.create_variant(
            &product.id,
            VariantInput {
                options: Some(vec![VariantOptionInput {
                    option_id: "opt_missing".to_string(),
                    value: "S".to_string(),
                }]),
                ..VariantInput::default()
            },
        );
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_rollback_restores_state() {
        let catalog = InMemoryCatalog::new();
        catalog.create_product(product_input("kept", &[])).unwrap();

        let result: Result<()> = with_transaction(&catalog, IsolationLevel::ReadCommitted, || {
            catalog.create_product(product_input("dropped", &[]))?;
            Err(invalid("boom"))
        });

        assert!(result.is_err());
        assert!(!catalog.in_transaction());
        assert_eq!(catalog.product_count(), 1);
        assert!(catalog.retrieve_product_by_handle("dropped").unwrap().is_none());
    }

    #[test]
    fn test_nested_begin_rejected() {
        let catalog = InMemoryCatalog::new();
        catalog.begin(IsolationLevel::Serializable).unwrap();
        assert!(catalog.begin(IsolationLevel::Serializable).is_err());
        catalog.commit().unwrap();
        assert!(catalog.commit().is_err());
    }

    #[test]
    fn test_list_paging_filter_and_count() {
        let catalog = InMemoryCatalog::new();
        for i in 0..5 {
            catalog
                .create_product(product_input(&format!("p-{i}"), &[]))
                .unwrap();
        }
        let config = ListConfig {
            skip: 1,
            take: 2,
            order: SortOrder::CreatedAtAsc,
        };
        let (page, count) = catalog
            .list_and_count_products(&ProductFilter::default(), &config)
            .unwrap();
        assert_eq!(count, 5);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].handle, "p-1");

        let filter = ProductFilter {
            q: Some("P-3".to_string()),
            ..ProductFilter::default()
        };
        let (page, count) = catalog
            .list_and_count_products(&filter, &ListConfig::default())
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(page[0].handle, "p-3");
    }

    #[test]
    fn test_update_variant_merges_options_and_replaces_prices() {
        let catalog = InMemoryCatalog::new();
        let product = catalog.create_product(product_input("a", &["Size"])).unwrap();
        let option_id = product.options[0].id.clone();
        let variant = catalog
            .create_variant(
                &product.id,
                VariantInput {
                    title: Some("Small".to_string()),
                    options: Some(vec![VariantOptionInput {
                        option_id: option_id.clone(),
                        value: "S".to_string(),
                    }]),
                    prices: Some(vec![PriceInput {
                        region_id: None,
                        currency_code: Some("usd".to_string()),
                        amount: 5,
                    }]),
                    ..VariantInput::default()
                },
            )
            .unwrap();

        let updated = catalog
            .update_variant(
                &variant.id,
                VariantInput {
                    options: Some(vec![VariantOptionInput {
                        option_id,
                        value: "M".to_string(),
                    }]),
                    prices: Some(vec![]),
                    ..VariantInput::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Small");
        assert_eq!(updated.options.len(), 1);
        assert_eq!(updated.options[0].value, "M");
        assert!(updated.prices.is_empty());
    }

    #[test]
    fn test_snapshot_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");

        let catalog = InMemoryCatalog::with_default_profile();
        catalog.add_region("Denmark", "dkk");
        catalog.create_product(product_input("shirt", &["Size"])).unwrap();
        catalog.save(&path).unwrap();

        let loaded = InMemoryCatalog::load(&path).unwrap();
        assert_eq!(loaded.snapshot(), catalog.snapshot());
        assert!(loaded.default_shipping_profile().is_ok());
        assert!(loaded.find_region_by_name("Denmark").unwrap().is_some());
    }

    #[test]
    fn test_load_missing_file_seeds_default_profile() {
        let dir = TempDir::new().unwrap();
        let catalog = InMemoryCatalog::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(
            catalog.default_shipping_profile().unwrap().profile_type,
            ShippingProfileType::Default
        );
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Summer Sale 2024!"), "summer-sale-2024");
    }
}
