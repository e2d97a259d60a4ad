//! Operation classifier.
//!
//! Turns parsed rows into the four operation batches the applier runs:
//!
//! 1. Region-coded prices are resolved to region ids (names are dropped).
//! 2. Each row becomes a variant create (no `variant.id`) or update.
//! 3. The first row of each handle also becomes a product create (no
//!    `product.id`) or update, stamped with the default shipping profile.

use crate::models::{FieldValue, ParsedRow, PriceRecord, Region, paths};
use crate::storage::traits::{CatalogBackend, OperationType};
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};

/// The four operation batches of an import, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationBatches {
    /// Products to create.
    pub product_create: Vec<ParsedRow>,
    /// Products to update.
    pub product_update: Vec<ParsedRow>,
    /// Variants to create.
    pub variant_create: Vec<ParsedRow>,
    /// Variants to update.
    pub variant_update: Vec<ParsedRow>,
}

impl OperationBatches {
    /// Returns the batch for an operation type.
    #[must_use]
    pub fn get(&self, op: OperationType) -> &[ParsedRow] {
        match op {
            OperationType::ProductCreate => &self.product_create,
            OperationType::ProductUpdate => &self.product_update,
            OperationType::VariantCreate => &self.variant_create,
            OperationType::VariantUpdate => &self.variant_update,
        }
    }

    /// Mutable access to the batch for an operation type.
    pub fn get_mut(&mut self, op: OperationType) -> &mut Vec<ParsedRow> {
        match op {
            OperationType::ProductCreate => &mut self.product_create,
            OperationType::ProductUpdate => &mut self.product_update,
            OperationType::VariantCreate => &mut self.variant_create,
            OperationType::VariantUpdate => &mut self.variant_update,
        }
    }

    /// Total number of operations across all batches.
    #[must_use]
    pub fn total(&self) -> usize {
        OperationType::ALL.iter().map(|&op| self.get(op).len()).sum()
    }

    /// Iterates the batches in apply order.
    pub fn iter(&self) -> impl Iterator<Item = (OperationType, &[ParsedRow])> {
        OperationType::ALL.iter().map(move |&op| (op, self.get(op)))
    }
}

/// Classifies rows against a catalog.
///
/// Region lookups and the default shipping profile are cached for the lifetime
/// of the classifier.
pub struct OperationClassifier<'a> {
    catalog: &'a dyn CatalogBackend,
    regions: HashMap<String, Region>,
    profile_id: Option<String>,
}

impl<'a> OperationClassifier<'a> {
    /// Creates a classifier reading reference data from `catalog`.
    #[must_use]
    pub fn new(catalog: &'a dyn CatalogBackend) -> Self {
        Self {
            catalog,
            regions: HashMap::new(),
            profile_id: None,
        }
    }

    /// Classifies every row, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first parse error of `rows`, [`Error::InvalidData`] for an
    /// unknown region or a contradictory price, or a catalog error.
    pub fn classify<I>(&mut self, rows: I) -> Result<OperationBatches>
    where
        I: IntoIterator<Item = Result<ParsedRow>>,
    {
        let mut batches = OperationBatches::default();
        let mut seen_handles: HashSet<String> = HashSet::new();

        for row in rows {
            let mut row = row?;
            self.resolve_prices(&mut row)?;

            let variant_op = if row.variant_id().is_some() {
                OperationType::VariantUpdate
            } else {
                OperationType::VariantCreate
            };

            let first_for_handle = row
                .product_handle()
                .is_some_and(|handle| seen_handles.insert(handle.to_string()));
            let product_row = if first_for_handle {
                let profile_id = self.default_profile_id()?;
                row.set(paths::PRODUCT_PROFILE_ID, FieldValue::Text(profile_id));
                Some(row.clone())
            } else {
                None
            };

            batches.get_mut(variant_op).push(row);
            if let Some(product_row) = product_row {
                let product_op = if product_row.product_id().is_some() {
                    OperationType::ProductUpdate
                } else {
                    OperationType::ProductCreate
                };
                batches.get_mut(product_op).push(product_row);
            }
        }

        tracing::debug!(
            product_create = batches.product_create.len(),
            product_update = batches.product_update.len(),
            variant_create = batches.variant_create.len(),
            variant_update = batches.variant_update.len(),
            "classified import rows"
        );
        Ok(batches)
    }

    fn default_profile_id(&mut self) -> Result<String> {
        if let Some(id) = &self.profile_id {
            return Ok(id.clone());
        }
        let id = self.catalog.default_shipping_profile()?.id;
        self.profile_id = Some(id.clone());
        Ok(id)
    }

    fn region(&mut self, name: &str) -> Result<Region> {
        if let Some(region) = self.regions.get(name) {
            return Ok(region.clone());
        }
        let region = self.catalog.find_region_by_name(name)?.ok_or_else(|| {
            Error::InvalidData(format!(
                "trying to set a price for a region {name} that does not exist"
            ))
        })?;
        self.regions.insert(name.to_string(), region.clone());
        Ok(region)
    }

    fn resolve_prices(&mut self, row: &mut ParsedRow) -> Result<()> {
        for price in &mut row.variant_prices {
            resolve_price(price, |name| self.region(name))?;
        }
        Ok(())
    }
}

fn resolve_price<F>(price: &mut PriceRecord, mut lookup: F) -> Result<()>
where
    F: FnMut(&str) -> Result<Region>,
{
    match (price.region_name.take(), price.currency_code.is_some()) {
        (Some(name), false) => {
            price.region_id = Some(lookup(&name)?.id);
            Ok(())
        },
        (None, true) => Ok(()),
        (Some(name), true) => Err(Error::InvalidData(format!(
            "price for region {name} also carries a currency code"
        ))),
        (None, false) if price.region_id.is_some() => Ok(()),
        (None, false) => Err(Error::InvalidData(
            "price has neither a region nor a currency code".to_string(),
        )),
    }
}
