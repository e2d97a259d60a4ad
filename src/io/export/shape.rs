//! Export shape discovery.

use crate::models::{ExportShape, MoneyAmount, PriceColumn, Product};
use std::collections::BTreeSet;

/// Folds products into an [`ExportShape`] without retaining them.
///
/// The result does not depend on the order products are observed in: counts are
/// maxima and price columns are collected into an ordered set.
#[derive(Debug, Default)]
pub struct ShapeAccumulator {
    max_options: usize,
    max_images: usize,
    prices: BTreeSet<PriceColumn>,
    products_seen: usize,
}

impl ShapeAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes one product with its variants and prices.
    pub fn observe(&mut self, product: &Product) {
        self.products_seen += 1;
        self.max_options = self.max_options.max(product.options.len());
        self.max_images = self.max_images.max(product.images.len());
        for price in product.variants.iter().flat_map(|v| &v.prices) {
            self.prices.insert(price_column(price));
        }
    }

    /// Number of products observed.
    #[must_use]
    pub const fn products_seen(&self) -> usize {
        self.products_seen
    }

    /// Returns the discovered shape.
    #[must_use]
    pub fn finish(self) -> ExportShape {
        ExportShape {
            dynamic_image_column_count: self.max_images,
            dynamic_option_column_count: self.max_options,
            prices: self.prices.into_iter().collect(),
        }
    }
}

/// Column key of a price.
///
/// A regional price whose region was not joined falls back to its region id for
/// the name.
#[must_use]
pub fn price_column(price: &MoneyAmount) -> PriceColumn {
    match (&price.region_id, &price.region) {
        (Some(_), Some(region)) => {
            PriceColumn::region(&region.id, &region.name, &region.currency_code)
        },
        (Some(region_id), None) => {
            PriceColumn::region(region_id, region_id, &price.currency_code)
        },
        (None, _) => PriceColumn::currency(&price.currency_code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Image, ProductOption, ProductVariant, Region};

    fn money(currency: &str, region: Option<&Region>) -> MoneyAmount {
        MoneyAmount {
            id: "ma".to_string(),
            currency_code: currency.to_string(),
            amount: 1,
            region_id: region.map(|r| r.id.clone()),
            region: region.cloned(),
        }
    }

    #[test]
    fn test_shape_takes_maxima_and_dedups_prices() {
        let denmark = Region {
            id: "reg_dk".to_string(),
            name: "Denmark".to_string(),
            currency_code: "dkk".to_string(),
        };
        let mut a = Product::new("p1", "a", "A");
        a.options = (0..2)
            .map(|i| ProductOption {
                id: format!("o{i}"),
                product_id: "p1".to_string(),
                title: format!("T{i}"),
            })
            .collect();
        a.variants.push(ProductVariant {
            prices: vec![money("dkk", None), money("dkk", Some(&denmark))],
            ..ProductVariant::default()
        });
        let mut b = Product::new("p2", "b", "B");
        b.images = (0..3)
            .map(|i| Image {
                id: format!("i{i}"),
                url: format!("u{i}"),
            })
            .collect();
        b.variants.push(ProductVariant {
            prices: vec![money("DKK", None)],
            ..ProductVariant::default()
        });

        let mut acc = ShapeAccumulator::new();
        acc.observe(&a);
        acc.observe(&b);
        assert_eq!(acc.products_seen(), 2);
        let shape = acc.finish();

        assert_eq!(shape.dynamic_option_column_count, 2);
        assert_eq!(shape.dynamic_image_column_count, 3);
        assert_eq!(shape.prices.len(), 2);
        assert!(shape.prices.contains(&PriceColumn::currency("dkk")));
        assert!(shape.prices.contains(&PriceColumn::region("reg_dk", "Denmark", "dkk")));
    }
}
