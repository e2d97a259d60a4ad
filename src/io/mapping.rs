//! Conversion of parsed rows into catalog inputs.

use crate::models::{
    FieldValue, ParsedRow, PriceInput, ProductInput, ProductStatus, VariantInput, paths,
};
use crate::{Error, Result};

fn text(row: &ParsedRow, path: &str) -> Option<String> {
    row.text(path).map(String::from)
}

fn number(row: &ParsedRow, path: &str) -> Option<f64> {
    match row.get(path)? {
        FieldValue::Number(n) => Some(*n),
        #[allow(clippy::cast_precision_loss)]
        FieldValue::Integer(i) => Some(*i as f64),
        FieldValue::Text(s) => s.parse().ok(),
        _ => None,
    }
}

fn integer(row: &ParsedRow, path: &str) -> Option<i64> {
    match row.get(path)? {
        FieldValue::Integer(i) => Some(*i),
        FieldValue::Text(s) => s.parse().ok(),
        _ => None,
    }
}

fn boolean(row: &ParsedRow, path: &str) -> Option<bool> {
    match row.get(path)? {
        FieldValue::Boolean(b) => Some(*b),
        _ => None,
    }
}

fn list(row: &ParsedRow, path: &str) -> Option<Vec<String>> {
    match row.get(path)? {
        FieldValue::List(items) => Some(items.clone()),
        FieldValue::Text(s) => Some(s.split(',').map(|t| t.trim().to_string()).collect()),
        _ => None,
    }
}

/// Builds the product input of a product create or update row.
///
/// Option titles come from `product.options`, image URLs from `product.images`.
/// Groups that are empty on the row are left unset so an update keeps the
/// product's existing options and images.
#[must_use]
pub fn product_input(row: &ParsedRow) -> ProductInput {
    let options: Vec<String> = row.product_options.iter().map(|o| o.title.clone()).collect();
    ProductInput {
        handle: text(row, paths::PRODUCT_HANDLE),
        title: text(row, "product.title"),
        subtitle: text(row, "product.subtitle"),
        description: text(row, "product.description"),
        status: row.text("product.status").and_then(ProductStatus::parse),
        thumbnail: text(row, "product.thumbnail"),
        weight: number(row, "product.weight"),
        length: number(row, "product.length"),
        width: number(row, "product.width"),
        height: number(row, "product.height"),
        hs_code: text(row, "product.hs_code"),
        origin_country: text(row, "product.origin_country"),
        mid_code: text(row, "product.mid_code"),
        material: text(row, "product.material"),
        collection_title: text(row, "product.collection.title"),
        collection_handle: text(row, "product.collection.handle"),
        product_type: text(row, "product.type"),
        tags: list(row, "product.tags"),
        discountable: boolean(row, "product.discountable"),
        external_id: text(row, "product.external_id"),
        profile_id: text(row, paths::PRODUCT_PROFILE_ID),
        options: (!options.is_empty()).then_some(options),
        images: (!row.product_images.is_empty()).then(|| row.product_images.clone()),
    }
}

/// Builds the variant input of a variant row, without options.
///
/// Option values need option ids, which only the applier can resolve.
///
/// # Errors
///
/// Returns [`Error::InvalidData`] if a price was not resolved by the
/// classifier.
pub fn variant_input(row: &ParsedRow) -> Result<VariantInput> {
    let prices = row
        .variant_prices
        .iter()
        .map(|p| {
            if p.region_name.is_some() {
                return Err(Error::InvalidData(format!(
                    "price for region {} was not resolved",
                    p.region_name.as_deref().unwrap_or_default()
                )));
            }
            Ok(PriceInput {
                region_id: p.region_id.clone(),
                currency_code: p.currency_code.clone(),
                amount: p.amount,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(VariantInput {
        title: text(row, "variant.title"),
        sku: text(row, paths::VARIANT_SKU),
        barcode: text(row, "variant.barcode"),
        ean: text(row, "variant.ean"),
        upc: text(row, "variant.upc"),
        inventory_quantity: integer(row, "variant.inventory_quantity"),
        allow_backorder: boolean(row, "variant.allow_backorder"),
        manage_inventory: boolean(row, "variant.manage_inventory"),
        weight: number(row, "variant.weight"),
        length: number(row, "variant.length"),
        width: number(row, "variant.width"),
        height: number(row, "variant.height"),
        hs_code: text(row, "variant.hs_code"),
        origin_country: text(row, "variant.origin_country"),
        mid_code: text(row, "variant.mid_code"),
        material: text(row, "variant.material"),
        prices: (!prices.is_empty()).then_some(prices),
        options: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OptionRecord, PriceRecord};

    #[test]
    fn test_product_input_from_row() {
        let mut row = ParsedRow::new()
            .with_text(paths::PRODUCT_HANDLE, "shirt")
            .with_text("product.title", "Shirt")
            .with_text("product.status", "published")
            .with_text(paths::PRODUCT_PROFILE_ID, "sp_1");
        row.set("product.weight", FieldValue::Number(2.5));
        row.set("product.discountable", FieldValue::Boolean(false));
        row.product_options.push(OptionRecord {
            title: "Size".to_string(),
        });

        let input = product_input(&row);
        assert_eq!(input.handle.as_deref(), Some("shirt"));
        assert_eq!(input.status, Some(ProductStatus::Published));
        assert_eq!(input.weight, Some(2.5));
        assert_eq!(input.discountable, Some(false));
        assert_eq!(input.profile_id.as_deref(), Some("sp_1"));
        assert_eq!(input.options, Some(vec!["Size".to_string()]));
        assert!(input.images.is_none());
    }

    #[test]
    fn test_variant_input_prices() {
        let mut row = ParsedRow::new().with_text(paths::VARIANT_SKU, "SKU-1");
        row.variant_prices.push(PriceRecord::currency("DKK", 110));
        let input = variant_input(&row).unwrap();

        let prices = input.prices.unwrap();
        assert_eq!(prices[0].currency_code.as_deref(), Some("dkk"));
        assert_eq!(prices[0].amount, 110);
        assert_eq!(input.sku.as_deref(), Some("SKU-1"));
    }

    #[test]
    fn test_variant_input_rejects_unresolved_region() {
        let mut row = ParsedRow::new();
        row.variant_prices.push(PriceRecord::region("Denmark", 1));
        assert!(variant_input(&row).is_err());
    }
}
