//! Column vocabulary shared by the import schema and the export header.
//!
//! Static columns map one header to one product or variant attribute. The same
//! table drives both directions, so a file produced by an export can be fed back
//! to an import unchanged.

use crate::models::{Product, ProductVariant};
use regex::Regex;
use std::sync::LazyLock;

/// Creates a lazily compiled static regex.
///
/// The patterns are literals covered by tests, so compilation cannot fail.
macro_rules! lazy_regex {
    ($pattern:expr) => {
        LazyLock::new(|| Regex::new($pattern).unwrap_or_else(|_| unreachable!()))
    };
}

/// `Option <N> Name`
pub static OPTION_NAME: LazyLock<Regex> = lazy_regex!(r"^Option (\d+) Name$");
/// `Option <N> Value`
pub static OPTION_VALUE: LazyLock<Regex> = lazy_regex!(r"^Option (\d+) Value$");
/// `Price <CODE>`, a currency-coded price.
pub static CURRENCY_PRICE: LazyLock<Regex> = lazy_regex!(r"^Price ([A-Z]{2,4})$");
/// `Price <Region name> [<CODE>]`, a region-coded price.
pub static REGION_PRICE: LazyLock<Regex> = lazy_regex!(r"^Price (.+) \[([A-Z]{2,4})\]$");
/// `Image <N> Url`
pub static IMAGE_URL: LazyLock<Regex> = lazy_regex!(r"^Image (\d+) Url$");

/// Header of the mandatory handle column.
pub const PRODUCT_HANDLE_HEADER: &str = "Product Handle";

/// How a static column's text is interpreted on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Kept as text.
    Text,
    /// Decimal number.
    Number,
    /// Whole number.
    Integer,
    /// `true/false/yes/no/1/0`.
    Boolean,
    /// Comma-separated list.
    List,
    /// Product status name.
    Status,
}

/// Which entity a column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnEntity {
    /// Product-level attribute, repeated on every variant line.
    Product,
    /// Variant-level attribute.
    Variant,
}

/// Reads the export cell of a static column.
pub type StaticAccessor = fn(&Product, &ProductVariant) -> Option<String>;

/// One static column.
#[derive(Debug, Clone, Copy)]
pub struct StaticColumn {
    /// Header text.
    pub header: &'static str,
    /// Dot-path the import writes to.
    pub path: &'static str,
    /// Import interpretation.
    pub kind: ValueKind,
    /// Required on import.
    pub required: bool,
    /// Export accessor.
    pub accessor: StaticAccessor,
}

impl StaticColumn {
    /// Entity the column belongs to, derived from its path.
    #[must_use]
    pub fn entity(&self) -> ColumnEntity {
        if self.path.starts_with(crate::models::paths::VARIANT_PREFIX) {
            ColumnEntity::Variant
        } else {
            ColumnEntity::Product
        }
    }
}

fn num(value: Option<f64>) -> Option<String> {
    value.map(|v| v.to_string())
}

macro_rules! column {
    ($header:literal, $path:literal, $kind:ident, |$p:ident, $v:ident| $body:expr) => {
        StaticColumn {
            header: $header,
            path: $path,
            kind: ValueKind::$kind,
            required: false,
            accessor: |$p, $v| $body,
        }
    };
}

/// Every static column, in export order.
pub static STATIC_COLUMNS: &[StaticColumn] = &[
    column!("Product Id", "product.id", Text, |p, _v| Some(p.id.clone())),
    StaticColumn {
        header: PRODUCT_HANDLE_HEADER,
        path: "product.handle",
        kind: ValueKind::Text,
        required: true,
        accessor: |p, _v| Some(p.handle.clone()),
    },
    column!("Product Title", "product.title", Text, |p, _v| Some(p.title.clone())),
    column!("Product Subtitle", "product.subtitle", Text, |p, _v| p.subtitle.clone()),
    column!("Product Description", "product.description", Text, |p, _v| p
        .description
        .clone()),
    column!("Product Status", "product.status", Status, |p, _v| Some(
        p.status.as_str().to_string()
    )),
    column!("Product Thumbnail", "product.thumbnail", Text, |p, _v| p
        .thumbnail
        .clone()),
    column!("Product Weight", "product.weight", Number, |p, _v| num(p.weight)),
    column!("Product Length", "product.length", Number, |p, _v| num(p.length)),
    column!("Product Width", "product.width", Number, |p, _v| num(p.width)),
    column!("Product Height", "product.height", Number, |p, _v| num(p.height)),
    column!("Product HS Code", "product.hs_code", Text, |p, _v| p.hs_code.clone()),
    column!("Product Origin Country", "product.origin_country", Text, |p, _v| p
        .origin_country
        .clone()),
    column!("Product MID Code", "product.mid_code", Text, |p, _v| p.mid_code.clone()),
    column!("Product Material", "product.material", Text, |p, _v| p.material.clone()),
    column!("Product Collection Title", "product.collection.title", Text, |p, _v| p
        .collection
        .as_ref()
        .map(|c| c.title.clone())),
    column!("Product Collection Handle", "product.collection.handle", Text, |p, _v| p
        .collection
        .as_ref()
        .map(|c| c.handle.clone())),
    column!("Product Type", "product.type", Text, |p, _v| p.product_type.clone()),
    column!("Product Tags", "product.tags", List, |p, _v| Some(p.tags.join(","))),
    column!("Product Discountable", "product.discountable", Boolean, |p, _v| Some(
        p.discountable.to_string()
    )),
    column!("Product External Id", "product.external_id", Text, |p, _v| p
        .external_id
        .clone()),
    column!("Product Profile Name", "product.profile.name", Text, |p, _v| p
        .profile
        .as_ref()
        .map(|s| s.name.clone())),
    column!("Product Profile Type", "product.profile.type", Text, |p, _v| p
        .profile
        .as_ref()
        .map(|s| s.profile_type.as_str().to_string())),
    column!("Variant Id", "variant.id", Text, |_p, v| Some(v.id.clone())),
    column!("Variant Title", "variant.title", Text, |_p, v| Some(v.title.clone())),
    column!("Variant SKU", "variant.sku", Text, |_p, v| v.sku.clone()),
    column!("Variant Barcode", "variant.barcode", Text, |_p, v| v.barcode.clone()),
    column!("Variant EAN", "variant.ean", Text, |_p, v| v.ean.clone()),
    column!("Variant UPC", "variant.upc", Text, |_p, v| v.upc.clone()),
    column!("Variant Inventory Quantity", "variant.inventory_quantity", Integer, |_p, v| {
        Some(v.inventory_quantity.to_string())
    }),
    column!("Variant Allow backorder", "variant.allow_backorder", Boolean, |_p, v| Some(
        v.allow_backorder.to_string()
    )),
    column!("Variant Manage inventory", "variant.manage_inventory", Boolean, |_p, v| Some(
        v.manage_inventory.to_string()
    )),
    column!("Variant Weight", "variant.weight", Number, |_p, v| num(v.weight)),
    column!("Variant Length", "variant.length", Number, |_p, v| num(v.length)),
    column!("Variant Width", "variant.width", Number, |_p, v| num(v.width)),
    column!("Variant Height", "variant.height", Number, |_p, v| num(v.height)),
    column!("Variant HS Code", "variant.hs_code", Text, |_p, v| v.hs_code.clone()),
    column!("Variant Origin Country", "variant.origin_country", Text, |_p, v| v
        .origin_country
        .clone()),
    column!("Variant MID Code", "variant.mid_code", Text, |_p, v| v.mid_code.clone()),
    column!("Variant Material", "variant.material", Text, |_p, v| v.material.clone()),
];

/// Header of the n-th (1-based) option name column.
#[must_use]
pub fn option_name_header(n: usize) -> String {
    format!("Option {n} Name")
}

/// Header of the n-th (1-based) option value column.
#[must_use]
pub fn option_value_header(n: usize) -> String {
    format!("Option {n} Value")
}

/// Header of the n-th (1-based) image column.
#[must_use]
pub fn image_header(n: usize) -> String {
    format!("Image {n} Url")
}

/// Header of a currency-coded price column.
#[must_use]
pub fn currency_price_header(currency_code: &str) -> String {
    format!("Price {}", currency_code.to_uppercase())
}

/// Header of a region-coded price column.
#[must_use]
pub fn region_price_header(region_name: &str, currency_code: &str) -> String {
    format!("Price {region_name} [{}]", currency_code.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use test_case::test_case;

    #[test_case("Option 1 Name", true, false ; "option name")]
    #[test_case("Option 12 Value", false, true ; "option value")]
    #[test_case("Option Name", false, false ; "option without index")]
    #[test_case("Option 1 Names", false, false ; "trailing text")]
    fn test_option_patterns(header: &str, is_name: bool, is_value: bool) {
        assert_eq!(OPTION_NAME.is_match(header), is_name);
        assert_eq!(OPTION_VALUE.is_match(header), is_value);
    }

    #[test_case("Price DKK", true, false ; "currency")]
    #[test_case("Price EU", true, false ; "two letter currency")]
    #[test_case("Price dkk", false, false ; "lowercase code")]
    #[test_case("Price DKKKK", false, false ; "five letter code")]
    #[test_case("Price Denmark [DKK]", false, true ; "region")]
    #[test_case("Price North America [USD]", false, true ; "region with spaces")]
    #[test_case("Variant Price DKK", false, false ; "prefixed")]
    fn test_price_patterns(header: &str, currency: bool, region: bool) {
        assert_eq!(CURRENCY_PRICE.is_match(header), currency);
        assert_eq!(REGION_PRICE.is_match(header), region);
    }

    #[test]
    fn test_region_price_captures() {
        let caps = REGION_PRICE.captures("Price North America [USD]").unwrap();
        assert_eq!(&caps[1], "North America");
        assert_eq!(&caps[2], "USD");
    }

    #[test]
    fn test_headers_unique_and_only_handle_required() {
        let headers: HashSet<_> = STATIC_COLUMNS.iter().map(|c| c.header).collect();
        assert_eq!(headers.len(), STATIC_COLUMNS.len());

        let required: Vec<_> = STATIC_COLUMNS.iter().filter(|c| c.required).collect();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0].header, PRODUCT_HANDLE_HEADER);
    }

    #[test]
    fn test_dynamic_headers_match_patterns() {
        assert!(OPTION_NAME.is_match(&option_name_header(3)));
        assert!(OPTION_VALUE.is_match(&option_value_header(3)));
        assert!(IMAGE_URL.is_match(&image_header(1)));
        assert!(CURRENCY_PRICE.is_match(&currency_price_header("dkk")));
        assert!(REGION_PRICE.is_match(&region_price_header("Denmark", "dkk")));
    }

    #[test]
    fn test_entity_from_path() {
        let sku = STATIC_COLUMNS
            .iter()
            .find(|c| c.header == "Variant SKU")
            .unwrap();
        assert_eq!(sku.entity(), ColumnEntity::Variant);
        assert_eq!(STATIC_COLUMNS[0].entity(), ColumnEntity::Product);
    }
}
