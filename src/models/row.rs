//! Parsed import rows.
//!
//! A [`ParsedRow`] is what the schema parser produces for one data line of an
//! import file: scalar values keyed by dot-path (`product.title`, `variant.sku`)
//! plus the four array-valued groups folded out of repeating columns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Dot-paths written by the import schema and read by the classifier and applier.
pub mod paths {
    /// Existing product identifier (present for updates).
    pub const PRODUCT_ID: &str = "product.id";
    /// Product natural key.
    pub const PRODUCT_HANDLE: &str = "product.handle";
    /// Shipping profile stamped by the classifier.
    pub const PRODUCT_PROFILE_ID: &str = "product.profile_id";
    /// Existing variant identifier (present for updates).
    pub const VARIANT_ID: &str = "variant.id";
    /// Variant stock keeping unit.
    pub const VARIANT_SKU: &str = "variant.sku";
    /// Prefix of product-level fields.
    pub const PRODUCT_PREFIX: &str = "product.";
    /// Prefix of variant-level fields.
    pub const VARIANT_PREFIX: &str = "variant.";
}

/// A scalar value produced by a static column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Raw or trimmed text.
    Text(String),
    /// Decimal number (dimensions, weights).
    Number(f64),
    /// Whole number (quantities).
    Integer(i64),
    /// Boolean flag.
    Boolean(bool),
    /// List of strings (tags).
    List(Vec<String>),
}

impl FieldValue {
    /// Returns the text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::List(items) => write!(f, "{}", items.join(",")),
        }
    }
}

/// A product option declared by an `Option <N> Name` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRecord {
    /// Option title, e.g. `Size`.
    pub title: String,
}

/// A variant option value declared by an `Option <N> Value` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionValueRecord {
    /// The value, e.g. `Large`.
    pub value: String,
    /// Title of the option group this value belongs to, read from the sibling
    /// `Option <N> Name` column.
    pub title: String,
    /// Resolved option group id, filled in by the applier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_id: Option<String>,
}

/// A variant price declared by a `Price ...` column.
///
/// Carries exactly one of `region_name` (before resolution), `region_id` (after
/// resolution) or `currency_code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Amount in the smallest currency unit.
    pub amount: i64,
    /// Lowercase ISO currency code for currency-coded prices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    /// Region name for region-coded prices, as written in the header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
    /// Resolved region id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
}

impl PriceRecord {
    /// Creates a currency-coded price.
    #[must_use]
    pub fn currency(code: impl Into<String>, amount: i64) -> Self {
        Self {
            amount,
            currency_code: Some(code.into().to_lowercase()),
            region_name: None,
            region_id: None,
        }
    }

    /// Creates a region-coded price awaiting resolution.
    #[must_use]
    pub fn region(name: impl Into<String>, amount: i64) -> Self {
        Self {
            amount,
            currency_code: None,
            region_name: Some(name.into()),
            region_id: None,
        }
    }

    /// Returns whether the price is tied to a region (named or resolved).
    #[must_use]
    pub const fn is_regional(&self) -> bool {
        self.region_name.is_some() || self.region_id.is_some()
    }
}

/// One data line of an import file after schema parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedRow {
    /// Scalar values keyed by dot-path.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    /// `product.options`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_options: Vec<OptionRecord>,
    /// `product.images`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_images: Vec<String>,
    /// `variant.options`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variant_options: Vec<OptionValueRecord>,
    /// `variant.prices`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variant_prices: Vec<PriceRecord>,
}

impl ParsedRow {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        self.fields.get(path)
    }

    /// Returns the text at `path`, ignoring non-text and empty values.
    #[must_use]
    pub fn text(&self, path: &str) -> Option<&str> {
        self.get(path)
            .and_then(FieldValue::as_text)
            .filter(|s| !s.is_empty())
    }

    /// Sets the value at `path`.
    pub fn set(&mut self, path: impl Into<String>, value: FieldValue) {
        self.fields.insert(path.into(), value);
    }

    /// Sets a text value at `path`.
    #[must_use]
    pub fn with_text(mut self, path: &str, value: impl Into<String>) -> Self {
        self.set(path, FieldValue::Text(value.into()));
        self
    }

    /// Product handle, the natural key used for deduplication.
    #[must_use]
    pub fn product_handle(&self) -> Option<&str> {
        self.text(paths::PRODUCT_HANDLE)
    }

    /// Existing product id.
    #[must_use]
    pub fn product_id(&self) -> Option<&str> {
        self.text(paths::PRODUCT_ID)
    }

    /// Existing variant id.
    #[must_use]
    pub fn variant_id(&self) -> Option<&str> {
        self.text(paths::VARIANT_ID)
    }

    /// Variant SKU.
    #[must_use]
    pub fn variant_sku(&self) -> Option<&str> {
        self.text(paths::VARIANT_SKU)
    }

    /// Iterates the fields under `prefix`, with the prefix stripped.
    pub fn fields_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a FieldValue)> + 'a {
        self.fields
            .iter()
            .filter_map(move |(k, v)| k.strip_prefix(prefix).map(|field| (field, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_ignores_empty_and_non_text() {
        let mut row = ParsedRow::new().with_text(paths::PRODUCT_HANDLE, "");
        row.set("product.weight", FieldValue::Number(1.5));

        assert!(row.product_handle().is_none());
        assert!(row.text("product.weight").is_none());
    }

    #[test]
    fn test_fields_with_prefix_strips_prefix() {
        let row = ParsedRow::new()
            .with_text("product.title", "Shirt")
            .with_text("variant.title", "Small");

        let product: Vec<_> = row.fields_with_prefix(paths::PRODUCT_PREFIX).collect();
        assert_eq!(product.len(), 1);
        assert_eq!(product[0].0, "title");
    }

    #[test]
    fn test_row_serde_roundtrip_keeps_groups() {
        let mut row = ParsedRow::new().with_text(paths::PRODUCT_HANDLE, "shirt");
        row.variant_prices.push(PriceRecord::currency("DKK", 110));
        row.product_options.push(OptionRecord {
            title: "Size".to_string(),
        });

        let json = serde_json::to_string(&row).unwrap();
        let back: ParsedRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
        assert_eq!(back.variant_prices[0].currency_code.as_deref(), Some("dkk"));
    }

    #[test]
    fn test_list_display_joins_with_comma() {
        let value = FieldValue::List(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(value.to_string(), "a,b");
    }
}
