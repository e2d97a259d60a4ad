//! Catalog entities as returned by the entity store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Publication status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Not yet visible.
    #[default]
    Draft,
    /// Awaiting review.
    Proposed,
    /// Visible in the storefront.
    Published,
    /// Rejected in review.
    Rejected,
}

impl ProductStatus {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Proposed => "proposed",
            Self::Published => "published",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "proposed" => Some(Self::Proposed),
            "published" => Some(Self::Published),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pricing region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Region id.
    pub id: String,
    /// Display name, unique across regions.
    pub name: String,
    /// Lowercase currency code used for prices in this region.
    pub currency_code: String,
}

/// Kind of shipping profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingProfileType {
    /// The store default profile.
    #[default]
    Default,
    /// Profile for gift cards.
    GiftCard,
    /// Any other profile.
    Custom,
}

impl ShippingProfileType {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::GiftCard => "gift_card",
            Self::Custom => "custom",
        }
    }
}

/// A shipping profile products are attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingProfile {
    /// Profile id.
    pub id: String,
    /// Profile name.
    pub name: String,
    /// Profile kind.
    #[serde(rename = "type")]
    pub profile_type: ShippingProfileType,
}

/// Collection a product belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductCollection {
    /// Collection title.
    pub title: String,
    /// Collection handle.
    pub handle: String,
}

/// An option group of a product, e.g. `Size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    /// Option id.
    pub id: String,
    /// Owning product.
    pub product_id: String,
    /// Option title.
    pub title: String,
}

/// A product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image id.
    pub id: String,
    /// Public URL.
    pub url: String,
}

/// A variant's value for one option group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOptionValue {
    /// Option group id.
    pub option_id: String,
    /// The value.
    pub value: String,
}

/// A price of a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAmount {
    /// Price id.
    pub id: String,
    /// Lowercase currency code.
    pub currency_code: String,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    /// Region the price applies to, if regional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
    /// Joined region, populated by listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ProductVariant {
    pub id: String,
    pub product_id: String,
    pub title: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub ean: Option<String>,
    pub upc: Option<String>,
    pub inventory_quantity: i64,
    pub allow_backorder: bool,
    pub manage_inventory: bool,
    pub weight: Option<f64>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub hs_code: Option<String>,
    pub origin_country: Option<String>,
    pub mid_code: Option<String>,
    pub material: Option<String>,
    #[serde(default)]
    pub options: Vec<ProductOptionValue>,
    #[serde(default)]
    pub prices: Vec<MoneyAmount>,
}

/// A catalog product with its relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Product {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub status: ProductStatus,
    pub thumbnail: Option<String>,
    pub weight: Option<f64>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub hs_code: Option<String>,
    pub origin_country: Option<String>,
    pub mid_code: Option<String>,
    pub material: Option<String>,
    pub collection: Option<ProductCollection>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub discountable: bool,
    pub external_id: Option<String>,
    pub profile_id: Option<String>,
    /// Joined shipping profile, populated by listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ShippingProfile>,
    #[serde(default)]
    pub options: Vec<ProductOption>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a draft product with only the required fields set.
    #[must_use]
    pub fn new(id: impl Into<String>, handle: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handle: handle.into(),
            title: title.into(),
            subtitle: None,
            description: None,
            status: ProductStatus::Draft,
            thumbnail: None,
            weight: None,
            length: None,
            width: None,
            height: None,
            hs_code: None,
            origin_country: None,
            mid_code: None,
            material: None,
            collection: None,
            product_type: None,
            tags: Vec::new(),
            discountable: true,
            external_id: None,
            profile_id: None,
            profile: None,
            options: Vec::new(),
            images: Vec::new(),
            variants: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Finds an option group by exact title.
    #[must_use]
    pub fn option_by_title(&self, title: &str) -> Option<&ProductOption> {
        self.options.iter().find(|o| o.title == title)
    }
}

/// Price as given to the entity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceInput {
    /// Region id for regional prices.
    pub region_id: Option<String>,
    /// Currency code for currency prices.
    pub currency_code: Option<String>,
    /// Amount in the smallest currency unit.
    pub amount: i64,
}

/// Option value as given to the entity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOptionInput {
    /// Option group id.
    pub option_id: String,
    /// The value.
    pub value: String,
}

/// Product attributes for a create or update call.
///
/// `None` leaves a field untouched on update and defaulted on create.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ProductInput {
    pub handle: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProductStatus>,
    pub thumbnail: Option<String>,
    pub weight: Option<f64>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub hs_code: Option<String>,
    pub origin_country: Option<String>,
    pub mid_code: Option<String>,
    pub material: Option<String>,
    pub collection_title: Option<String>,
    pub collection_handle: Option<String>,
    pub product_type: Option<String>,
    pub tags: Option<Vec<String>>,
    pub discountable: Option<bool>,
    pub external_id: Option<String>,
    pub profile_id: Option<String>,
    /// Option group titles, in declaration order.
    pub options: Option<Vec<String>>,
    /// Image URLs, in declaration order.
    pub images: Option<Vec<String>>,
}

/// Variant attributes for a create or update call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct VariantInput {
    pub title: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub ean: Option<String>,
    pub upc: Option<String>,
    pub inventory_quantity: Option<i64>,
    pub allow_backorder: Option<bool>,
    pub manage_inventory: Option<bool>,
    pub weight: Option<f64>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub hs_code: Option<String>,
    pub origin_country: Option<String>,
    pub mid_code: Option<String>,
    pub material: Option<String>,
    pub prices: Option<Vec<PriceInput>>,
    pub options: Option<Vec<VariantOptionInput>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_roundtrip() {
        for status in [
            ProductStatus::Draft,
            ProductStatus::Proposed,
            ProductStatus::Published,
            ProductStatus::Rejected,
        ] {
            assert_eq!(ProductStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProductStatus::parse(" Published "), Some(ProductStatus::Published));
        assert_eq!(ProductStatus::parse("archived"), None);
    }

    #[test]
    fn test_option_by_title_is_exact() {
        let mut product = Product::new("prod_1", "shirt", "Shirt");
        product.options.push(ProductOption {
            id: "opt_1".to_string(),
            product_id: "prod_1".to_string(),
            title: "Size".to_string(),
        });

        assert!(product.option_by_title("Size").is_some());
        assert!(product.option_by_title("size").is_none());
    }
}
