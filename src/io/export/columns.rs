//! Export column descriptors.

use crate::io::columns::{
    ColumnEntity, STATIC_COLUMNS, StaticAccessor, currency_price_header, image_header,
    option_name_header, option_value_header, region_price_header,
};
use crate::models::{ExportShape, MoneyAmount, PriceColumn, Product, ProductVariant};

/// How a column reads its cell.
#[derive(Debug, Clone)]
pub enum ExportAccessor {
    /// A fixed product or variant attribute.
    Static(StaticAccessor),
    /// Title of the n-th (0-based) product option.
    OptionName(usize),
    /// The variant's value for the n-th (0-based) product option.
    OptionValue(usize),
    /// URL of the n-th (0-based) product image.
    Image(usize),
    /// Amount of the variant's price matching the column.
    Price(PriceColumn),
}

/// One column of the export file.
#[derive(Debug, Clone)]
pub struct ExportColumnDescriptor {
    /// Header text.
    pub name: String,
    /// Cell reader.
    pub accessor: ExportAccessor,
    /// Entity the column belongs to.
    pub entity: ColumnEntity,
}

impl ExportColumnDescriptor {
    /// Reads the cell for one product-variant pair. Absent values are empty.
    #[must_use]
    pub fn value(&self, product: &Product, variant: &ProductVariant) -> String {
        let cell = match &self.accessor {
            ExportAccessor::Static(read) => read(product, variant),
            ExportAccessor::OptionName(i) => product.options.get(*i).map(|o| o.title.clone()),
            ExportAccessor::OptionValue(i) => product.options.get(*i).and_then(|option| {
                variant
                    .options
                    .iter()
                    .find(|v| v.option_id == option.id)
                    .map(|v| v.value.clone())
            }),
            ExportAccessor::Image(i) => product.images.get(*i).map(|img| img.url.clone()),
            ExportAccessor::Price(column) => variant
                .prices
                .iter()
                .find(|p| price_matches(column, p))
                .map(|p| p.amount.to_string()),
        };
        cell.unwrap_or_default()
    }
}

/// Returns whether `price` belongs in `column`.
///
/// A currency column takes a price without a region whose currency equals the
/// column's. A region column takes a price whose region name and id both equal
/// the column's. Comparisons ignore case.
#[must_use]
pub fn price_matches(column: &PriceColumn, price: &MoneyAmount) -> bool {
    match (&column.currency_code, &column.region) {
        (_, Some(region)) => {
            let Some(price_region_id) = price.region_id.as_deref() else {
                return false;
            };
            let name_matches = price
                .region
                .as_ref()
                .is_some_and(|r| r.name.eq_ignore_ascii_case(&region.name));
            name_matches && price_region_id.eq_ignore_ascii_case(&region.id)
        },
        (Some(code), None) => {
            price.region_id.is_none() && price.currency_code.eq_ignore_ascii_case(code)
        },
        (None, None) => false,
    }
}

/// Builds the ordered column list for a shape: static columns, then option
/// name/value pairs, then image columns, then one column per price key.
#[must_use]
pub fn build_export_columns(shape: &ExportShape) -> Vec<ExportColumnDescriptor> {
    let mut columns: Vec<ExportColumnDescriptor> = STATIC_COLUMNS
        .iter()
        .map(|c| ExportColumnDescriptor {
            name: c.header.to_string(),
            accessor: ExportAccessor::Static(c.accessor),
            entity: c.entity(),
        })
        .collect();

    for i in 0..shape.dynamic_option_column_count {
        columns.push(ExportColumnDescriptor {
            name: option_name_header(i + 1),
            accessor: ExportAccessor::OptionName(i),
            entity: ColumnEntity::Product,
        });
        columns.push(ExportColumnDescriptor {
            name: option_value_header(i + 1),
            accessor: ExportAccessor::OptionValue(i),
            entity: ColumnEntity::Variant,
        });
    }

    for i in 0..shape.dynamic_image_column_count {
        columns.push(ExportColumnDescriptor {
            name: image_header(i + 1),
            accessor: ExportAccessor::Image(i),
            entity: ColumnEntity::Product,
        });
    }

    for price in &shape.prices {
        let name = match (&price.currency_code, &price.region) {
            (_, Some(region)) => region_price_header(&region.name, &region.currency_code),
            (Some(code), None) => currency_price_header(code),
            (None, None) => continue,
        };
        columns.push(ExportColumnDescriptor {
            name,
            accessor: ExportAccessor::Price(price.clone()),
            entity: ColumnEntity::Variant,
        });
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Image, ProductOption, ProductOptionValue, Region};
    use test_case::test_case;

    fn denmark() -> Region {
        Region {
            id: "reg_dk".to_string(),
            name: "Denmark".to_string(),
            currency_code: "dkk".to_string(),
        }
    }

    fn money(currency: &str, region: Option<Region>) -> MoneyAmount {
        MoneyAmount {
            id: "ma".to_string(),
            currency_code: currency.to_string(),
            amount: 42,
            region_id: region.as_ref().map(|r| r.id.clone()),
            region,
        }
    }

    #[test_case(PriceColumn::currency("dkk"), money("DKK", None), true ; "currency case insensitive")]
    #[test_case(PriceColumn::currency("dkk"), money("eur", None), false ; "other currency")]
    #[test_case(PriceColumn::currency("dkk"), money("dkk", Some(denmark())), false ; "regional price in currency column")]
    #[test_case(PriceColumn::region("REG_DK", "denmark", "dkk"), money("dkk", Some(denmark())), true ; "region case insensitive")]
    #[test_case(PriceColumn::region("reg_other", "Denmark", "dkk"), money("dkk", Some(denmark())), false ; "region id differs")]
    #[test_case(PriceColumn::region("reg_dk", "Denmark", "dkk"), money("dkk", None), false ; "currency price in region column")]
    fn test_price_matches(column: PriceColumn, price: MoneyAmount, expected: bool) {
        assert_eq!(price_matches(&column, &price), expected);
    }

    #[test]
    fn test_header_order() {
        let shape = ExportShape {
            dynamic_image_column_count: 1,
            dynamic_option_column_count: 2,
            prices: vec![
                PriceColumn::region("reg_dk", "Denmark", "dkk"),
                PriceColumn::currency("eur"),
            ],
        };
        let names: Vec<String> = build_export_columns(&shape)
            .into_iter()
            .map(|c| c.name)
            .collect();
        let dynamic = &names[STATIC_COLUMNS.len()..];
        assert_eq!(
            dynamic,
            [
                "Option 1 Name",
                "Option 1 Value",
                "Option 2 Name",
                "Option 2 Value",
                "Image 1 Url",
                "Price Denmark [DKK]",
                "Price EUR",
            ]
        );
        assert_eq!(names[0], "Product Id");
    }

    #[test]
    fn test_dynamic_cell_values() {
        let mut product = Product::new("p1", "shirt", "Shirt");
        product.options.push(ProductOption {
            id: "opt_size".to_string(),
            product_id: "p1".to_string(),
            title: "Size".to_string(),
        });
        product.images.push(Image {
            id: "img".to_string(),
            url: "https://img/1.png".to_string(),
        });
        let variant = ProductVariant {
            options: vec![ProductOptionValue {
                option_id: "opt_size".to_string(),
                value: "L".to_string(),
            }],
            prices: vec![money("eur", None)],
            ..ProductVariant::default()
        };
        let shape = ExportShape {
            dynamic_image_column_count: 2,
            dynamic_option_column_count: 1,
            prices: vec![PriceColumn::currency("eur"), PriceColumn::currency("usd")],
        };
        let values: Vec<String> = build_export_columns(&shape)[STATIC_COLUMNS.len()..]
            .iter()
            .map(|c| c.value(&product, &variant))
            .collect();
        assert_eq!(values, ["Size", "L", "https://img/1.png", "", "42", ""]);
    }
}
