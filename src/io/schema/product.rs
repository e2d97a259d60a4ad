//! The product import schema: transforms, reducers and the column list.

use super::{ColumnDescriptor, ColumnSchema, RawRow, Transform};
use crate::io::columns::{
    CURRENCY_PRICE, IMAGE_URL, OPTION_NAME, OPTION_VALUE, REGION_PRICE, STATIC_COLUMNS,
    ValueKind,
};
use crate::models::{
    FieldValue, OptionRecord, OptionValueRecord, ParsedRow, PriceRecord, ProductStatus,
};

type ReduceResult = std::result::Result<(), String>;
type TransformResult = std::result::Result<FieldValue, String>;

/// Builds the product import schema: every static column followed by the
/// option, price and image groups.
#[must_use]
pub fn product_import_schema() -> ColumnSchema {
    let mut columns: Vec<ColumnDescriptor> = STATIC_COLUMNS
        .iter()
        .map(|c| {
            let descriptor = ColumnDescriptor::mapped(c.header, c.path);
            let descriptor = match transform_for(c.kind) {
                Some(f) => descriptor.with_transform(f),
                None => descriptor,
            };
            if c.required {
                descriptor.required()
            } else {
                descriptor
            }
        })
        .collect();

    columns.extend([
        ColumnDescriptor::matching("product.options", OPTION_NAME.clone(), reduce_option_name),
        ColumnDescriptor::matching("variant.options", OPTION_VALUE.clone(), reduce_option_value),
        ColumnDescriptor::matching(
            "variant.prices",
            REGION_PRICE.clone(),
            reduce_region_price,
        ),
        ColumnDescriptor::matching(
            "variant.prices",
            CURRENCY_PRICE.clone(),
            reduce_currency_price,
        ),
        ColumnDescriptor::matching("product.images", IMAGE_URL.clone(), reduce_image),
    ]);
    ColumnSchema::new(columns)
}

const fn transform_for(kind: ValueKind) -> Option<Transform> {
    match kind {
        ValueKind::Text => None,
        ValueKind::Number => Some(to_number),
        ValueKind::Integer => Some(to_integer),
        ValueKind::Boolean => Some(to_boolean),
        ValueKind::List => Some(to_list),
        ValueKind::Status => Some(to_status),
    }
}

fn to_number(raw: &str) -> TransformResult {
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(FieldValue::Number)
        .ok_or_else(|| format!("'{raw}' is not a number"))
}

fn to_integer(raw: &str) -> TransformResult {
    raw.parse::<i64>()
        .map(FieldValue::Integer)
        .map_err(|_| format!("'{raw}' is not a whole number"))
}

fn to_boolean(raw: &str) -> TransformResult {
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(FieldValue::Boolean(true)),
        "false" | "no" | "0" => Ok(FieldValue::Boolean(false)),
        _ => Err(format!("'{raw}' is not a boolean")),
    }
}

fn to_list(raw: &str) -> TransformResult {
    Ok(FieldValue::List(
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
    ))
}

fn to_status(raw: &str) -> TransformResult {
    ProductStatus::parse(raw)
        .map(|s| FieldValue::Text(s.as_str().to_string()))
        .ok_or_else(|| format!("'{raw}' is not a product status"))
}

fn parse_amount(raw: &str) -> std::result::Result<i64, String> {
    raw.parse::<i64>()
        .map_err(|_| format!("'{raw}' is not a valid price amount"))
}

fn reduce_option_name(row: &mut ParsedRow, _column: &str, raw: &str, _: &RawRow<'_>) -> ReduceResult {
    if !raw.is_empty() {
        row.product_options.push(OptionRecord {
            title: raw.to_string(),
        });
    }
    Ok(())
}

fn reduce_option_value(row: &mut ParsedRow, column: &str, raw: &str, line: &RawRow<'_>) -> ReduceResult {
    if raw.is_empty() {
        return Ok(());
    }
    let index = OPTION_VALUE
        .captures(column)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| format!("unexpected option column {column}"))?;
    let name_header = format!("Option {index} Name");
    let title = line
        .get(&name_header)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| format!("value '{raw}' has no matching {name_header}"))?;
    row.variant_options.push(OptionValueRecord {
        value: raw.to_string(),
        title: title.to_string(),
        option_id: None,
    });
    Ok(())
}

fn reduce_currency_price(row: &mut ParsedRow, column: &str, raw: &str, _: &RawRow<'_>) -> ReduceResult {
    if raw.is_empty() {
        return Ok(());
    }
    let code = CURRENCY_PRICE
        .captures(column)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| format!("unexpected price column {column}"))?;
    row.variant_prices
        .push(PriceRecord::currency(code, parse_amount(raw)?));
    Ok(())
}

fn reduce_region_price(row: &mut ParsedRow, column: &str, raw: &str, _: &RawRow<'_>) -> ReduceResult {
    if raw.is_empty() {
        return Ok(());
    }
    let name = REGION_PRICE
        .captures(column)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| format!("unexpected price column {column}"))?;
    row.variant_prices
        .push(PriceRecord::region(name, parse_amount(raw)?));
    Ok(())
}

fn reduce_image(row: &mut ParsedRow, _column: &str, raw: &str, _: &RawRow<'_>) -> ReduceResult {
    if !raw.is_empty() {
        row.product_images.push(raw.to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::schema::RowParser;
    use std::collections::HashMap;
    use test_case::test_case;

    #[test_case("true", true ; "true")]
    #[test_case("YES", true ; "uppercase yes")]
    #[test_case("1", true ; "one")]
    #[test_case("no", false ; "no")]
    #[test_case("False", false ; "mixed case false")]
    fn test_to_boolean(raw: &str, expected: bool) {
        assert_eq!(to_boolean(raw), Ok(FieldValue::Boolean(expected)));
    }

    #[test]
    fn test_transforms_reject_garbage() {
        assert!(to_boolean("maybe").is_err());
        assert!(to_number("wide").is_err());
        assert!(to_number("NaN").is_err());
        assert!(to_integer("1.5").is_err());
        assert!(to_status("archived").is_err());
    }

    #[test]
    fn test_to_list_splits_and_trims() {
        assert_eq!(
            to_list("summer, cotton,,sale "),
            Ok(FieldValue::List(vec![
                "summer".to_string(),
                "cotton".to_string(),
                "sale".to_string()
            ]))
        );
    }

    #[test]
    fn test_option_value_reads_sibling_name() {
        let index: HashMap<String, usize> = [
            ("Option 2 Name".to_string(), 0),
            ("Option 2 Value".to_string(), 1),
        ]
        .into_iter()
        .collect();
        let record = csv::StringRecord::from(vec!["Color", "Red"]);
        let raw = RawRow::new(&index, &record);

        let mut row = ParsedRow::new();
        reduce_option_value(&mut row, "Option 2 Value", "Red", &raw).unwrap();
        assert_eq!(row.variant_options[0].title, "Color");
        assert_eq!(row.variant_options[0].value, "Red");
    }

    #[test]
    fn test_option_value_without_name_fails() {
        let index = HashMap::new();
        let record = csv::StringRecord::new();
        let raw = RawRow::new(&index, &record);
        let mut row = ParsedRow::new();
        assert!(reduce_option_value(&mut row, "Option 1 Value", "Red", &raw).is_err());
    }

    #[test]
    fn test_region_and_currency_prices() {
        let schema = product_import_schema();
        let input = "Product Handle;Price Denmark [DKK];Price EUR\nshirt;100;15\n";
        let rows: Vec<_> = RowParser::new(&schema, input.as_bytes(), b';')
            .unwrap()
            .collect::<crate::Result<_>>()
            .unwrap();

        let prices = &rows[0].variant_prices;
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].region_name.as_deref(), Some("Denmark"));
        assert!(prices[0].currency_code.is_none());
        assert_eq!(prices[1].currency_code.as_deref(), Some("eur"));
        assert!(prices[1].region_name.is_none());
    }

    #[test]
    fn test_typed_static_columns() {
        let schema = product_import_schema();
        let input = "Product Handle;Product Weight;Variant Inventory Quantity;Product Discountable;Product Tags;Product Status\n\
                     shirt;1.5;10;no;a,b;Published\n";
        let rows: Vec<_> = RowParser::new(&schema, input.as_bytes(), b';')
            .unwrap()
            .collect::<crate::Result<_>>()
            .unwrap();
        let row = &rows[0];
        assert_eq!(row.get("product.weight"), Some(&FieldValue::Number(1.5)));
        assert_eq!(row.get("variant.inventory_quantity"), Some(&FieldValue::Integer(10)));
        assert_eq!(row.get("product.discountable"), Some(&FieldValue::Boolean(false)));
        assert_eq!(row.text("product.status"), Some("published"));
        assert!(matches!(row.get("product.tags"), Some(FieldValue::List(t)) if t.len() == 2));
    }
}
